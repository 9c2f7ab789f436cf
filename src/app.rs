use anyhow::{Context, Result, bail};
use tracing::{info, warn};
use triad_core::{ExperimentError, Response, TaskPhase};
use triad_experiment::{ExperimentController, ExperimentState, RecordSink};
use triad_timing::Timer;

use crate::presenter::{Presenter, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The participant ended the session; rows written so far are kept.
    Aborted,
}

/// Feeds presenter events into the controller, one trial at a time.
pub struct App<T, L, P>
where
    T: Timer,
    L: RecordSink,
    P: Presenter,
{
    experiment: ExperimentController<T, L>,
    presenter: P,
    announced_block: Option<usize>,
    last_phase: Option<TaskPhase>,
}

impl<T, L, P> App<T, L, P>
where
    T: Timer,
    L: RecordSink,
    P: Presenter,
{
    pub fn new(experiment: ExperimentController<T, L>, presenter: P) -> Self {
        Self {
            experiment,
            presenter,
            announced_block: None,
            last_phase: None,
        }
    }

    pub fn experiment(&self) -> &ExperimentController<T, L> {
        &self.experiment
    }

    pub fn run(&mut self) -> Result<Outcome> {
        self.presenter.announce(Screen::Welcome)?;
        self.experiment.start()?;

        loop {
            let state = self.experiment.state();
            self.announce_transition(state)?;

            match state {
                ExperimentState::Finished => {
                    self.presenter.announce(Screen::Finished {
                        output: self.experiment.output_path(),
                    })?;
                    return Ok(Outcome::Completed);
                }
                ExperimentState::BlockBreak { .. } => {
                    self.presenter.announce(Screen::RestBreak)?;
                    self.experiment.acknowledge_break()?;
                }
                ExperimentState::NotStarted => bail!("experiment did not start"),
                ExperimentState::Practice { .. }
                | ExperimentState::MainBlock { .. }
                | ExperimentState::Descriptor { .. } => {
                    if !self.run_trial()? {
                        warn!(state = %state, "session aborted by participant");
                        return Ok(Outcome::Aborted);
                    }
                }
            }
        }
    }

    /// Shows the current trial and submits the answer. Returns `false` if
    /// the participant quit instead of answering.
    fn run_trial(&mut self) -> Result<bool> {
        let trial = self
            .experiment
            .current_trial()
            .context("no trial awaiting a response")?;

        let response = if trial.phase.is_choice() {
            self.presenter
                .choose(trial.phase, &trial.items)?
                .map(Response::Choice)
        } else {
            self.presenter.describe(&trial.items[0])?.map(Response::Text)
        };
        let Some(response) = response else {
            return Ok(false);
        };

        match self.experiment.submit_response(response) {
            Ok(_) => Ok(true),
            Err(err @ ExperimentError::OutOfRange { .. }) => {
                info!(%err, "selection rejected");
                self.presenter.reject(&err.to_string())?;
                Ok(true)
            }
            Err(err) => Err(err).context("failed to record response"),
        }
    }

    fn announce_transition(&mut self, state: ExperimentState) -> Result<()> {
        let phase = state.phase();
        if phase != self.last_phase {
            match (self.last_phase, phase) {
                (_, Some(TaskPhase::Practice)) => {
                    self.presenter.announce(Screen::PracticeIntro {
                        count: self.experiment.progress().practice_total,
                    })?;
                }
                (Some(TaskPhase::Practice), Some(TaskPhase::Main)) => {
                    self.presenter.announce(Screen::PracticeDone)?;
                }
                (Some(TaskPhase::Main), Some(TaskPhase::Descriptor)) => {
                    self.presenter.announce(Screen::ChoiceTaskDone)?;
                }
                _ => {}
            }
            if phase == Some(TaskPhase::Descriptor) {
                self.presenter.announce(Screen::DescriptorIntro {
                    count: self.experiment.stimuli().len(),
                })?;
            }
            self.last_phase = phase;
        }

        if let ExperimentState::MainBlock { block, .. } = state {
            if self.announced_block != Some(block) {
                self.presenter.announce(Screen::BlockStart {
                    block,
                    count: self.experiment.progress().block_count,
                })?;
                self.announced_block = Some(block);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;
    use triad_core::{Stimulus, StimulusSet, TrialRecord};
    use triad_experiment::TrialSetBuilder;
    use triad_timing::ManualTimer;

    #[derive(Debug, Clone, PartialEq)]
    enum Answer {
        Pick(usize),
        Say(&'static str),
    }

    /// Replays canned answers and remembers which screens were shown.
    #[derive(Default)]
    struct ScriptedPresenter {
        answers: VecDeque<Answer>,
        screens: Vec<String>,
        rejections: usize,
    }

    impl Presenter for ScriptedPresenter {
        fn announce(&mut self, screen: Screen<'_>) -> Result<()> {
            let name = match screen {
                Screen::BlockStart { block, .. } => format!("block{}", block + 1),
                Screen::Finished { .. } => "finished".to_string(),
                other => format!("{other:?}"),
            };
            self.screens.push(name);
            Ok(())
        }

        fn choose(&mut self, _: TaskPhase, _: &[Stimulus]) -> Result<Option<usize>> {
            Ok(match self.answers.pop_front() {
                Some(Answer::Pick(i)) => Some(i),
                Some(other) => bail!("script expected a pick, got {other:?}"),
                None => None,
            })
        }

        fn describe(&mut self, _: &Stimulus) -> Result<Option<String>> {
            Ok(match self.answers.pop_front() {
                Some(Answer::Say(text)) => Some(text.to_string()),
                Some(other) => bail!("script expected text, got {other:?}"),
                None => None,
            })
        }

        fn reject(&mut self, _: &str) -> Result<()> {
            self.rejections += 1;
            Ok(())
        }
    }

    fn app(
        practice: usize,
        answers: Vec<Answer>,
    ) -> App<ManualTimer, Vec<TrialRecord>, ScriptedPresenter> {
        // C(5,3) = 10 main trials in blocks of 3: 4 blocks, one break before block 3.
        let stimuli = StimulusSet::from_template("img/img{i}.png", 5).unwrap();
        let trials = TrialSetBuilder::new(3, 1, practice)
            .build(&stimuli, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let controller =
            ExperimentController::new(stimuli, trials, ManualTimer::new(), Vec::new()).unwrap();
        let presenter = ScriptedPresenter {
            answers: answers.into(),
            ..Default::default()
        };
        App::new(controller, presenter)
    }

    #[test]
    fn full_session_shows_screens_in_order() {
        let mut answers = vec![Answer::Pick(0); 2 + 10];
        answers.extend(["a", "", "c", "d", "e"].map(Answer::Say));
        let mut app = app(2, answers);

        assert_eq!(app.run().unwrap(), Outcome::Completed);
        assert_eq!(
            app.presenter.screens,
            [
                "Welcome",
                "PracticeIntro { count: 2 }",
                "PracticeDone",
                "block1",
                "block2",
                "RestBreak",
                "block3",
                "block4",
                "ChoiceTaskDone",
                "DescriptorIntro { count: 5 }",
                "finished",
            ]
        );
        let records = app.experiment().sink();
        assert_eq!(records.len(), 10 + 5);
        assert!(records.iter().all(|r| r.phase != TaskPhase::Practice));
    }

    #[test]
    fn out_of_range_pick_is_asked_again() {
        let mut answers = vec![Answer::Pick(7)];
        answers.extend(vec![Answer::Pick(2); 10]);
        answers.extend(["a", "b", "c", "d", "e"].map(Answer::Say));
        let mut app = app(0, answers);

        assert_eq!(app.run().unwrap(), Outcome::Completed);
        assert_eq!(app.presenter.rejections, 1);
        assert_eq!(app.experiment().sink().len(), 15);
    }

    #[test]
    fn quitting_mid_block_keeps_earlier_rows() {
        let mut app = app(0, vec![Answer::Pick(1); 4]);
        assert_eq!(app.run().unwrap(), Outcome::Aborted);
        assert_eq!(app.experiment().sink().len(), 4);
        assert_eq!(
            app.experiment().state(),
            ExperimentState::MainBlock { block: 1, trial: 1 }
        );
    }
}
