use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};
use triad_core::{ExperimentError, Response, Stimulus, StimulusSet, TaskPhase, TrialRecord, Triple};
use triad_timing::Timer;

use crate::builder::TrialSet;
use crate::logger::RecordSink;
use crate::sequencer::DescriptorSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentState {
    NotStarted,
    Practice { trial: usize },
    MainBlock { block: usize, trial: usize },
    /// Rest gate before `block`. No data is recorded here.
    BlockBreak { block: usize },
    Descriptor { stimulus: usize },
    Finished,
}

impl ExperimentState {
    pub fn phase(&self) -> Option<TaskPhase> {
        match self {
            Self::Practice { .. } => Some(TaskPhase::Practice),
            Self::MainBlock { .. } | Self::BlockBreak { .. } => Some(TaskPhase::Main),
            Self::Descriptor { .. } => Some(TaskPhase::Descriptor),
            Self::NotStarted | Self::Finished => None,
        }
    }
}

impl fmt::Display for ExperimentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not started"),
            Self::Practice { trial } => write!(f, "in practice trial {}", trial + 1),
            Self::MainBlock { block, trial } => {
                write!(f, "in block {} trial {}", block + 1, trial + 1)
            }
            Self::BlockBreak { block } => write!(f, "on the break before block {}", block + 1),
            Self::Descriptor { stimulus } => write!(f, "describing stimulus {}", stimulus + 1),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// What the presenter should put on screen for the pending response.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentTrial {
    pub phase: TaskPhase,
    pub items: Vec<Stimulus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub practice_total: usize,
    pub main_completed: usize,
    pub main_total: usize,
    pub block: Option<usize>,
    pub block_count: usize,
}

/// Drives one participant through practice, the blocked odd-one-out task
/// and the descriptor task. Calls are strictly sequential: `current_trial`
/// for what to show, then one `submit_response` for it.
pub struct ExperimentController<T, L>
where
    T: Timer,
    L: RecordSink,
{
    stimuli: StimulusSet,
    trials: TrialSet,
    timer: T,
    log: L,
    state: ExperimentState,
    descriptors: DescriptorSequencer,
    described: Option<Stimulus>,
    shown_at: Option<u64>,
    main_completed: usize,
    missing_timer: usize,
}

impl<T, L> ExperimentController<T, L>
where
    T: Timer,
    L: RecordSink,
{
    /// Fails if `trials` was built for a stimulus set of another size.
    pub fn new(
        stimuli: StimulusSet,
        trials: TrialSet,
        timer: T,
        log: L,
    ) -> Result<Self, ExperimentError> {
        if trials.stimulus_count() != stimuli.len() {
            return Err(ExperimentError::invalid(format!(
                "trial set was built for {} stimuli but {} were given",
                trials.stimulus_count(),
                stimuli.len()
            )));
        }
        let descriptors = DescriptorSequencer::new(stimuli.clone());
        Ok(Self {
            stimuli,
            trials,
            timer,
            log,
            state: ExperimentState::NotStarted,
            descriptors,
            described: None,
            shown_at: None,
            main_completed: 0,
            missing_timer: 0,
        })
    }

    pub fn start(&mut self) -> Result<(), ExperimentError> {
        if self.state != ExperimentState::NotStarted {
            return Err(self.unexpected("start"));
        }
        if self.trials.practice().is_empty() {
            self.enter_main();
        } else {
            self.state = ExperimentState::Practice { trial: 0 };
            info!(count = self.trials.practice().len(), "practice started");
        }
        Ok(())
    }

    /// Items to display, or `None` when no response is awaited (not started,
    /// on a break, finished). The first call for a trial starts its clock.
    pub fn current_trial(&mut self) -> Option<CurrentTrial> {
        let trial = match self.state {
            ExperimentState::Practice { trial } => CurrentTrial {
                phase: TaskPhase::Practice,
                items: self.resolve(self.trials.practice()[trial]),
            },
            ExperimentState::MainBlock { block, trial } => CurrentTrial {
                phase: TaskPhase::Main,
                items: self.resolve(self.trials.blocks()[block].trials()[trial]),
            },
            ExperimentState::Descriptor { .. } => CurrentTrial {
                phase: TaskPhase::Descriptor,
                items: self.described.iter().cloned().collect(),
            },
            _ => return None,
        };
        if self.shown_at.is_none() {
            self.shown_at = Some(self.timer.now());
        }
        Some(trial)
    }

    /// Records the response to the current trial and advances. On error the
    /// same trial stays current and nothing is logged.
    pub fn submit_response(&mut self, response: Response) -> Result<TrialRecord, ExperimentError> {
        let record = match (self.state, &response) {
            (ExperimentState::Practice { trial }, Response::Choice(index)) => {
                let triple = self.trials.practice()[trial];
                self.choice_record(TaskPhase::Practice, trial + 1, triple, *index)?
            }
            (ExperimentState::MainBlock { block, trial }, Response::Choice(index)) => {
                let triple = self.trials.blocks()[block].trials()[trial];
                let trial_num = block * self.trials.block_size() + trial + 1;
                self.choice_record(TaskPhase::Main, trial_num, triple, *index)?
            }
            (ExperimentState::Descriptor { .. }, Response::Text(text)) => {
                let Some(stimulus) = self.described.as_ref().map(|s| s.id().clone()) else {
                    return Err(self.unexpected(response.kind()));
                };
                TrialRecord::descriptor(stimulus, text, self.reaction_time())
            }
            _ => return Err(self.unexpected(response.kind())),
        };

        if record.phase.is_logged() {
            self.log.record(&record)?;
        }
        if record.reaction_time.is_none() {
            self.missing_timer += 1;
            warn!(state = %self.state, "response without display time; reaction time left blank");
        }
        debug!(
            phase = %record.phase,
            trial = ?record.trial_num,
            reaction_time = ?record.reaction_time,
            "response recorded"
        );
        self.advance();
        Ok(record)
    }

    /// Leaves a rest break and starts the block it precedes.
    pub fn acknowledge_break(&mut self) -> Result<(), ExperimentError> {
        let ExperimentState::BlockBreak { block } = self.state else {
            return Err(self.unexpected("break acknowledgement"));
        };
        self.state = ExperimentState::MainBlock { block, trial: 0 };
        info!(block = block + 1, "block started after break");
        Ok(())
    }

    pub fn state(&self) -> ExperimentState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ExperimentState::Finished
    }

    pub fn progress(&self) -> Progress {
        let block = match self.state {
            ExperimentState::MainBlock { block, .. } | ExperimentState::BlockBreak { block } => {
                Some(block)
            }
            _ => None,
        };
        Progress {
            practice_total: self.trials.practice().len(),
            main_completed: self.main_completed,
            main_total: self.trials.main_len(),
            block,
            block_count: self.trials.blocks().len(),
        }
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.log.location()
    }

    /// Responses that arrived without a recorded display time.
    pub fn missing_timer_count(&self) -> usize {
        self.missing_timer
    }

    pub fn stimuli(&self) -> &StimulusSet {
        &self.stimuli
    }

    pub fn sink(&self) -> &L {
        &self.log
    }

    fn resolve(&self, triple: Triple) -> Vec<Stimulus> {
        triple
            .indices()
            .iter()
            .map(|&i| self.stimuli[i].clone())
            .collect()
    }

    fn choice_record(
        &self,
        phase: TaskPhase,
        trial_num: usize,
        triple: Triple,
        index: usize,
    ) -> Result<TrialRecord, ExperimentError> {
        let items = triple.ids(&self.stimuli);
        let Some(chosen) = items.get(index).cloned() else {
            return Err(ExperimentError::OutOfRange {
                index,
                len: items.len(),
            });
        };
        let reaction_time = self.reaction_time();
        Ok(TrialRecord::choice(phase, trial_num, items, chosen, reaction_time))
    }

    /// `None` when the trial was never shown or the clock went backwards.
    fn reaction_time(&self) -> Option<std::time::Duration> {
        let now = self.timer.now();
        self.shown_at
            .and_then(|shown| self.timer.between(shown, now))
    }

    fn advance(&mut self) {
        self.shown_at = None;
        match self.state {
            ExperimentState::Practice { trial } => {
                if trial + 1 < self.trials.practice().len() {
                    self.state = ExperimentState::Practice { trial: trial + 1 };
                } else {
                    info!("practice finished");
                    self.enter_main();
                }
            }
            ExperimentState::MainBlock { block, trial } => {
                self.main_completed += 1;
                if trial + 1 < self.trials.blocks()[block].len() {
                    self.state = ExperimentState::MainBlock {
                        block,
                        trial: trial + 1,
                    };
                    return;
                }
                let next = block + 1;
                if next == self.trials.blocks().len() {
                    info!(trials = self.main_completed, "odd-one-out task finished");
                    self.enter_descriptor();
                } else if next % 2 == 0 {
                    self.state = ExperimentState::BlockBreak { block: next };
                    info!(before_block = next + 1, "rest break");
                } else {
                    self.state = ExperimentState::MainBlock {
                        block: next,
                        trial: 0,
                    };
                    info!(block = next + 1, "block started");
                }
            }
            ExperimentState::Descriptor { stimulus } => {
                self.described = self.descriptors.next();
                if self.described.is_some() {
                    self.state = ExperimentState::Descriptor {
                        stimulus: stimulus + 1,
                    };
                } else {
                    self.state = ExperimentState::Finished;
                    info!(output = ?self.output_path(), "experiment finished");
                }
            }
            ExperimentState::NotStarted
            | ExperimentState::BlockBreak { .. }
            | ExperimentState::Finished => {}
        }
    }

    fn enter_main(&mut self) {
        if self.trials.blocks().is_empty() {
            self.enter_descriptor();
        } else {
            self.state = ExperimentState::MainBlock { block: 0, trial: 0 };
            info!(blocks = self.trials.blocks().len(), "block started");
        }
    }

    fn enter_descriptor(&mut self) {
        self.described = self.descriptors.next();
        self.state = if self.described.is_some() {
            info!(stimuli = self.stimuli.len(), "descriptor task started");
            ExperimentState::Descriptor { stimulus: 0 }
        } else {
            ExperimentState::Finished
        };
    }

    fn unexpected(&self, response: &'static str) -> ExperimentError {
        ExperimentError::UnexpectedResponse {
            response,
            state: self.state.to_string(),
        }
    }
}
