//! Assembles a run from configuration. Everything that can make a run
//! invalid is checked here, before anything is shown to the participant.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use triad_core::{ExperimentError, StimulusSet};
use triad_timing::Timer;

use crate::builder::{TrialSet, TrialSetBuilder};
use crate::config::{ExperimentConfig, output_path};
use crate::logger::ResponseLogger;
use crate::state::ExperimentController;

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub stimuli: StimulusSet,
    pub trials: TrialSet,
    pub seed: u64,
    pub output: PathBuf,
}

impl RunPlan {
    /// `output` overrides the generated file name, e.g. to resume a run.
    pub fn from_config(
        config: &ExperimentConfig,
        output: Option<PathBuf>,
    ) -> Result<Self, ExperimentError> {
        config.validate()?;
        let stimuli = config.stimuli.load()?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);

        let trials = TrialSetBuilder::new(
            config.block_size,
            config.repeat_passes,
            config.practice_trials,
        )
        .build(&stimuli, &mut rng)?;

        let output = match output {
            Some(path) => path,
            None => output_path(&config.output_dir, &config.output_prefix, &mut rng)?,
        };
        check_output_dir(&output)?;

        info!(
            seed,
            stimuli = stimuli.len(),
            trials = trials.main_len(),
            blocks = trials.blocks().len(),
            practice = trials.practice().len(),
            output = %output.display(),
            "run prepared"
        );

        Ok(Self {
            stimuli,
            trials,
            seed,
            output,
        })
    }

    pub fn into_controller<T: Timer>(
        self,
        timer: T,
    ) -> Result<ExperimentController<T, ResponseLogger>, ExperimentError> {
        let logger = ResponseLogger::new(self.output);
        ExperimentController::new(self.stimuli, self.trials, timer, logger)
    }
}

/// The data file is created on the first write, so its directory has to
/// exist before the participant sees anything.
fn check_output_dir(output: &Path) -> Result<(), ExperimentError> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(ExperimentError::invalid(format!(
            "output directory {} does not exist",
            dir.display()
        )));
    }
    Ok(())
}
