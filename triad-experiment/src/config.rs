use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};
use triad_core::{ExperimentError, StimulusSet};

/// Attempts at drawing an unused output file name before giving up.
const NAME_ATTEMPTS: usize = 100;

/// Where the stimulus paths come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StimulusSource {
    /// `{i}` in `template` is replaced by 1..=count.
    Template { template: String, count: usize },
    Paths { paths: Vec<PathBuf> },
}

impl Default for StimulusSource {
    fn default() -> Self {
        Self::Template {
            template: "img/img{i}.png".to_string(),
            count: 10,
        }
    }
}

impl StimulusSource {
    pub fn load(&self) -> Result<StimulusSet, ExperimentError> {
        match self {
            Self::Template { template, count } => StimulusSet::from_template(template, *count),
            Self::Paths { paths } => StimulusSet::from_paths(paths.iter().cloned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub stimuli: StimulusSource,
    pub block_size: usize,
    pub practice_trials: usize,
    /// How many times the full set of triples is shown.
    pub repeat_passes: usize,
    /// Drawn from the thread RNG when absent.
    pub seed: Option<u64>,
    pub output_dir: PathBuf,
    pub output_prefix: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            stimuli: StimulusSource::default(),
            block_size: 20,
            practice_trials: 5,
            repeat_passes: 2,
            seed: None,
            output_dir: PathBuf::from("."),
            output_prefix: "experiment_data".to_string(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ExperimentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ExperimentError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks what can be checked without building the trial set.
    pub fn validate(&self) -> Result<(), ExperimentError> {
        if self.block_size == 0 {
            return Err(ExperimentError::invalid("block_size must be positive"));
        }
        if self.repeat_passes == 0 {
            return Err(ExperimentError::invalid("repeat_passes must be at least 1"));
        }
        if let StimulusSource::Template { count, .. } = &self.stimuli {
            if *count < 3 {
                return Err(ExperimentError::invalid(format!(
                    "at least 3 stimuli are needed, template count is {count}"
                )));
            }
        }
        if self.output_prefix.is_empty() {
            return Err(ExperimentError::invalid("output_prefix must not be empty"));
        }
        Ok(())
    }
}

/// Picks `{dir}/{prefix}_{NNNN}.csv` that does not exist yet.
pub fn output_path<R: Rng + ?Sized>(
    dir: &Path,
    prefix: &str,
    rng: &mut R,
) -> Result<PathBuf, ExperimentError> {
    for _ in 0..NAME_ATTEMPTS {
        let suffix: u16 = rng.random_range(1000..=9999);
        let candidate = dir.join(format!("{prefix}_{suffix}.csv"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(ExperimentError::invalid(format!(
        "no free output file name for prefix '{prefix}' in {}",
        dir.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn defaults_are_two_pass_blocks_of_twenty() {
        let config = ExperimentConfig::default();
        assert_eq!(config.block_size, 20);
        assert_eq!(config.practice_trials, 5);
        assert_eq!(config.repeat_passes, 2);
        assert_eq!(config.stimuli.load().unwrap().len(), 10);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ExperimentConfig::from_json_str(
            r#"{ "block_size": 2, "stimuli": { "paths": ["a.png", "b.png", "c.png", "d.png"] } }"#,
        )
        .unwrap();
        assert_eq!(config.block_size, 2);
        assert_eq!(config.practice_trials, 5);
        assert_eq!(config.stimuli.load().unwrap().len(), 4);
    }

    #[test]
    fn template_source_parses() {
        let config = ExperimentConfig::from_json_str(
            r#"{ "stimuli": { "template": "tex/t{i}.jpg", "count": 4 } }"#,
        )
        .unwrap();
        assert_eq!(
            config.stimuli,
            StimulusSource::Template {
                template: "tex/t{i}.jpg".to_string(),
                count: 4
            }
        );
    }

    #[test]
    fn zero_block_size_is_invalid() {
        let config = ExperimentConfig {
            block_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ExperimentError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn zero_passes_is_invalid() {
        let config = ExperimentConfig {
            repeat_passes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_name_has_four_digit_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let path = output_path(dir.path(), "experiment_data", &mut rng).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        let digits = name
            .strip_prefix("experiment_data_")
            .and_then(|rest| rest.strip_suffix(".csv"))
            .unwrap();
        let n: u16 = digits.parse().unwrap();
        assert!((1000..=9999).contains(&n));
        assert!(!path.exists());
    }

    #[test]
    fn output_name_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = output_path(dir.path(), "run", &mut StdRng::seed_from_u64(9)).unwrap();
        std::fs::write(&first, "taken").unwrap();
        let second = output_path(dir.path(), "run", &mut StdRng::seed_from_u64(9)).unwrap();
        assert_ne!(first, second);
    }
}
