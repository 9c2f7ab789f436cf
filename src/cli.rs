use std::path::PathBuf;

use clap::Parser;
use triad_experiment::{ExperimentConfig, StimulusSource};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Triple odd-one-out and descriptor task")]
pub struct Args {
    /// Stimulus image paths, in descriptor-task order (overrides config)
    #[arg(value_name = "STIMULUS")]
    pub stimuli: Vec<PathBuf>,

    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stimulus path template with an {i} placeholder, e.g. img/img{i}.png
    #[arg(long, conflicts_with = "stimuli", requires = "count")]
    pub template: Option<String>,

    /// Number of stimuli to expand from --template
    #[arg(long, requires = "template")]
    pub count: Option<usize>,

    /// Main-task trials per block
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Number of practice trials
    #[arg(long)]
    pub practice: Option<usize>,

    /// How many times every triple is shown
    #[arg(long)]
    pub repeat: Option<usize>,

    /// Seed for trial generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write to this file instead of a generated name; an existing file is resumed
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Directory for generated output files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut ExperimentConfig) {
        if !self.stimuli.is_empty() {
            config.stimuli = StimulusSource::Paths {
                paths: self.stimuli.clone(),
            };
        }
        if let (Some(template), Some(count)) = (&self.template, self.count) {
            config.stimuli = StimulusSource::Template {
                template: template.clone(),
                count,
            };
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        if let Some(practice) = self.practice {
            config.practice_trials = practice;
        }
        if let Some(repeat) = self.repeat {
            config.repeat_passes = repeat;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}
