pub mod builder;
pub mod config;
pub mod logger;
pub mod sequencer;
pub mod setup;
pub mod state;
pub use builder::{Block, TrialSet, TrialSetBuilder};
pub use config::{ExperimentConfig, StimulusSource};
pub use logger::{RecordSink, ResponseLogger};
pub use sequencer::DescriptorSequencer;
pub use setup::RunPlan;
pub use state::{CurrentTrial, ExperimentController, ExperimentState, Progress};
