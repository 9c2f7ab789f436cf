pub mod error;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use error::ExperimentError;
pub use phase::TaskPhase;
pub use stimulus::{Atom, Stimulus, StimulusSet};
pub use trial::{NOT_APPLICABLE, Response, TrialRecord, Triple};
