//! Error taxonomy shared by the trial builder, the controller and the logger.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    /// Fatal at startup: the run cannot be set up from these parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A selection outside the displayed items. The trial stays current.
    #[error("Selection {index} is out of range for a trial with {len} items")]
    OutOfRange { index: usize, len: usize },

    /// A response arrived that the current state does not accept.
    #[error("Unexpected {response} response while {state}")]
    UnexpectedResponse {
        response: &'static str,
        state: String,
    },

    /// Writing the data file failed. Always fatal for the run.
    #[error("Response log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl ExperimentError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
