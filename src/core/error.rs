//! Error handling - configuration vs. runtime invariant failures

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Simulator error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid static parameters, raised before any step runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// A core invariant broke mid-run. Fatal: the run is aborted.
    #[error("Invariant violation at step {step}: {reason}")]
    InvariantViolation { step: u64, reason: String },

    /// Config file / record export IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record export serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A batch worker thread died
    #[error("Worker error: {0}")]
    Worker(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn invariant(step: u64, reason: impl Into<String>) -> Self {
        Error::InvariantViolation {
            step,
            reason: reason.into(),
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation { .. })
    }
}
