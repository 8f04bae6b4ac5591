//! Error types for trace computation.

use std::path::PathBuf;
use thiserror::Error;

use kt_model::ConfigError;

/// Errors encountered while integrating a trace.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Computation cancelled")]
    Cancelled,

    #[error("Non-physical state: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid track: {what}")]
    InvalidTrack { what: &'static str },

    #[error("Track {path} unavailable: {message}")]
    TrackUnavailable { path: PathBuf, message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Whether the failure is the user's configuration rather than the engine.
    pub fn is_config(&self) -> bool {
        matches!(self, SimError::Config(_))
    }
}
