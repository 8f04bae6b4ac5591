//! Error types for the kt-app service layer.

use std::path::PathBuf;

use kt_core::{GraphId, KtError, TraceId};
use kt_model::{ConfigError, ModelError};
use kt_sim::SimError;

/// Application error type shared by the workbench, scripts and the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Trace {trace:?} cannot be computed: {source}")]
    Config {
        trace: String,
        #[source]
        source: ConfigError,
    },

    #[error("Trace not found: {0:?}")]
    TraceNotFound(TraceId),

    #[error("Graph not found: {0:?}")]
    GraphNotFound(GraphId),

    #[error("Trace {trace:?} is still referenced by {} graph(s)", .graphs.len())]
    TraceInUse { trace: TraceId, graphs: Vec<GraphId> },

    #[error("No {0} selected")]
    NoSelection(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Failed to read {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Timed out with {pending} computation(s) still running")]
    Timeout { pending: usize },

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<KtError> for AppError {
    fn from(err: KtError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
