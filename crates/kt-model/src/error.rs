//! Model-layer error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::trace::TraceField;

pub type ModelResult<T> = Result<T, ModelError>;

/// A trace cannot be computed with its current configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} is required")]
    Missing { field: TraceField },

    #[error("{field} must be finite (got {value})")]
    NonFinite { field: TraceField, value: f64 },

    #[error("{field} {reason}")]
    OutOfDomain {
        field: TraceField,
        reason: &'static str,
    },

    #[error("domain start {min_x} must be below domain end {max_x}")]
    EmptyDomain { min_x: f64, max_x: f64 },

    #[error("step {step} needs {steps} steps, more than the limit of {limit}")]
    TooManySteps {
        step: f64,
        steps: f64,
        limit: usize,
    },

    #[error("source file {path}: {message}")]
    Source { path: PathBuf, message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown {kind}: {text:?}")]
    UnknownChoice { kind: &'static str, text: String },

    #[error("Invalid color {text:?} (expected #RRGGBB or #RRGGBBAA)")]
    InvalidColor { text: String },
}
