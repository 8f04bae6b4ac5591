//! Application layer for kinetrace.
//!
//! This crate provides the session model shared by the CLI and any UI on
//! top: entity stores with selection, field bindings, off-thread
//! computation and chart composition, all driven through [`Workbench`].

pub mod binding;
pub mod chart;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fields;
pub mod import;
pub mod labels;
pub mod script;
pub mod workbench;

// Re-export key types for convenience
pub use binding::Binder;
pub use chart::{
    Chart, ChartComposer, ChartSettings, ChartSurface, DisplaySeries, ElementKind, ElementStyle,
    RecordingSurface, RenderedElement, SeriesKey, StyleReport, apply_styles, draw,
};
pub use config::WorkbenchConfig;
pub use dispatcher::{Completion, DispatchStats, Dispatcher};
pub use error::{AppError, AppResult};
pub use fields::{DiagnosticLabels, GraphForm, TraceForm, apply_graph_text, apply_trace_text};
pub use import::{FileCatalog, list_available_files};
pub use labels::ListView;
pub use script::{Action, Script, ScriptReport, ScriptTrack, StepError};
pub use workbench::{BatchReport, CompletionReport, CompletionStatus, Workbench};
