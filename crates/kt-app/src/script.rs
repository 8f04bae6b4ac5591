//! Session scripts: a YAML list of user intents replayed on a workbench.
//!
//! ```yaml
//! tracks:
//!   - path: ramp.txt
//!     samples: [[0.0, 4.0], [4.0, 0.0]]
//! actions:
//!   - new_trace
//!   - open_file: ramp.txt
//!   - edit_trace: { field: mass, value: "1,5" }
//!   - compute_all
//!   - wait
//! ```
//!
//! Entities are addressed by their position in the list views. Actions
//! without a position act on the current selection.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use kt_core::{GraphId, TraceId};
use kt_model::{Entity, GraphField, TraceField};
use kt_sim::{MemoryTracks, Sample};

use crate::error::{AppError, AppResult};
use crate::workbench::{CompletionReport, Workbench};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptTrack {
    pub path: PathBuf,
    /// `[x, y]` pairs.
    pub samples: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NewTrace,
    SelectTrace(Option<usize>),
    DeleteTrace,
    MoveTraceUp,
    MoveTraceDown,
    EditTrace { field: TraceField, value: String },
    OpenFile(PathBuf),
    NewGraph,
    SelectGraph(Option<usize>),
    DeleteGraph,
    MoveGraphUp,
    MoveGraphDown,
    EditGraph { field: GraphField, value: String },
    /// Point the selected graph at the trace at this position (or none).
    PickTrace(Option<usize>),
    Compute,
    ComputeAll,
    Cancel,
    Wait,
}

fn default_wait_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub tracks: Vec<ScriptTrack>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default = "default_wait_ms")]
    pub wait_timeout_ms: u64,
}

/// One action that did not go through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepError {
    pub step: usize,
    pub action: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptReport {
    pub executed: usize,
    pub errors: Vec<StepError>,
    pub completions: Vec<CompletionReport>,
}

impl ScriptReport {
    fn record(&mut self, step: usize, action: &Action, err: &AppError) {
        warn!(step, ?action, error = %err, "script action failed");
        self.errors.push(StepError {
            step,
            action: format!("{action:?}"),
            message: err.to_string(),
        });
    }
}

/// What one action produced. A batch action can be partly rejected and
/// still dispatch the rest.
#[derive(Debug)]
struct Applied {
    completions: Vec<CompletionReport>,
    rejected: Vec<AppError>,
}

impl Applied {
    fn completed(completions: Vec<CompletionReport>) -> Self {
        Self {
            completions,
            rejected: Vec::new(),
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| AppError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Inline tracks as an in-memory loader.
    pub fn track_loader(&self) -> MemoryTracks {
        let mut tracks = MemoryTracks::new();
        for track in &self.tracks {
            let samples = track.samples.iter().map(|[x, y]| Sample::new(*x, *y)).collect();
            tracks.insert(track.path.clone(), samples);
        }
        tracks
    }

    /// Replay every action. A failing action is recorded and the script
    /// goes on. Computations still running at the end are waited for.
    pub fn run(&self, workbench: &mut Workbench) -> AppResult<ScriptReport> {
        let timeout = Duration::from_millis(self.wait_timeout_ms);
        let mut report = ScriptReport::default();
        for (step, action) in self.actions.iter().enumerate() {
            report.executed += 1;
            match self.apply(workbench, action, timeout) {
                Ok(applied) => {
                    report.completions.extend(applied.completions);
                    for err in applied.rejected {
                        report.record(step, action, &err);
                    }
                }
                Err(err) => report.record(step, action, &err),
            }
        }
        report.completions.extend(workbench.wait_idle(timeout)?);
        Ok(report)
    }

    fn apply(
        &self,
        wb: &mut Workbench,
        action: &Action,
        timeout: Duration,
    ) -> AppResult<Applied> {
        match action {
            Action::NewTrace => {
                wb.new_trace();
            }
            Action::SelectTrace(index) => {
                let id = index.map(|i| trace_at(wb, i)).transpose()?;
                wb.select_trace(id)?;
            }
            Action::DeleteTrace => wb.delete_trace(selected_trace(wb)?)?,
            Action::MoveTraceUp => {
                wb.move_trace_up(selected_trace(wb)?)?;
            }
            Action::MoveTraceDown => {
                wb.move_trace_down(selected_trace(wb)?)?;
            }
            Action::EditTrace { field, value } => {
                wb.edit_trace(*field, value)?;
            }
            Action::OpenFile(path) => {
                wb.open_file(path.clone())?;
            }
            Action::NewGraph => {
                wb.new_graph();
            }
            Action::SelectGraph(index) => {
                let id = index.map(|i| graph_at(wb, i)).transpose()?;
                wb.select_graph(id)?;
            }
            Action::DeleteGraph => wb.delete_graph(selected_graph(wb)?)?,
            Action::MoveGraphUp => {
                wb.move_graph_up(selected_graph(wb)?)?;
            }
            Action::MoveGraphDown => {
                wb.move_graph_down(selected_graph(wb)?)?;
            }
            Action::EditGraph { field, value } => {
                wb.edit_graph(*field, value)?;
            }
            Action::PickTrace(index) => {
                let id = index.map(|i| trace_at(wb, i)).transpose()?;
                wb.pick_graph_trace(id)?;
            }
            Action::Compute => {
                wb.compute()?;
            }
            Action::ComputeAll => {
                let batch = wb.compute_all();
                let mut rejected = Vec::with_capacity(batch.rejected.len());
                for (id, source) in batch.rejected {
                    let trace = wb.trace(id)?.name().to_string();
                    rejected.push(AppError::Config { trace, source });
                }
                return Ok(Applied {
                    completions: wb.poll(),
                    rejected,
                });
            }
            Action::Cancel => {
                wb.cancel(selected_trace(wb)?);
            }
            Action::Wait => return wb.wait_idle(timeout).map(Applied::completed),
        }
        Ok(Applied::completed(wb.poll()))
    }
}

fn trace_at(wb: &Workbench, index: usize) -> AppResult<TraceId> {
    wb.traces()
        .at(index)
        .map(Entity::id)
        .ok_or_else(|| AppError::InvalidInput(format!("no trace at position {index}")))
}

fn graph_at(wb: &Workbench, index: usize) -> AppResult<GraphId> {
    wb.graphs()
        .at(index)
        .map(Entity::id)
        .ok_or_else(|| AppError::InvalidInput(format!("no graph at position {index}")))
}

fn selected_trace(wb: &Workbench) -> AppResult<TraceId> {
    wb.traces().selected().ok_or(AppError::NoSelection("trace"))
}

fn selected_graph(wb: &Workbench) -> AppResult<GraphId> {
    wb.graphs().selected().ok_or(AppError::NoSelection("graph"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        let yaml = r#"
tracks:
  - path: ramp.txt
    samples: [[0.0, 4.0], [4.0, 0.0]]
actions:
  - new_trace
  - select_trace: 0
  - select_graph: null
  - edit_trace: { field: min_x, value: "0,5" }
  - edit_graph: { field: y_channel, value: velocity }
  - open_file: ramp.txt
  - compute_all
  - wait
"#;
        let script = Script::from_yaml(yaml).unwrap();
        assert_eq!(script.actions.len(), 8);
        assert_eq!(script.actions[1], Action::SelectTrace(Some(0)));
        assert_eq!(script.actions[2], Action::SelectGraph(None));
        assert_eq!(
            script.actions[3],
            Action::EditTrace {
                field: TraceField::MinX,
                value: "0,5".to_string()
            }
        );
        assert_eq!(script.wait_timeout_ms, 30_000);
        assert_eq!(script.track_loader().len(), 1);
    }
}
