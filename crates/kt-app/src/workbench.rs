//! The workbench: trace and graph stores, field bindings, computation and
//! chart composition, driven by explicit user intents.
//!
//! All state lives on the thread that owns the workbench. Computations run on
//! the dispatcher's pool; their results are applied in [`Workbench::poll`] or
//! [`Workbench::wait_idle`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use kt_core::{GraphId, TraceId};
use kt_model::{
    Change, ChangeBus, ChangeField, ConfigError, Entity, EntityRef, EntityStore, Graph, GraphField,
    MoveOutcome, SourceFile, Trace, TraceField,
};
use kt_sim::{SimError, TrackLoader};

use crate::binding::Binder;
use crate::chart::{Chart, ChartComposer, ChartSurface, StyleReport, draw};
use crate::config::WorkbenchConfig;
use crate::dispatcher::{Completion, DispatchStats, Dispatcher};
use crate::error::{AppError, AppResult};
use crate::import::FileCatalog;
use crate::labels::ListView;

/// How a computation ended, as seen by the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed { iterations: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub trace: TraceId,
    pub name: String,
    #[serde(flatten)]
    pub status: CompletionStatus,
}

/// Outcome of a compute-all request. Traces with configuration errors are
/// reported and skipped; the rest are dispatched.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub dispatched: Vec<TraceId>,
    pub rejected: Vec<(TraceId, ConfigError)>,
}

#[derive(Debug)]
pub struct Workbench {
    config: WorkbenchConfig,
    traces: EntityStore<Trace>,
    graphs: EntityStore<Graph>,
    bus: ChangeBus,
    binder: Binder,
    dispatcher: Dispatcher,
    composer: ChartComposer,
    chart: Chart,
    catalog: FileCatalog,
    trace_list: ListView<TraceId>,
    graph_list: ListView<GraphId>,
    trace_picker: ListView<TraceId>,
}

impl Workbench {
    /// Start a session: scan the import folder, build the worker pool and
    /// seed the default trace and graph when configured.
    pub fn new(config: WorkbenchConfig, tracks: Arc<dyn TrackLoader>) -> AppResult<Self> {
        let catalog = match &config.import_folder {
            Some(folder) => FileCatalog::scan(folder, &config.import_extension)?,
            None => FileCatalog::default(),
        };
        let dispatcher = Dispatcher::new(config.worker_threads, tracks)?;
        let composer = ChartComposer::new(config.chart.clone());
        let mut workbench = Self {
            traces: EntityStore::new(),
            graphs: EntityStore::new(),
            bus: ChangeBus::new(),
            binder: Binder::new(),
            dispatcher,
            chart: Chart::default(),
            composer,
            catalog,
            trace_list: ListView::new(),
            graph_list: ListView::new(),
            trace_picker: ListView::new(),
            config,
        };
        if workbench.config.seed_defaults {
            workbench.new_trace();
            workbench.new_graph();
        }
        workbench.rebuild_trace_lists();
        workbench.rebuild_graph_list();
        workbench.recompose();
        info!(
            files = workbench.catalog.len(),
            traces = workbench.traces.len(),
            "workbench ready"
        );
        Ok(workbench)
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn traces(&self) -> &EntityStore<Trace> {
        &self.traces
    }

    pub fn graphs(&self) -> &EntityStore<Graph> {
        &self.graphs
    }

    pub fn trace(&self, id: TraceId) -> AppResult<&Trace> {
        self.traces.get(id).ok_or(AppError::TraceNotFound(id))
    }

    pub fn graph(&self, id: GraphId) -> AppResult<&Graph> {
        self.graphs.get(id).ok_or(AppError::GraphNotFound(id))
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn catalog(&self) -> &FileCatalog {
        &self.catalog
    }

    pub fn trace_list(&self) -> &ListView<TraceId> {
        &self.trace_list
    }

    pub fn graph_list(&self) -> &ListView<GraphId> {
        &self.graph_list
    }

    pub fn trace_picker(&self) -> &ListView<TraceId> {
        &self.trace_picker
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn compositions(&self) -> u64 {
        self.composer.compositions()
    }

    // Traces

    /// Add a trace with default configuration and select it.
    pub fn new_trace(&mut self) -> TraceId {
        let name = format!("Trace {}", self.traces.issued() + 1);
        let id = self.traces.insert(|id| Trace::new(id, name));
        self.traces.select_last();
        self.rebind_trace();
        self.rebuild_trace_lists();
        debug!(?id, "trace created");
        id
    }

    pub fn select_trace(&mut self, id: Option<TraceId>) -> AppResult<()> {
        if let Some(id) = id {
            self.trace(id)?;
        }
        self.traces.select(id);
        self.rebind_trace();
        Ok(())
    }

    /// Delete a trace. Graphs referencing it are unlinked first and stay
    /// listed with an empty series; a run in flight is cancelled.
    pub fn delete_trace(&mut self, id: TraceId) -> AppResult<()> {
        let index = self.traces.index_of(id).ok_or(AppError::TraceNotFound(id))?;
        let was_selected = self.traces.selected() == Some(id);
        self.dispatcher.cancel(id);

        let unlinked = self.unlink_graphs_from(id);
        self.remove_trace(id)?;

        if was_selected {
            self.traces.select_nearest(index);
        }
        self.rebind_trace();
        self.rebuild_trace_lists();
        self.process_changes();
        if !unlinked.is_empty() {
            self.recompose();
        }
        info!(?id, unlinked = unlinked.len(), "trace deleted");
        Ok(())
    }

    /// Remove a trace from the store, refusing while graphs reference it.
    pub fn remove_trace(&mut self, id: TraceId) -> AppResult<Trace> {
        let graphs: Vec<GraphId> = self
            .graphs
            .iter()
            .filter(|g| g.references(id))
            .map(Entity::id)
            .collect();
        if !graphs.is_empty() {
            return Err(AppError::TraceInUse { trace: id, graphs });
        }
        self.traces.remove(id).ok_or(AppError::TraceNotFound(id))
    }

    pub fn move_trace_up(&mut self, id: TraceId) -> AppResult<MoveOutcome> {
        let outcome = self.traces.move_up(id);
        self.after_trace_move(id, outcome)
    }

    pub fn move_trace_down(&mut self, id: TraceId) -> AppResult<MoveOutcome> {
        let outcome = self.traces.move_down(id);
        self.after_trace_move(id, outcome)
    }

    fn after_trace_move(&mut self, id: TraceId, outcome: MoveOutcome) -> AppResult<MoveOutcome> {
        match outcome {
            MoveOutcome::NotFound => Err(AppError::TraceNotFound(id)),
            MoveOutcome::AtBoundary => Ok(outcome),
            MoveOutcome::Moved { .. } => {
                self.rebuild_trace_lists();
                Ok(outcome)
            }
        }
    }

    /// Commit a text edit on the selected trace.
    pub fn edit_trace(&mut self, field: TraceField, text: &str) -> AppResult<bool> {
        let changed = self
            .binder
            .edit_trace(&mut self.traces, &mut self.bus, field, text)?;
        self.process_changes();
        Ok(changed)
    }

    /// Set (or clear) the source file of the selected trace.
    pub fn set_file(&mut self, file: Option<SourceFile>) -> AppResult<bool> {
        let text = file
            .as_ref()
            .map(|f| f.path().display().to_string())
            .unwrap_or_default();
        self.edit_trace(TraceField::File, &text)
    }

    /// Add a file to the catalog and use it on the selected trace.
    pub fn open_file(&mut self, path: impl Into<PathBuf>) -> AppResult<bool> {
        let file = SourceFile::new(path);
        self.catalog.add(file.clone());
        self.set_file(Some(file))
    }

    // Graphs

    /// Add a graph on the selected trace and select it.
    pub fn new_graph(&mut self) -> GraphId {
        let name = format!("Graph {}", self.graphs.issued() + 1);
        let trace = self.traces.selected();
        let defaults = &self.config.graph_defaults;
        let id = self.graphs.insert(|id| Graph::new(id, name, trace, defaults));
        self.graphs.select_last();
        self.rebind_graph();
        self.rebuild_graph_list();
        self.recompose();
        debug!(?id, ?trace, "graph created");
        id
    }

    pub fn select_graph(&mut self, id: Option<GraphId>) -> AppResult<()> {
        if let Some(id) = id {
            self.graph(id)?;
        }
        self.graphs.select(id);
        self.rebind_graph();
        Ok(())
    }

    /// Delete a graph: unlink its trace, drop its series, then remove it.
    pub fn delete_graph(&mut self, id: GraphId) -> AppResult<()> {
        let index = self.graphs.index_of(id).ok_or(AppError::GraphNotFound(id))?;
        let was_selected = self.graphs.selected() == Some(id);

        if let Some(graph) = self.graphs.get_mut(id) {
            graph.unlink_trace();
        }
        self.chart.series.retain(|s| s.graph != id);
        self.graphs.remove_at(index);

        if was_selected {
            self.graphs.select_nearest(index);
        }
        self.rebind_graph();
        self.rebuild_graph_list();
        self.recompose();
        info!(?id, "graph deleted");
        Ok(())
    }

    pub fn move_graph_up(&mut self, id: GraphId) -> AppResult<MoveOutcome> {
        let outcome = self.graphs.move_up(id);
        self.after_graph_move(id, outcome)
    }

    pub fn move_graph_down(&mut self, id: GraphId) -> AppResult<MoveOutcome> {
        let outcome = self.graphs.move_down(id);
        self.after_graph_move(id, outcome)
    }

    fn after_graph_move(&mut self, id: GraphId, outcome: MoveOutcome) -> AppResult<MoveOutcome> {
        match outcome {
            MoveOutcome::NotFound => Err(AppError::GraphNotFound(id)),
            MoveOutcome::AtBoundary => Ok(outcome),
            MoveOutcome::Moved { .. } => {
                self.rebuild_graph_list();
                self.recompose();
                Ok(outcome)
            }
        }
    }

    /// Commit a text edit on the selected graph.
    pub fn edit_graph(&mut self, field: GraphField, text: &str) -> AppResult<bool> {
        let changed = self
            .binder
            .edit_graph(&mut self.graphs, &mut self.bus, field, text)?;
        self.process_changes();
        Ok(changed)
    }

    /// Point the selected graph at another trace (or none).
    pub fn pick_graph_trace(&mut self, trace: Option<TraceId>) -> AppResult<bool> {
        if let Some(trace) = trace {
            self.trace(trace)?;
        }
        let id = self.binder.bound_graph().ok_or(AppError::NoSelection("graph"))?;
        let graph = self.graphs.get_mut(id).ok_or(AppError::GraphNotFound(id))?;
        let changed = graph.set_trace(trace);
        if changed {
            self.bus.publish(Change::graph(id, GraphField::Trace));
        }
        self.process_changes();
        Ok(changed)
    }

    // Computation

    /// Compute the selected trace. A configuration error is returned at once
    /// and nothing is dispatched.
    pub fn compute(&mut self) -> AppResult<TraceId> {
        let id = self.traces.selected().ok_or(AppError::NoSelection("trace"))?;
        self.compute_trace(id)?;
        Ok(id)
    }

    pub fn compute_trace(&mut self, id: TraceId) -> AppResult<u64> {
        let trace = self.trace(id)?;
        if let Err(source) = trace.config().validate() {
            warn!(?id, error = %source, "trace not computed");
            return Err(AppError::Config {
                trace: trace.name().to_string(),
                source,
            });
        }
        let config = trace.config().clone();
        Ok(self.dispatcher.compute_one(id, config))
    }

    /// Compute every trace. One trace's configuration error does not stop
    /// the others.
    pub fn compute_all(&mut self) -> BatchReport {
        let mut report = BatchReport::default();
        let mut jobs = Vec::new();
        for trace in self.traces.iter() {
            match trace.config().validate() {
                Ok(_) => jobs.push((trace.id(), trace.config().clone())),
                Err(err) => {
                    warn!(trace = ?trace.id(), error = %err, "trace skipped");
                    report.rejected.push((trace.id(), err));
                }
            }
        }
        report.dispatched = jobs.iter().map(|(id, _)| *id).collect();
        self.dispatcher.compute_all(jobs);
        report
    }

    pub fn cancel(&mut self, id: TraceId) -> bool {
        self.dispatcher.cancel(id)
    }

    pub fn is_idle(&self) -> bool {
        self.dispatcher.in_flight() == 0
    }

    /// Apply every completion that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<CompletionReport> {
        let mut reports = Vec::new();
        while let Some(completion) = self.dispatcher.try_next() {
            reports.extend(self.complete(completion));
        }
        self.finish_completions(&reports);
        reports
    }

    /// Block until every dispatched computation has been applied, or fail
    /// with [`AppError::Timeout`].
    pub fn wait_idle(&mut self, timeout: Duration) -> AppResult<Vec<CompletionReport>> {
        let deadline = Instant::now() + timeout;
        let mut reports = Vec::new();
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.dispatcher.wait_next(remaining) {
                Some(completion) => reports.extend(self.complete(completion)),
                None => break,
            }
        }
        self.finish_completions(&reports);
        if !self.is_idle() {
            return Err(AppError::Timeout {
                pending: self.dispatcher.in_flight(),
            });
        }
        Ok(reports)
    }

    fn complete(&mut self, completion: Completion) -> Option<CompletionReport> {
        let Completion { trace: id, result, .. } = completion;
        let Some(trace) = self.traces.get_mut(id) else {
            debug!(?id, "completion for a deleted trace dropped");
            return None;
        };
        let status = match result {
            Ok(outcome) => {
                let iterations = outcome.iterations;
                info!(
                    ?id,
                    iterations,
                    compute_time = outcome.compute_time,
                    "trace computed"
                );
                trace.apply_outcome(outcome, Utc::now());
                self.bus.publish(Change::trace(id, TraceField::Results));
                CompletionStatus::Completed { iterations }
            }
            Err(SimError::Cancelled) => return None,
            Err(err) => {
                warn!(?id, error = %err, "trace computation failed");
                CompletionStatus::Failed {
                    message: err.to_string(),
                }
            }
        };
        Some(CompletionReport {
            trace: id,
            name: trace.name().to_string(),
            status,
        })
    }

    fn finish_completions(&mut self, reports: &[CompletionReport]) {
        if reports.is_empty() {
            return;
        }
        self.process_changes();
        let shown = reports.iter().any(|r| {
            matches!(r.status, CompletionStatus::Completed { .. })
                && self
                    .graphs
                    .iter()
                    .any(|g| g.is_visible() && g.references(r.trace))
        });
        if shown {
            self.recompose();
        }
    }

    // Rendering

    /// Draw the current chart on `surface`.
    pub fn render(&self, surface: &mut dyn ChartSurface) -> StyleReport {
        draw(&self.chart, surface)
    }

    // Internals

    fn rebind_trace(&mut self) {
        let selected = self.traces.selected_entity();
        self.binder.bind_trace(&mut self.bus, selected);
    }

    fn rebind_graph(&mut self) {
        let selected = self.graphs.selected_entity();
        self.binder.bind_graph(&mut self.bus, selected);
    }

    fn unlink_graphs_from(&mut self, trace: TraceId) -> Vec<GraphId> {
        let mut unlinked = Vec::new();
        for graph in self.graphs.iter_mut().filter(|g| g.references(trace)) {
            graph.unlink_trace();
            unlinked.push(graph.id());
        }
        for id in &unlinked {
            self.bus.publish(Change::graph(*id, GraphField::Trace));
        }
        unlinked
    }

    /// Route pending changes to the bound fields, refresh list labels on
    /// renames and recompose on graph edits.
    fn process_changes(&mut self) {
        let deliveries = self.bus.drain();
        let mut recompose = false;
        for delivery in &deliveries {
            match (delivery.change.entity, delivery.change.field) {
                (EntityRef::Trace(id), ChangeField::Trace(TraceField::Name)) => {
                    self.refresh_trace_label(id);
                }
                (EntityRef::Graph(id), ChangeField::Graph(field)) => {
                    if field == GraphField::Name {
                        self.refresh_graph_label(id);
                    }
                    recompose = true;
                }
                _ => {}
            }
        }
        self.binder.apply(&deliveries, &self.traces, &self.graphs);
        if recompose {
            self.recompose();
        }
    }

    fn refresh_trace_label(&mut self, id: TraceId) {
        if let Some(trace) = self.traces.get(id) {
            self.trace_list.refresh(id, trace.name());
            self.trace_picker.refresh(id, trace.name());
        }
    }

    fn refresh_graph_label(&mut self, id: GraphId) {
        if let Some(graph) = self.graphs.get(id) {
            self.graph_list.refresh(id, graph.name());
        }
    }

    fn rebuild_trace_lists(&mut self) {
        let entries: Vec<(TraceId, String)> = self
            .traces
            .iter()
            .map(|t| (t.id(), t.name().to_string()))
            .collect();
        self.trace_picker.rebuild(entries.iter().cloned());
        self.trace_list.rebuild(entries);
    }

    fn rebuild_graph_list(&mut self) {
        self.graph_list
            .rebuild(self.graphs.iter().map(|g| (g.id(), g.name().to_string())));
    }

    fn recompose(&mut self) {
        self.chart = self.composer.compose(&self.graphs, &self.traces);
    }
}
