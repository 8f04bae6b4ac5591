//! Workbench behavior driven through user intents.

use std::sync::Arc;
use std::time::Duration;

use kt_app::{AppError, CompletionStatus, RecordingSurface, Workbench, WorkbenchConfig};
use kt_model::{Channel, EntityKind, GraphField, MoveOutcome, TraceField};
use kt_sim::{MemoryTracks, NoTracks, Sample};

const WAIT: Duration = Duration::from_secs(30);

fn workbench() -> Workbench {
    Workbench::new(WorkbenchConfig::default(), Arc::new(NoTracks)).expect("workbench starts")
}

fn configure_t1(wb: &mut Workbench) {
    wb.edit_trace(TraceField::Name, "T1").unwrap();
    wb.edit_trace(TraceField::Mass, "1").unwrap();
    wb.edit_trace(TraceField::MinX, "0").unwrap();
    wb.edit_trace(TraceField::MaxX, "10").unwrap();
    wb.edit_trace(TraceField::Step, "0,1").unwrap();
    wb.edit_trace(TraceField::InitV, "0").unwrap();
}

#[test]
fn session_is_seeded() {
    let wb = workbench();
    assert_eq!(wb.traces().len(), 1);
    assert_eq!(wb.graphs().len(), 1);
    let t = wb.traces().selected().unwrap();
    let g = wb.graphs().selected().unwrap();
    assert_eq!(wb.graph(g).unwrap().trace(), Some(t));
    assert_eq!(wb.binder().bound_trace(), Some(t));
    assert_eq!(wb.binder().bound_graph(), Some(g));
    assert_eq!(wb.trace_list().labels(), vec!["Trace 1"]);
    assert_eq!(wb.chart().series.len(), 1);
    assert_eq!(wb.chart().settings.title, "My Chart");
}

#[test]
fn reference_trace_computes_one_hundred_steps() {
    let mut wb = workbench();
    configure_t1(&mut wb);
    let t1 = wb.compute().unwrap();
    let reports = wb.wait_idle(WAIT).unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, CompletionStatus::Completed { iterations: 100 });
    let trace = wb.trace(t1).unwrap();
    assert_eq!(trace.diagnostics().unwrap().iterations, 100);
    let time = trace.channels().get(Channel::Time);
    let position = trace.channels().get(Channel::Position);
    assert!(!time.is_empty());
    assert_eq!(time.len(), position.len());
    assert_eq!(time.len(), 101);

    // Diagnostics reach the bound fields.
    assert_eq!(wb.binder().trace_form().diagnostics.iterations, "100");
}

#[test]
fn graph_clip_keeps_points_inside() {
    let mut wb = workbench();
    configure_t1(&mut wb);
    wb.edit_graph(GraphField::MinX, "2").unwrap();
    wb.edit_graph(GraphField::MaxX, "8").unwrap();
    wb.compute().unwrap();
    wb.wait_idle(WAIT).unwrap();

    let g1 = wb.graphs().selected().unwrap();
    let series = wb.chart().series_for_graph(g1).unwrap();
    assert!(!series.points.is_empty());
    assert!(series.points.iter().all(|[t, _]| (2.0..=8.0).contains(t)));
}

#[test]
fn deleting_a_referenced_trace_unlinks_graphs() {
    let mut wb = workbench();
    configure_t1(&mut wb);
    wb.compute().unwrap();
    wb.wait_idle(WAIT).unwrap();
    let t1 = wb.traces().selected().unwrap();
    let g1 = wb.graphs().selected().unwrap();

    let err = wb.remove_trace(t1).unwrap_err();
    assert!(matches!(err, AppError::TraceInUse { trace, .. } if trace == t1));

    wb.delete_trace(t1).unwrap();
    assert!(wb.traces().is_empty());
    assert_eq!(wb.graph(g1).unwrap().trace(), None);
    assert!(wb.chart().series_for_graph(g1).unwrap().points.is_empty());
    assert_eq!(wb.binder().bound_trace(), None);
    assert_eq!(wb.binder().graph_form().trace, None);
    assert_eq!(wb.bus().live_count(EntityKind::Trace), 0);
}

#[test]
fn removing_a_graph_frees_its_trace() {
    let mut wb = workbench();
    let t1 = wb.traces().selected().unwrap();
    let g1 = wb.graphs().selected().unwrap();
    wb.delete_graph(g1).unwrap();
    assert!(wb.graphs().is_empty());
    assert!(wb.chart().series.is_empty());
    assert!(wb.remove_trace(t1).is_ok());
}

#[test]
fn moves_keep_selection_and_series_order() {
    let mut wb = workbench();
    let g1 = wb.graphs().selected().unwrap();
    let g2 = wb.new_graph();
    let g3 = wb.new_graph();
    assert_eq!(wb.chart().graph_order(), vec![g1, g2, g3]);

    assert_eq!(wb.move_graph_down(g3).unwrap(), MoveOutcome::AtBoundary);
    assert_eq!(wb.move_graph_up(g1).unwrap(), MoveOutcome::AtBoundary);

    assert_eq!(wb.move_graph_up(g3).unwrap(), MoveOutcome::Moved { to: 1 });
    assert_eq!(wb.graphs().selected(), Some(g3));
    assert_eq!(wb.chart().graph_order(), vec![g1, g3, g2]);
    assert_eq!(wb.graph_list().ids(), vec![g1, g3, g2]);

    let t1 = wb.traces().selected().unwrap();
    let t2 = wb.new_trace();
    assert_eq!(wb.move_trace_up(t2).unwrap(), MoveOutcome::Moved { to: 0 });
    assert_eq!(wb.traces().selected(), Some(t2));
    assert_eq!(wb.trace_picker().ids(), vec![t2, t1]);
}

#[test]
fn deleting_the_selected_entity_reselects_by_position() {
    let mut wb = workbench();
    let g1 = wb.graphs().selected().unwrap();
    let g2 = wb.new_graph();
    let g3 = wb.new_graph();

    wb.select_graph(Some(g2)).unwrap();
    wb.delete_graph(g2).unwrap();
    assert_eq!(wb.graphs().selected(), Some(g3));
    wb.delete_graph(g3).unwrap();
    assert_eq!(wb.graphs().selected(), Some(g1));
    wb.delete_graph(g1).unwrap();
    assert_eq!(wb.graphs().selected(), None);
    assert_eq!(wb.binder().graph_form().detail, 50.0);
}

#[test]
fn rename_refreshes_only_labels() {
    let mut wb = workbench();
    let t1 = wb.traces().selected().unwrap();
    let before = wb.compositions();
    wb.edit_trace(TraceField::Name, "Ramp run").unwrap();

    assert_eq!(wb.trace_list().label(t1), Some("Ramp run"));
    assert_eq!(wb.trace_picker().label(t1), Some("Ramp run"));
    assert_eq!(wb.binder().trace_form().name, "Ramp run");
    assert_eq!(wb.compositions(), before);

    wb.edit_graph(GraphField::Name, "Position").unwrap();
    assert_eq!(wb.graph_list().labels(), vec!["Position"]);
    assert_eq!(wb.chart().series[0].name, "Position");
}

#[test]
fn batch_reports_bad_configs_and_runs_the_rest() {
    let mut wb = workbench();
    configure_t1(&mut wb);
    let good = wb.traces().selected().unwrap();
    let bad = wb.new_trace();
    wb.edit_trace(TraceField::Mass, "1").unwrap();
    wb.edit_trace(TraceField::MinX, "5").unwrap();
    wb.edit_trace(TraceField::MaxX, "1").unwrap();
    wb.edit_trace(TraceField::Step, "0.1").unwrap();
    wb.edit_trace(TraceField::InitV, "0").unwrap();

    let batch = wb.compute_all();
    assert_eq!(batch.dispatched, vec![good]);
    assert_eq!(batch.rejected.len(), 1);
    assert_eq!(batch.rejected[0].0, bad);

    let err = wb.compute().unwrap_err();
    assert!(matches!(err, AppError::Config { .. }));

    wb.wait_idle(WAIT).unwrap();
    assert!(wb.trace(good).unwrap().has_results());
    assert!(!wb.trace(bad).unwrap().has_results());
}

#[test]
fn cancelled_computation_keeps_previous_results() {
    let mut wb = workbench();
    configure_t1(&mut wb);
    let t1 = wb.compute().unwrap();
    wb.wait_idle(WAIT).unwrap();
    let before = wb.trace(t1).unwrap().channels().clone();

    wb.edit_trace(TraceField::Step, "0,00002").unwrap();
    wb.compute().unwrap();
    assert!(wb.cancel(t1));
    let reports = wb.wait_idle(WAIT).unwrap();
    assert!(reports.is_empty());
    assert_eq!(wb.trace(t1).unwrap().channels(), &before);
}

#[test]
fn open_file_uses_the_track() {
    let mut tracks = MemoryTracks::new();
    tracks.insert("ramp.txt", vec![Sample::new(0.0, 4.0), Sample::new(4.0, 0.0)]);
    let mut wb = Workbench::new(WorkbenchConfig::default(), Arc::new(tracks)).unwrap();
    configure_t1(&mut wb);
    wb.edit_trace(TraceField::MaxX, "0,5").unwrap();
    wb.open_file("ramp.txt").unwrap();
    assert_eq!(wb.catalog().labels(), vec!["ramp.txt"]);
    assert_eq!(wb.binder().trace_form().file.as_ref().unwrap().name(), "ramp.txt");

    let t1 = wb.compute().unwrap();
    wb.wait_idle(WAIT).unwrap();
    let diagnostics = wb.trace(t1).unwrap().diagnostics().unwrap();
    assert_eq!(diagnostics.interpolation_label, "Linear");
    assert!(diagnostics.energy_difference.abs() < 1e-6);
}

#[test]
fn rendering_styles_every_visible_series() {
    let mut wb = workbench();
    wb.new_graph();
    wb.edit_graph(GraphField::Visible, "false").unwrap();

    let mut surface = RecordingSurface::new();
    let report = wb.render(&mut surface);
    assert_eq!(report.styled, 2);
    assert!(report.unmatched.is_empty());
    assert!(surface.elements.iter().all(|e| e.style.is_some()));
}

#[test]
fn selecting_unknown_entities_fails_cleanly() {
    let mut wb = workbench();
    let t1 = wb.traces().selected().unwrap();
    wb.delete_graph(wb.graphs().selected().unwrap()).unwrap();
    wb.delete_trace(t1).unwrap();

    assert!(matches!(wb.select_trace(Some(t1)), Err(AppError::TraceNotFound(_))));
    assert!(matches!(
        wb.edit_trace(TraceField::Mass, "1"),
        Err(AppError::NoSelection("trace"))
    ));
    assert!(matches!(wb.compute(), Err(AppError::NoSelection(_))));
}
