//! Session scripts replayed end to end.

use std::sync::Arc;

use kt_app::{CompletionStatus, Script, Workbench, WorkbenchConfig};
use kt_model::{Channel, Entity};

const SCRIPT: &str = r#"
tracks:
  - path: hill.txt
    samples: [[0.0, 2.0], [1.0, 1.5], [2.0, 0.5], [3.0, 0.0], [4.0, 0.2]]
actions:
  - edit_trace: { field: name, value: Hill }
  - open_file: imports/hill.txt
  - edit_trace: { field: interpolation, value: cubic_spline }
  - edit_trace: { field: mass, value: "2,5" }
  - edit_trace: { field: min_x, value: "0" }
  - edit_trace: { field: max_x, value: "2" }
  - edit_trace: { field: init_v, value: "0" }
  - edit_trace: { field: step, value: "0.01" }
  - new_trace
  - edit_trace: { field: mass, value: "-1" }
  - compute_all
  - new_graph
  - pick_trace: 0
  - edit_graph: { field: y_channel, value: energy }
  - wait
"#;

#[test]
fn script_runs_and_reports_failures() {
    let script = Script::from_yaml(SCRIPT).unwrap();
    let tracks = Arc::new(script.track_loader());
    let mut wb = Workbench::new(WorkbenchConfig::default(), tracks).unwrap();
    let report = script.run(&mut wb).unwrap();

    assert_eq!(report.executed, 15);
    // The second trace has no domain and a negative mass.
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].step, 10);

    assert_eq!(report.completions.len(), 1);
    assert_eq!(report.completions[0].name, "Hill");
    assert_eq!(report.completions[0].status, CompletionStatus::Completed { iterations: 200 });

    let hill = wb.traces().at(0).unwrap();
    assert_eq!(hill.diagnostics().unwrap().interpolation_label, "Cubic spline");
    assert_eq!(hill.channels().get(Channel::Position)[0], 0.0);

    let energy_graph = wb.chart().series.last().unwrap();
    assert_eq!(energy_graph.trace, Some(hill.id()));
    assert_eq!(energy_graph.points.len(), 201);
}

#[test]
fn compute_all_reports_every_rejected_trace() {
    let script = Script::from_yaml(
        r#"
actions:
  - new_trace
  - edit_trace: { field: name, value: Second }
  - compute_all
"#,
    )
    .unwrap();
    let tracks = Arc::new(script.track_loader());
    let mut wb = Workbench::new(WorkbenchConfig::default(), tracks).unwrap();
    let report = script.run(&mut wb).unwrap();

    assert_eq!(wb.traces().len(), 2);
    assert_eq!(report.errors.len(), 2);
    assert!(report.errors.iter().all(|e| e.step == 2));
    assert!(report.errors[0].message.contains("Trace 1"));
    assert!(report.errors[1].message.contains("Second"));
    assert!(report.completions.is_empty());
}
