//! Field state shown for the bound trace and graph, and text edits applied
//! back to the entities.

use serde::Serialize;

use kt_core::{TraceId, format_decimal, parse_decimal};
use kt_model::{
    Channel, Choice, Color, Graph, GraphField, Inertia, Integration, Interpolation, SourceFile,
    Style, Trace, TraceDiagnostics, TraceField,
};

use crate::error::{AppError, AppResult};

/// Read-only diagnostic labels of the bound trace. Empty before computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticLabels {
    pub interpolation: String,
    pub integration: String,
    pub step_size: String,
    pub iterations: String,
    pub total_time: String,
    pub compute_time: String,
    pub energy_difference: String,
    pub computed_at: String,
}

impl DiagnosticLabels {
    pub fn from_diagnostics(diagnostics: Option<&TraceDiagnostics>) -> Self {
        let Some(d) = diagnostics else {
            return Self::default();
        };
        Self {
            interpolation: d.interpolation_label.clone(),
            integration: d.integration_label.clone(),
            step_size: format_decimal(Some(d.step_size)),
            iterations: d.iterations.to_string(),
            total_time: format!("{} s", d.total_time),
            compute_time: format!("{:.3} ms", d.compute_time * 1e3),
            energy_difference: format!("{:.6e} J", d.energy_difference),
            computed_at: d.computed_at.format("%H:%M:%S").to_string(),
        }
    }
}

/// Editable trace fields as displayed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceForm {
    pub name: String,
    pub file: Option<SourceFile>,
    pub integration: Option<Integration>,
    pub interpolation: Option<Interpolation>,
    pub inertia: Option<Inertia>,
    pub mass: String,
    pub min_x: String,
    pub max_x: String,
    pub init_v: String,
    pub step: String,
    pub diagnostics: DiagnosticLabels,
}

impl TraceForm {
    /// Fields with nothing bound.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn from_trace(trace: &Trace) -> Self {
        let mut form = Self::cleared();
        for field in TraceField::EDITABLE {
            form.refresh(field, trace);
        }
        form.refresh(TraceField::Results, trace);
        form
    }

    /// Re-read one field from the entity.
    pub fn refresh(&mut self, field: TraceField, trace: &Trace) {
        let config = trace.config();
        match field {
            TraceField::Name => config.name.clone_into(&mut self.name),
            TraceField::File => self.file = config.file.clone(),
            TraceField::Integration => self.integration = config.integration,
            TraceField::Interpolation => self.interpolation = config.interpolation,
            TraceField::Inertia => self.inertia = config.inertia,
            TraceField::Mass => self.mass = format_decimal(config.mass),
            TraceField::MinX => self.min_x = format_decimal(config.min_x),
            TraceField::MaxX => self.max_x = format_decimal(config.max_x),
            TraceField::InitV => self.init_v = format_decimal(config.init_v),
            TraceField::Step => self.step = format_decimal(config.step),
            TraceField::Results => {
                self.diagnostics = DiagnosticLabels::from_diagnostics(trace.diagnostics())
            }
        }
    }
}

/// Editable graph fields as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphForm {
    pub name: String,
    pub trace: Option<TraceId>,
    pub x_channel: Option<Channel>,
    pub y_channel: Option<Channel>,
    pub min_x: String,
    pub max_x: String,
    pub color: Color,
    pub style: Option<Style>,
    pub detail: f64,
    pub width: f64,
    pub visible: bool,
}

impl Default for GraphForm {
    fn default() -> Self {
        Self::cleared()
    }
}

impl GraphForm {
    /// Fields with nothing bound.
    pub fn cleared() -> Self {
        Self {
            name: String::new(),
            trace: None,
            x_channel: None,
            y_channel: None,
            min_x: String::new(),
            max_x: String::new(),
            color: Color::WHITE,
            style: None,
            detail: 50.0,
            width: 1.0,
            visible: false,
        }
    }

    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            name: graph.name().to_string(),
            trace: graph.trace(),
            x_channel: graph.x_channel(),
            y_channel: graph.y_channel(),
            min_x: format_decimal(graph.min_x()),
            max_x: format_decimal(graph.max_x()),
            color: graph.color(),
            style: Some(graph.style()),
            detail: graph.detail(),
            width: graph.width(),
            visible: graph.is_visible(),
        }
    }

    pub fn refresh(&mut self, field: GraphField, graph: &Graph) {
        match field {
            GraphField::Name => graph.name().clone_into(&mut self.name),
            GraphField::Trace => self.trace = graph.trace(),
            GraphField::XChannel => self.x_channel = graph.x_channel(),
            GraphField::YChannel => self.y_channel = graph.y_channel(),
            GraphField::MinX => self.min_x = format_decimal(graph.min_x()),
            GraphField::MaxX => self.max_x = format_decimal(graph.max_x()),
            GraphField::Color => self.color = graph.color(),
            GraphField::Style => self.style = Some(graph.style()),
            GraphField::Detail => self.detail = graph.detail(),
            GraphField::Width => self.width = graph.width(),
            GraphField::Visible => self.visible = graph.is_visible(),
        }
    }
}

fn optional_choice<C: Choice>(text: &str) -> AppResult<Option<C>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(C::parse_choice(text)?))
}

fn required_number(field: GraphField, text: &str) -> AppResult<f64> {
    parse_decimal(text)?.ok_or_else(|| AppError::InvalidInput(format!("{field} cannot be empty")))
}

/// Apply a text edit of one trace field. Returns true when the trace changed.
///
/// Empty text unsets optional values; choices accept their key or label.
pub fn apply_trace_text(trace: &mut Trace, field: TraceField, text: &str) -> AppResult<bool> {
    let changed = match field {
        TraceField::Name => trace.set_name(text.trim()),
        TraceField::File => {
            let file = (!text.trim().is_empty()).then(|| SourceFile::new(text.trim()));
            trace.set_file(file)
        }
        TraceField::Integration => trace.set_integration(optional_choice(text)?),
        TraceField::Interpolation => trace.set_interpolation(optional_choice(text)?),
        TraceField::Inertia => trace.set_inertia(optional_choice(text)?),
        TraceField::Mass => trace.set_mass(parse_decimal(text)?),
        TraceField::MinX => trace.set_min_x(parse_decimal(text)?),
        TraceField::MaxX => trace.set_max_x(parse_decimal(text)?),
        TraceField::InitV => trace.set_init_v(parse_decimal(text)?),
        TraceField::Step => trace.set_step(parse_decimal(text)?),
        TraceField::Results => {
            return Err(AppError::InvalidInput("results are read-only".to_string()));
        }
    };
    Ok(changed)
}

/// Apply a text edit of one graph field. Returns true when the graph changed.
///
/// The referenced trace is picked by handle, not typed.
pub fn apply_graph_text(graph: &mut Graph, field: GraphField, text: &str) -> AppResult<bool> {
    let changed = match field {
        GraphField::Name => graph.set_name(text.trim()),
        GraphField::Trace => {
            return Err(AppError::InvalidInput(
                "the graph trace is picked from the trace list".to_string(),
            ));
        }
        GraphField::XChannel => graph.set_x_channel(optional_choice(text)?),
        GraphField::YChannel => graph.set_y_channel(optional_choice(text)?),
        GraphField::MinX => graph.set_min_x(parse_decimal(text)?),
        GraphField::MaxX => graph.set_max_x(parse_decimal(text)?),
        GraphField::Color => graph.set_color(text.parse()?),
        GraphField::Style => graph.set_style(Style::parse_choice(text)?),
        GraphField::Detail => graph.set_detail(required_number(field, text)?),
        GraphField::Width => graph.set_width(required_number(field, text)?),
        GraphField::Visible => {
            let visible = match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                other => {
                    return Err(AppError::InvalidInput(format!(
                        "expected true or false, got {other:?}"
                    )));
                }
            };
            graph.set_visible(visible)
        }
    };
    Ok(changed)
}
