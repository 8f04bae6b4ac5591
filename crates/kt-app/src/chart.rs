//! Chart composition from the ordered graph collection.
//!
//! The composed [`Chart`] is rebuilt wholesale on every change. Each series is
//! stamped with a fresh [`SeriesKey`]; rendering surfaces hand the key back on
//! every element they draw, and style overrides are looked up by it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use kt_core::{GraphId, TraceId};
use kt_model::{Color, Entity, EntityStore, Graph, Style, Trace};

/// Chart title, axis labels and optional fixed axis ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Option<[f64; 2]>,
    pub y_range: Option<[f64; 2]>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            title: "My Chart".to_string(),
            x_label: "xAxis".to_string(),
            y_label: "yAxis".to_string(),
            x_range: None,
            y_range: None,
        }
    }
}

/// Identifier stamped on a series when it is composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SeriesKey(Uuid);

impl SeriesKey {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SeriesKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series-{}", self.0)
    }
}

/// One graph, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySeries {
    pub key: SeriesKey,
    pub graph: GraphId,
    pub trace: Option<TraceId>,
    pub name: String,
    pub color: Color,
    pub style: Style,
    pub width: f64,
    pub visible: bool,
    pub points: Vec<[f64; 2]>,
}

/// The composed chart: settings plus one series per graph, in graph order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Chart {
    pub settings: ChartSettings,
    pub series: Vec<DisplaySeries>,
}

impl Chart {
    pub fn series_for_graph(&self, graph: GraphId) -> Option<&DisplaySeries> {
        self.series.iter().find(|s| s.graph == graph)
    }

    pub fn graph_order(&self) -> Vec<GraphId> {
        self.series.iter().map(|s| s.graph).collect()
    }

    pub fn visible(&self) -> impl Iterator<Item = &DisplaySeries> {
        self.series.iter().filter(|s| s.visible)
    }

    /// Style overrides by series key.
    pub fn style_index(&self) -> HashMap<SeriesKey, ElementStyle> {
        self.series
            .iter()
            .map(|s| (s.key, ElementStyle::of(s)))
            .collect()
    }
}

#[derive(Debug)]
pub struct ChartComposer {
    settings: ChartSettings,
    compositions: u64,
}

impl ChartComposer {
    pub fn new(settings: ChartSettings) -> Self {
        Self {
            settings,
            compositions: 0,
        }
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ChartSettings) {
        self.settings = settings;
    }

    /// Number of charts composed so far.
    pub fn compositions(&self) -> u64 {
        self.compositions
    }

    /// Build the chart from the current graph order. A graph whose trace is
    /// gone or not yet computed yields an empty series.
    pub fn compose(&mut self, graphs: &EntityStore<Graph>, traces: &EntityStore<Trace>) -> Chart {
        self.compositions += 1;
        let series: Vec<DisplaySeries> = graphs
            .iter()
            .map(|graph| DisplaySeries {
                key: SeriesKey::new(),
                graph: graph.id(),
                trace: graph.trace(),
                name: graph.name().to_string(),
                color: graph.color(),
                style: graph.style(),
                width: graph.width(),
                visible: graph.is_visible(),
                points: graph.display_points(graph.trace().and_then(|t| traces.get(t))),
            })
            .collect();
        debug!(series = series.len(), "chart composed");
        Chart {
            settings: self.settings.clone(),
            series,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    Series,
    Legend,
}

/// Style override attached to a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementStyle {
    pub color: Color,
    pub width: f64,
    pub style: Style,
}

impl ElementStyle {
    fn of(series: &DisplaySeries) -> Self {
        Self {
            color: series.color,
            width: series.width,
            style: series.style,
        }
    }
}

/// A visual element produced by a surface, tagged with the key of the
/// series it was drawn for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedElement {
    pub key: SeriesKey,
    pub kind: ElementKind,
    pub style: Option<ElementStyle>,
}

impl RenderedElement {
    pub fn new(key: SeriesKey, kind: ElementKind) -> Self {
        Self {
            key,
            kind,
            style: None,
        }
    }
}

/// Something a chart is drawn on.
pub trait ChartSurface {
    /// Draw `chart`, returning the elements drawn.
    fn render(&mut self, chart: &Chart) -> Vec<RenderedElement>;

    /// Receive the elements back with their style overrides attached.
    fn restyle(&mut self, elements: &[RenderedElement]);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleReport {
    pub styled: usize,
    pub unmatched: Vec<SeriesKey>,
}

/// Attach each element's series style, found by key. Elements whose key maps
/// to no series keep no override and are reported.
pub fn apply_styles(chart: &Chart, elements: &mut [RenderedElement]) -> StyleReport {
    let index = chart.style_index();
    let mut report = StyleReport::default();
    for element in elements.iter_mut() {
        match index.get(&element.key) {
            Some(style) => {
                element.style = Some(*style);
                report.styled += 1;
            }
            None => {
                element.style = None;
                warn!(
                    key = %element.key,
                    kind = ?element.kind,
                    "rendered element matches no series"
                );
                report.unmatched.push(element.key);
            }
        }
    }
    report
}

/// Render `chart` on `surface` and hand the styled elements back.
pub fn draw(chart: &Chart, surface: &mut dyn ChartSurface) -> StyleReport {
    let mut elements = surface.render(chart);
    let report = apply_styles(chart, &mut elements);
    surface.restyle(&elements);
    report
}

/// Surface that draws nothing and keeps what it was given. One series
/// element and one legend entry per visible series.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub renders: usize,
    pub last_chart: Option<Chart>,
    pub elements: Vec<RenderedElement>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChartSurface for RecordingSurface {
    fn render(&mut self, chart: &Chart) -> Vec<RenderedElement> {
        self.renders += 1;
        self.last_chart = Some(chart.clone());
        chart
            .visible()
            .flat_map(|s| {
                [
                    RenderedElement::new(s.key, ElementKind::Series),
                    RenderedElement::new(s.key, ElementKind::Legend),
                ]
            })
            .collect()
    }

    fn restyle(&mut self, elements: &[RenderedElement]) {
        self.elements = elements.to_vec();
    }
}
