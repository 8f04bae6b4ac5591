//! Graph entity: a clipped, styled 2D view of two channels of one trace.

use serde::{Deserialize, Serialize};
use std::fmt;

use kt_core::{GraphId, TraceId};

use crate::channel::Channel;
use crate::color::Color;
use crate::scheme::Style;
use crate::store::Entity;
use crate::trace::Trace;

pub const MIN_DETAIL: f64 = 1.0;
pub const MAX_DETAIL: f64 = 100.0;
pub const MIN_WIDTH: f64 = 0.1;
pub const MAX_WIDTH: f64 = 10.0;

/// Editable fields of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphField {
    Name,
    Trace,
    XChannel,
    YChannel,
    MinX,
    MaxX,
    Color,
    Style,
    Detail,
    Width,
    Visible,
}

impl fmt::Display for GraphField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::Trace => "trace",
            Self::XChannel => "x channel",
            Self::YChannel => "y channel",
            Self::MinX => "clip start",
            Self::MaxX => "clip end",
            Self::Color => "color",
            Self::Style => "style",
            Self::Detail => "detail",
            Self::Width => "width",
            Self::Visible => "visible",
        })
    }
}

/// Attributes given to newly created graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphDefaults {
    pub x_channel: Channel,
    pub y_channel: Channel,
    pub style: Style,
    /// Percentage of clipped samples kept for display.
    pub detail: f64,
    pub width: f64,
    pub visible: bool,
}

impl Default for GraphDefaults {
    fn default() -> Self {
        Self {
            x_channel: Channel::Time,
            y_channel: Channel::Position,
            style: Style::Line,
            detail: MAX_DETAIL,
            width: 2.0,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    id: GraphId,
    name: String,
    trace: Option<TraceId>,
    x_channel: Option<Channel>,
    y_channel: Option<Channel>,
    min_x: Option<f64>,
    max_x: Option<f64>,
    color: Color,
    style: Style,
    detail: f64,
    width: f64,
    visible: bool,
}

impl Entity for Graph {
    type Id = GraphId;

    fn id(&self) -> GraphId {
        self.id
    }
}

impl Graph {
    /// New graph referencing `trace`. The color is picked from the palette by
    /// handle so that graphs keep distinct colors across deletions.
    pub fn new(
        id: GraphId,
        name: impl Into<String>,
        trace: Option<TraceId>,
        defaults: &GraphDefaults,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            trace,
            x_channel: Some(defaults.x_channel),
            y_channel: Some(defaults.y_channel),
            min_x: None,
            max_x: None,
            color: Color::palette(id.index() as usize),
            style: defaults.style,
            detail: clamp_detail(defaults.detail).unwrap_or(MAX_DETAIL),
            width: clamp_width(defaults.width).unwrap_or(1.0),
            visible: defaults.visible,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trace(&self) -> Option<TraceId> {
        self.trace
    }

    pub fn x_channel(&self) -> Option<Channel> {
        self.x_channel
    }

    pub fn y_channel(&self) -> Option<Channel> {
        self.y_channel
    }

    pub fn min_x(&self) -> Option<f64> {
        self.min_x
    }

    pub fn max_x(&self) -> Option<f64> {
        self.max_x
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn detail(&self) -> f64 {
        self.detail
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn references(&self, trace: TraceId) -> bool {
        self.trace == Some(trace)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        replace(&mut self.name, name)
    }

    pub fn set_trace(&mut self, trace: Option<TraceId>) -> bool {
        replace(&mut self.trace, trace)
    }

    /// Drop the trace reference. Returns the trace that was referenced.
    pub fn unlink_trace(&mut self) -> Option<TraceId> {
        self.trace.take()
    }

    pub fn set_x_channel(&mut self, channel: Option<Channel>) -> bool {
        replace(&mut self.x_channel, channel)
    }

    pub fn set_y_channel(&mut self, channel: Option<Channel>) -> bool {
        replace(&mut self.y_channel, channel)
    }

    pub fn set_min_x(&mut self, value: Option<f64>) -> bool {
        replace(&mut self.min_x, value)
    }

    pub fn set_max_x(&mut self, value: Option<f64>) -> bool {
        replace(&mut self.max_x, value)
    }

    pub fn set_color(&mut self, color: Color) -> bool {
        replace(&mut self.color, color)
    }

    pub fn set_style(&mut self, style: Style) -> bool {
        replace(&mut self.style, style)
    }

    /// Clamped to `[MIN_DETAIL, MAX_DETAIL]`; NaN is ignored.
    pub fn set_detail(&mut self, detail: f64) -> bool {
        match clamp_detail(detail) {
            Some(d) => replace(&mut self.detail, d),
            None => false,
        }
    }

    /// Clamped to `[MIN_WIDTH, MAX_WIDTH]`; NaN is ignored.
    pub fn set_width(&mut self, width: f64) -> bool {
        match clamp_width(width) {
            Some(w) => replace(&mut self.width, w),
            None => false,
        }
    }

    pub fn set_visible(&mut self, visible: bool) -> bool {
        replace(&mut self.visible, visible)
    }

    fn in_clip(&self, x: f64) -> bool {
        x.is_finite()
            && self.min_x.is_none_or(|min| x >= min)
            && self.max_x.is_none_or(|max| x <= max)
    }

    /// Display points for this graph, read from `trace`.
    ///
    /// Empty when there is no trace, no channel selection, or no computed data.
    /// Points outside the clip are dropped, then the remainder is thinned to
    /// the detail percentage (first and last kept).
    pub fn display_points(&self, trace: Option<&Trace>) -> Vec<[f64; 2]> {
        let Some(trace) = trace.filter(|t| self.references(t.id())) else {
            return Vec::new();
        };
        let (Some(xc), Some(yc)) = (self.x_channel, self.y_channel) else {
            return Vec::new();
        };

        let channels = trace.channels();
        let clipped: Vec<[f64; 2]> = channels
            .get(xc)
            .iter()
            .zip(channels.get(yc))
            .filter(|(x, _)| self.in_clip(**x))
            .map(|(x, y)| [*x, *y])
            .collect();

        decimate(clipped, self.detail)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn clamp_detail(detail: f64) -> Option<f64> {
    (!detail.is_nan()).then(|| detail.clamp(MIN_DETAIL, MAX_DETAIL))
}

fn clamp_width(width: f64) -> Option<f64> {
    (!width.is_nan()).then(|| width.clamp(MIN_WIDTH, MAX_WIDTH))
}

fn decimate(points: Vec<[f64; 2]>, detail: f64) -> Vec<[f64; 2]> {
    let len = points.len();
    let keep = ((len as f64 * detail / MAX_DETAIL).ceil() as usize).max(2);
    if keep >= len {
        return points;
    }
    (0..keep)
        .map(|i| points[i * (len - 1) / (keep - 1)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channels;
    use crate::trace::TraceOutcome;

    fn computed_trace(id: TraceId, n: usize) -> Trace {
        let mut trace = Trace::new(id, "T");
        let time: Vec<f64> = (0..=n).map(|i| i as f64 * 0.1).collect();
        let position: Vec<f64> = time.iter().map(|t| t * 2.0).collect();
        let channels: Channels = [(Channel::Time, time), (Channel::Position, position)]
            .into_iter()
            .collect();
        trace.apply_outcome(
            TraceOutcome {
                interpolation_label: "Flat".into(),
                integration_label: "Euler".into(),
                step_size: 0.1,
                iterations: n,
                total_time: n as f64 * 0.1,
                compute_time: 0.0,
                energy_difference: 0.0,
                channels,
            },
            chrono::Utc::now(),
        );
        trace
    }

    fn graph_on(trace: TraceId) -> Graph {
        Graph::new(GraphId::from_index(0), "G", Some(trace), &GraphDefaults::default())
    }

    #[test]
    fn no_trace_or_no_data_renders_empty() {
        let t = TraceId::from_index(0);
        let graph = graph_on(t);
        assert!(graph.display_points(None).is_empty());
        assert!(graph.display_points(Some(&Trace::new(t, "T"))).is_empty());
    }

    #[test]
    fn foreign_trace_is_not_read() {
        let graph = graph_on(TraceId::from_index(0));
        let other = computed_trace(TraceId::from_index(1), 10);
        assert!(graph.display_points(Some(&other)).is_empty());
    }

    #[test]
    fn clip_is_inclusive() {
        let t = TraceId::from_index(0);
        let trace = computed_trace(t, 100);
        let mut graph = graph_on(t);
        graph.set_min_x(Some(2.0));
        graph.set_max_x(Some(8.0));

        let points = graph.display_points(Some(&trace));
        assert!(!points.is_empty());
        assert!(points.iter().all(|[x, _]| (2.0..=8.0).contains(x)));
    }

    #[test]
    fn inverted_clip_is_empty_not_error() {
        let t = TraceId::from_index(0);
        let trace = computed_trace(t, 10);
        let mut graph = graph_on(t);
        graph.set_min_x(Some(0.8));
        graph.set_max_x(Some(0.2));
        assert!(graph.display_points(Some(&trace)).is_empty());
    }

    #[test]
    fn detail_thins_but_keeps_ends() {
        let t = TraceId::from_index(0);
        let trace = computed_trace(t, 100);
        let mut graph = graph_on(t);
        graph.set_detail(10.0);

        let points = graph.display_points(Some(&trace));
        assert_eq!(points.len(), 11);
        assert_eq!(points.first().unwrap()[0], 0.0);
        assert_eq!(points.last().unwrap()[0], trace.channels().get(Channel::Time)[100]);
    }

    #[test]
    fn detail_and_width_are_clamped() {
        let mut graph = graph_on(TraceId::from_index(0));
        assert!(graph.set_detail(-3.0));
        assert_eq!(graph.detail(), MIN_DETAIL);
        assert!(graph.set_detail(500.0));
        assert_eq!(graph.detail(), MAX_DETAIL);
        assert!(!graph.set_detail(f64::NAN));
        assert!(!graph.set_width(f64::NAN));
        assert!(graph.set_width(99.0));
        assert_eq!(graph.width(), MAX_WIDTH);
        assert!(graph.set_width(0.0));
        assert_eq!(graph.width(), MIN_WIDTH);
        assert!(!graph.set_width(-5.0));
    }

    #[test]
    fn unlink_returns_previous_trace() {
        let t = TraceId::from_index(3);
        let mut graph = graph_on(t);
        assert_eq!(graph.unlink_trace(), Some(t));
        assert_eq!(graph.trace(), None);
        assert_eq!(graph.unlink_trace(), None);
    }
}
