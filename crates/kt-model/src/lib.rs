//! kt-model: trace/graph entity layer for kinetrace.
//!
//! Provides:
//! - Closed channel set and scheme enums with human-readable labels
//! - Trace (configuration, diagnostics, result channels)
//! - Graph (channel selection, domain clip, display attributes)
//! - Ordered entity stores with a single selection cursor
//! - Change bus used to keep bound fields in sync with entities
//!
//! # Example
//!
//! ```
//! use kt_model::{Channel, EntityStore, Graph, GraphDefaults, Trace};
//!
//! let mut traces: EntityStore<Trace> = EntityStore::new();
//! let t1 = traces.insert(|id| Trace::new(id, "T1"));
//!
//! let mut graphs: EntityStore<Graph> = EntityStore::new();
//! let g1 = graphs.insert(|id| Graph::new(id, "G1", Some(t1), &GraphDefaults::default()));
//!
//! let graph = graphs.get(g1).unwrap();
//! assert_eq!(graph.x_channel(), Some(Channel::Time));
//! assert!(graph.display_points(traces.get(t1)).is_empty());
//! ```

pub mod channel;
pub mod color;
pub mod error;
pub mod event;
pub mod graph;
pub mod scheme;
pub mod store;
pub mod trace;

pub use channel::{Channel, Channels};
pub use color::Color;
pub use error::{ConfigError, ModelError, ModelResult};
pub use event::{Change, ChangeBus, ChangeField, Delivery, EntityKind, EntityRef};
pub use graph::{Graph, GraphDefaults, GraphField, MAX_DETAIL, MAX_WIDTH, MIN_DETAIL, MIN_WIDTH};
pub use scheme::{Choice, Inertia, Integration, Interpolation, Style};
pub use store::{Entity, EntityStore, MoveOutcome};
pub use trace::{
    MAX_STEPS, ResolvedConfig, SourceFile, Trace, TraceConfig, TraceDiagnostics, TraceField,
    TraceOutcome,
};

pub use kt_core::{GraphId, TraceId};
