//! kt-core: stable foundation for kinetrace.
//!
//! Contains:
//! - ids (stable compact handles for traces, graphs and subscriptions)
//! - numeric (Real + decimal text conversion)
//! - timing (wall-clock stopwatch and shared accumulators)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod timing;

pub use error::{KtError, KtResult};
pub use ids::*;
pub use numeric::*;
pub use timing::{AccumulatingTimer, Stopwatch};
