//! Reference trajectory engine for kinetrace traces.
//!
//! Provides:
//! - Track profiles from imported samples (linear, natural cubic spline)
//! - Rolling-body model with inertia factor
//! - Fixed-step Euler, Heun and RK4 integrators
//! - `integrate`: resolved trace configuration in, channels and diagnostics out

pub mod body;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod model;
pub mod profile;
pub mod track;

pub use body::{BodyState, RollingBody};
pub use engine::{CancelToken, GRAVITY, integrate, integrate_with_cancel};
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Heun, Integrator, RK4};
pub use model::TransientModel;
pub use profile::Profile;
pub use track::{MemoryTracks, NoTracks, Sample, TrackLoader};
