//! Rigid body rolling along a track profile.

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;
use crate::profile::Profile;

/// Position along the track axis and tangential speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub x: f64,
    pub v: f64,
}

/// One recorded sample of the body, in channel order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub time: f64,
    pub position: f64,
    pub height: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub force: f64,
    pub kinetic_energy: f64,
    pub potential_energy: f64,
}

impl Observation {
    pub fn energy(&self) -> f64 {
        self.kinetic_energy + self.potential_energy
    }
}

/// Body of mass `m` rolling without slipping; `inertia_factor` is `I / (m r^2)`.
#[derive(Debug, Clone)]
pub struct RollingBody {
    profile: Profile,
    mass: f64,
    inertia_factor: f64,
    gravity: f64,
}

impl RollingBody {
    pub fn new(profile: Profile, mass: f64, inertia_factor: f64, gravity: f64) -> Self {
        Self {
            profile,
            mass,
            inertia_factor,
            gravity,
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Tangential acceleration at position `x`.
    pub fn acceleration(&self, x: f64) -> f64 {
        let s = self.profile.slope(x);
        let n = (1.0 + s * s).sqrt();
        -self.gravity * (s / n) / (1.0 + self.inertia_factor)
    }

    pub fn observe(&self, t: f64, state: &BodyState) -> Observation {
        let acceleration = self.acceleration(state.x);
        let height = self.profile.height(state.x);
        Observation {
            time: t,
            position: state.x,
            height,
            velocity: state.v,
            acceleration,
            force: self.mass * acceleration,
            kinetic_energy: 0.5 * (1.0 + self.inertia_factor) * self.mass * state.v * state.v,
            potential_energy: self.mass * self.gravity * height,
        }
    }
}

impl TransientModel for RollingBody {
    type State = BodyState;

    fn rhs(&mut self, _t: f64, x: &BodyState) -> SimResult<BodyState> {
        if !x.x.is_finite() || !x.v.is_finite() {
            return Err(SimError::NonPhysical {
                what: "state left the finite range",
            });
        }
        let s = self.profile.slope(x.x);
        let n = (1.0 + s * s).sqrt();
        Ok(BodyState {
            x: x.v / n,
            v: -self.gravity * (s / n) / (1.0 + self.inertia_factor),
        })
    }

    fn add(&self, a: &BodyState, b: &BodyState) -> BodyState {
        BodyState {
            x: a.x + b.x,
            v: a.v + b.v,
        }
    }

    fn scale(&self, a: &BodyState, scale: f64) -> BodyState {
        BodyState {
            x: a.x * scale,
            v: a.v * scale,
        }
    }
}
