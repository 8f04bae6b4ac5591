//! Closed strategy and style choices.
//!
//! Every choice is a closed set with a stable key (used in scripts and
//! configuration) and a human-readable label (used in pickers and diagnostics).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A closed enumerated choice with a label per member.
pub trait Choice: Copy + Eq + Sized + 'static {
    /// What the choice selects, used in error messages.
    const KIND: &'static str;
    /// All members, in picker order.
    const ALL: &'static [Self];

    fn key(self) -> &'static str;
    fn label(self) -> &'static str;

    /// Look up a member by key or label, ignoring ASCII case.
    fn parse_choice(text: &str) -> Result<Self, ModelError> {
        let text = text.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(text) || c.label().eq_ignore_ascii_case(text))
            .ok_or_else(|| ModelError::UnknownChoice {
                kind: Self::KIND,
                text: text.to_string(),
            })
    }
}

macro_rules! choice_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }

            impl FromStr for $ty {
                type Err = ModelError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    <$ty as Choice>::parse_choice(s)
                }
            }
        )*
    };
}

pub(crate) use choice_traits;

/// Time integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
    /// Explicit forward Euler (1st order, one derivative evaluation per step).
    Euler,
    /// Heun's method (explicit trapezoid, 2nd order).
    Heun,
    /// Classical 4th-order Runge-Kutta.
    #[default]
    Rk4,
}

impl Choice for Integration {
    const KIND: &'static str = "integration scheme";
    const ALL: &'static [Self] = &[Self::Euler, Self::Heun, Self::Rk4];

    fn key(self) -> &'static str {
        match self {
            Self::Euler => "euler",
            Self::Heun => "heun",
            Self::Rk4 => "rk4",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Euler => "Euler",
            Self::Heun => "Heun (RK2)",
            Self::Rk4 => "Runge-Kutta 4",
        }
    }
}

/// How the imported track samples are turned into a continuous profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Natural cubic spline (zero curvature at both ends).
    CubicSpline,
}

impl Choice for Interpolation {
    const KIND: &'static str = "interpolation scheme";
    const ALL: &'static [Self] = &[Self::Linear, Self::CubicSpline];

    fn key(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::CubicSpline => "cubic_spline",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::CubicSpline => "Cubic spline",
        }
    }
}

/// Shape of the rolling body, which fixes how much of its kinetic energy is
/// rotational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inertia {
    /// Sliding point mass, no rotation.
    #[default]
    PointMass,
    SolidSphere,
    HollowSphere,
    SolidCylinder,
    HollowCylinder,
}

impl Inertia {
    /// Moment of inertia as a fraction of `m r^2`.
    pub fn factor(self) -> f64 {
        match self {
            Self::PointMass => 0.0,
            Self::SolidSphere => 2.0 / 5.0,
            Self::HollowSphere => 2.0 / 3.0,
            Self::SolidCylinder => 1.0 / 2.0,
            Self::HollowCylinder => 1.0,
        }
    }
}

impl Choice for Inertia {
    const KIND: &'static str = "inertia model";
    const ALL: &'static [Self] = &[
        Self::PointMass,
        Self::SolidSphere,
        Self::HollowSphere,
        Self::SolidCylinder,
        Self::HollowCylinder,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::PointMass => "point_mass",
            Self::SolidSphere => "solid_sphere",
            Self::HollowSphere => "hollow_sphere",
            Self::SolidCylinder => "solid_cylinder",
            Self::HollowCylinder => "hollow_cylinder",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::PointMass => "Point mass",
            Self::SolidSphere => "Solid sphere",
            Self::HollowSphere => "Hollow sphere",
            Self::SolidCylinder => "Solid cylinder",
            Self::HollowCylinder => "Hollow cylinder",
        }
    }
}

/// How a graph's series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Line,
    Points,
    LinePoints,
}

impl Style {
    pub fn draws_line(self) -> bool {
        matches!(self, Self::Line | Self::LinePoints)
    }

    pub fn draws_points(self) -> bool {
        matches!(self, Self::Points | Self::LinePoints)
    }
}

impl Choice for Style {
    const KIND: &'static str = "style";
    const ALL: &'static [Self] = &[Self::Line, Self::Points, Self::LinePoints];

    fn key(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Points => "points",
            Self::LinePoints => "line_points",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Points => "Points",
            Self::LinePoints => "Line and points",
        }
    }
}

choice_traits!(Integration, Interpolation, Inertia, Style);
