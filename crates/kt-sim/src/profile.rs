//! Continuous track height profiles built from samples.

use kt_model::{Choice, Interpolation};

use crate::error::{SimError, SimResult};
use crate::track::Sample;

/// Height profile `y(x)` of a track. Past the last (or before the first)
/// sample, profiles continue as a straight line with the end slope.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// No source file: level ground at height 0.
    Flat,
    Linear { xs: Vec<f64>, ys: Vec<f64> },
    /// Natural cubic spline; `m` holds the second derivative at each knot.
    Spline {
        xs: Vec<f64>,
        ys: Vec<f64>,
        m: Vec<f64>,
    },
}

impl Profile {
    /// Build a profile from raw samples.
    ///
    /// Non-finite samples are dropped, the rest sorted by x; of several
    /// samples at the same x the first one wins. At least two distinct x
    /// positions are required.
    pub fn build(samples: &[Sample], scheme: Interpolation) -> SimResult<Self> {
        let mut clean: Vec<Sample> = samples
            .iter()
            .copied()
            .filter(|s| s.x.is_finite() && s.y.is_finite())
            .collect();
        clean.sort_by(|a, b| a.x.total_cmp(&b.x));
        clean.dedup_by(|later, earlier| later.x == earlier.x);

        if clean.len() < 2 {
            return Err(SimError::InvalidTrack {
                what: "needs at least two samples at distinct positions",
            });
        }

        let xs: Vec<f64> = clean.iter().map(|s| s.x).collect();
        let ys: Vec<f64> = clean.iter().map(|s| s.y).collect();
        Ok(match scheme {
            Interpolation::Linear => Profile::Linear { xs, ys },
            Interpolation::CubicSpline => {
                let m = natural_second_derivatives(&xs, &ys);
                Profile::Spline { xs, ys, m }
            }
        })
    }

    /// Label shown in trace diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Profile::Flat => "Flat",
            Profile::Linear { .. } => Interpolation::Linear.label(),
            Profile::Spline { .. } => Interpolation::CubicSpline.label(),
        }
    }

    /// Where a body placed on this track starts.
    pub fn start_x(&self) -> f64 {
        match self {
            Profile::Flat => 0.0,
            Profile::Linear { xs, .. } | Profile::Spline { xs, .. } => xs[0],
        }
    }

    pub fn height(&self, x: f64) -> f64 {
        match self {
            Profile::Flat => 0.0,
            Profile::Linear { xs, ys } => {
                let i = segment(xs, x);
                let s = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]);
                ys[i] + s * (x - xs[i])
            }
            Profile::Spline { xs, ys, m } => {
                let last = xs.len() - 1;
                if x < xs[0] {
                    ys[0] + self.slope(xs[0]) * (x - xs[0])
                } else if x > xs[last] {
                    ys[last] + self.slope(xs[last]) * (x - xs[last])
                } else {
                    let i = segment(xs, x);
                    let h = xs[i + 1] - xs[i];
                    let a = (xs[i + 1] - x) / h;
                    let b = (x - xs[i]) / h;
                    a * ys[i]
                        + b * ys[i + 1]
                        + ((a * a * a - a) * m[i] + (b * b * b - b) * m[i + 1]) * h * h / 6.0
                }
            }
        }
    }

    /// dy/dx at `x`. On a knot of a linear profile the right-hand segment wins.
    pub fn slope(&self, x: f64) -> f64 {
        match self {
            Profile::Flat => 0.0,
            Profile::Linear { xs, ys } => {
                let i = segment(xs, x);
                (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
            }
            Profile::Spline { xs, ys, m } => {
                let i = segment(xs, x.clamp(xs[0], xs[xs.len() - 1]));
                let h = xs[i + 1] - xs[i];
                let xc = x.clamp(xs[i], xs[i + 1]);
                let a = (xs[i + 1] - xc) / h;
                let b = (xc - xs[i]) / h;
                (ys[i + 1] - ys[i]) / h - (3.0 * a * a - 1.0) / 6.0 * h * m[i]
                    + (3.0 * b * b - 1.0) / 6.0 * h * m[i + 1]
            }
        }
    }
}

/// Index `i` of the segment `[xs[i], xs[i+1]]` used for `x`, clamped to the
/// first/last segment outside the sampled range.
fn segment(xs: &[f64], x: f64) -> usize {
    let upper = xs.partition_point(|&v| v <= x);
    upper.saturating_sub(1).min(xs.len() - 2)
}

/// Second derivatives of the natural cubic spline through the knots
/// (tridiagonal solve, zero curvature at both ends).
fn natural_second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut m = vec![0.0; n];
    if n < 3 {
        return m;
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    // Forward sweep over the interior rows.
    let mut diag = vec![0.0; n];
    let mut rhs = vec![0.0; n];
    for i in 1..n - 1 {
        diag[i] = 2.0 * (h[i - 1] + h[i]);
        rhs[i] = 6.0 * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);
        if i > 1 {
            let w = h[i - 1] / diag[i - 1];
            diag[i] -= w * h[i - 1];
            rhs[i] -= w * rhs[i - 1];
        }
    }
    // Back substitution.
    for i in (1..n - 1).rev() {
        let upper = if i + 1 < n - 1 { h[i] * m[i + 1] } else { 0.0 };
        m[i] = (rhs[i] - upper) / diag[i];
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(f64, f64)]) -> Vec<Sample> {
        points.iter().map(|&(x, y)| Sample::new(x, y)).collect()
    }

    #[test]
    fn linear_interpolates_and_extrapolates() {
        let track = samples(&[(0.0, 1.0), (1.0, 0.0), (2.0, 0.0)]);
        let p = Profile::build(&track, Interpolation::Linear).unwrap();
        assert_eq!(p.height(0.5), 0.5);
        assert_eq!(p.slope(0.5), -1.0);
        assert_eq!(p.height(-1.0), 2.0);
        assert_eq!(p.slope(5.0), 0.0);
        assert_eq!(p.start_x(), 0.0);
    }

    #[test]
    fn spline_passes_through_knots() {
        let pts = [(0.0, 0.0), (1.0, 1.0), (2.0, 0.0), (3.0, 2.0)];
        let p = Profile::build(&samples(&pts), Interpolation::CubicSpline).unwrap();
        for (x, y) in pts {
            assert!((p.height(x) - y).abs() < 1e-12, "knot {x}");
        }
    }

    #[test]
    fn spline_of_a_line_is_the_line() {
        let pts: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, 3.0 - 0.5 * i as f64)).collect();
        let p = Profile::build(&samples(&pts), Interpolation::CubicSpline).unwrap();
        for x in [0.25, 1.7, 4.9, 7.0, -2.0] {
            assert!((p.height(x) - (3.0 - 0.5 * x)).abs() < 1e-9);
            assert!((p.slope(x) + 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn spline_slope_matches_finite_difference() {
        let pts = [(0.0, 0.0), (0.5, 0.3), (1.5, -0.2), (2.0, 0.4), (3.0, 0.1)];
        let p = Profile::build(&samples(&pts), Interpolation::CubicSpline).unwrap();
        let eps = 1e-6;
        for x in [0.2, 0.9, 1.7, 2.6] {
            let fd = (p.height(x + eps) - p.height(x - eps)) / (2.0 * eps);
            assert!((p.slope(x) - fd).abs() < 1e-5, "x={x}");
        }
    }

    #[test]
    fn samples_are_cleaned() {
        let raw = samples(&[(2.0, 0.0), (f64::NAN, 1.0), (0.0, 1.0), (2.0, 5.0)]);
        let p = Profile::build(&raw, Interpolation::Linear).unwrap();
        assert_eq!(p, Profile::Linear { xs: vec![0.0, 2.0], ys: vec![1.0, 0.0] });

        let err = Profile::build(&samples(&[(1.0, 1.0), (1.0, 2.0)]), Interpolation::Linear);
        assert!(matches!(err, Err(SimError::InvalidTrack { .. })));
    }

    #[test]
    fn flat_profile() {
        assert_eq!(Profile::Flat.height(12.0), 0.0);
        assert_eq!(Profile::Flat.slope(-3.0), 0.0);
        assert_eq!(Profile::Flat.label(), "Flat");
    }
}
