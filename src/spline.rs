//! Piecewise curves used to remap noise values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building a [`SplineEvaluator`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    #[error("Mismatched control point arrays: {0} x values, {1} y values")]
    LengthMismatch(usize, usize),
    #[error("A spline needs at least 2 control points, got {0}")]
    TooFewPoints(usize),
    #[error("Control point x values must be strictly increasing (index {0})")]
    NotIncreasing(usize),
    #[error("Control point {0} is not finite")]
    NonFinite(usize),
}

/// Interpolation between control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplineKind {
    #[default]
    Linear,
    /// Natural cubic spline (zero curvature at both ends).
    Cubic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplinePoint {
    pub x: f32,
    pub y: f32,
}

impl SplinePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Serializable spline description, as stored in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplineConfig {
    pub kind: SplineKind,
    pub points: Vec<SplinePoint>,
}

impl SplineConfig {
    pub fn new(kind: SplineKind, points: &[(f32, f32)]) -> Self {
        Self {
            kind,
            points: points.iter().map(|&(x, y)| SplinePoint::new(x, y)).collect(),
        }
    }
}

/// Maps a scalar through a curve defined by control points.
///
/// Knots are interpolated exactly. Outside `[x_min, x_max]` the curve is
/// extended along the boundary tangent.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineEvaluator {
    kind: SplineKind,
    points: Vec<SplinePoint>,
    /// Second derivatives at each knot (cubic only).
    second: Vec<f32>,
}

impl SplineEvaluator {
    pub fn new(points: &[SplinePoint], kind: SplineKind) -> Result<Self, SplineError> {
        validate(points)?;
        let second = match kind {
            SplineKind::Linear => Vec::new(),
            SplineKind::Cubic => natural_second_derivatives(points),
        };
        Ok(Self {
            kind,
            points: points.to_vec(),
            second,
        })
    }

    pub fn from_config(config: &SplineConfig) -> Result<Self, SplineError> {
        Self::new(&config.points, config.kind)
    }

    /// The curve `y = x` over [-1, 1].
    pub fn identity() -> Self {
        Self {
            kind: SplineKind::Linear,
            points: vec![SplinePoint::new(-1.0, -1.0), SplinePoint::new(1.0, 1.0)],
            second: Vec::new(),
        }
    }

    /// Replaces the control points. On error the evaluator is left unchanged.
    pub fn set_points(&mut self, xs: &[f32], ys: &[f32], kind: SplineKind) -> Result<(), SplineError> {
        if xs.len() != ys.len() {
            return Err(SplineError::LengthMismatch(xs.len(), ys.len()));
        }
        let points: Vec<SplinePoint> = xs
            .iter()
            .zip(ys)
            .map(|(&x, &y)| SplinePoint::new(x, y))
            .collect();
        *self = Self::new(&points, kind)?;
        Ok(())
    }

    pub fn points(&self) -> &[SplinePoint] {
        &self.points
    }

    pub fn kind(&self) -> SplineKind {
        self.kind
    }

    pub fn to_config(&self) -> SplineConfig {
        SplineConfig {
            kind: self.kind,
            points: self.points.clone(),
        }
    }

    /// Evaluates the curve at `x`. NaN maps to NaN.
    pub fn evaluate(&self, x: f32) -> f32 {
        if x.is_nan() {
            return x;
        }
        let pts = &self.points;
        let last = pts.len() - 1;

        if x <= pts[0].x {
            return pts[0].y + self.end_slope(0) * (x - pts[0].x);
        }
        if x >= pts[last].x {
            return pts[last].y + self.end_slope(last) * (x - pts[last].x);
        }

        // First knot strictly greater than x; x lies in [i - 1, i).
        let i = pts.partition_point(|p| p.x <= x);
        let (p0, p1) = (pts[i - 1], pts[i]);
        let h = p1.x - p0.x;
        let t = (x - p0.x) / h;

        match self.kind {
            SplineKind::Linear => p0.y + (p1.y - p0.y) * t,
            SplineKind::Cubic => {
                let a = 1.0 - t;
                let (m0, m1) = (self.second[i - 1], self.second[i]);
                a * p0.y + t * p1.y + ((a * a * a - a) * m0 + (t * t * t - t) * m1) * h * h / 6.0
            }
        }
    }

    /// Tangent at the first or last knot.
    fn end_slope(&self, knot: usize) -> f32 {
        let pts = &self.points;
        let last = pts.len() - 1;
        let (i0, i1) = if knot == 0 { (0, 1) } else { (last - 1, last) };
        let h = pts[i1].x - pts[i0].x;
        let secant = (pts[i1].y - pts[i0].y) / h;
        match self.kind {
            SplineKind::Linear => secant,
            SplineKind::Cubic => {
                let (m0, m1) = (self.second[i0], self.second[i1]);
                if knot == 0 {
                    secant - h * (2.0 * m0 + m1) / 6.0
                } else {
                    secant + h * (m0 + 2.0 * m1) / 6.0
                }
            }
        }
    }
}

fn validate(points: &[SplinePoint]) -> Result<(), SplineError> {
    if points.len() < 2 {
        return Err(SplineError::TooFewPoints(points.len()));
    }
    if let Some(i) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(SplineError::NonFinite(i));
    }
    if let Some(i) = points.windows(2).position(|w| w[1].x <= w[0].x) {
        return Err(SplineError::NotIncreasing(i + 1));
    }
    Ok(())
}

/// Solves the tridiagonal system for a natural cubic spline.
fn natural_second_derivatives(points: &[SplinePoint]) -> Vec<f32> {
    let n = points.len();
    let mut m = vec![0.0f32; n];
    if n < 3 {
        return m;
    }

    // Thomas algorithm over the interior knots.
    let mut c_prime = vec![0.0f32; n];
    let mut d_prime = vec![0.0f32; n];
    for i in 1..n - 1 {
        let h0 = points[i].x - points[i - 1].x;
        let h1 = points[i + 1].x - points[i].x;
        let a = h0;
        let b = 2.0 * (h0 + h1);
        let c = h1;
        let d = 6.0 * ((points[i + 1].y - points[i].y) / h1 - (points[i].y - points[i - 1].y) / h0);

        let denom = b - a * c_prime[i - 1];
        c_prime[i] = c / denom;
        d_prime[i] = (d - a * d_prime[i - 1]) / denom;
    }
    for i in (1..n - 1).rev() {
        m[i] = d_prime[i] - c_prime[i] * m[i + 1];
    }
    m
}
