//! Secant segment tables over a sample grid.
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{ApproxError, ConfigError, OverflowError};
use crate::fixed_point::{check_signed, FixedPoint};

/// Strictly increasing sample points, at least two of them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleGrid {
    points: Vec<f64>,
}

impl SampleGrid {
    /// `count` evenly spaced points, both endpoints included.
    pub fn uniform(start: f64, end: f64, count: usize) -> Result<Self, ConfigError> {
        if count < 2 {
            return Err(ConfigError::SampleCount(count));
        }
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(ConfigError::Domain { start, end });
        }
        let step = (end - start) / (count - 1) as f64;
        let mut points: Vec<_> = (0..count).map(|i| i as f64 * step + start).collect();
        // pin the endpoint, i * step may not land on it exactly
        points[count - 1] = end;
        Self::from_points(points)
    }

    pub fn from_points(points: Vec<f64>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::SampleCount(points.len()));
        }
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(ConfigError::UnorderedSamples(idx));
        }
        if let Some((idx, _)) = points
            .iter()
            .tuple_windows()
            .find_position(|(a, b)| a >= b)
        {
            return Err(ConfigError::UnorderedSamples(idx + 1));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Functions with a name, usable in configs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Exp,
    Tanh,
}

impl Target {
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Target::Exp => x.exp(),
            Target::Tanh => x.tanh(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Target::Exp => "exp",
            Target::Tanh => "tanh",
        }
    }
}

/// The secant `slope * x + intercept` over `[lower, upper]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub lower: f64,
    pub upper: f64,
    pub slope: f64,
    pub intercept: f64,
}

impl Segment {
    /// Secant through `(lower, f_lower)` and `(upper, f_upper)`, anchored at the upper sample.
    pub fn secant(lower: f64, f_lower: f64, upper: f64, f_upper: f64) -> Self {
        let slope = (f_upper - f_lower) / (upper - lower);
        let intercept = f_upper - slope * upper;
        Self {
            lower,
            upper,
            slope,
            intercept,
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// [`Segment`] with every field scaled to fixed point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedSegment {
    pub lower: i128,
    pub upper: i128,
    pub slope: i128,
    pub intercept: i128,
}

impl FixedSegment {
    /// Plaintext fixed-point evaluation `slope * x + intercept`.
    pub fn eval(&self, x: i128, fp: &FixedPoint) -> Result<i128, ApproxError> {
        let prod = fp.mul(self.slope, x)?;
        let sum = prod
            .checked_add(self.intercept)
            .ok_or(OverflowError {
                value: prod,
                bits: 128,
            })?;
        Ok(check_signed(sum, fp.value_bits)?)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentTable {
    segments: Vec<Segment>,
}

impl SegmentTable {
    /// Samples `f` on `grid` and derives one secant per adjacent sample pair.
    #[tracing::instrument(level = "debug", skip_all, fields(samples = grid.len()))]
    pub fn build(f: impl Fn(f64) -> f64, grid: &SampleGrid) -> Result<Self, ApproxError> {
        let samples: Vec<(f64, f64)> = grid
            .points()
            .iter()
            .map(|&x| {
                let value = f(x);
                if value.is_finite() {
                    Ok((x, value))
                } else {
                    Err(ApproxError::NonFiniteSample { x, value })
                }
            })
            .collect::<Result<_, _>>()?;
        let segments: Vec<_> = samples
            .into_iter()
            .tuple_windows()
            .map(|((lo, f_lo), (hi, f_hi))| Segment::secant(lo, f_lo, hi, f_hi))
            .collect();
        debug!(segments = segments.len(), "Built segment table");
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the segment covering `x`. Outside of the sampled domain the first or last
    /// segment is used.
    pub fn locate(&self, x: f64) -> usize {
        self.segments
            .iter()
            .position(|seg| x <= seg.upper)
            .unwrap_or(self.segments.len() - 1)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.segments[self.locate(x)].eval(x)
    }

    /// Scales breakpoints and coefficients. Colliding breakpoints are kept but reported.
    pub fn to_fixed(&self, fp: &FixedPoint) -> Result<Vec<FixedSegment>, ApproxError> {
        let fixed = self
            .segments
            .iter()
            .map(|seg| -> Result<_, ApproxError> {
                Ok(FixedSegment {
                    lower: fp.encode(seg.lower)?,
                    upper: fp.encode(seg.upper)?,
                    slope: fp.encode(seg.slope)?,
                    intercept: fp.encode(seg.intercept)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let collisions = fixed.iter().filter(|seg| seg.lower == seg.upper).count();
        if collisions > 0 {
            warn!(
                collisions,
                scale_bits = fp.scale_bits,
                "Breakpoints collide after scaling, affected segments are never selected"
            );
        }
        Ok(fixed)
    }
}
