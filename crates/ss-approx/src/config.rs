//! Parameters of the approximation and test vector requests.
//!
//! Every struct deserializes with `#[serde(default)]`, so a config file only needs to name the
//! fields it changes. The defaults are the reference parameters: `exp` on `[-20, 20]` with 100
//! samples at 20 fractional bits, and the two-piece `tanh` vector at 30 fractional bits in
//! `Z_{2^60}`.
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::fixed_point::FixedPoint;
use crate::ring::Ring;

pub const MAX_VALUE_BITS: u32 = 128;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximationConfig {
    /// Used for the rendered function name, `ss_<name>`.
    pub name: String,
    pub domain_start: f64,
    pub domain_end: f64,
    pub sample_count: usize,
    pub scale_bits: u32,
    /// Width of the signed integers the circuit computes with.
    pub value_bits: u32,
    /// Mask removed from the selected product.
    pub correction: i64,
}

impl Default for ApproximationConfig {
    fn default() -> Self {
        Self {
            name: "exp".to_string(),
            domain_start: -20.0,
            domain_end: 20.0,
            sample_count: 100,
            scale_bits: 20,
            value_bits: 64,
            correction: 0,
        }
    }
}

impl ApproximationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count < 2 {
            return Err(ConfigError::SampleCount(self.sample_count));
        }
        if !self.domain_start.is_finite()
            || !self.domain_end.is_finite()
            || self.domain_start >= self.domain_end
        {
            return Err(ConfigError::Domain {
                start: self.domain_start,
                end: self.domain_end,
            });
        }
        validate_widths(self.scale_bits, self.value_bits, "value_bits")?;
        if self.value_bits > MAX_VALUE_BITS {
            return Err(ConfigError::WidthTooLarge {
                name: "value_bits",
                bits: self.value_bits,
                max: MAX_VALUE_BITS,
            });
        }
        Ok(())
    }

    pub fn fixed_point(&self) -> FixedPoint {
        FixedPoint::new(self.scale_bits, self.value_bits)
    }
}

/// One piece `n * x^2 + c * x + d` of a piecewise quadratic approximation.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadraticPiece {
    pub n: f64,
    pub c: f64,
    pub d: f64,
}

impl QuadraticPiece {
    /// `tanh` on `[0, 1.52]`.
    pub const TANH_LOW: Self = Self {
        n: -0.2716,
        c: 1.0,
        d: 0.016,
    };
    /// `tanh` on `(1.52, 2.57]`.
    pub const TANH_HIGH: Self = Self {
        n: -0.0848,
        c: 0.42654,
        d: 0.4519,
    };

    pub fn eval(&self, x: f64) -> f64 {
        self.n * x * x + self.c * x + self.d
    }

    fn is_finite(&self) -> bool {
        self.n.is_finite() && self.c.is_finite() && self.d.is_finite()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestVectorConfig {
    /// Plaintext input which is shared.
    pub input: f64,
    pub scale_bits: u32,
    /// Shares and masks are drawn from `[1, random_range)`.
    pub random_range: u64,
    pub ring_bits: u32,
    /// Pieces from the lowest to the highest part of the domain.
    pub coefficients: Vec<QuadraticPiece>,
}

impl Default for TestVectorConfig {
    fn default() -> Self {
        Self {
            input: 3.1415926,
            scale_bits: 30,
            random_range: 1 << 40,
            ring_bits: 60,
            coefficients: vec![QuadraticPiece::TANH_LOW, QuadraticPiece::TANH_HIGH],
        }
    }
}

impl TestVectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input.is_finite() {
            return Err(ConfigError::NonFinite("input"));
        }
        self.ring()?;
        validate_widths(self.scale_bits, self.ring_bits, "ring_bits")?;
        if self.random_range < 2 {
            return Err(ConfigError::RandomRange(self.random_range));
        }
        if self.coefficients.is_empty() {
            return Err(ConfigError::EmptyCoefficients);
        }
        if !self.coefficients.iter().all(QuadraticPiece::is_finite) {
            return Err(ConfigError::NonFinite("coefficients"));
        }
        Ok(())
    }

    pub fn ring(&self) -> Result<Ring, ConfigError> {
        Ring::new(self.ring_bits)
    }
}

/// Cut points of the two-piece selection, in plaintext units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Inputs with `|x| <= low_cut` use the low piece.
    pub low_cut: f64,
    /// Inputs with `low_cut < |x| <= high_cut` use the high piece.
    pub high_cut: f64,
    /// Output beyond `high_cut`, negated for negative inputs.
    pub saturation: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            low_cut: 1.52,
            high_cut: 2.57,
            saturation: 1.0,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.saturation.is_finite() {
            return Err(ConfigError::NonFinite("saturation"));
        }
        if !self.low_cut.is_finite()
            || !self.high_cut.is_finite()
            || self.low_cut <= 0.0
            || self.low_cut > self.high_cut
        {
            return Err(ConfigError::Domain {
                start: self.low_cut,
                end: self.high_cut,
            });
        }
        Ok(())
    }
}

fn validate_widths(
    scale_bits: u32,
    value_bits: u32,
    value_name: &'static str,
) -> Result<(), ConfigError> {
    if scale_bits == 0 {
        return Err(ConfigError::ZeroBitWidth("scale_bits"));
    }
    if value_bits == 0 {
        return Err(ConfigError::ZeroBitWidth(value_name));
    }
    if scale_bits >= value_bits {
        return Err(ConfigError::ScaleExceedsWidth {
            scale_bits,
            value_bits,
        });
    }
    Ok(())
}
