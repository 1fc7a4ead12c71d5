//! Conversion between reals and fixed-point integers.
//!
//! All breakpoints, coefficients and thresholds are scaled with [`scale`], which floors.
//! The interval tests of a [`DecisionProcedure`](crate::decision::DecisionProcedure) rely on
//! every boundary being produced by the same rounding rule.
use serde::{Deserialize, Serialize};

use crate::errors::OverflowError;

/// `2^bits` as a float. Exact for every bit width used here.
pub(crate) fn pow2(bits: u32) -> f64 {
    2_f64.powi(bits as i32)
}

/// `floor(value * 2^scale_bits)`.
pub fn scale(value: f64, scale_bits: u32) -> i128 {
    (value * pow2(scale_bits)).floor() as i128
}

/// `value * 2^scale_bits` rounded to the nearest integer, ties to even.
pub fn scale_nearest(value: f64, scale_bits: u32) -> i128 {
    (value * pow2(scale_bits)).round_ties_even() as i128
}

/// Approximate inverse of [`scale`]. Only meant for verification.
pub fn unscale(value: i128, scale_bits: u32) -> f64 {
    value as f64 / pow2(scale_bits)
}

/// Whether `value` is representable as a signed two's complement integer of `bits` bits.
pub fn fits_signed(value: i128, bits: u32) -> bool {
    if bits >= 128 {
        return true;
    }
    if bits == 0 {
        return false;
    }
    let bound = 1_i128 << (bits - 1);
    (-bound..bound).contains(&value)
}

pub fn check_signed(value: i128, bits: u32) -> Result<i128, OverflowError> {
    if fits_signed(value, bits) {
        Ok(value)
    } else {
        Err(OverflowError { value, bits })
    }
}

/// A fixed-point format with `scale_bits` fractional bits stored in a signed
/// `value_bits` wide integer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedPoint {
    pub scale_bits: u32,
    pub value_bits: u32,
}

impl FixedPoint {
    pub fn new(scale_bits: u32, value_bits: u32) -> Self {
        Self {
            scale_bits,
            value_bits,
        }
    }

    /// Scales `value` and checks that it fits the value width.
    pub fn encode(&self, value: f64) -> Result<i128, OverflowError> {
        if !value.is_finite() {
            return Err(OverflowError {
                value: if value.is_sign_negative() {
                    i128::MIN
                } else {
                    i128::MAX
                },
                bits: self.value_bits,
            });
        }
        check_signed(scale(value, self.scale_bits), self.value_bits)
    }

    pub fn decode(&self, value: i128) -> f64 {
        unscale(value, self.scale_bits)
    }

    /// Fixed-point product, floored back to `scale_bits` fractional bits.
    pub fn mul(&self, a: i128, b: i128) -> Result<i128, OverflowError> {
        let prod = a.checked_mul(b).ok_or(OverflowError {
            value: a.saturating_mul(b),
            bits: 128,
        })?;
        check_signed(prod >> self.scale_bits, self.value_bits)
    }
}
