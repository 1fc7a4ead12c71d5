//! Reference model of the selection circuit consuming a two-piece test vector.
//!
//! The circuit reconstructs the input and the partial sums `t_k = t_k1 + t_k2` in the ring,
//! picks the piece by comparing the input against scaled cut points and adds the mask `r`:
//!
//! ```text
//! x >= 0:  x <= low -> t1,   x <= high -> t2,   else  saturation
//! x <  0:  x >= -low -> t3,  x >= -high -> t4,  else -saturation
//! ```
//!
//! Running it on a generated [`TestVector`] yields the value an independent secure evaluator
//! has to output. Note that `t_k` misses the cross term `2 * n * x1 * x2 / scale` of the
//! square, so the output only matches the piece at `x` when one share is small.
use tracing::debug;

use crate::config::{SelectorConfig, TestVectorConfig};
use crate::errors::{ConfigError, VectorError};
use crate::fixed_point::{scale, unscale};
use crate::ring::{Ring, RingElement};
use crate::vectors::TestVector;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PiecewiseSelector {
    ring: Ring,
    scale_bits: u32,
    low_cut: i128,
    high_cut: i128,
    saturation: i128,
}

impl PiecewiseSelector {
    pub fn new(config: &SelectorConfig, vectors: &TestVectorConfig) -> Result<Self, VectorError> {
        config.validate()?;
        vectors.validate()?;
        if vectors.coefficients.len() != 2 {
            return Err(ConfigError::PieceCount(vectors.coefficients.len()).into());
        }
        let ring = vectors.ring()?;
        let scale_bits = vectors.scale_bits;
        let [low_cut, high_cut, saturation] =
            [config.low_cut, config.high_cut, config.saturation].map(|v| scale(v, scale_bits));
        // the negated values have to be representable as well
        for value in [low_cut, high_cut, saturation] {
            ring.canonicalize(value)?;
            ring.canonicalize(-value)?;
        }
        Ok(Self {
            ring,
            scale_bits,
            low_cut,
            high_cut,
            saturation,
        })
    }

    /// Reconstructs `name1 + name2` in the ring.
    fn sum(&self, vector: &TestVector, name: &str) -> Result<RingElement, VectorError> {
        let field = |suffix: &str| {
            let key = format!("{name}{suffix}");
            vector.get(&key).ok_or(VectorError::MissingField(key))
        };
        Ok(self.ring.add(field("1")?, field("2")?))
    }

    /// Masked output `f(x) + r` of the selection circuit.
    pub fn evaluate(&self, vector: &TestVector) -> Result<RingElement, VectorError> {
        let x = self.ring.to_signed(self.sum(vector, "x")?);
        let selected = if x < 0 {
            if x >= -self.low_cut {
                self.sum(vector, "t3")?
            } else if x >= -self.high_cut {
                self.sum(vector, "t4")?
            } else {
                self.ring.reduce(-self.saturation)
            }
        } else if x <= self.low_cut {
            self.sum(vector, "t1")?
        } else if x <= self.high_cut {
            self.sum(vector, "t2")?
        } else {
            self.ring.reduce(self.saturation)
        };
        let r = vector
            .get("r")
            .ok_or_else(|| VectorError::MissingField("r".into()))?;
        debug!(x, %selected, "Selected piece");
        Ok(self.ring.add(selected, r))
    }

    /// Removes the mask from an output and converts it back to a real.
    pub fn unmask(&self, output: RingElement, r: RingElement) -> f64 {
        unscale(self.ring.to_signed(self.ring.sub(output, r)), self.scale_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuadraticPiece;
    use crate::vectors::TestVectorGenerator;

    fn output_for(input: f64) -> f64 {
        let config = TestVectorConfig {
            input,
            ..Default::default()
        };
        let selector = PiecewiseSelector::new(&SelectorConfig::default(), &config).unwrap();
        let vector = TestVectorGenerator::new(config)
            .unwrap()
            .generate_with(1, 5)
            .unwrap();
        let out = selector.evaluate(&vector).unwrap();
        selector.unmask(out, vector.get("r").unwrap())
    }

    #[test]
    fn reference_input_saturates() {
        let config = TestVectorConfig::default();
        let selector = PiecewiseSelector::new(&SelectorConfig::default(), &config).unwrap();
        let vector = TestVectorGenerator::new(config)
            .unwrap()
            .generate_with(573417318112, 427722916458)
            .unwrap();
        assert_eq!(
            selector.evaluate(&vector).unwrap().value(),
            (1 << 30) + 427722916458
        );
    }

    #[test]
    fn pieces_by_magnitude() {
        let low = QuadraticPiece::TANH_LOW;
        let high = QuadraticPiece::TANH_HIGH;
        for (x, expected) in [
            (0.5, low.eval(0.5)),
            (1.0, low.eval(1.0)),
            (2.0, high.eval(2.0)),
            (-0.5, -low.eval(0.5)),
            (-1.0, -low.eval(1.0)),
            (-2.0, -high.eval(2.0)),
            (3.0, 1.0),
            (-3.0, -1.0),
        ] {
            let got = output_for(x);
            assert!((got - expected).abs() < 1e-6, "x = {x}: {got} != {expected}");
            assert!((got - x.tanh()).abs() < 0.04, "x = {x}: {got} far from tanh");
        }
    }

    #[test]
    fn needs_two_pieces() {
        let config = TestVectorConfig {
            coefficients: vec![QuadraticPiece::TANH_LOW],
            ..Default::default()
        };
        assert_eq!(
            PiecewiseSelector::new(&SelectorConfig::default(), &config).unwrap_err(),
            VectorError::Config(ConfigError::PieceCount(1))
        );
    }

    #[test]
    fn missing_field() {
        let config = TestVectorConfig::default();
        let selector = PiecewiseSelector::new(&SelectorConfig::default(), &config).unwrap();
        assert_eq!(
            selector.evaluate(&TestVector::default()).unwrap_err(),
            VectorError::MissingField("x1".into())
        );
    }
}
