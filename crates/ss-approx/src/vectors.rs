//! Ring-correct test vectors for a two-party evaluation of a piecewise quadratic.
//!
//! The plaintext input is scaled to `bigX` and split into additive shares `x1 + x2 = bigX`.
//! Every term of the coefficient table is then evaluated on each share independently,
//!
//! ```text
//! t = (sign * n) * share^2 / scale + c * share + sign * (selector * (d * scale))
//! ```
//!
//! with `selector = 0` for `x1` and `1` for `x2`, so that `d * scale` is added exactly once
//! when both partial results are summed. Partial results are computed in `f64`, rounded once
//! (half to even) and only then mapped into the ring.
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{QuadraticPiece, TestVectorConfig};
use crate::errors::{OverflowError, VectorError};
use crate::fixed_point::{pow2, scale_nearest};
use crate::ring::{Ring, RingElement};

const SIGNS: [f64; 2] = [1.0, -1.0];

/// Additive shares of a fixed-point value over the integers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SharePair {
    pub x1: i128,
    pub x2: i128,
}

impl SharePair {
    /// Splits `value` with the given first share, `x2 = value - x1`.
    pub fn split(value: i128, x1: i128) -> Self {
        Self { x1, x2: value - x1 }
    }

    pub fn reconstruct(&self) -> i128 {
        self.x1 + self.x2
    }

    fn with_selector(&self) -> [(i128, f64); 2] {
        [(self.x1, 0.0), (self.x2, 1.0)]
    }
}

/// One row of the term table. Produces the fields `t{index}1` and `t{index}2`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Term {
    pub index: usize,
    /// `1.0` for the piece itself, `-1.0` for its reflection onto negative inputs.
    pub sign: f64,
    pub piece: QuadraticPiece,
}

impl Term {
    /// Partial result of this term for one share.
    pub fn partial(&self, share: i128, selector: f64, scale: f64) -> Result<f64, OverflowError> {
        let square = share.checked_mul(share).ok_or(OverflowError {
            value: share,
            bits: 128,
        })? as f64;
        let n = self.sign * self.piece.n;
        let offset = self.sign * (selector * (self.piece.d * scale));
        Ok(n * square / scale + self.piece.c * share as f64 + offset)
    }
}

/// Named ring elements `x1, x2, t11, t12, ..., r`, in this order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestVector {
    fields: IndexMap<String, RingElement>,
}

impl TestVector {
    pub fn get(&self, name: &str) -> Option<RingElement> {
        self.fields.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RingElement)> + '_ {
        self.fields.iter().map(|(name, el)| (name.as_str(), *el))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn insert(&mut self, name: String, value: RingElement) {
        self.fields.insert(name, value);
    }
}

impl Display for TestVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (name, value) in &self.fields {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct TestVectorGenerator {
    config: TestVectorConfig,
    ring: Ring,
    big_x: i128,
    terms: Vec<Term>,
}

impl TestVectorGenerator {
    pub fn new(config: TestVectorConfig) -> Result<Self, VectorError> {
        config.validate()?;
        let ring = config.ring()?;
        let big_x = scale_nearest(config.input, config.scale_bits);
        ring.canonicalize(big_x)?;
        let pieces = config.coefficients.len();
        let terms = SIGNS
            .iter()
            .enumerate()
            .flat_map(|(sign_idx, &sign)| {
                config
                    .coefficients
                    .iter()
                    .enumerate()
                    .map(move |(piece_idx, &piece)| Term {
                        index: 1 + sign_idx * pieces + piece_idx,
                        sign,
                        piece,
                    })
            })
            .collect();
        Ok(Self {
            config,
            ring,
            big_x,
            terms,
        })
    }

    pub fn config(&self) -> &TestVectorConfig {
        &self.config
    }

    pub fn ring(&self) -> Ring {
        self.ring
    }

    /// The scaled plaintext input.
    pub fn big_x(&self) -> i128 {
        self.big_x
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Draws the share `x1` and the mask `r` from `[1, random_range)`, in this order.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<TestVector, VectorError> {
        let x1 = rng.gen_range(1..self.config.random_range);
        let r = rng.gen_range(1..self.config.random_range);
        self.generate_with(x1, r)
    }

    pub fn generate_seeded(&self, seed: u64) -> Result<TestVector, VectorError> {
        self.generate(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Builds the vector for a fixed share `x1` and mask `r`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn generate_with(&self, x1: u64, r: u64) -> Result<TestVector, VectorError> {
        let shares = SharePair::split(self.big_x, x1 as i128);
        debug!(big_x = self.big_x, x2 = shares.x2, "Split input");
        let scale = pow2(self.config.scale_bits);

        let mut vector = TestVector::default();
        vector.insert("x1".into(), self.ring.canonicalize(shares.x1)?);
        vector.insert("x2".into(), self.ring.canonicalize(shares.x2)?);
        for term in &self.terms {
            for (j, (share, selector)) in shares.with_selector().into_iter().enumerate() {
                let t = term.partial(share, selector, scale)?;
                let value = self.round(t)?;
                trace!(index = term.index, share = j + 1, t, value, "Partial result");
                vector.insert(
                    format!("t{}{}", term.index, j + 1),
                    self.ring.canonicalize(value)?,
                );
            }
        }
        vector.insert("r".into(), self.ring.canonicalize(r as i128)?);
        Ok(vector)
    }

    fn round(&self, t: f64) -> Result<i128, OverflowError> {
        let rounded = t.round_ties_even();
        let size = self.ring.size() as f64;
        if !rounded.is_finite() || rounded.abs() >= size {
            return Err(OverflowError {
                value: if rounded.is_finite() {
                    rounded as i128
                } else {
                    i128::MAX
                },
                bits: self.ring.bits(),
            });
        }
        Ok(rounded as i128)
    }
}
