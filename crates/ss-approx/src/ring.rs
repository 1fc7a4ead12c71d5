//! The ring `Z_{2^bits}` shared values live in.
//!
//! Secure computation rings have no native negative values. Signed integers are mapped to
//! their canonical non-negative residue with [`Ring::canonicalize`], which refuses values
//! whose magnitude already exceeds the ring instead of wrapping them silently.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use num_traits::{WrappingAdd, WrappingNeg, WrappingSub};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{ConfigError, OverflowError};

pub const MAX_RING_BITS: u32 = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ring {
    bits: u32,
}

/// Canonical residue in `[0, 2^bits)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RingElement(u64);

impl Ring {
    pub fn new(bits: u32) -> Result<Self, ConfigError> {
        match bits {
            0 => Err(ConfigError::ZeroBitWidth("ring_bits")),
            bits if bits > MAX_RING_BITS => Err(ConfigError::WidthTooLarge {
                name: "ring_bits",
                bits,
                max: MAX_RING_BITS,
            }),
            bits => Ok(Self { bits }),
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn size(&self) -> u128 {
        1 << self.bits
    }

    fn mask(&self) -> u64 {
        u64::MAX >> (MAX_RING_BITS - self.bits)
    }

    fn wrap(&self, raw: u64) -> RingElement {
        RingElement(raw & self.mask())
    }

    /// Maps `value` into `[0, size)` by adding the ring size to negative values.
    ///
    /// Values with `|value| >= size` are reported as overflow.
    pub fn canonicalize(&self, value: i128) -> Result<RingElement, OverflowError> {
        let size = self.size() as i128;
        if value <= -size || value >= size {
            return Err(OverflowError {
                value,
                bits: self.bits,
            });
        }
        let canonical = if value < 0 { value + size } else { value };
        Ok(RingElement(canonical as u64))
    }

    /// Reduces an arbitrary integer modulo the ring size.
    pub fn reduce(&self, value: i128) -> RingElement {
        RingElement(value.rem_euclid(self.size() as i128) as u64)
    }

    pub fn element(&self, raw: u64) -> Result<RingElement, OverflowError> {
        if raw & !self.mask() != 0 {
            return Err(OverflowError {
                value: raw as i128,
                bits: self.bits,
            });
        }
        Ok(RingElement(raw))
    }

    pub fn add(&self, a: RingElement, b: RingElement) -> RingElement {
        self.wrap(WrappingAdd::wrapping_add(&a.0, &b.0))
    }

    pub fn sub(&self, a: RingElement, b: RingElement) -> RingElement {
        self.wrap(WrappingSub::wrapping_sub(&a.0, &b.0))
    }

    pub fn neg(&self, a: RingElement) -> RingElement {
        self.wrap(WrappingNeg::wrapping_neg(&a.0))
    }

    /// Whether `a` is in the upper half of the ring, i.e. encodes a negative value.
    pub fn is_negative(&self, a: RingElement) -> bool {
        (a.0 >> (self.bits - 1)) & 1 == 1
    }

    /// Two's complement interpretation of `a`.
    pub fn to_signed(&self, a: RingElement) -> i128 {
        if self.is_negative(a) {
            a.0 as i128 - self.size() as i128
        } else {
            a.0 as i128
        }
    }
}

impl RingElement {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for RingElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for RingElement {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RingElement)
    }
}

// Ring elements are exchanged as decimal strings, 64 bit integers are not portable
// through every serialization format.
impl Serialize for RingElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RingElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RING_60: u32 = 60;

    #[test]
    fn ring_bounds() {
        assert_eq!(Ring::new(0), Err(ConfigError::ZeroBitWidth("ring_bits")));
        assert!(Ring::new(65).is_err());
        assert_eq!(Ring::new(64).unwrap().size(), 1 << 64);
    }

    #[test]
    fn canonicalize_negative() {
        let ring = Ring::new(RING_60).unwrap();
        let size = ring.size() as i128;
        assert_eq!(ring.canonicalize(-1).unwrap().value() as i128, size - 1);
        assert_eq!(ring.canonicalize(0).unwrap().value(), 0);
        assert_eq!(ring.canonicalize(size - 1).unwrap().value() as i128, size - 1);
        assert!(ring.canonicalize(size).is_err());
        assert!(ring.canonicalize(-size).is_err());
    }

    #[test]
    fn wrapping_arith_64() {
        let ring = Ring::new(64).unwrap();
        let max = ring.element(u64::MAX).unwrap();
        let one = ring.element(1).unwrap();
        assert_eq!(ring.add(max, one).value(), 0);
        assert_eq!(ring.sub(RingElement::default(), one), max);
        assert_eq!(ring.to_signed(max), -1);
    }

    #[test]
    fn element_checks_mask() {
        let ring = Ring::new(8).unwrap();
        assert!(ring.element(255).is_ok());
        assert!(ring.element(256).is_err());
    }

    #[test]
    fn string_serialization() {
        let el = RingElement(1152921504606846975);
        let json = serde_json::to_string(&el).unwrap();
        assert_eq!(json, "\"1152921504606846975\"");
        assert_eq!(serde_json::from_str::<RingElement>(&json).unwrap(), el);
    }

    proptest! {
        #[test]
        fn canonical_in_ring(v in -(1_i128 << 60) + 1..(1_i128 << 60)) {
            let ring = Ring::new(RING_60).unwrap();
            let c = ring.canonicalize(v).unwrap();
            prop_assert!((c.value() as u128) < ring.size());
            if v < 0 {
                prop_assert_eq!(c.value() as i128 - ring.size() as i128, v);
            } else {
                prop_assert_eq!(c.value() as i128, v);
            }
            prop_assert_eq!(ring.reduce(v), c);
        }

        #[test]
        fn signed_round_trip(v in -(1_i128 << 59)..(1_i128 << 59)) {
            let ring = Ring::new(RING_60).unwrap();
            prop_assert_eq!(ring.to_signed(ring.reduce(v)), v);
        }

        #[test]
        fn add_sub_inverse(a in 0_u64..(1 << 60), b in 0_u64..(1 << 60)) {
            let ring = Ring::new(RING_60).unwrap();
            let (a, b) = (ring.element(a).unwrap(), ring.element(b).unwrap());
            prop_assert_eq!(ring.sub(ring.add(a, b), b), a);
            prop_assert_eq!(ring.add(a, ring.neg(a)), RingElement::default());
        }
    }
}
