//! # Piecewise approximations for secret-shared fixed-point arithmetic
//!
//! Non-linear functions like `exp` or `tanh` can not be evaluated directly in an arithmetic
//! secure two-party computation. This crate derives piecewise approximations that can:
//!
//! - [`Approximation`] samples a target function on a bounded domain, builds secant segments,
//!   scales them to fixed point and emits a [`DecisionProcedure`] selecting the segment for the
//!   sum of two input shares. The procedure can be rendered as a function of the circuit
//!   language via [`Approximation::render`].
//! - [`TestVectorGenerator`] computes, for a piecewise quadratic, the partial results each
//!   party obtains on its share of the input, mapped into the ring `Z_{2^k}`. The
//!   [`PiecewiseSelector`] recombines such a vector the way the selection circuit does and
//!   thereby provides the expected output of a secure evaluation.
//!
//! All parameters are passed explicitly via the serde (de)serializable configs in [`config`].
//!
//! ```
//! use ss_approx::config::ApproximationConfig;
//! use ss_approx::segment::Target;
//! use ss_approx::Approximation;
//!
//! let approx = Approximation::for_target(&ApproximationConfig::default(), Target::Exp).unwrap();
//! assert_eq!(approx.segments().len(), 99);
//! assert!((approx.evaluate_real(1.0).unwrap() - 1.0_f64.exp()).abs() < 0.1);
//! ```
pub use approximation::Approximation;
pub use decision::DecisionProcedure;
pub use ring::{Ring, RingElement};
pub use selector::PiecewiseSelector;
pub use vectors::{TestVector, TestVectorGenerator};

pub mod approximation;
pub mod config;
pub mod decision;
pub mod errors;
pub mod fixed_point;
#[cfg(feature = "_integration_tests")]
#[doc(hidden)]
/// Do **not** use items from this module. They are intended for integration tests and must
/// therefore be public.
pub mod private_test_utils;
pub mod render;
pub mod ring;
pub mod segment;
pub mod selector;
pub mod vectors;
