//! Private test utilities - Do Not Use!
//!
//! This module is activated by the "_integration_tests" feature and should not be used by
//! downstream code. It can change in any version.
use anyhow::Result;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{SelectorConfig, TestVectorConfig};
use crate::ring::RingElement;
use crate::selector::PiecewiseSelector;
use crate::vectors::TestVectorGenerator;

pub fn init_tracing() -> tracing::dispatcher::DefaultGuard {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .set_default()
}

/// Generates a vector for `config` with fixed randomness and runs the default selector on
/// it. Returns the masked output and the mask.
pub fn select_with(
    config: TestVectorConfig,
    x1: u64,
    r: u64,
) -> Result<(PiecewiseSelector, RingElement, RingElement)> {
    let selector = PiecewiseSelector::new(&SelectorConfig::default(), &config)?;
    let vector = TestVectorGenerator::new(config)?.generate_with(x1, r)?;
    let output = selector.evaluate(&vector)?;
    let mask = vector
        .get("r")
        .ok_or_else(|| anyhow::anyhow!("vector without mask"))?;
    Ok((selector, output, mask))
}
