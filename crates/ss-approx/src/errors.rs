use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("at least 2 samples are needed, got {0}")]
    SampleCount(usize),
    #[error("bit width `{0}` must be positive")]
    ZeroBitWidth(&'static str),
    #[error("scale bits ({scale_bits}) must be smaller than value bits ({value_bits})")]
    ScaleExceedsWidth { scale_bits: u32, value_bits: u32 },
    #[error("bit width `{name}` is {bits}, at most {max} is supported")]
    WidthTooLarge {
        name: &'static str,
        bits: u32,
        max: u32,
    },
    #[error("domain [{start}, {end}] is empty or not finite")]
    Domain { start: f64, end: f64 },
    #[error("sample points must be finite and strictly increasing (index {0})")]
    UnorderedSamples(usize),
    #[error("random range must be at least 2, got {0}")]
    RandomRange(u64),
    #[error("coefficient set is empty")]
    EmptyCoefficients,
    #[error("value `{0}` is not finite")]
    NonFinite(&'static str),
    #[error("selector needs exactly 2 pieces, got {0}")]
    PieceCount(usize),
}

/// A scaled value that does not fit the declared bit width or ring.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value {value} does not fit into {bits} bits")]
pub struct OverflowError {
    pub value: i128,
    pub bits: u32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApproxError {
    #[error("invalid approximation config")]
    Config(#[from] ConfigError),
    #[error("target function is not finite at {x} (got {value})")]
    NonFiniteSample { x: f64, value: f64 },
    #[error("breakpoint of segment {index} ({value}) is below its predecessor ({previous})")]
    NonMonotonic {
        index: usize,
        previous: i128,
        value: i128,
    },
    #[error("segment {index} starts at {value}, its predecessor ends at {previous}")]
    Gap {
        index: usize,
        previous: i128,
        value: i128,
    },
    #[error("scaled value overflows")]
    Overflow(#[from] OverflowError),
    #[error("expected {expected} segment products, got {actual}")]
    ProductCount { expected: usize, actual: usize },
    #[error("decision node {0} refers to a missing node or segment")]
    MalformedTree(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorError {
    #[error("invalid test vector config")]
    Config(#[from] ConfigError),
    #[error("test vector value overflows the ring")]
    Overflow(#[from] OverflowError),
    #[error("test vector has no field `{0}`")]
    MissingField(String),
}
