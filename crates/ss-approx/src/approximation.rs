//! End-to-end approximation of a target function: sampling, fixed-point scaling and the
//! decision procedure, plus a plaintext oracle for the products the circuit receives.
use serde::Serialize;
use tracing::info;

use crate::config::ApproximationConfig;
use crate::decision::DecisionProcedure;
use crate::errors::ApproxError;
use crate::fixed_point::FixedPoint;
use crate::render::Rendered;
use crate::segment::{FixedSegment, SampleGrid, SegmentTable, Target};

/// A piecewise linear fixed-point approximation together with the decision procedure
/// selecting its segments.
#[derive(Clone, Debug, Serialize)]
pub struct Approximation {
    config: ApproximationConfig,
    #[serde(skip)]
    table: SegmentTable,
    segments: Vec<FixedSegment>,
    procedure: DecisionProcedure,
}

impl Approximation {
    /// Approximates `f` on the uniform grid described by `config`.
    pub fn build(config: &ApproximationConfig, f: impl Fn(f64) -> f64) -> Result<Self, ApproxError> {
        config.validate()?;
        let grid = SampleGrid::uniform(config.domain_start, config.domain_end, config.sample_count)?;
        Self::with_grid(config, &grid, f)
    }

    pub fn for_target(config: &ApproximationConfig, target: Target) -> Result<Self, ApproxError> {
        Self::build(config, |x| target.eval(x))
    }

    /// Approximates `f` on an explicit grid. The domain and sample count of `config` are
    /// ignored.
    #[tracing::instrument(level = "debug", skip(grid, f))]
    pub fn with_grid(
        config: &ApproximationConfig,
        grid: &SampleGrid,
        f: impl Fn(f64) -> f64,
    ) -> Result<Self, ApproxError> {
        config.validate()?;
        let fp = config.fixed_point();
        let table = SegmentTable::build(f, grid)?;
        let segments = table.to_fixed(&fp)?;
        let procedure = DecisionProcedure::build(&segments, config.correction as i128)?;
        info!(
            name = %config.name,
            segments = segments.len(),
            scale_bits = config.scale_bits,
            "Built approximation"
        );
        Ok(Self {
            config: config.clone(),
            table,
            segments,
            procedure,
        })
    }

    pub fn config(&self) -> &ApproximationConfig {
        &self.config
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    pub fn segments(&self) -> &[FixedSegment] {
        &self.segments
    }

    pub fn procedure(&self) -> &DecisionProcedure {
        &self.procedure
    }

    pub fn fixed_point(&self) -> FixedPoint {
        self.config.fixed_point()
    }

    /// Plaintext products `slope_i * x + intercept_i` of every segment at the fixed-point
    /// input `x`, as the circuit receives them.
    pub fn products(&self, x: i128) -> Result<Vec<i128>, ApproxError> {
        let fp = self.fixed_point();
        self.segments.iter().map(|seg| seg.eval(x, &fp)).collect()
    }

    /// Evaluates the approximation at the fixed-point input `x`, correction included.
    pub fn evaluate(&self, x: i128) -> Result<i128, ApproxError> {
        let products = self.products(x)?;
        self.procedure.evaluate(x, &products)
    }

    pub fn evaluate_real(&self, x: f64) -> Result<f64, ApproxError> {
        let fp = self.fixed_point();
        let result = self.evaluate(fp.encode(x)?)?;
        Ok(fp.decode(result))
    }

    pub fn rendered(&self) -> Rendered<'_> {
        Rendered::new(&self.procedure, &self.config.name, self.config.value_bits)
    }

    pub fn render(&self) -> String {
        self.rendered().to_string()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
