use anyhow::Result;
use ss_approx::config::ApproximationConfig;
use ss_approx::fixed_point::scale;
use ss_approx::private_test_utils::init_tracing;
use ss_approx::segment::{SampleGrid, Target};
use ss_approx::{Approximation, DecisionProcedure};

#[test]
fn exp_reference_procedure() -> Result<()> {
    let _guard = init_tracing();
    let approx = Approximation::for_target(&ApproximationConfig::default(), Target::Exp)?;
    let segments = approx.segments();
    assert_eq!(segments.len(), 99);
    assert_eq!(segments[0].lower, -20971520);
    assert_eq!(segments[98].upper, 20971520);
    for pair in segments.windows(2) {
        assert_eq!(pair[0].upper, pair[1].lower);
    }

    let proc = approx.procedure();
    assert_eq!(proc.select(-20971521), 0);
    assert_eq!(proc.select(-20971520), 0);
    assert_eq!(proc.select(segments[1].lower), 0);
    assert_eq!(proc.select(segments[1].lower + 1), 1);
    assert_eq!(proc.select(segments[98].lower + 1), 98);
    assert_eq!(proc.select(i64::MAX as i128), 98);

    let text = approx.render();
    assert!(text.contains("if (sum < -20971520) {"));
    assert!(text.contains(&format!(
        "if (sum > {} && sum <= {}) {{",
        segments[0].lower, segments[0].upper
    )));
    assert!(text.contains(&format!("if (sum > {}) {{", segments[98].lower)));
    Ok(())
}

#[test]
fn config_from_yaml() -> Result<()> {
    let _guard = init_tracing();
    let config: ApproximationConfig = serde_yaml::from_str(
        "name: tanh\ndomain_start: -4.0\ndomain_end: 4.0\nsample_count: 9\n",
    )?;
    assert_eq!(config.scale_bits, 20);
    assert_eq!(config.value_bits, 64);
    let approx = Approximation::for_target(&config, Target::Tanh)?;
    assert_eq!(approx.segments().len(), 8);

    let json: serde_json::Value = serde_json::from_str(&approx.to_json()?)?;
    assert_eq!(json["config"]["name"], "tanh");
    assert_eq!(json["segments"].as_array().map(Vec::len), Some(8));
    let nodes = &json["procedure"]["nodes"];
    let root = &nodes[json["procedure"]["root"].as_u64().unwrap_or(u64::MAX) as usize];
    assert_eq!(root["branch"]["test"]["below"], -4194304);
    let then = root["branch"]["then"].as_u64().unwrap_or(u64::MAX) as usize;
    assert_eq!(nodes[then]["leaf"], 0);
    assert!(approx.render().starts_with("func ss_tanh(int64 x0, int64 x1, int64 r,"));
    Ok(())
}

#[test]
fn custom_function_on_explicit_grid() -> Result<()> {
    let _guard = init_tracing();
    let grid = SampleGrid::from_points(vec![-1.0, -0.25, 0.0, 0.5, 2.0])?;
    let config = ApproximationConfig {
        name: "square".into(),
        ..Default::default()
    };
    let approx = Approximation::with_grid(&config, &grid, |x| x * x)?;
    for seg in approx.table().segments() {
        assert!((seg.eval(seg.upper) - seg.upper * seg.upper).abs() < 1e-12);
        assert!((seg.eval(seg.lower) - seg.lower * seg.lower).abs() < 1e-12);
    }
    assert_eq!(approx.segments()[3].lower, scale(0.5, 20));
    // (0.5, 2.0) secant is 2.5x - 1
    let got = approx.evaluate_real(1.0)?;
    assert!((got - 1.5).abs() < 1e-5, "{got}");
    Ok(())
}

#[test]
fn shares_and_correction() -> Result<()> {
    let _guard = init_tracing();
    let config = ApproximationConfig {
        correction: 777,
        ..Default::default()
    };
    let approx = Approximation::for_target(&config, Target::Exp)?;
    let fp = approx.fixed_point();
    let x = fp.encode(0.5)?;
    let products = approx.products(x)?;
    let x0 = 123_456_789;
    let from_shares = approx
        .procedure()
        .evaluate_shares(x0, x - x0, &products)?;
    assert_eq!(from_shares, approx.evaluate(x)?);
    let selected = products[approx.procedure().select(x)];
    assert_eq!(from_shares, selected - 777);
    Ok(())
}

#[test]
fn reference_procedure_json_round_trip() -> Result<()> {
    let _guard = init_tracing();
    let approx = Approximation::for_target(&ApproximationConfig::default(), Target::Exp)?;
    let json = serde_json::to_string(approx.procedure())?;
    let back: DecisionProcedure = serde_json::from_str(&json)?;
    assert_eq!(&back, approx.procedure());
    assert_eq!(back.select(-20971520), 0);
    Ok(())
}

#[test]
fn many_samples_build_and_drop() -> Result<()> {
    let _guard = init_tracing();
    let config = ApproximationConfig {
        domain_start: -1.0,
        domain_end: 1.0,
        sample_count: 200_000,
        scale_bits: 40,
        ..Default::default()
    };
    let approx = Approximation::for_target(&config, Target::Exp)?;
    assert_eq!(approx.segments().len(), 199_999);
    assert_eq!(approx.procedure().depth(), 200_000);
    let got = approx.evaluate_real(0.5)?;
    assert!((got - 0.5_f64.exp()).abs() < 1e-6, "{got}");
    let json = serde_json::to_string(approx.procedure())?;
    let back: DecisionProcedure = serde_json::from_str(&json)?;
    assert_eq!(&back, approx.procedure());
    drop(approx);
    Ok(())
}
