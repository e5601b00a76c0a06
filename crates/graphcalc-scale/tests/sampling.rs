use graphcalc_eval::AngleUnit;
use graphcalc_scale::{sample_coordinates, ConfigurationError, ScaleMode, ScaleTransform, LOG_FLOOR};

#[test]
fn linear_sampling_is_evenly_spaced_with_exact_endpoints() {
    let xs = sample_coordinates(ScaleMode::Linear, -10.0, 10.0, 1000).unwrap();
    assert_eq!(xs.len(), 1000);
    assert_eq!(xs[0], -10.0);
    assert_eq!(xs[999], 10.0);
    let step = 20.0 / 999.0;
    for w in xs.windows(2) {
        assert!(((w[1] - w[0]) - step).abs() < 1e-9);
    }
}

#[test]
fn log_sampling_never_reaches_zero() {
    for n in [1, 2, 10, 1000] {
        let xs = sample_coordinates(ScaleMode::Log, 1e-12, 100.0, n).unwrap();
        assert_eq!(xs.len(), n);
        assert!(xs.iter().all(|&x| x > 0.0), "n = {n}");
        assert_eq!(xs[0], LOG_FLOOR);
    }
}

#[test]
fn log_sampling_clamps_negative_start() {
    let xs = sample_coordinates(ScaleMode::Log, -5.0, 10.0, 50).unwrap();
    assert_eq!(xs[0], LOG_FLOOR);
    assert_eq!(*xs.last().unwrap(), 10.0);
    assert!(xs.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn single_sample_is_the_start() {
    assert_eq!(sample_coordinates(ScaleMode::Linear, 2.0, 3.0, 1).unwrap(), vec![2.0]);
}

#[test]
fn invalid_configurations_are_reported() {
    assert_eq!(
        sample_coordinates(ScaleMode::Linear, 0.0, 1.0, 0),
        Err(ConfigurationError::ZeroResolution)
    );
    assert!(matches!(
        sample_coordinates(ScaleMode::Linear, 1.0, 1.0, 10),
        Err(ConfigurationError::EmptyDomain { .. })
    ));
    assert!(matches!(
        sample_coordinates(ScaleMode::Degrees, 5.0, -5.0, 10),
        Err(ConfigurationError::EmptyDomain { .. })
    ));
    assert!(matches!(
        sample_coordinates(ScaleMode::Linear, f64::NEG_INFINITY, 1.0, 10),
        Err(ConfigurationError::NonFiniteBounds { .. })
    ));
    assert!(matches!(
        sample_coordinates(ScaleMode::Log, -3.0, 1e-11, 10),
        Err(ConfigurationError::LogRangeBelowFloor { .. })
    ));
    assert!(matches!(
        "spiral".parse::<ScaleMode>(),
        Err(ConfigurationError::UnknownScaleMode(name)) if name == "spiral"
    ));
}

#[test]
fn polar_and_parametric_accept_reversed_ranges() {
    let xs = sample_coordinates(ScaleMode::Polar, 6.0, 0.0, 4).unwrap();
    assert_eq!(xs, vec![6.0, 4.0, 2.0, 0.0]);
    assert!(sample_coordinates(ScaleMode::Parametric, 0.0, 0.0, 3).is_ok());
}

#[test]
fn labels_follow_the_mode() {
    assert_eq!(ScaleMode::Linear.axis_label("x"), "x");
    assert_eq!(ScaleMode::Log.axis_label("x"), "x (log)");
    assert_eq!(ScaleMode::Degrees.axis_label("x"), "x (degrees)");
    assert_eq!(ScaleMode::Parametric.axis_label("x"), "t (ms)");
    assert_eq!(ScaleMode::Polar.axis_label("x"), "θ");
}

#[test]
fn millisecond_mode_forces_time_label() {
    let axis = ScaleTransform::new(ScaleMode::Linear)
        .with_millisecond_mode(true)
        .sample("x", 0.0, 1000.0, 11)
        .unwrap();
    assert_eq!(axis.label, "t (ms)");
    assert_eq!(axis.coordinates[1], 100.0);
}

#[test]
fn degree_axis_reports_degree_angles() {
    let axis = ScaleTransform::new(ScaleMode::Degrees).sample("x", 0.0, 360.0, 5).unwrap();
    assert_eq!(axis.angle_unit, AngleUnit::Degrees);
    assert_eq!(axis.coordinates, vec![0.0, 90.0, 180.0, 270.0, 360.0]);
    assert_eq!(ScaleMode::Linear.angle_unit(), AngleUnit::Radians);
}

#[test]
fn scale_mode_serde_names() {
    let mode: ScaleMode = serde_json::from_str("\"logarithmic\"").unwrap();
    assert_eq!(mode, ScaleMode::Log);
    assert_eq!(serde_json::to_string(&ScaleMode::Parametric).unwrap(), "\"parametric\"");
}
