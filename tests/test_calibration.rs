//! Integration tests for pixel-to-data calibration.

use chart_oxide::geometry::PixelPoint;
use chart_oxide::ocr::{TickMark, TickSet};
use chart_oxide::transform::{
    build_from_calibration, build_from_ticks, fit_axis, validate_calibration, CalibrationPoint,
    ManualCalibration, ScaleKind,
};
use chart_oxide::Error;
use proptest::prelude::*;

fn ticks(pairs: &[(f64, f64)]) -> Vec<TickMark> {
    pairs
        .iter()
        .map(|&(pixel, value)| TickMark::new(pixel, value, value.to_string()))
        .collect()
}

fn manual() -> ManualCalibration {
    ManualCalibration::new(
        [CalibrationPoint::new(50.0, 0.0), CalibrationPoint::new(550.0, 5.0)],
        [CalibrationPoint::new(350.0, 0.0), CalibrationPoint::new(50.0, 30.0)],
    )
}

// ============================================================================
// Fitting through ticks
// ============================================================================

#[test]
fn test_six_ticks_fit_exactly() {
    let x = ticks(&[(50.0, 0.0), (150.0, 1.0), (250.0, 2.0), (350.0, 3.0), (450.0, 4.0), (550.0, 5.0)]);
    let (axis, error) = fit_axis(&x, ScaleKind::Linear).unwrap();
    assert!((axis.slope - 0.01).abs() < 1e-12);
    assert!((axis.intercept + 0.5).abs() < 1e-12);
    assert!(error < 1e-12);
    assert!((axis.apply(250.0) - 2.0).abs() < 1e-12);
}

#[test]
fn test_tick_set_confidence_follows_fit_error() {
    let set = TickSet {
        x: ticks(&[(50.0, 0.0), (150.0, 1.0), (250.0, 2.0)]),
        y: ticks(&[(300.0, 0.0), (200.0, 10.0), (100.0, 20.0)]),
    };
    let outcome = build_from_ticks(&set, ScaleKind::Linear, ScaleKind::Linear);
    assert!(!outcome.is_degraded());
    assert!((outcome.confidence - 1.0).abs() < 1e-9);

    let point = outcome.value.apply(&PixelPoint::new(200.0, 250.0));
    assert!((point.x - 1.5).abs() < 1e-9);
    assert!((point.y - 5.0).abs() < 1e-9);
}

#[test]
fn test_single_tick_axis_is_identity() {
    let set = TickSet {
        x: ticks(&[(50.0, 0.0)]),
        y: ticks(&[(300.0, 0.0), (100.0, 20.0)]),
    };
    let outcome = build_from_ticks(&set, ScaleKind::Linear, ScaleKind::Linear);
    assert!(outcome.value.x.is_identity());
    assert!(!outcome.value.y.is_identity());
    assert!(outcome.failure.unwrap().contains("x-axis"));
}

#[test]
fn test_no_ticks_zero_confidence() {
    let outcome = build_from_ticks(&TickSet::default(), ScaleKind::Linear, ScaleKind::Log);
    assert_eq!(outcome.confidence, 0.0);
    assert!(outcome.value.x.is_identity() && outcome.value.y.is_identity());
}

#[test]
fn test_log_axis_decades() {
    let y = ticks(&[(300.0, 1.0), (200.0, 10.0), (100.0, 100.0)]);
    let (axis, error) = fit_axis(&y, ScaleKind::Log).unwrap();
    assert!(error < 1e-9);
    assert!((axis.apply(150.0) - 10f64.powf(1.5)).abs() < 1e-6);
}

// ============================================================================
// Manual calibration
// ============================================================================

#[test]
fn test_manual_two_point_mapping() {
    let transform = build_from_calibration(&manual(), ScaleKind::Linear, ScaleKind::Linear).unwrap();
    assert!((transform.x.slope - 0.01).abs() < 1e-12);
    assert!((transform.x.intercept + 0.5).abs() < 1e-12);
    assert!((transform.x.apply(250.0) - 2.0).abs() < 1e-12);
    assert!((transform.y.apply(200.0) - 15.0).abs() < 1e-9);
    assert_eq!(transform.fit_error, 0.0);
}

#[test]
fn test_manual_calibration_rejects_shared_pixel() {
    let mut calibration = manual();
    calibration.x[1].pixel = 50.0;
    let err = build_from_calibration(&calibration, ScaleKind::Linear, ScaleKind::Linear).unwrap_err();
    assert!(matches!(err, Error::DegenerateCalibration { axis: "x", .. }));
}

#[test]
fn test_manual_calibration_rejects_point_count() {
    let mut calibration = manual();
    calibration.x.push(CalibrationPoint::new(300.0, 2.5));
    assert!(matches!(
        validate_calibration(&calibration),
        Err(Error::InsufficientCalibration { axis: "x", found: 3 })
    ));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_log_mapping_is_monotonic(
        p1 in 0.0f64..500.0,
        gap in 1.0f64..500.0,
        v1 in 0.001f64..1000.0,
        ratio in 1.5f64..1000.0,
        a in 0.0f64..1000.0,
        b in 0.0f64..1000.0,
    ) {
        let axis_ticks = ticks(&[(p1, v1), (p1 + gap, v1 * ratio)]);
        let (axis, _) = fit_axis(&axis_ticks, ScaleKind::Log).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(axis.apply(lo) <= axis.apply(hi));
        prop_assert!(axis.apply(lo) > 0.0);
    }

    #[test]
    fn prop_manual_calibration_reproduces_reference_points(
        px1 in 0.0f64..400.0,
        dx in 1.0f64..400.0,
        vx1 in -100.0f64..100.0,
        vx2 in -100.0f64..100.0,
    ) {
        let calibration = ManualCalibration::new(
            [CalibrationPoint::new(px1, vx1), CalibrationPoint::new(px1 + dx, vx2)],
            [CalibrationPoint::new(10.0, 0.0), CalibrationPoint::new(20.0, 1.0)],
        );
        let transform = build_from_calibration(&calibration, ScaleKind::Linear, ScaleKind::Linear).unwrap();
        prop_assert!((transform.x.apply(px1) - vx1).abs() < 1e-6);
        prop_assert!((transform.x.apply(px1 + dx) - vx2).abs() < 1e-6);
    }
}
