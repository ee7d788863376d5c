//! Pixel-to-value calibration.
//!
//! Each axis maps pixels to values with `value = slope * pixel + intercept`
//! on a linear scale, or `value = 10^(slope * pixel + intercept)` on a log
//! scale. The mapping comes either from two manual calibration points per
//! axis or from a least-squares fit through the recognized ticks.

use crate::error::{Error, Result};
use crate::geometry::{DataPoint, PixelPoint};
use crate::ocr::{TickMark, TickSet};
use crate::outcome::Outcome;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Values at or below zero are clamped to this before taking log10.
pub const LOG_EPSILON: f64 = 1e-10;

/// Axis scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    /// Evenly spaced values
    #[default]
    Linear,
    /// Evenly spaced decades
    Log,
}

impl FromStr for ScaleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ScaleKind::Linear),
            "log" => Ok(ScaleKind::Log),
            other => Err(Error::UnknownScale(other.to_string())),
        }
    }
}

impl ScaleKind {
    /// Fit target for a value on this scale.
    fn target(self, value: f64) -> f64 {
        match self {
            ScaleKind::Linear => value,
            ScaleKind::Log => value.max(LOG_EPSILON).log10(),
        }
    }
}

/// A manually supplied pixel/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Pixel position along the axis
    pub pixel: f64,
    /// Value at that pixel
    pub value: f64,
}

impl CalibrationPoint {
    /// Create a calibration point.
    pub fn new(pixel: f64, value: f64) -> Self {
        Self { pixel, value }
    }
}

/// Manual calibration: exactly two points per axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualCalibration {
    /// X-axis points (pixel = column)
    pub x: Vec<CalibrationPoint>,
    /// Y-axis points (pixel = row)
    pub y: Vec<CalibrationPoint>,
}

impl ManualCalibration {
    /// Calibration from two points per axis.
    pub fn new(x: [CalibrationPoint; 2], y: [CalibrationPoint; 2]) -> Self {
        Self {
            x: x.to_vec(),
            y: y.to_vec(),
        }
    }
}

/// Pixel-to-value mapping of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisTransform {
    /// Change of the fit target per pixel
    pub slope: f64,
    /// Fit target at pixel 0
    pub intercept: f64,
    /// Scale the fit target lives on
    pub scale: ScaleKind,
}

impl AxisTransform {
    /// The identity mapping: value equals pixel.
    pub fn identity() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            scale: ScaleKind::Linear,
        }
    }

    /// Whether this is the identity mapping.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Value at a pixel position.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::transform::{AxisTransform, ScaleKind};
    ///
    /// let log = AxisTransform { slope: 0.01, intercept: 0.0, scale: ScaleKind::Log };
    /// assert!((log.apply(200.0) - 100.0).abs() < 1e-9);
    /// ```
    pub fn apply(&self, pixel: f64) -> f64 {
        let t = self.slope * pixel + self.intercept;
        match self.scale {
            ScaleKind::Linear => t,
            ScaleKind::Log => 10f64.powf(t),
        }
    }

    /// Pixel position of a value, `None` when the mapping cannot be inverted
    /// there (zero slope, or a non-positive value on a log scale).
    pub fn invert(&self, value: f64) -> Option<f64> {
        if self.slope == 0.0 {
            return None;
        }
        let t = match self.scale {
            ScaleKind::Linear => value,
            ScaleKind::Log if value > 0.0 => value.log10(),
            ScaleKind::Log => return None,
        };
        Some((t - self.intercept) / self.slope)
    }
}

/// Mapping of both axes plus the quality of the fit that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// X-axis mapping
    pub x: AxisTransform,
    /// Y-axis mapping
    pub y: AxisTransform,
    /// Normalized mean residual in `[0, 1]`; 0 for manual calibration
    pub fit_error: f64,
}

impl Transform {
    /// Map a pixel point to value space.
    pub fn apply(&self, point: &PixelPoint) -> DataPoint {
        DataPoint::new(self.x.apply(point.x), self.y.apply(point.y))
    }

    /// Map many pixel points, preserving order.
    pub fn apply_all(&self, points: &[PixelPoint]) -> Vec<DataPoint> {
        points.iter().map(|p| self.apply(p)).collect()
    }
}

/// Check a manual calibration.
///
/// Each axis needs exactly two points at distinct, non-negative pixels.
/// Equal values on one axis are allowed but logged.
pub fn validate_calibration(calibration: &ManualCalibration) -> Result<()> {
    for (axis, points) in [("x", &calibration.x), ("y", &calibration.y)] {
        if points.len() != 2 {
            return Err(Error::InsufficientCalibration {
                axis,
                found: points.len(),
            });
        }
        let (p1, p2) = (points[0], points[1]);
        if !(p1.pixel.is_finite() && p2.pixel.is_finite() && p1.value.is_finite() && p2.value.is_finite()) {
            return Err(Error::DegenerateCalibration {
                axis,
                reason: "non-finite coordinate".to_string(),
            });
        }
        if p1.pixel == p2.pixel {
            return Err(Error::DegenerateCalibration {
                axis,
                reason: format!("both points at pixel {}", p1.pixel),
            });
        }
        if p1.pixel < 0.0 || p2.pixel < 0.0 {
            return Err(Error::DegenerateCalibration {
                axis,
                reason: "negative pixel coordinate".to_string(),
            });
        }
        if p1.value == p2.value {
            log::warn!("{}-axis calibration points share the value {}", axis, p1.value);
        }
    }
    Ok(())
}

/// Build the exact two-point mapping of each axis.
///
/// # Errors
///
/// [`Error::InsufficientCalibration`] or [`Error::DegenerateCalibration`]
/// when [`validate_calibration`] rejects the points.
///
/// # Examples
///
/// ```
/// use chart_oxide::transform::{build_from_calibration, CalibrationPoint, ManualCalibration, ScaleKind};
///
/// let calibration = ManualCalibration::new(
///     [CalibrationPoint::new(50.0, 0.0), CalibrationPoint::new(550.0, 5.0)],
///     [CalibrationPoint::new(350.0, 0.0), CalibrationPoint::new(50.0, 30.0)],
/// );
/// let transform = build_from_calibration(&calibration, ScaleKind::Linear, ScaleKind::Linear).unwrap();
/// assert!((transform.x.slope - 0.01).abs() < 1e-12);
/// assert!((transform.x.apply(250.0) - 2.0).abs() < 1e-9);
/// assert_eq!(transform.fit_error, 0.0);
/// ```
pub fn build_from_calibration(
    calibration: &ManualCalibration,
    x_scale: ScaleKind,
    y_scale: ScaleKind,
) -> Result<Transform> {
    validate_calibration(calibration)?;
    let two_point = |points: &[CalibrationPoint], scale: ScaleKind| {
        let (p1, p2) = (points[0], points[1]);
        let (t1, t2) = (scale.target(p1.value), scale.target(p2.value));
        let slope = (t2 - t1) / (p2.pixel - p1.pixel);
        AxisTransform {
            slope,
            intercept: t1 - slope * p1.pixel,
            scale,
        }
    };
    Ok(Transform {
        x: two_point(&calibration.x, x_scale),
        y: two_point(&calibration.y, y_scale),
        fit_error: 0.0,
    })
}

/// Least-squares degree-1 fit of one axis.
///
/// Returns the mapping and its normalized error, or `None` with fewer than
/// two ticks or when all ticks share one pixel.
pub fn fit_axis(ticks: &[TickMark], scale: ScaleKind) -> Option<(AxisTransform, f64)> {
    let samples: Vec<(f64, f64)> = ticks
        .iter()
        .filter(|t| t.pixel.is_finite() && t.value.is_finite())
        .map(|t| (t.pixel, scale.target(t.value)))
        .collect();
    if samples.len() < 2 {
        return None;
    }

    let n = samples.len() as f64;
    let mean_p = samples.iter().map(|s| s.0).sum::<f64>() / n;
    let mean_t = samples.iter().map(|s| s.1).sum::<f64>() / n;
    let var_p: f64 = samples.iter().map(|s| (s.0 - mean_p).powi(2)).sum();
    if var_p <= f64::EPSILON {
        return None;
    }
    let cov: f64 = samples.iter().map(|s| (s.0 - mean_p) * (s.1 - mean_t)).sum();
    let slope = cov / var_p;
    let intercept = mean_t - slope * mean_p;

    let mean_residual = samples
        .iter()
        .map(|&(p, t)| (slope * p + intercept - t).abs())
        .sum::<f64>()
        / n;
    let mean_abs_target = samples.iter().map(|s| s.1.abs()).sum::<f64>() / n;
    let error = if mean_abs_target > 0.0 {
        mean_residual / mean_abs_target
    } else {
        mean_residual
    };

    Some((
        AxisTransform {
            slope,
            intercept,
            scale,
        },
        error,
    ))
}

/// Fit both axes through recognized ticks.
///
/// An axis without a usable fit falls back to the identity mapping and the
/// outcome carries the reason. `fit_error` is the mean error over the
/// fitted axes, clamped to `[0, 1]`. The confidence is `1 - fit_error`.
pub fn build_from_ticks(ticks: &TickSet, x_scale: ScaleKind, y_scale: ScaleKind) -> Outcome<Transform> {
    let mut failures = Vec::new();
    let mut errors = Vec::new();

    let mut fit = |axis: &str, marks: &[TickMark], scale: ScaleKind| match fit_axis(marks, scale) {
        Some((transform, error)) => {
            log::debug!(
                "{}-axis fit: slope {:.6}, intercept {:.6}, error {:.4}",
                axis,
                transform.slope,
                transform.intercept,
                error
            );
            errors.push(error);
            transform
        },
        None => {
            log::warn!("{}-axis: {} usable ticks, using identity transform", axis, marks.len());
            failures.push(format!("{}-axis has fewer than 2 distinct ticks, identity transform used", axis));
            AxisTransform::identity()
        },
    };

    let x = fit("x", &ticks.x, x_scale);
    let y = fit("y", &ticks.y, y_scale);

    let fit_error = if errors.is_empty() {
        0.0
    } else {
        (errors.iter().sum::<f64>() / errors.len() as f64).clamp(0.0, 1.0)
    };
    let transform = Transform { x, y, fit_error };
    let confidence = if errors.is_empty() { 0.0 } else { 1.0 - fit_error };

    if failures.is_empty() {
        Outcome::ok(transform, confidence)
    } else {
        Outcome::degraded(transform, confidence, failures.join("; "))
    }
}
