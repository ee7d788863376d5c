//! Extraction results and warnings.

use crate::extractors::ChartType;
use crate::geometry::{AxesPosition, CropBox, DataPoint};
use crate::outcome::clamp_confidence;
use crate::transform::Transform;
use crate::tuning::CombineWeights;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of degradation a warning reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// Plot area came from a fallback detector
    CropFallback,
    /// An axis line was assumed at the plot-area edge
    AxisFallback,
    /// The requested OCR backend could not run
    OcrBackendUnavailable,
    /// Batched remote OCR failed, labels were read one by one
    OcrRemoteFallback,
    /// Remote OCR values did not line up with the detected ticks
    OcrAlignmentMismatch,
    /// Few tick labels could be read
    OcrLowConfidence,
    /// An axis fell back to the identity transform
    TransformIdentity,
    /// Tick values fit a straight line poorly
    HighFitError,
    /// The chart-type extractor used a fallback or found little
    ExtractionDegraded,
    /// Some points mapped to non-finite values and were dropped
    NonFiniteValues,
    /// Vision extraction failed and the pipeline ran instead
    VisionFallback,
}

impl WarningCode {
    /// Wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::CropFallback => "CROP_FALLBACK",
            WarningCode::AxisFallback => "AXIS_FALLBACK",
            WarningCode::OcrBackendUnavailable => "OCR_BACKEND_UNAVAILABLE",
            WarningCode::OcrRemoteFallback => "OCR_REMOTE_FALLBACK",
            WarningCode::OcrAlignmentMismatch => "OCR_ALIGNMENT_MISMATCH",
            WarningCode::OcrLowConfidence => "OCR_LOW_CONFIDENCE",
            WarningCode::TransformIdentity => "TRANSFORM_IDENTITY",
            WarningCode::HighFitError => "HIGH_FIT_ERROR",
            WarningCode::ExtractionDegraded => "EXTRACTION_DEGRADED",
            WarningCode::NonFiniteValues => "NON_FINITE_VALUES",
            WarningCode::VisionFallback => "VISION_FALLBACK",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal degradation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// What kind of degradation
    pub code: WarningCode,
    /// Human-readable detail
    pub message: String,
}

impl Warning {
    /// Create a warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Confidence of every pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageConfidence {
    /// Plot-area detection
    pub crop: f64,
    /// Axis and tick location
    pub axes: f64,
    /// Tick-label recognition
    pub ocr: f64,
    /// Transform fit (`1 - fit_error`)
    pub fit: f64,
    /// Chart-type extraction
    pub extraction: f64,
}

impl StageConfidence {
    /// Weighted mean of the stage confidences, clamped to `[0, 1]`.
    ///
    /// Non-decreasing in every stage confidence for non-negative weights.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::pipeline::StageConfidence;
    /// use chart_oxide::tuning::CombineWeights;
    ///
    /// let all = |c| StageConfidence { crop: c, axes: c, ocr: c, fit: c, extraction: c };
    /// let weights = CombineWeights::default();
    /// assert!((all(0.8).combine(&weights) - 0.8).abs() < 1e-9);
    /// assert!(all(0.5).combine(&weights) < all(0.6).combine(&weights));
    /// ```
    pub fn combine(&self, weights: &CombineWeights) -> f64 {
        let parts = [
            (self.crop, weights.crop),
            (self.axes, weights.axes),
            (self.ocr, weights.ocr),
            (self.fit, weights.fit),
            (self.extraction, weights.extraction),
        ];
        let total: f64 = parts.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted: f64 = parts
            .iter()
            .map(|(c, w)| clamp_confidence(*c) * w.max(0.0))
            .sum();
        clamp_confidence(weighted / total)
    }
}

/// Which strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// The multi-stage pipeline
    Pipeline,
    /// The vision-language model
    Vision,
}

/// Terminal output of one extraction.
///
/// Pixel-space fields (`crop`, `axes`) refer to the image the pipeline
/// worked on, which is the input downscaled by `scale`.
#[derive(Debug, Clone, Serialize)]
pub struct ChartResult {
    /// Chart type extracted (forced, classified or reported by the model)
    pub chart_type: ChartType,
    /// Data points in value space, ordered left to right
    pub data: Vec<DataPoint>,
    /// Overall confidence in `[0, 1]`
    pub confidence: f64,
    /// Per-stage confidences (pipeline results only)
    pub stages: Option<StageConfidence>,
    /// Degradations met on the way, in order
    pub warnings: Vec<Warning>,
    /// X-axis title, when known
    pub x_label: Option<String>,
    /// Y-axis title, when known
    pub y_label: Option<String>,
    /// Strategy that produced the data
    pub source: ResultSource,
    /// Plot area used (pipeline results only)
    pub crop: Option<CropBox>,
    /// Axis positions used (pipeline results only)
    pub axes: Option<AxesPosition>,
    /// Pixel-to-value mapping used (pipeline results only)
    pub transform: Option<Transform>,
    /// Downscale factor applied before detection
    pub scale: f64,
    /// Diagnostic rendering, only when requested
    #[serde(skip)]
    pub overlay: Option<RgbImage>,
}

impl ChartResult {
    /// Whether any warning with `code` was recorded.
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}
