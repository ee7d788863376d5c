//! Multi-stage chart extraction pipeline.
//!
//! ```text
//! ChartImage
//!     ↓
//! [preprocess]          (downscale to the working size)
//!     ↓
//! [detect_plot_area]    (or the crop override)
//!     ↓
//! [locate_axes]         (axis lines + tick pixels)
//!     ↓
//! [TickLabelRecognizer] (skipped with manual calibration)
//!     ↓
//! [Transform]           (tick fit or manual calibration)
//!     ↓
//! [extractors]          (pixel points per chart type)
//!     ↓
//! ChartResult           (points mapped to value space)
//! ```
//!
//! Every stage returns a best-effort [`Outcome`](crate::outcome::Outcome).
//! Degraded stages become [`Warning`]s; the run only fails when the request
//! is malformed or no data points could be extracted.

pub mod result;

pub use result::{ChartResult, ResultSource, StageConfidence, Warning, WarningCode};

use crate::cache::CacheStore;
use crate::chart_image::ChartImage;
use crate::config::{AxisOverrides, ExtractOptions};
use crate::debug::OverlayRenderer;
use crate::error::{Error, Result};
use crate::extractors::{classify_chart, extract_points};
use crate::geometry::CropBox;
use crate::layout::{detect_plot_area, locate_axes, AxisLayout};
use crate::ocr::{OcrIssue, RemoteOcr, TextRecognizer, TickLabelRecognizer};
use crate::outcome::Outcome;
use crate::transform::{build_from_calibration, build_from_ticks, CalibrationPoint, ManualCalibration, Transform};
use crate::tuning::Tuning;
use crate::vision::VisionChannel;

/// The computer-vision extraction pipeline.
///
/// Borrows its collaborators; construct one per request or keep it around,
/// it holds no per-request state.
pub struct Pipeline<'a> {
    ocr: &'a dyn TextRecognizer,
    remote: Option<(&'a dyn VisionChannel, &'a str)>,
    cache: Option<&'a dyn CacheStore>,
    tuning: &'a Tuning,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline reading tick labels with a local engine.
    pub fn new(ocr: &'a dyn TextRecognizer, tuning: &'a Tuning) -> Self {
        Self {
            ocr,
            remote: None,
            cache: None,
            tuning,
        }
    }

    /// Enable the remote OCR backend over `channel`, asking for `model`.
    pub fn with_remote_ocr(mut self, channel: &'a dyn VisionChannel, model: &'a str) -> Self {
        self.remote = Some((channel, model));
        self
    }

    /// Cache tick-label readings (when the request allows it).
    pub fn with_cache(mut self, cache: &'a dyn CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run the pipeline on one image.
    ///
    /// # Arguments
    ///
    /// * `image` - The chart image
    /// * `options` - Per-request overrides and switches
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCrop`] when the crop override does not fit the image
    /// - [`Error::InsufficientCalibration`] / [`Error::DegenerateCalibration`]
    ///   for unusable manual calibration
    /// - [`Error::NoUsableResult`] when no data point could be extracted
    pub fn run(&self, image: &ChartImage, options: &ExtractOptions) -> Result<ChartResult> {
        let tuning = self.tuning;
        let mut warnings = Vec::new();

        if let Some(crop) = &options.crop {
            if !crop.fits(image.width(), image.height()) {
                return Err(Error::InvalidCrop(format!(
                    "({}, {}, {}, {}) does not fit image {}x{}",
                    crop.x1,
                    crop.y1,
                    crop.x2,
                    crop.y2,
                    image.width(),
                    image.height()
                )));
            }
        }

        let (work, scale) = if options.preprocess {
            image.preprocess(tuning.max_image_side)
        } else {
            (image.clone(), 1.0)
        };
        log::info!("Pipeline: {}x{} working image (scale {:.3})", work.width(), work.height(), scale);

        // Plot area
        let crop = match &options.crop {
            Some(crop) => Outcome::ok(scale_crop(crop, scale, work.width(), work.height()), 1.0),
            None => detect_plot_area(work.gray(), options.margin, &tuning.plot_area),
        };
        note(&mut warnings, WarningCode::CropFallback, &crop);
        let crop_confidence = crop.confidence;
        let crop = crop.value;

        // Axes and ticks
        let overrides = AxisOverrides {
            x_axis_row: options.axes.x_axis_row.map(|row| scale_pixel(row, scale)),
            y_axis_col: options.axes.y_axis_col.map(|col| scale_pixel(col, scale)),
        };
        let layout = locate_axes(work.gray(), &crop, overrides, &tuning.axes);
        note(&mut warnings, WarningCode::AxisFallback, &layout);
        let axes_confidence = layout.confidence;
        let layout = layout.value;

        // Calibration
        let (transform, ocr_confidence, fit_confidence) = match &options.calibration {
            Some(calibration) => {
                log::debug!("Using manual calibration, tick OCR skipped");
                let scaled = scale_calibration(calibration, scale);
                let transform = build_from_calibration(&scaled, options.x_scale, options.y_scale)?;
                (transform, 1.0, 1.0)
            },
            None => self.calibrate_from_ticks(&work, &layout, options, &mut warnings),
        };

        // Extraction
        let chart_type = options
            .chart_type
            .unwrap_or_else(|| classify_chart(&work, &crop, tuning));
        let points = extract_points(chart_type, &work, &crop, options.scatter_method, tuning);
        note(&mut warnings, WarningCode::ExtractionDegraded, &points);
        let extraction_confidence = points.confidence;
        let points = points.value;

        if points.is_empty() {
            return Err(Error::NoUsableResult(format!("no data points found in the {} chart", chart_type)));
        }

        let mapped = transform.apply_all(&points);
        let total = mapped.len();
        let data: Vec<_> = mapped
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .collect();
        if data.len() < total {
            warnings.push(Warning::new(
                WarningCode::NonFiniteValues,
                format!("{} of {} points mapped to non-finite values and were dropped", total - data.len(), total),
            ));
        }
        if data.is_empty() {
            return Err(Error::NoUsableResult("every extracted point mapped to a non-finite value".to_string()));
        }

        let stages = StageConfidence {
            crop: crop_confidence,
            axes: axes_confidence,
            ocr: ocr_confidence,
            fit: fit_confidence,
            extraction: extraction_confidence,
        };
        let confidence = stages.combine(&tuning.weights);
        log::info!(
            "Pipeline: {} {} points, confidence {:.2}, {} warnings",
            data.len(),
            chart_type,
            confidence,
            warnings.len()
        );

        let overlay = options.overlay.then(|| {
            OverlayRenderer::default().render(work.rgb(), &crop, &layout.position, chart_type, &points)
        });

        Ok(ChartResult {
            chart_type,
            data,
            confidence,
            stages: Some(stages),
            warnings,
            x_label: None,
            y_label: None,
            source: ResultSource::Pipeline,
            crop: Some(crop),
            axes: Some(layout.position),
            transform: Some(transform),
            scale,
            overlay,
        })
    }

    /// Read tick labels and fit the transform.
    ///
    /// Returns the transform with the OCR and fit confidences.
    fn calibrate_from_ticks(
        &self,
        work: &ChartImage,
        layout: &AxisLayout,
        options: &ExtractOptions,
        warnings: &mut Vec<Warning>,
    ) -> (Transform, f64, f64) {
        let tuning = self.tuning;
        let mut recognizer = TickLabelRecognizer::new(self.ocr, &tuning.ocr);
        if let Some((channel, model)) = self.remote {
            recognizer = recognizer.with_remote(RemoteOcr::new(channel, model));
        }
        if let (true, Some(cache)) = (options.use_cache, self.cache) {
            recognizer = recognizer.with_cache(cache);
        }

        let reading = recognizer.recognize(work.gray(), layout, options.ocr_backend);
        for issue in &reading.value.issues {
            let code = match issue {
                OcrIssue::RemoteUnavailable(_) | OcrIssue::EngineUnavailable(_) => WarningCode::OcrBackendUnavailable,
                OcrIssue::RemoteFailed(_) => WarningCode::OcrRemoteFallback,
                OcrIssue::AlignmentMismatch { .. } => WarningCode::OcrAlignmentMismatch,
            };
            warnings.push(Warning::new(code, issue.to_string()));
        }
        if reading.confidence < tuning.low_ocr_confidence {
            warnings.push(Warning::new(
                WarningCode::OcrLowConfidence,
                format!(
                    "only {:.0}% of tick labels were read with {}",
                    reading.confidence * 100.0,
                    reading.value.backend
                ),
            ));
        }

        let transform = build_from_ticks(&reading.value.ticks, options.x_scale, options.y_scale);
        note(warnings, WarningCode::TransformIdentity, &transform);
        if transform.value.fit_error > tuning.high_fit_error {
            warnings.push(Warning::new(
                WarningCode::HighFitError,
                format!("tick values fit poorly (error {:.3})", transform.value.fit_error),
            ));
        }
        (transform.value, reading.confidence, transform.confidence)
    }
}

/// Turn a stage's failure reason into a warning.
fn note<T>(warnings: &mut Vec<Warning>, code: WarningCode, outcome: &Outcome<T>) {
    if let Some(reason) = &outcome.failure {
        log::warn!("[{}] {}", code, reason);
        warnings.push(Warning::new(code, reason.clone()));
    }
}

fn scale_pixel(value: u32, scale: f64) -> u32 {
    (value as f64 * scale).round() as u32
}

/// Map a crop from input to working coordinates, keeping it non-empty.
fn scale_crop(crop: &CropBox, scale: f64, width: u32, height: u32) -> CropBox {
    if scale == 1.0 {
        return *crop;
    }
    CropBox::clamped(
        (crop.x1 as f64 * scale).floor() as i64,
        (crop.y1 as f64 * scale).floor() as i64,
        (crop.x2 as f64 * scale).ceil() as i64,
        (crop.y2 as f64 * scale).ceil() as i64,
        width,
        height,
    )
    .unwrap_or_else(|| CropBox::full(width, height))
}

fn scale_calibration(calibration: &ManualCalibration, scale: f64) -> ManualCalibration {
    let scaled = |points: &[CalibrationPoint]| {
        points
            .iter()
            .map(|p| CalibrationPoint::new(p.pixel * scale, p.value))
            .collect()
    };
    ManualCalibration {
        x: scaled(&calibration.x),
        y: scaled(&calibration.y),
    }
}
