//! Top-level chart extractor.
//!
//! Owns the injected collaborators (character-recognition engine, optional
//! vision channel, optional cache) and drives the [`ArbiterState`] machine
//! between the vision model and the pipeline.

use super::arbiter::{ArbiterState, ExtractionMode};
use crate::cache::CacheStore;
use crate::chart_image::ChartImage;
use crate::config::{ExtractOptions, RemoteServiceConfig, DEFAULT_OCR_MODEL, DEFAULT_VISION_MODEL};
use crate::error::{Error, Result};
use crate::extractors::ChartType;
use crate::ocr::{TesseractCli, TextRecognizer};
use crate::pipeline::{ChartResult, Pipeline, ResultSource, Warning, WarningCode};
use crate::tuning::Tuning;
use crate::vision::{VisionChannel, VisionExtractor};
use std::sync::Arc;

/// Chart-to-data extractor.
///
/// # Example
///
/// ```no_run
/// use chart_oxide::{ChartExtractor, ChartImage, ExtractOptions};
///
/// let extractor = ChartExtractor::new();
/// let image = ChartImage::open("chart.png")?;
/// let result = extractor.extract(&image, &ExtractOptions::default())?;
/// for point in &result.data {
///     println!("{}, {}", point.x, point.y);
/// }
/// # Ok::<(), chart_oxide::Error>(())
/// ```
pub struct ChartExtractor {
    ocr: Box<dyn TextRecognizer>,
    vision: Option<Box<dyn VisionChannel>>,
    vision_model: String,
    ocr_model: String,
    cache: Option<Arc<dyn CacheStore>>,
    tuning: Tuning,
}

impl Default for ChartExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartExtractor {
    /// Create an extractor using `tesseract` for tick labels, without a
    /// vision channel or cache.
    pub fn new() -> Self {
        Self {
            ocr: Box::new(TesseractCli::new()),
            vision: None,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            cache: None,
            tuning: Tuning::default(),
        }
    }

    /// Replace the local character-recognition engine.
    pub fn with_text_recognizer(mut self, ocr: Box<dyn TextRecognizer>) -> Self {
        self.ocr = ocr;
        self
    }

    /// Attach a vision-language channel (vision mode and remote OCR).
    pub fn with_vision_channel(mut self, channel: Box<dyn VisionChannel>) -> Self {
        self.vision = Some(channel);
        self
    }

    /// Take the model names from a service configuration.
    pub fn with_service_config(mut self, config: &RemoteServiceConfig) -> Self {
        self.vision_model = config.vision_model.clone();
        self.ocr_model = config.ocr_model.clone();
        self
    }

    /// Share a tick-label cache.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the heuristic tuning.
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Tuning in use.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Extract the data series of a chart.
    ///
    /// # Arguments
    ///
    /// * `image` - The decoded chart
    /// * `options` - Overrides, scales, mode and switches for this request
    ///
    /// # Returns
    ///
    /// A populated result, possibly low-confidence and with warnings.
    ///
    /// # Errors
    ///
    /// - [`Error::BackendUnavailable`] in vision mode without a channel
    /// - [`Error::VisionFailed`] when the vision model fails in vision mode
    /// - any pipeline error (invalid overrides, no usable result)
    pub fn extract(&self, image: &ChartImage, options: &ExtractOptions) -> Result<ChartResult> {
        let mode = options.mode;
        let mut state = ArbiterState::initial(mode);
        log::debug!("Extraction mode {}, starting in {}", mode, state.name());

        loop {
            state = match state {
                ArbiterState::TryVision => ArbiterState::after_vision(mode, self.try_vision(image, options))?,
                ArbiterState::Accept(result) => ArbiterState::Done(result),
                ArbiterState::FallbackToPipeline { reason } => {
                    let mut result = self.run_pipeline(image, options)?;
                    if let Some(reason) = reason {
                        log::warn!("Vision extraction failed ({}), using pipeline", reason);
                        result.warnings.insert(
                            0,
                            Warning::new(
                                WarningCode::VisionFallback,
                                format!("vision extraction failed, used pipeline: {}", reason),
                            ),
                        );
                    }
                    ArbiterState::Done(Box::new(result))
                },
                ArbiterState::Done(result) => return Ok(*result),
            };
        }
    }

    fn try_vision(&self, image: &ChartImage, options: &ExtractOptions) -> Result<ChartResult> {
        let channel = self
            .vision
            .as_deref()
            .ok_or_else(|| Error::BackendUnavailable("no vision channel configured".to_string()))?;

        let outcome = VisionExtractor::new(channel, self.vision_model.as_str()).extract(image);
        let extraction = match outcome.value {
            Some(extraction) if !extraction.data.is_empty() => extraction,
            _ => {
                let reason = outcome.failure.unwrap_or_else(|| "No data extracted".to_string());
                return Err(Error::VisionFailed(reason));
            },
        };

        let chart_type = options
            .chart_type
            .or(extraction.chart_type)
            .unwrap_or(ChartType::Scatter);
        if options.overlay {
            log::debug!("Overlay not available for vision results");
        }

        Ok(ChartResult {
            chart_type,
            data: extraction.data,
            confidence: outcome.confidence,
            stages: None,
            warnings: Vec::new(),
            x_label: extraction.x_label,
            y_label: extraction.y_label,
            source: ResultSource::Vision,
            crop: None,
            axes: None,
            transform: None,
            scale: 1.0,
            overlay: None,
        })
    }

    fn run_pipeline(&self, image: &ChartImage, options: &ExtractOptions) -> Result<ChartResult> {
        let mut pipeline = Pipeline::new(self.ocr.as_ref(), &self.tuning);
        if let Some(channel) = self.vision.as_deref() {
            pipeline = pipeline.with_remote_ocr(channel, &self.ocr_model);
        }
        if let Some(cache) = self.cache.as_deref() {
            pipeline = pipeline.with_cache(cache);
        }
        pipeline.run(image, options)
    }
}
