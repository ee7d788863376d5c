//! Configuration for chart extraction.
//!
//! [`ExtractOptions`] carries the per-request knobs of
//! [`ChartExtractor::extract`](crate::hybrid::ChartExtractor::extract);
//! [`RemoteServiceConfig`] carries the process-wide settings of the remote
//! vision/OCR service.

use crate::error::{Error, Result};
use crate::extractors::{ChartType, ScatterMethod};
use crate::geometry::CropBox;
use crate::hybrid::ExtractionMode;
use crate::transform::{ManualCalibration, ScaleKind};
use std::str::FromStr;

/// Default remote model for whole-chart extraction.
pub const DEFAULT_VISION_MODEL: &str = "pixtral-large-latest";

/// Default remote model for tick-label reading.
pub const DEFAULT_OCR_MODEL: &str = "pixtral-12b-2409";

/// Which engine reads tick labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrBackendKind {
    /// Local character-recognition engine
    #[default]
    Local,
    /// Remote vision-OCR service
    Remote,
}

impl FromStr for OcrBackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "tesseract" => Ok(OcrBackendKind::Local),
            "remote" | "mistral" => Ok(OcrBackendKind::Remote),
            other => Err(Error::BackendUnavailable(format!("unknown OCR backend '{}'", other))),
        }
    }
}

/// Manually supplied axis pixel positions.
///
/// Any field left `None` is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisOverrides {
    /// Row of the x-axis line
    pub x_axis_row: Option<u32>,
    /// Column of the y-axis line
    pub y_axis_col: Option<u32>,
}

/// Per-request extraction options.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Plot area to use instead of detecting one
    pub crop: Option<CropBox>,

    /// Axis positions to use instead of detecting them
    pub axes: AxisOverrides,

    /// Scale of the x-axis
    pub x_scale: ScaleKind,

    /// Scale of the y-axis
    pub y_scale: ScaleKind,

    /// Chart type to use instead of classifying the image
    pub chart_type: Option<ChartType>,

    /// Scatter detection strategy
    pub scatter_method: ScatterMethod,

    /// Manual calibration; skips tick-label recognition when set
    pub calibration: Option<ManualCalibration>,

    /// Vision, pipeline, or vision-then-pipeline
    pub mode: ExtractionMode,

    /// Tick-label backend
    pub ocr_backend: OcrBackendKind,

    /// Read and write the OCR cache
    pub use_cache: bool,

    /// Render a debug overlay onto the result
    pub overlay: bool,

    /// Pixels the detected plot area is shrunk by
    pub margin: u32,

    /// Downscale large images before detection
    pub preprocess: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self {
            crop: None,
            axes: AxisOverrides::default(),
            x_scale: ScaleKind::Linear,
            y_scale: ScaleKind::Linear,
            chart_type: None,
            scatter_method: ScatterMethod::Auto,
            calibration: None,
            mode: ExtractionMode::Pipeline,
            ocr_backend: OcrBackendKind::Local,
            use_cache: true,
            overlay: false,
            margin: 5,
            preprocess: true,
        }
    }

    /// Use a fixed plot area.
    pub fn with_crop(mut self, crop: CropBox) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Use fixed axis positions.
    pub fn with_axes(mut self, axes: AxisOverrides) -> Self {
        self.axes = axes;
        self
    }

    /// Set both axis scales.
    pub fn with_scales(mut self, x_scale: ScaleKind, y_scale: ScaleKind) -> Self {
        self.x_scale = x_scale;
        self.y_scale = y_scale;
        self
    }

    /// Force a chart type.
    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    /// Choose the scatter detection strategy.
    pub fn with_scatter_method(mut self, method: ScatterMethod) -> Self {
        self.scatter_method = method;
        self
    }

    /// Calibrate manually instead of reading tick labels.
    pub fn with_calibration(mut self, calibration: ManualCalibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// Set the extraction mode.
    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Choose the tick-label backend.
    pub fn with_ocr_backend(mut self, backend: OcrBackendKind) -> Self {
        self.ocr_backend = backend;
        self
    }

    /// Enable or disable the OCR cache.
    pub fn with_cache(mut self, enable: bool) -> Self {
        self.use_cache = enable;
        self
    }

    /// Enable or disable the debug overlay.
    pub fn with_overlay(mut self, enable: bool) -> Self {
        self.overlay = enable;
        self
    }

    /// Set the plot-area margin.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Enable or disable downscaling.
    pub fn with_preprocess(mut self, enable: bool) -> Self {
        self.preprocess = enable;
        self
    }
}

/// Settings of the remote vision/OCR service.
///
/// The API key is handed to whatever [`VisionChannel`](crate::vision::VisionChannel)
/// implementation talks to the service; the model names travel with every request.
#[derive(Debug, Clone)]
pub struct RemoteServiceConfig {
    /// Service credential
    pub api_key: String,
    /// Model used for whole-chart extraction
    pub vision_model: String,
    /// Model used for tick-label reading
    pub ocr_model: String,
}

impl RemoteServiceConfig {
    /// Create a configuration with the default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// `MISTRAL_API_KEY` is required; `CHART_OXIDE_VISION_MODEL` and
    /// `CHART_OXIDE_OCR_MODEL` override the default models.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] when the key is unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("MISTRAL_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::MissingCredential("MISTRAL_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Some(model) = lookup("CHART_OXIDE_VISION_MODEL").filter(|m| !m.is_empty()) {
            config.vision_model = model;
        }
        if let Some(model) = lookup("CHART_OXIDE_OCR_MODEL").filter(|m| !m.is_empty()) {
            config.ocr_model = model;
        }
        Ok(config)
    }

    /// Override the vision model.
    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    /// Override the OCR model.
    pub fn with_ocr_model(mut self, model: impl Into<String>) -> Self {
        self.ocr_model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.crop.is_none());
        assert_eq!(options.mode, ExtractionMode::Pipeline);
        assert_eq!(options.ocr_backend, OcrBackendKind::Local);
        assert!(options.use_cache);
        assert!(!options.overlay);
        assert_eq!(options.margin, 5);
    }

    #[test]
    fn test_builder_chain() {
        let options = ExtractOptions::new()
            .with_chart_type(ChartType::Bar)
            .with_mode(ExtractionMode::Auto)
            .with_scales(ScaleKind::Linear, ScaleKind::Log)
            .with_cache(false)
            .with_overlay(true);
        assert_eq!(options.chart_type, Some(ChartType::Bar));
        assert_eq!(options.mode, ExtractionMode::Auto);
        assert_eq!(options.y_scale, ScaleKind::Log);
        assert!(!options.use_cache);
        assert!(options.overlay);
    }

    #[test]
    fn test_backend_tokens() {
        assert_eq!("tesseract".parse::<OcrBackendKind>().unwrap(), OcrBackendKind::Local);
        assert_eq!("Mistral".parse::<OcrBackendKind>().unwrap(), OcrBackendKind::Remote);
        assert!("easyocr".parse::<OcrBackendKind>().is_err());
    }

    #[test]
    fn test_remote_config_requires_key() {
        let err = RemoteServiceConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));

        let err = RemoteServiceConfig::from_lookup(lookup_from(&[("MISTRAL_API_KEY", "  ")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[test]
    fn test_remote_config_model_overrides() {
        let config = RemoteServiceConfig::from_lookup(lookup_from(&[
            ("MISTRAL_API_KEY", "secret"),
            ("CHART_OXIDE_OCR_MODEL", "ocr-small"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.vision_model, DEFAULT_VISION_MODEL);
        assert_eq!(config.ocr_model, "ocr-small");
    }
}
