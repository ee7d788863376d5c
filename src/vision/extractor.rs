//! Single-request chart extraction with a vision-language model.

use super::response::{as_number, parse_reply};
use super::{VisionChannel, VisionRequest};
use crate::chart_image::ChartImage;
use crate::extractors::ChartType;
use crate::geometry::DataPoint;
use crate::outcome::{clamp_confidence, Outcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Instruction sent with the chart image.
pub const EXTRACTION_PROMPT: &str = r#"You are extracting data from a chart. Be EXTREMELY precise.

TASK: Extract the X,Y coordinates of EVERY data point marker in this chart.

STEP 1 - ANALYZE AXES:
First, identify the axis ranges by reading the tick labels.

STEP 2 - LOCATE MARKERS:
For line charts: find every dot/marker on the line (not the line itself, the markers).
For scatter plots: find every dot.
For bar charts: measure the height of each bar.

STEP 3 - READ VALUES:
For EACH marker, look at its position and read:
- X: What X gridline or tick is it at or between?
- Y: What Y gridline is the marker at? If between gridlines, estimate precisely.

CRITICAL: Do NOT interpolate or assume patterns. Each point may have a UNIQUE value.
Many charts have irregular data - do not assume smooth curves.

Return JSON only:
{
    "chart_type": "line" or "scatter" or "bar",
    "x_label": "axis label",
    "y_label": "axis label",
    "data": [{"x": val, "y": val}, ...]
}

Example for irregular data:
{"data": [{"x": 0, "y": 5}, {"x": 1, "y": 8}, {"x": 2, "y": 12}, {"x": 3, "y": 15}]}
Note: each Y is different and not following a pattern."#;

const MAX_TOKENS: u32 = 4096;

/// Data read directly off a chart by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionExtraction {
    /// Chart type the model reported, if recognizable
    pub chart_type: Option<ChartType>,
    /// X-axis label
    pub x_label: Option<String>,
    /// Y-axis label
    pub y_label: Option<String>,
    /// Points in reply order
    pub data: Vec<DataPoint>,
    /// Whether the reply carried `x_min`, `x_max`, `y_min` and `y_max`
    pub has_range: bool,
}

impl VisionExtraction {
    /// Build from the parsed reply object.
    ///
    /// Returns `None` when `data` is missing or not an array. Entries
    /// without numeric `x` and `y` are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entries = value.get("data")?.as_array()?;
        let data = entries
            .iter()
            .filter_map(|entry| {
                let x = entry.get("x").and_then(as_number)?;
                let y = entry.get("y").and_then(as_number)?;
                Some(DataPoint::new(x, y))
            })
            .collect();

        let label = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            chart_type: value
                .get("chart_type")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            x_label: label("x_label"),
            y_label: label("y_label"),
            data,
            has_range: ["x_min", "x_max", "y_min", "y_max"]
                .iter()
                .all(|key| value.get(*key).is_some()),
        })
    }

    /// Heuristic confidence of the reply.
    ///
    /// Base 0.5; +0.2 with any data, +0.1 above five points, +0.1 with an
    /// axis label, +0.1 with all range fields.
    pub fn confidence(&self) -> f64 {
        let mut confidence = 0.5;
        if !self.data.is_empty() {
            confidence += 0.2;
        }
        if self.data.len() > 5 {
            confidence += 0.1;
        }
        if self.x_label.is_some() || self.y_label.is_some() {
            confidence += 0.1;
        }
        if self.has_range {
            confidence += 0.1;
        }
        clamp_confidence(confidence)
    }
}

/// Whole-chart extractor over a [`VisionChannel`].
pub struct VisionExtractor<'a> {
    channel: &'a dyn VisionChannel,
    model: String,
}

impl<'a> VisionExtractor<'a> {
    /// Create an extractor targeting `model`.
    pub fn new(channel: &'a dyn VisionChannel, model: impl Into<String>) -> Self {
        Self {
            channel,
            model: model.into(),
        }
    }

    /// Extract chart data in one request.
    ///
    /// Never fails: transport errors, unparsable replies and replies
    /// without a data list all produce `None` with confidence 0 and a
    /// failure reason.
    pub fn extract(&self, image: &ChartImage) -> Outcome<Option<VisionExtraction>> {
        let png = match image.to_png() {
            Ok(png) => png,
            Err(e) => return Outcome::degraded(None, 0.0, format!("image encoding failed: {}", e)),
        };
        let request = VisionRequest::new(self.model.clone(), EXTRACTION_PROMPT)
            .with_image(png)
            .with_max_tokens(MAX_TOKENS)
            .with_temperature(0.0);

        log::info!("Vision extraction with {}", self.model);
        let reply = match self.channel.complete(&request) {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Vision request failed: {}", e);
                return Outcome::degraded(None, 0.0, e.to_string());
            },
        };

        let value = match parse_reply(&reply) {
            Ok(value) => value,
            Err(reason) => {
                log::warn!("Vision reply unusable: {}", reason);
                return Outcome::degraded(None, 0.0, reason);
            },
        };

        match VisionExtraction::from_value(&value) {
            Some(extraction) => {
                let confidence = extraction.confidence();
                log::debug!(
                    "Vision extraction: {} points (confidence {:.2})",
                    extraction.data.len(),
                    confidence
                );
                Outcome::ok(Some(extraction), confidence)
            },
            None => Outcome::degraded(None, 0.0, "No data extracted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use image::RgbImage;

    struct Scripted(std::result::Result<String, String>);

    impl VisionChannel for Scripted {
        fn complete(&self, _request: &VisionRequest) -> Result<String> {
            self.0.clone().map_err(Error::ExternalService)
        }
    }

    fn image() -> ChartImage {
        ChartImage::from_rgb(RgbImage::new(8, 8)).unwrap()
    }

    #[test]
    fn test_fenced_reply_is_parsed() {
        let reply = "```json\n{\"chart_type\": \"line\", \"x_label\": \"t\", \"data\": [{\"x\": 0, \"y\": 5}, {\"x\": \"1\", \"y\": 8}, {\"x\": 2}]}\n```";
        let channel = Scripted(Ok(reply.to_string()));
        let outcome = VisionExtractor::new(&channel, "m").extract(&image());
        let extraction = outcome.value.unwrap();
        assert_eq!(extraction.chart_type, Some(ChartType::Line));
        assert_eq!(extraction.data, vec![DataPoint::new(0.0, 5.0), DataPoint::new(1.0, 8.0)]);
        assert!((outcome.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_with_range_and_many_points() {
        let value: Value = serde_json::from_str(
            r#"{"x_min": 0, "x_max": 9, "y_min": 0, "y_max": 1, "y_label": "v",
                "data": [{"x":0,"y":0},{"x":1,"y":0},{"x":2,"y":0},{"x":3,"y":0},{"x":4,"y":0},{"x":5,"y":0}]}"#,
        )
        .unwrap();
        let extraction = VisionExtraction::from_value(&value).unwrap();
        assert!(extraction.has_range);
        assert!((extraction.confidence() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_data_is_error_marker() {
        let channel = Scripted(Ok("{\"chart_type\": \"bar\"}".to_string()));
        let outcome = VisionExtractor::new(&channel, "m").extract(&image());
        assert!(outcome.value.is_none());
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.failure.as_deref(), Some("No data extracted"));
    }

    #[test]
    fn test_transport_error_is_not_raised() {
        let channel = Scripted(Err("401 unauthorized".to_string()));
        let outcome = VisionExtractor::new(&channel, "m").extract(&image());
        assert!(outcome.value.is_none());
        assert!(outcome.failure.unwrap().contains("401"));
    }

    #[test]
    fn test_garbage_reply_is_error_marker() {
        let channel = Scripted(Ok("I cannot read this chart.".to_string()));
        let outcome = VisionExtractor::new(&channel, "m").extract(&image());
        assert!(outcome.value.is_none());
        assert_eq!(outcome.confidence, 0.0);
    }
}
