//! Tick-label reading through a remote vision-OCR model.

use super::parse::parse_number;
use crate::chart_image::encode_png;
use crate::error::{Error, Result};
use crate::vision::response::{number_list, parse_reply};
use crate::vision::{VisionChannel, VisionRequest};
use image::{DynamicImage, GrayImage};

const BATCH_PROMPT: &str = r#"Extract all numbers from these two chart axis images.

Image 1 is the X-axis (horizontal, read left to right).
Image 2 is the Y-axis (vertical, read top to bottom).

Return JSON format only:
{"x": [list of numbers], "y": [list of numbers]}

Example: {"x": [0, 10, 20, 30], "y": [100, 75, 50, 25, 0]}"#;

const SINGLE_PROMPT: &str =
    "This image shows one chart axis tick label. Reply with the number only, nothing else.";

/// Remote tick-label reader.
pub struct RemoteOcr<'a> {
    channel: &'a dyn VisionChannel,
    model: String,
}

impl<'a> RemoteOcr<'a> {
    /// Create a reader targeting `model`.
    pub fn new(channel: &'a dyn VisionChannel, model: impl Into<String>) -> Self {
        Self {
            channel,
            model: model.into(),
        }
    }

    /// Backend name, used in cache keys.
    pub fn name(&self) -> &str {
        "mistral"
    }

    /// Read both axis label strips in one request.
    ///
    /// Returns the x values left to right and the y values top to bottom.
    pub fn read_strips(&self, x_strip: &GrayImage, y_strip: &GrayImage) -> Result<(Vec<f64>, Vec<f64>)> {
        let request = VisionRequest::new(self.model.clone(), BATCH_PROMPT)
            .with_image(png(x_strip)?)
            .with_image(png(y_strip)?)
            .with_max_tokens(1024);

        let reply = self.channel.complete(&request)?;
        let value = parse_reply(&reply).map_err(Error::Parse)?;
        if !value.is_object() {
            return Err(Error::Parse("axis reply is not a JSON object".to_string()));
        }
        Ok((number_list(value.get("x")), number_list(value.get("y"))))
    }

    /// Read a single tick label.
    ///
    /// Returns the raw reply and the number parsed from it, if any.
    pub fn read_label(&self, window: &GrayImage) -> Result<(String, Option<f64>)> {
        let request = VisionRequest::new(self.model.clone(), SINGLE_PROMPT)
            .with_image(png(window)?)
            .with_max_tokens(32);
        let reply = self.channel.complete(&request)?;
        let value = parse_number(&reply);
        Ok((reply.trim().to_string(), value))
    }
}

fn png(image: &GrayImage) -> Result<Vec<u8>> {
    encode_png(&DynamicImage::ImageLuma8(image.clone()))
}
