//! Decoded chart image.
//!
//! A [`ChartImage`] is the sole input of extraction: an immutable RGB buffer
//! plus its grayscale rendition, computed once at construction.

use crate::error::{Error, Result};
use crate::geometry::CropBox;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;

/// Immutable decoded chart image.
#[derive(Debug, Clone)]
pub struct ChartImage {
    rgb: RgbImage,
    gray: GrayImage,
}

impl ChartImage {
    /// Wrap an RGB buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] for a zero-sized buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::ChartImage;
    /// use image::{Rgb, RgbImage};
    ///
    /// let image = ChartImage::from_rgb(RgbImage::from_pixel(40, 30, Rgb([255, 255, 255]))).unwrap();
    /// assert_eq!((image.width(), image.height()), (40, 30));
    /// assert!(ChartImage::from_rgb(RgbImage::new(0, 0)).is_err());
    /// ```
    pub fn from_rgb(rgb: RgbImage) -> Result<Self> {
        if rgb.width() == 0 || rgb.height() == 0 {
            return Err(Error::InvalidImage(format!(
                "image has no pixels ({}x{})",
                rgb.width(),
                rgb.height()
            )));
        }
        let gray = DynamicImage::ImageRgb8(rgb.clone()).to_luma8();
        Ok(Self { rgb, gray })
    }

    /// Convert any decoded image.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        Self::from_rgb(image.to_rgb8())
    }

    /// Decode an encoded image (PNG, JPEG, TIFF).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] when the bytes cannot be decoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| Error::InvalidImage(e.to_string()))?;
        Self::from_dynamic(decoded)
    }

    /// Decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .map_err(|e| Error::InvalidImage(format!("{}: {}", path.display(), e)))?;
        Self::from_dynamic(decoded)
    }

    /// Downscale so the longest side is at most `max_side` pixels.
    ///
    /// Returns the (possibly unchanged) image and the applied scale factor.
    pub fn preprocess(&self, max_side: u32) -> (ChartImage, f64) {
        let longest = self.width().max(self.height());
        if max_side == 0 || longest <= max_side {
            return (self.clone(), 1.0);
        }

        let scale = max_side as f64 / longest as f64;
        let new_w = ((self.width() as f64 * scale) as u32).max(1);
        let new_h = ((self.height() as f64 * scale) as u32).max(1);
        log::debug!(
            "Downscaling {}x{} -> {}x{}",
            self.width(),
            self.height(),
            new_w,
            new_h
        );

        let rgb = imageops::resize(&self.rgb, new_w, new_h, FilterType::Triangle);
        let gray = DynamicImage::ImageRgb8(rgb.clone()).to_luma8();
        (ChartImage { rgb, gray }, scale)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// RGB buffer.
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Grayscale buffer.
    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Grayscale copy of a region.
    pub fn crop_gray(&self, crop: &CropBox) -> GrayImage {
        imageops::crop_imm(&self.gray, crop.x1, crop.y1, crop.width(), crop.height()).to_image()
    }

    /// RGB copy of a region.
    pub fn crop_rgb(&self, crop: &CropBox) -> RgbImage {
        imageops::crop_imm(&self.rgb, crop.x1, crop.y1, crop.width(), crop.height()).to_image()
    }

    /// PNG encoding of the RGB buffer.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&DynamicImage::ImageRgb8(self.rgb.clone()))
    }
}

/// Encode any image as PNG bytes.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
