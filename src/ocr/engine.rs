//! Local character-recognition engines.

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, ImageFormat};
use std::io::{ErrorKind, Write};
use std::process::Command;
use std::sync::OnceLock;

/// Characters a tick label can contain.
pub const NUMERIC_WHITELIST: &str = "0123456789.eE+-";

/// Region-to-text recognizer.
pub trait TextRecognizer: Send + Sync {
    /// Backend name, used in cache keys.
    fn name(&self) -> &str;

    /// Whether the engine can be invoked at all.
    fn is_available(&self) -> bool;

    /// Recognize the text in a small binarized region.
    ///
    /// # Errors
    ///
    /// [`Error::BackendUnavailable`] when the engine cannot be started;
    /// [`Error::ExternalService`] when it ran and failed.
    fn recognize(&self, region: &GrayImage) -> Result<String>;
}

/// The `tesseract` command-line engine, restricted to numeric characters.
#[derive(Debug)]
pub struct TesseractCli {
    program: String,
    page_segmentation: u32,
    available: OnceLock<bool>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    /// Use `tesseract` from `PATH`.
    pub fn new() -> Self {
        Self::with_program("tesseract")
    }

    /// Use a specific executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            // Single text line.
            page_segmentation: 7,
            available: OnceLock::new(),
        }
    }

    fn run(&self, path: &std::path::Path) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(path)
            .arg("stdout")
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(self.page_segmentation.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", NUMERIC_WHITELIST))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    Error::BackendUnavailable(format!("{} is not installed", self.program))
                },
                _ => Error::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExternalService(format!("tesseract failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let found = Command::new(&self.program)
                .arg("--version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false);
            if !found {
                log::warn!("{} not found; local tick OCR disabled", self.program);
            }
            found
        })
    }

    fn recognize(&self, region: &GrayImage) -> Result<String> {
        let mut tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
        DynamicImage::ImageLuma8(region.clone()).write_to(tmp.as_file_mut(), ImageFormat::Png)?;
        tmp.flush()?;
        self.run(tmp.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_unavailable() {
        let engine = TesseractCli::with_program("chart-oxide-no-such-ocr-binary");
        assert!(!engine.is_available());
        let err = engine.recognize(&GrayImage::new(10, 10)).unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }

    #[test]
    fn test_name_is_cache_backend() {
        assert_eq!(TesseractCli::new().name(), "tesseract");
    }
}
