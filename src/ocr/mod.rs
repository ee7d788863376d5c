//! Tick-label recognition.
//!
//! Reads the numeric label next to every detected tick, using either a local
//! character-recognition engine (one small window per tick) or a remote
//! vision-OCR model (one strip per axis, batched into a single request).
//! Results go through the [`CacheStore`](crate::cache::CacheStore) when one
//! is attached.

pub mod engine;
pub mod parse;
pub mod remote;

pub use engine::{TesseractCli, TextRecognizer, NUMERIC_WHITELIST};
pub use parse::{parse_number, parse_numbers};
pub use remote::RemoteOcr;

use crate::cache::{content_hash, CacheEntry, CacheStore};
use crate::config::OcrBackendKind;
use crate::error::Error;
use crate::geometry::CropBox;
use crate::layout::AxisLayout;
use crate::outcome::Outcome;
use crate::raster::adaptive_binarize;
use crate::tuning::OcrTuning;
use image::imageops::crop_imm;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tick with its recognized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickMark {
    /// Pixel position along the axis (column for x, row for y)
    pub pixel: f64,
    /// Recognized value
    pub value: f64,
    /// Text the value was parsed from
    pub recognized_text: String,
}

impl TickMark {
    /// Create a tick mark.
    pub fn new(pixel: f64, value: f64, text: impl Into<String>) -> Self {
        Self {
            pixel,
            value,
            recognized_text: text.into(),
        }
    }
}

/// Recognized ticks of both axes, ordered by pixel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSet {
    /// X-axis ticks
    pub x: Vec<TickMark>,
    /// Y-axis ticks
    pub y: Vec<TickMark>,
}

/// Something that went wrong while reading tick labels.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrIssue {
    /// The remote service was requested but is not configured
    RemoteUnavailable(String),
    /// The batched remote request failed; labels were read one by one
    RemoteFailed(String),
    /// The local engine cannot run; no ticks were read
    EngineUnavailable(String),
    /// The remote reply did not line up with the detected ticks
    AlignmentMismatch {
        /// Axis name ("x" or "y")
        axis: &'static str,
        /// Ticks detected in the image
        detected: usize,
        /// Values returned by the service
        returned: usize,
    },
}

impl fmt::Display for OcrIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrIssue::RemoteUnavailable(reason) => {
                write!(f, "remote OCR unavailable ({}), used local engine", reason)
            },
            OcrIssue::RemoteFailed(reason) => {
                write!(f, "batched remote OCR failed ({}), read labels individually", reason)
            },
            OcrIssue::EngineUnavailable(reason) => {
                write!(f, "local OCR engine unavailable ({}), no tick labels read", reason)
            },
            OcrIssue::AlignmentMismatch {
                axis,
                detected,
                returned,
            } => write!(
                f,
                "{}-axis: {} ticks detected but service returned {} ordered values; re-read per tick",
                axis, detected, returned
            ),
        }
    }
}

/// Result of reading all tick labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReading {
    /// Recognized ticks
    pub ticks: TickSet,
    /// Backend that produced them
    pub backend: String,
    /// Whether they came from the cache
    pub cached: bool,
    /// Problems met on the way
    pub issues: Vec<OcrIssue>,
}

/// Reads tick labels with a local engine, an optional remote reader and an
/// optional cache.
pub struct TickLabelRecognizer<'a> {
    local: &'a dyn TextRecognizer,
    remote: Option<RemoteOcr<'a>>,
    cache: Option<&'a dyn CacheStore>,
    tuning: &'a OcrTuning,
}

impl<'a> TickLabelRecognizer<'a> {
    /// Create a recognizer around the local engine.
    pub fn new(local: &'a dyn TextRecognizer, tuning: &'a OcrTuning) -> Self {
        Self {
            local,
            remote: None,
            cache: None,
            tuning,
        }
    }

    /// Attach a remote reader.
    pub fn with_remote(mut self, remote: RemoteOcr<'a>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Read through and write through a cache.
    pub fn with_cache(mut self, cache: &'a dyn CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Read the labels of every tick in `layout`.
    ///
    /// # Arguments
    ///
    /// * `gray` - The full chart image the layout was detected on
    /// * `layout` - Axis lines and tick positions
    /// * `backend` - Requested backend
    ///
    /// # Returns
    ///
    /// The reading with confidence `matched / total ticks` (0 without
    /// ticks). Never fails: an unavailable engine yields zero ticks.
    ///
    /// # Caching
    ///
    /// Cache entries are keyed by the image content and backend name only,
    /// not by `layout`. A caller that reads the same image with different
    /// crop or axis overrides gets the first reading back and must disable
    /// the cache for those requests.
    pub fn recognize(&self, gray: &GrayImage, layout: &AxisLayout, backend: OcrBackendKind) -> Outcome<TickReading> {
        let mut issues = Vec::new();
        let remote = match (backend, &self.remote) {
            (OcrBackendKind::Remote, Some(remote)) => Some(remote),
            (OcrBackendKind::Remote, None) => {
                log::warn!("Remote OCR requested but no vision channel configured; using local engine");
                issues.push(OcrIssue::RemoteUnavailable("no vision channel configured".to_string()));
                None
            },
            (OcrBackendKind::Local, _) => None,
        };
        let backend_name = match remote {
            Some(remote) => remote.name().to_string(),
            None => self.local.name().to_string(),
        };

        let key = content_hash(gray);
        if let Some(entry) = self.cache.and_then(|cache| cache.get(&backend_name, &key)) {
            log::debug!("Tick labels from cache ({}_{})", backend_name, key);
            let reading = TickReading {
                ticks: entry.result,
                backend: entry.backend,
                cached: true,
                issues,
            };
            return finish(reading, entry.confidence);
        }

        let ticks = match remote {
            Some(remote) => self.read_remote(remote, gray, layout, &mut issues),
            None => {
                if !self.local.is_available() {
                    issues.push(OcrIssue::EngineUnavailable(format!("{} not available", self.local.name())));
                    let reading = TickReading {
                        ticks: TickSet::default(),
                        backend: backend_name,
                        cached: false,
                        issues,
                    };
                    return finish(reading, 0.0);
                }
                self.read_local(gray, layout, &mut issues)
            },
        };

        let total = layout.x_ticks.len() + layout.y_ticks.len();
        let matched = ticks.x.len() + ticks.y.len();
        let confidence = if total > 0 {
            matched as f64 / total as f64
        } else {
            0.0
        };
        log::info!("Tick labels: {}/{} read with {}", matched, total, backend_name);

        if let Some(cache) = self.cache {
            cache.put(
                &key,
                &CacheEntry {
                    result: ticks.clone(),
                    confidence,
                    backend: backend_name.clone(),
                },
            );
        }

        let reading = TickReading {
            ticks,
            backend: backend_name,
            cached: false,
            issues,
        };
        finish(reading, confidence)
    }

    fn x_window(&self, gray: &GrayImage, layout: &AxisLayout, px: f64) -> Option<CropBox> {
        let t = self.tuning;
        let row = layout.lines.x_axis_row as i64;
        let px = px.round() as i64;
        CropBox::clamped(
            px - t.x_window_half_width as i64,
            row + t.x_window_top as i64,
            px + t.x_window_half_width as i64,
            row + t.x_window_bottom as i64,
            gray.width(),
            gray.height(),
        )
    }

    fn y_window(&self, gray: &GrayImage, layout: &AxisLayout, py: f64) -> Option<CropBox> {
        let t = self.tuning;
        let col = layout.lines.y_axis_col as i64;
        let py = py.round() as i64;
        CropBox::clamped(
            col - t.y_window_far as i64,
            py - t.y_window_half_height as i64,
            col - t.y_window_near as i64,
            py + t.y_window_half_height as i64,
            gray.width(),
            gray.height(),
        )
    }

    fn read_local(&self, gray: &GrayImage, layout: &AxisLayout, issues: &mut Vec<OcrIssue>) -> TickSet {
        let mut set = TickSet::default();
        let axes: [(&str, &Vec<f64>); 2] = [("x", &layout.x_ticks), ("y", &layout.y_ticks)];

        for (axis, pixels) in axes {
            for &pixel in pixels {
                let window = if axis == "x" {
                    self.x_window(gray, layout, pixel)
                } else {
                    self.y_window(gray, layout, pixel)
                };
                let Some(window) = window else {
                    continue;
                };

                let binary = adaptive_binarize(
                    &region(gray, &window),
                    self.tuning.adaptive_block_radius,
                    self.tuning.adaptive_offset,
                );
                match self.local.recognize(&binary) {
                    Ok(text) => {
                        if let Some(value) = parse_number(&text) {
                            let mark = TickMark::new(pixel, value, text);
                            if axis == "x" {
                                set.x.push(mark);
                            } else {
                                set.y.push(mark);
                            }
                        } else {
                            log::debug!("{}-tick at {}: unparsable text {:?}", axis, pixel, text);
                        }
                    },
                    Err(Error::BackendUnavailable(reason)) => {
                        log::warn!("Local OCR engine failed to start: {}", reason);
                        issues.push(OcrIssue::EngineUnavailable(reason));
                        return set;
                    },
                    Err(e) => log::debug!("{}-tick at {}: {}", axis, pixel, e),
                }
            }
        }
        set
    }

    fn read_remote(
        &self,
        remote: &RemoteOcr<'_>,
        gray: &GrayImage,
        layout: &AxisLayout,
        issues: &mut Vec<OcrIssue>,
    ) -> TickSet {
        let (w, h) = gray.dimensions();
        let t = self.tuning;
        let row = layout.lines.x_axis_row as i64;
        let col = layout.lines.y_axis_col as i64;
        let x_strip = CropBox::clamped(0, row + t.x_window_top as i64, w as i64, row + t.x_strip_height as i64, w, h);
        let y_strip = CropBox::clamped(col - t.y_strip_width as i64, 0, col - t.y_window_near as i64, h as i64, w, h);

        let batch = match (x_strip, y_strip) {
            (Some(xs), Some(ys)) => remote
                .read_strips(&region(gray, &xs), &region(gray, &ys))
                .map_err(|e| e.to_string()),
            _ => Err("axis label strip outside the image".to_string()),
        };

        match batch {
            Ok((x_values, y_values)) => TickSet {
                x: self.align(remote, gray, layout, "x", x_values, issues),
                y: self.align(remote, gray, layout, "y", y_values, issues),
            },
            Err(reason) => {
                log::warn!("Batched remote OCR failed: {}", reason);
                issues.push(OcrIssue::RemoteFailed(reason));
                TickSet {
                    x: self.read_remote_per_tick(remote, gray, layout, "x"),
                    y: self.read_remote_per_tick(remote, gray, layout, "y"),
                }
            },
        }
    }

    /// Pair returned values with detected ticks when counts agree and the
    /// values are strictly monotonic; otherwise re-read every tick alone.
    fn align(
        &self,
        remote: &RemoteOcr<'_>,
        gray: &GrayImage,
        layout: &AxisLayout,
        axis: &'static str,
        values: Vec<f64>,
        issues: &mut Vec<OcrIssue>,
    ) -> Vec<TickMark> {
        let pixels = if axis == "x" { &layout.x_ticks } else { &layout.y_ticks };
        if pixels.is_empty() {
            return Vec::new();
        }
        if values.len() == pixels.len() && strictly_monotonic(&values) {
            return pixels
                .iter()
                .zip(values)
                .map(|(&pixel, value)| TickMark::new(pixel, value, value.to_string()))
                .collect();
        }

        log::warn!(
            "{}-axis: {} ticks but {} returned values; reading per tick",
            axis,
            pixels.len(),
            values.len()
        );
        issues.push(OcrIssue::AlignmentMismatch {
            axis,
            detected: pixels.len(),
            returned: values.len(),
        });
        self.read_remote_per_tick(remote, gray, layout, axis)
    }

    fn read_remote_per_tick(
        &self,
        remote: &RemoteOcr<'_>,
        gray: &GrayImage,
        layout: &AxisLayout,
        axis: &str,
    ) -> Vec<TickMark> {
        let pixels = if axis == "x" { &layout.x_ticks } else { &layout.y_ticks };
        pixels
            .iter()
            .filter_map(|&pixel| {
                let window = if axis == "x" {
                    self.x_window(gray, layout, pixel)
                } else {
                    self.y_window(gray, layout, pixel)
                }?;
                match remote.read_label(&region(gray, &window)) {
                    Ok((text, Some(value))) => Some(TickMark::new(pixel, value, text)),
                    Ok((text, None)) => {
                        log::debug!("{}-tick at {}: unparsable reply {:?}", axis, pixel, text);
                        None
                    },
                    Err(e) => {
                        log::debug!("{}-tick at {}: {}", axis, pixel, e);
                        None
                    },
                }
            })
            .collect()
    }
}

fn region(gray: &GrayImage, window: &CropBox) -> GrayImage {
    crop_imm(gray, window.x1, window.y1, window.width(), window.height()).to_image()
}

fn strictly_monotonic(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] > w[0]) || values.windows(2).all(|w| w[1] < w[0])
}

fn finish(reading: TickReading, confidence: f64) -> Outcome<TickReading> {
    if reading.issues.is_empty() {
        Outcome::ok(reading, confidence)
    } else {
        let reason = reading
            .issues
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Outcome::degraded(reading, confidence, reason)
    }
}
