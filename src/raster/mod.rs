//! Raster primitives shared by the detectors and extractors.
//!
//! All masks are [`GrayImage`](image::GrayImage)s holding `0` (background)
//! or `255` (foreground).

pub mod color;
pub mod morphology;
pub mod shape;
pub mod threshold;

pub use color::{chromatic_mask, saturation};
pub use morphology::{and_not, keep_runs, remove_grid, union, RunDirection};
pub use shape::{external_contours, ShapeStats};
pub use threshold::{adaptive_binarize, foreground_mask, ink_mask, mean_intensity};

/// Foreground value of a mask pixel.
pub const FOREGROUND: u8 = 255;

/// Count the foreground pixels of a mask.
pub fn count_foreground(mask: &image::GrayImage) -> usize {
    mask.as_raw().iter().filter(|&&v| v > 0).count()
}
