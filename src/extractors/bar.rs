//! Vertical bar extraction.

use crate::chart_image::ChartImage;
use crate::geometry::{CropBox, PixelPoint};
use crate::outcome::Outcome;
use crate::raster::{external_contours, foreground_mask, remove_grid, ShapeStats};
use crate::tuning::{BarTuning, Tuning};
use crate::utils::safe_float_cmp;

/// Shapes in a plot area that are large enough to be bars.
pub(crate) fn bar_shapes(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> Vec<ShapeStats> {
    let mask = remove_grid(&foreground_mask(&image.crop_gray(crop)), &tuning.grid);
    external_contours(&mask)
        .iter()
        .filter_map(|contour| ShapeStats::measure(contour))
        .filter(|stats| is_bar_sized(stats, &tuning.bar))
        .collect()
}

fn is_bar_sized(stats: &ShapeStats, tuning: &BarTuning) -> bool {
    stats.bounds.height() > tuning.min_height && stats.bounds.width() > tuning.min_width
}

/// Extract the top-centre of every bar.
///
/// Bars are the external contours of the binarized, grid-free plot area
/// whose bounding box is taller than `min_height` and wider than
/// `min_width`. Each yields `(horizontal centre, top edge)` in full-image
/// coordinates; the result is sorted left to right.
///
/// The confidence is the base score, plus a flat bonus when at least one
/// bar was found.
pub fn extract_bar(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> Outcome<Vec<PixelPoint>> {
    let t = &tuning.bar;
    let mut points: Vec<PixelPoint> = bar_shapes(image, crop, tuning)
        .iter()
        .map(|stats| {
            let b = stats.bounds;
            PixelPoint::new(
                b.left as f64 + b.width() as f64 / 2.0 + crop.x1 as f64,
                b.top as f64 + crop.y1 as f64,
            )
        })
        .collect();
    points.sort_by(|a, b| safe_float_cmp(a.x, b.x));

    log::debug!("Bar: {} bars", points.len());
    if points.is_empty() {
        Outcome::degraded(points, t.base, "bar: no bars found")
    } else {
        Outcome::ok(points, t.base + t.found_bonus)
    }
}
