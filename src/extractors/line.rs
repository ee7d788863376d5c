//! Line-series extraction.

use crate::chart_image::ChartImage;
use crate::geometry::{CropBox, PixelPoint};
use crate::outcome::Outcome;
use crate::raster::{foreground_mask, remove_grid};
use crate::tuning::Tuning;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;

/// Foreground of a line chart's plot area with grid lines and specks removed.
pub(crate) fn line_mask(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> GrayImage {
    let mask = remove_grid(&foreground_mask(&image.crop_gray(crop)), &tuning.grid);
    open(&mask, Norm::LInf, 1)
}

/// Extract a single dominant line series.
///
/// Every column of the plot area holding foreground contributes one point:
/// the mean row of its foreground pixels. Points come back ordered by
/// column, in full-image coordinates. The confidence grows with the
/// fraction of columns covered.
///
/// # Arguments
///
/// * `image` - The chart image
/// * `crop` - Plot area to sample
/// * `tuning` - Grid removal and confidence parameters
pub fn extract_line(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> Outcome<Vec<PixelPoint>> {
    let t = &tuning.line;
    let mask = line_mask(image, crop, tuning);

    let mut points = Vec::new();
    for x in 0..mask.width() {
        let (sum, count) = (0..mask.height())
            .filter(|&y| mask.get_pixel(x, y)[0] > 0)
            .fold((0u64, 0u64), |(sum, count), y| (sum + y as u64, count + 1));
        if count > 0 {
            points.push(PixelPoint::new(
                (x + crop.x1) as f64,
                sum as f64 / count as f64 + crop.y1 as f64,
            ));
        }
    }

    if points.is_empty() {
        log::debug!("Line: no foreground after grid removal");
        return Outcome::degraded(points, t.empty, "line: no series pixels found");
    }

    let coverage = points.len() as f64 / crop.width() as f64;
    log::debug!("Line: {} columns, coverage {:.2}", points.len(), coverage);
    Outcome::ok(points, (t.base + t.coverage_weight * coverage).min(1.0))
}

/// Fraction of plot-area columns holding line foreground.
pub(crate) fn column_coverage(mask: &GrayImage) -> f64 {
    if mask.width() == 0 {
        return 0.0;
    }
    let covered = (0..mask.width())
        .filter(|&x| (0..mask.height()).any(|y| mask.get_pixel(x, y)[0] > 0))
        .count();
    covered as f64 / mask.width() as f64
}
