//! Scatter marker extraction.
//!
//! Two strategies locate markers inside the plot area:
//!
//! - **Color**: chromatic pixels (high saturation) are grouped into blobs.
//!   Grid lines, axes and text are gray and drop out immediately.
//! - **Blob**: the dark foreground is binarized, grid lines are erased, and
//!   the remaining components are filtered for round, convex shapes.
//!
//! Both report marker centroids in full-image pixel coordinates and share
//! one confidence heuristic ([`scatter_confidence`]).

use super::ScatterMethod;
use crate::chart_image::ChartImage;
use crate::geometry::{CropBox, PixelPoint};
use crate::outcome::Outcome;
use crate::raster::{chromatic_mask, external_contours, foreground_mask, remove_grid, ShapeStats};
use crate::tuning::{ScatterConfidenceTuning, Tuning};
use crate::utils::safe_float_cmp;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};

/// Markers accepted by one strategy, with the area of each.
#[derive(Debug, Default)]
struct Markers {
    points: Vec<PixelPoint>,
    areas: Vec<f64>,
}

impl Markers {
    fn push(&mut self, stats: &ShapeStats, crop: &CropBox) {
        self.points
            .push(stats.centroid.offset(crop.x1 as f64, crop.y1 as f64));
        self.areas.push(stats.area);
    }

    fn into_outcome(mut self, strategy: &str, tuning: &ScatterConfidenceTuning) -> Outcome<Vec<PixelPoint>> {
        let confidence = scatter_confidence(&self.points, &self.areas, tuning);
        if self.points.is_empty() {
            return Outcome::degraded(Vec::new(), confidence, format!("{} scatter: no markers found", strategy));
        }
        self.points
            .sort_by(|a, b| safe_float_cmp(a.x, b.x).then(safe_float_cmp(a.y, b.y)));
        Outcome::ok(self.points, confidence)
    }
}

/// Find chromatic scatter markers.
///
/// Thresholds the saturation channel, cleans the mask with a 3×3 cross
/// opening and closing, and keeps components whose area lies in the
/// configured window and whose circularity reaches the minimum.
pub fn extract_scatter_color(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> Outcome<Vec<PixelPoint>> {
    let t = &tuning.scatter_color;
    let mask = chromatic_mask(&image.crop_rgb(crop), t.saturation_level);
    let mask = close(&open(&mask, Norm::L1, 1), Norm::L1, 1);

    let mut markers = Markers::default();
    for contour in external_contours(&mask) {
        let Some(stats) = ShapeStats::measure(&contour) else {
            continue;
        };
        if stats.area < t.min_area || stats.area > t.max_area {
            continue;
        }
        if stats.perimeter > 0.0 && stats.circularity < t.min_circularity {
            continue;
        }
        markers.push(&stats, crop);
    }

    log::debug!("Color scatter: {} markers", markers.points.len());
    markers.into_outcome("color", &tuning.scatter_confidence)
}

/// Find dark round scatter markers after grid removal.
pub fn extract_scatter_blob(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> Outcome<Vec<PixelPoint>> {
    let t = &tuning.scatter_blob;
    let mask = remove_grid(&foreground_mask(&image.crop_gray(crop)), &tuning.grid);

    let mut markers = Markers::default();
    for contour in external_contours(&mask) {
        let Some(stats) = ShapeStats::measure(&contour) else {
            continue;
        };
        let keep = stats.area >= t.min_area
            && stats.area <= t.max_area
            && stats.circularity >= t.min_circularity
            && stats.convexity >= t.min_convexity
            && stats.inertia_ratio >= t.min_inertia_ratio;
        if keep {
            markers.push(&stats, crop);
        }
    }

    log::debug!("Blob scatter: {} markers", markers.points.len());
    markers.into_outcome("blob", &tuning.scatter_confidence)
}

/// Extract scatter markers with the requested strategy.
///
/// `Auto` tries color first and accepts it when it found markers with
/// enough confidence. Otherwise the blob strategy runs too and the non-empty
/// result wins, color first when both found markers.
pub fn extract_scatter(
    image: &ChartImage,
    crop: &CropBox,
    method: ScatterMethod,
    tuning: &Tuning,
) -> Outcome<Vec<PixelPoint>> {
    match method {
        ScatterMethod::Color => extract_scatter_color(image, crop, tuning),
        ScatterMethod::Blob => extract_scatter_blob(image, crop, tuning),
        ScatterMethod::Auto => {
            let color = extract_scatter_color(image, crop, tuning);
            if !color.value.is_empty() && color.confidence >= tuning.scatter_color.accept_confidence {
                return color;
            }
            let blob = extract_scatter_blob(image, crop, tuning);
            if color.value.is_empty() {
                log::debug!("Scatter: color found nothing, using blob result");
                blob
            } else {
                color
            }
        },
    }
}

/// Shared scatter confidence.
///
/// Starts from a base and adjusts for a plausible marker count, consistent
/// marker sizes (area coefficient of variation), and spread across the plot
/// area. Clamped to `[floor, 1]`; an empty set gets the empty score.
///
/// # Examples
///
/// ```
/// use chart_oxide::extractors::scatter_confidence;
/// use chart_oxide::geometry::PixelPoint;
/// use chart_oxide::tuning::ScatterConfidenceTuning;
///
/// let tuning = ScatterConfidenceTuning::default();
/// assert_eq!(scatter_confidence(&[], &[], &tuning), 0.1);
///
/// let points: Vec<_> = (0..5).map(|i| PixelPoint::new(i as f64 * 40.0, i as f64 * 30.0)).collect();
/// let areas = vec![50.0; 5];
/// assert!((scatter_confidence(&points, &areas, &tuning) - 1.0).abs() < 1e-9);
/// ```
pub fn scatter_confidence(points: &[PixelPoint], areas: &[f64], tuning: &ScatterConfidenceTuning) -> f64 {
    let n = points.len();
    if n == 0 {
        return tuning.empty;
    }

    let mut confidence = tuning.base;
    let (lo, hi) = tuning.count_range;
    if (lo..=hi).contains(&n) {
        confidence += tuning.count_bonus;
    } else if n > tuning.noise_count {
        confidence -= tuning.noise_penalty;
    }

    if areas.len() >= 3 {
        let mean = areas.iter().sum::<f64>() / areas.len() as f64;
        if mean > 0.0 {
            let variance = areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / areas.len() as f64;
            let cv = variance.sqrt() / mean;
            if cv < tuning.consistent_cv {
                confidence += tuning.consistent_bonus;
            } else if cv > tuning.mixed_cv {
                confidence -= tuning.mixed_penalty;
            }
        }
    }

    if n >= 3 {
        let spread = |coord: fn(&PixelPoint) -> f64| {
            let (min, max) = points
                .iter()
                .map(coord)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
            max - min
        };
        if spread(|p| p.x) > tuning.min_spread && spread(|p| p.y) > tuning.min_spread {
            confidence += tuning.spread_bonus;
        }
    }

    confidence.clamp(tuning.floor, 1.0)
}
