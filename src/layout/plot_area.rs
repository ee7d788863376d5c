//! Plot-area detection.
//!
//! The plot area is the rectangle framed by the axis lines. It is found in
//! three tiers, each with a lower confidence than the last:
//!
//! 1. **Line segments**: Canny edges, Hough lines traced into segments,
//!    segments classified as near-horizontal or near-vertical; the crop is
//!    the span of vertical x positions by the span of horizontal y positions.
//! 2. **Background contour**: the largest near-white polygon with at least
//!    four vertices covering enough of the image.
//! 3. **Geometric**: a fixed 10% inset.

use crate::geometry::{CropBox, LineSegment, PixelBounds};
use crate::outcome::Outcome;
use crate::raster::{external_contours, FOREGROUND};
use crate::tuning::PlotAreaTuning;
use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::hough::{detect_lines, LineDetectionOptions, PolarLine};

/// Images smaller than this on either side skip edge analysis.
const MIN_ANALYZABLE_SIDE: u32 = 16;

/// Detect the plot area of a grayscale chart image.
///
/// # Arguments
///
/// * `gray` - The full chart image
/// * `margin` - Pixels the detected frame is shrunk by
/// * `tuning` - Detection thresholds and tier confidences
///
/// # Returns
///
/// A crop box that always satisfies the [`CropBox`] invariant for `gray`,
/// with a failure reason when a fallback tier produced it.
///
/// # Examples
///
/// ```
/// use chart_oxide::layout::detect_plot_area;
/// use chart_oxide::tuning::PlotAreaTuning;
/// use image::{GrayImage, Luma};
///
/// let blank = GrayImage::from_pixel(600, 400, Luma([255]));
/// let outcome = detect_plot_area(&blank, 5, &PlotAreaTuning::default());
/// assert_eq!((outcome.value.x1, outcome.value.y1), (60, 40));
/// assert_eq!(outcome.confidence, 0.3);
/// ```
pub fn detect_plot_area(gray: &GrayImage, margin: u32, tuning: &PlotAreaTuning) -> Outcome<CropBox> {
    let (w, h) = gray.dimensions();
    if w < MIN_ANALYZABLE_SIDE || h < MIN_ANALYZABLE_SIDE {
        return geometric_fallback(w, h, tuning, "image too small for edge analysis".to_string());
    }

    let edges = canny(gray, tuning.canny_low, tuning.canny_high);
    let segments = detect_segments(&edges, tuning);
    log::debug!("Plot area: {} line segments", segments.len());

    if segments.len() < 2 {
        return geometric_fallback(
            w,
            h,
            tuning,
            format!("found {} line segments, need at least 2", segments.len()),
        );
    }

    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for segment in &segments {
        let angle = segment.angle_degrees();
        let mid = segment.midpoint();
        if angle < tuning.horizontal_tolerance_deg || angle > 180.0 - tuning.horizontal_tolerance_deg {
            horizontal.push(mid.y);
        } else if (angle - 90.0).abs() < tuning.vertical_tolerance_deg {
            vertical.push(mid.x);
        }
    }

    if horizontal.is_empty() || vertical.is_empty() {
        return contour_fallback(
            gray,
            tuning,
            format!(
                "axis frame incomplete ({} horizontal, {} vertical segments)",
                horizontal.len(),
                vertical.len()
            ),
        );
    }

    let left = vertical.iter().copied().fold(f64::INFINITY, f64::min);
    let right = vertical.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let top = horizontal.iter().copied().fold(f64::INFINITY, f64::min);
    let bottom = horizontal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (region_w, region_h) = (right - left, bottom - top);

    if region_w < w as f64 * tuning.min_region_fraction || region_h < h as f64 * tuning.min_region_fraction {
        return contour_fallback(
            gray,
            tuning,
            format!("line frame {:.0}x{:.0} too small for {}x{} image", region_w, region_h, w, h),
        );
    }

    let m = margin as i64;
    let Some(crop) = CropBox::clamped(
        left as i64 + m,
        top as i64 + m,
        right as i64 - m,
        bottom as i64 - m,
        w,
        h,
    ) else {
        return contour_fallback(gray, tuning, "margin consumed the line frame".to_string());
    };

    let large = tuning.large_region_fraction;
    let confidence = if region_w > w as f64 * large && region_h > h as f64 * large {
        tuning.conf_large
    } else {
        tuning.conf_sized
    };
    log::info!("Plot area from axis lines: {:?} (confidence {:.2})", crop, confidence);
    Outcome::ok(crop, confidence)
}

/// Hough lines on the edge map, traced into finite segments.
pub fn detect_segments(edges: &GrayImage, tuning: &PlotAreaTuning) -> Vec<LineSegment> {
    let (w, h) = edges.dimensions();
    let min_len = (w.min(h) as f64 * tuning.min_segment_fraction).max(2.0);
    let options = LineDetectionOptions {
        vote_threshold: tuning.hough_votes,
        suppression_radius: tuning.hough_suppression,
    };
    detect_lines(edges, options)
        .iter()
        .flat_map(|line| trace_segments(edges, line, min_len, tuning.max_segment_gap as f64))
        .collect()
}

/// Walk an infinite polar line across the edge map and cut it into the
/// stretches actually supported by edge pixels.
///
/// Gaps up to `max_gap` pixels are bridged; stretches shorter than
/// `min_len` are dropped.
fn trace_segments(edges: &GrayImage, line: &PolarLine, min_len: f64, max_gap: f64) -> Vec<LineSegment> {
    let (w, h) = edges.dimensions();
    let theta = (line.angle_in_degrees as f64).to_radians();
    let (cos, sin) = (theta.cos(), theta.sin());
    let r = line.r as f64;
    // Foot of the normal and the direction along the line.
    let (x0, y0) = (r * cos, r * sin);
    let (dx, dy) = (-sin, cos);

    let is_edge = |x: f64, y: f64| {
        let (xi, yi) = (x.round(), y.round());
        xi >= 0.0 && yi >= 0.0 && (xi as u32) < w && (yi as u32) < h && edges.get_pixel(xi as u32, yi as u32)[0] > 0
    };
    // Accept a one-pixel perpendicular wobble from discretization.
    let supported = |x: f64, y: f64| is_edge(x, y) || is_edge(x + cos, y + sin) || is_edge(x - cos, y - sin);

    let reach = ((w as f64).powi(2) + (h as f64).powi(2)).sqrt().ceil() as i64;
    let mut segments = Vec::new();
    let mut run: Option<(f64, f64)> = None;

    let close = |run: (f64, f64), segments: &mut Vec<LineSegment>| {
        let (start, end) = run;
        if end - start + 1.0 >= min_len {
            segments.push(LineSegment::new(
                x0 + start * dx,
                y0 + start * dy,
                x0 + end * dx,
                y0 + end * dy,
            ));
        }
    };

    for step in -reach..=reach {
        let t = step as f64;
        if supported(x0 + t * dx, y0 + t * dy) {
            run = match run {
                Some((start, last)) if t - last - 1.0 <= max_gap => Some((start, t)),
                Some(done) => {
                    close(done, &mut segments);
                    Some((t, t))
                },
                None => Some((t, t)),
            };
        }
    }
    if let Some(done) = run {
        close(done, &mut segments);
    }
    segments
}

/// Largest near-white polygonal region, shrunk by the contour margin.
fn contour_fallback(gray: &GrayImage, tuning: &PlotAreaTuning, reason: String) -> Outcome<CropBox> {
    let (w, h) = gray.dimensions();
    log::warn!("Plot area: {}; trying background contour", reason);

    let background = GrayImage::from_fn(w, h, |x, y| {
        Luma([if gray.get_pixel(x, y)[0] > tuning.background_level { FOREGROUND } else { 0 }])
    });

    let min_area = (w as f64 * h as f64) * tuning.min_contour_area_fraction;
    let mut best: Option<(PixelBounds, f64)> = None;
    for contour in external_contours(&background) {
        if contour.len() < 4 {
            continue;
        }
        let perimeter = crate::raster::shape::perimeter(&contour);
        let polygon = approximate_polygon_dp(&contour, tuning.polygon_epsilon_fraction * perimeter, true);
        if polygon.len() < 4 {
            continue;
        }
        let Some(bounds) = PixelBounds::of_points(contour.iter().map(|p| (p.x, p.y))) else {
            continue;
        };
        let area = bounds.width() as f64 * bounds.height() as f64;
        if area > min_area && best.map_or(true, |(_, a)| area > a) {
            best = Some((bounds, area));
        }
    }

    let Some((bounds, _)) = best else {
        return geometric_fallback(w, h, tuning, format!("{}; no background contour", reason));
    };

    let m = tuning.contour_margin as i64;
    let Some(crop) = CropBox::clamped(
        bounds.left as i64 + m,
        bounds.top as i64 + m,
        bounds.right as i64 + 1 - m,
        bounds.bottom as i64 + 1 - m,
        w,
        h,
    ) else {
        return geometric_fallback(w, h, tuning, format!("{}; contour region collapsed", reason));
    };

    let sized = bounds.width() as f64 >= w as f64 * tuning.min_region_fraction
        && bounds.height() as f64 >= h as f64 * tuning.min_region_fraction;
    let confidence = if sized {
        tuning.conf_contour
    } else {
        tuning.conf_contour_undersized
    };
    log::info!("Plot area from background contour: {:?} (confidence {:.2})", crop, confidence);
    Outcome::degraded(crop, confidence, format!("{}; used background contour", reason))
}

fn geometric_fallback(w: u32, h: u32, tuning: &PlotAreaTuning, reason: String) -> Outcome<CropBox> {
    let crop = CropBox::inset(w, h, tuning.fallback_inset);
    log::warn!("Plot area: {}; using fixed inset {:?}", reason, crop);
    Outcome::degraded(crop, tuning.conf_geometric, reason)
}
