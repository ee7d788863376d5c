//! Axis line and tick mark location.
//!
//! Axis lines are the rows/columns with the most ink next to the plot area.
//! Tick marks are short runs of ink just outside an axis line: below the
//! x-axis and left of the y-axis.

use crate::config::AxisOverrides;
use crate::geometry::{AxesPosition, CropBox};
use crate::outcome::{clamp_confidence, Outcome};
use crate::raster::{ink_mask, FOREGROUND};
use crate::tuning::AxisTuning;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Axis lines and tick pixel positions of one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLayout {
    /// Axis lines clamped into the plot area
    pub position: AxesPosition,
    /// Axis lines as detected, possibly just outside the plot area
    pub lines: AxesPosition,
    /// Columns of x-axis ticks, ascending
    pub x_ticks: Vec<f64>,
    /// Rows of y-axis ticks, ascending
    pub y_ticks: Vec<f64>,
    /// Tick confidence of the x-axis
    pub x_confidence: f64,
    /// Tick confidence of the y-axis
    pub y_confidence: f64,
}

/// Locate both axis lines and their ticks.
///
/// # Arguments
///
/// * `gray` - The full chart image
/// * `crop` - Plot area
/// * `overrides` - Axis positions that replace detection
/// * `tuning` - Ink level, search band and tick geometry
///
/// # Returns
///
/// The layout with confidence `mean(x_confidence, y_confidence)`. A failure
/// reason is attached when an axis line had to be assumed at the plot-area edge.
pub fn locate_axes(
    gray: &GrayImage,
    crop: &CropBox,
    overrides: AxisOverrides,
    tuning: &AxisTuning,
) -> Outcome<AxisLayout> {
    let (w, h) = gray.dimensions();
    let ink = ink_mask(gray, tuning.ink_level);
    let mut failures = Vec::new();

    let x_axis_row = match overrides.x_axis_row {
        Some(row) => row.min(h.saturating_sub(1)),
        None => find_x_axis(&ink, crop, tuning).unwrap_or_else(|| {
            failures.push("x-axis line not found".to_string());
            crop.y2.min(h.saturating_sub(1))
        }),
    };
    let y_axis_col = match overrides.y_axis_col {
        Some(col) => col.min(w.saturating_sub(1)),
        None => find_y_axis(&ink, crop, tuning).unwrap_or_else(|| {
            failures.push("y-axis line not found".to_string());
            crop.x1.saturating_sub(1)
        }),
    };
    let lines = AxesPosition {
        x_axis_row,
        y_axis_col,
    };

    let x_ticks = find_x_ticks(&ink, crop, &lines, tuning);
    let y_ticks = find_y_ticks(&ink, crop, &lines, tuning);
    let x_confidence = tick_confidence(&x_ticks, tuning.saturating_tick_count);
    let y_confidence = tick_confidence(&y_ticks, tuning.saturating_tick_count);
    log::debug!(
        "Axes at row {} / col {}: {} x ticks ({:.2}), {} y ticks ({:.2})",
        x_axis_row,
        y_axis_col,
        x_ticks.len(),
        x_confidence,
        y_ticks.len(),
        y_confidence
    );

    let layout = AxisLayout {
        position: lines.clamp_into(crop),
        lines,
        x_ticks,
        y_ticks,
        x_confidence,
        y_confidence,
    };
    let confidence = (x_confidence + y_confidence) / 2.0;
    if failures.is_empty() {
        Outcome::ok(layout, confidence)
    } else {
        let reason = failures.join("; ");
        log::warn!("Axis locator: {}", reason);
        Outcome::degraded(layout, confidence, reason)
    }
}

fn is_ink(ink: &GrayImage, x: u32, y: u32) -> bool {
    ink.get_pixel(x, y)[0] == FOREGROUND
}

/// Row with the most ink across the crop columns, ties going to the lower row.
fn find_x_axis(ink: &GrayImage, crop: &CropBox, tuning: &AxisTuning) -> Option<u32> {
    let h = ink.height();
    let first = crop.y1.saturating_sub(tuning.search_band);
    let last = (crop.y2 + tuning.search_band).min(h);

    let mut best: Option<(u32, u32)> = None;
    for y in first..last {
        let count = (crop.x1..crop.x2).filter(|&x| is_ink(ink, x, y)).count() as u32;
        if best.map_or(true, |(_, c)| count >= c) {
            best = Some((y, count));
        }
    }

    let (row, count) = best?;
    let needed = crop.width() as f64 * tuning.min_axis_coverage;
    (count as f64 >= needed).then_some(row)
}

/// Column with the most ink across the crop rows, ties going to the left.
fn find_y_axis(ink: &GrayImage, crop: &CropBox, tuning: &AxisTuning) -> Option<u32> {
    let w = ink.width();
    let first = crop.x1.saturating_sub(tuning.search_band);
    let last = (crop.x2 + tuning.search_band).min(w);

    let mut best: Option<(u32, u32)> = None;
    for x in first..last {
        let count = (crop.y1..crop.y2).filter(|&y| is_ink(ink, x, y)).count() as u32;
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((x, count));
        }
    }

    let (col, count) = best?;
    let needed = crop.height() as f64 * tuning.min_axis_coverage;
    (count as f64 >= needed).then_some(col)
}

/// Tick columns below the x-axis, between the y-axis and the right edge.
fn find_x_ticks(ink: &GrayImage, crop: &CropBox, lines: &AxesPosition, tuning: &AxisTuning) -> Vec<f64> {
    let (w, h) = ink.dimensions();
    let top = lines.x_axis_row + tuning.tick_near;
    let bottom = (lines.x_axis_row + tuning.tick_far).min(h.saturating_sub(1));
    if top > bottom {
        return Vec::new();
    }

    let first = lines.y_axis_col.min(crop.x1);
    let last = (crop.x2 + tuning.search_band).min(w);
    let hits: Vec<bool> = (first..last)
        .map(|x| (top..=bottom).filter(|&y| is_ink(ink, x, y)).count() as u32 >= tuning.tick_min_ink)
        .collect();
    merge_close(run_centres(&hits, first), tuning.min_tick_spacing)
}

/// Tick rows left of the y-axis, between the top edge and the x-axis.
fn find_y_ticks(ink: &GrayImage, crop: &CropBox, lines: &AxesPosition, tuning: &AxisTuning) -> Vec<f64> {
    let h = ink.height();
    let Some(right) = lines.y_axis_col.checked_sub(tuning.tick_near) else {
        return Vec::new();
    };
    let left = lines.y_axis_col.saturating_sub(tuning.tick_far);

    let first = crop.y1.saturating_sub(tuning.search_band);
    let last = (lines.x_axis_row.max(crop.y2 - 1) + 1).min(h);
    let hits: Vec<bool> = (first..last)
        .map(|y| (left..=right).filter(|&x| is_ink(ink, x, y)).count() as u32 >= tuning.tick_min_ink)
        .collect();
    merge_close(run_centres(&hits, first), tuning.min_tick_spacing)
}

/// Centres of consecutive `true` runs, offset by `origin`.
fn run_centres(hits: &[bool], origin: u32) -> Vec<f64> {
    let mut centres = Vec::new();
    let mut start = None;
    for (i, &hit) in hits.iter().chain(std::iter::once(&false)).enumerate() {
        match (hit, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                centres.push(origin as f64 + (s + i - 1) as f64 / 2.0);
                start = None;
            },
            _ => {},
        }
    }
    centres
}

/// Merge ascending positions closer than `min_spacing` into their mean.
fn merge_close(positions: Vec<f64>, min_spacing: f64) -> Vec<f64> {
    let mut groups: Vec<Vec<f64>> = Vec::new();
    for p in positions {
        match groups.last_mut() {
            Some(group) if p - group[group.len() - 1] < min_spacing => group.push(p),
            _ => groups.push(vec![p]),
        }
    }
    groups
        .iter()
        .map(|g| g.iter().sum::<f64>() / g.len() as f64)
        .collect()
}

/// Tick confidence from count and spacing regularity.
///
/// `0.5 * min(n / saturating, 1) + 0.5 * (1 - CV(spacings))`, where fewer
/// than two ticks have no regularity.
pub fn tick_confidence(ticks: &[f64], saturating: usize) -> f64 {
    let count_term = (ticks.len() as f64 / saturating.max(1) as f64).min(1.0);
    if ticks.len() < 2 {
        return clamp_confidence(0.5 * count_term);
    }
    let spacings: Vec<f64> = ticks.windows(2).map(|w| w[1] - w[0]).collect();
    let mean = spacings.iter().sum::<f64>() / spacings.len() as f64;
    let regularity = if mean > 0.0 {
        let var = spacings.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / spacings.len() as f64;
        (1.0 - var.sqrt() / mean).clamp(0.0, 1.0)
    } else {
        0.0
    };
    clamp_confidence(0.5 * count_term + 0.5 * regularity)
}
