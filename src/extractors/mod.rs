//! Chart-type extractors.
//!
//! Each extractor takes the chart image and the plot area and returns the
//! data marks it found as pixel points in full-image coordinates, ordered
//! left to right, together with a heuristic confidence.

pub mod bar;
pub mod line;
pub mod scatter;

pub use bar::extract_bar;
pub use line::extract_line;
pub use scatter::{extract_scatter, extract_scatter_blob, extract_scatter_color, scatter_confidence};

use crate::chart_image::ChartImage;
use crate::error::{Error, Result};
use crate::geometry::{CropBox, PixelPoint};
use crate::outcome::Outcome;
use crate::tuning::Tuning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported chart types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// Individual markers
    Scatter,
    /// One connected series
    Line,
    /// Vertical bars
    Bar,
}

impl ChartType {
    /// Lowercase name, as used in requests and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Scatter => "scatter",
            ChartType::Line => "line",
            ChartType::Bar => "bar",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = Error;

    /// Parse a chart type token, ignoring case and surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::extractors::ChartType;
    ///
    /// assert_eq!(" Bar ".parse::<ChartType>().unwrap(), ChartType::Bar);
    /// assert!("pie".parse::<ChartType>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scatter" => Ok(ChartType::Scatter),
            "line" => Ok(ChartType::Line),
            "bar" => Ok(ChartType::Bar),
            other => Err(Error::UnknownChartType(other.to_string())),
        }
    }
}

/// Marker-finding strategy for scatter charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScatterMethod {
    /// Color first, blob detection when color finds too little
    #[default]
    Auto,
    /// Chromatic markers only
    Color,
    /// Dark round markers only
    Blob,
}

/// Run the extractor for `chart_type`.
pub fn extract_points(
    chart_type: ChartType,
    image: &ChartImage,
    crop: &CropBox,
    scatter_method: ScatterMethod,
    tuning: &Tuning,
) -> Outcome<Vec<PixelPoint>> {
    match chart_type {
        ChartType::Scatter => extract_scatter(image, crop, scatter_method, tuning),
        ChartType::Line => extract_line(image, crop, tuning),
        ChartType::Bar => extract_bar(image, crop, tuning),
    }
}

/// Guess the chart type of a plot area.
///
/// Checked in order: two or more solid, bar-sized shapes make a bar chart;
/// three or more scatter markers make a scatter chart; foreground in at
/// least half of the columns makes a line chart. Anything else is treated
/// as a scatter chart.
pub fn classify_chart(image: &ChartImage, crop: &CropBox, tuning: &Tuning) -> ChartType {
    let solid_bars = bar::bar_shapes(image, crop, tuning)
        .iter()
        .filter(|stats| stats.fill_ratio() >= tuning.bar.solid_fill_ratio)
        .count();
    if solid_bars >= 2 {
        log::debug!("Classified as bar chart ({} solid bars)", solid_bars);
        return ChartType::Bar;
    }

    let markers = extract_scatter(image, crop, ScatterMethod::Auto, tuning).value.len();
    if markers >= 3 {
        log::debug!("Classified as scatter chart ({} markers)", markers);
        return ChartType::Scatter;
    }

    let coverage = line::column_coverage(&line::line_mask(image, crop, tuning));
    if coverage >= 0.5 {
        log::debug!("Classified as line chart (coverage {:.2})", coverage);
        return ChartType::Line;
    }

    log::debug!("No clear chart type, defaulting to scatter");
    ChartType::Scatter
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn canvas() -> RgbImage {
        RgbImage::from_pixel(400, 300, Rgb([255, 255, 255]))
    }

    fn crop() -> CropBox {
        CropBox::within(20, 20, 380, 280, 400, 300).unwrap()
    }

    #[test]
    fn test_chart_type_roundtrip_names() {
        for chart_type in [ChartType::Scatter, ChartType::Line, ChartType::Bar] {
            assert_eq!(chart_type.to_string().parse::<ChartType>().unwrap(), chart_type);
        }
        assert!(matches!("pie".parse::<ChartType>(), Err(Error::UnknownChartType(t)) if t == "pie"));
        assert_eq!(serde_json::to_string(&ChartType::Line).unwrap(), "\"line\"");
    }

    #[test]
    fn test_classify_bars() {
        let mut rgb = canvas();
        for i in 0..3 {
            draw_filled_rect_mut(&mut rgb, Rect::at(60 + i * 100, 100 + i * 30).of_size(40, 160 - i as u32 * 30), Rgb([40, 40, 40]));
        }
        let image = ChartImage::from_rgb(rgb).unwrap();
        assert_eq!(classify_chart(&image, &crop(), &Tuning::default()), ChartType::Bar);
    }

    #[test]
    fn test_classify_scatter() {
        let mut rgb = canvas();
        for i in 0..5 {
            draw_filled_circle_mut(&mut rgb, (60 + i * 60, 240 - i * 40), 5, Rgb([200, 30, 30]));
        }
        let image = ChartImage::from_rgb(rgb).unwrap();
        assert_eq!(classify_chart(&image, &crop(), &Tuning::default()), ChartType::Scatter);
    }

    #[test]
    fn test_classify_line() {
        let mut rgb = canvas();
        for x in 30..370 {
            let y = 250 - (x - 30) / 2;
            draw_filled_rect_mut(&mut rgb, Rect::at(x, y - 2).of_size(1, 5), Rgb([20, 20, 20]));
        }
        let image = ChartImage::from_rgb(rgb).unwrap();
        assert_eq!(classify_chart(&image, &crop(), &Tuning::default()), ChartType::Line);
    }

    #[test]
    fn test_classify_blank_defaults_to_scatter() {
        let image = ChartImage::from_rgb(canvas()).unwrap();
        assert_eq!(classify_chart(&image, &crop(), &Tuning::default()), ChartType::Scatter);
    }

    #[test]
    fn test_dispatch_matches_direct_call() {
        let mut rgb = canvas();
        draw_filled_rect_mut(&mut rgb, Rect::at(100, 100).of_size(30, 150), Rgb([0, 0, 0]));
        let image = ChartImage::from_rgb(rgb).unwrap();
        let tuning = Tuning::default();
        let direct = extract_bar(&image, &crop(), &tuning);
        let dispatched = extract_points(ChartType::Bar, &image, &crop(), ScatterMethod::Auto, &tuning);
        assert_eq!(direct, dispatched);
    }
}
