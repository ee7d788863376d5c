//! Debug visualization of extraction results.
//!
//! Renders the detected plot area, the axis lines and the extracted points
//! over the chart image, useful for checking what the pipeline saw.
//!
//! ## Example
//!
//! ```ignore
//! use chart_oxide::{ChartExtractor, ChartImage, ExtractOptions};
//!
//! let image = ChartImage::open("chart.png")?;
//! let result = extractor.extract(&image, &ExtractOptions::new().with_overlay(true))?;
//! result.overlay.unwrap().save("chart_overlay.png")?;
//! ```

mod visualizer;

pub use visualizer::{OverlayColors, OverlayOptions, OverlayRenderer};
