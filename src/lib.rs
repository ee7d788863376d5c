// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Chart Oxide
//!
//! Recover the numeric data series behind a chart image (scatter, line or
//! bar) by locating the plot area and axes, reading the tick labels,
//! fitting a pixel-to-data mapping and extracting the plotted marks.
//!
//! ## Core Features
//!
//! - **Plot-area detection**: edges and line segments, with a margin fallback
//! - **Axis location**: dominant horizontal/vertical lines and tick marks
//! - **Tick reading**: local `tesseract` or a remote vision model, with a
//!   content-addressed cache
//! - **Calibration**: least-squares fit on linear or logarithmic axes, or
//!   two manual reference points per axis
//! - **Extraction**: color and blob strategies for scatter markers,
//!   per-column line tracing, bar tops
//! - **Vision mode**: whole-chart extraction through a vision-language
//!   model, with automatic fallback to the pipeline
//! - **Export**: CSV and JSON renderings, debug overlays
//!
//! Every stage reports a confidence; degraded stages add warnings to the
//! result instead of failing the request.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chart_oxide::{ChartExtractor, ChartImage, ExtractOptions};
//! use chart_oxide::transform::ScaleKind;
//!
//! # fn main() -> chart_oxide::Result<()> {
//! let image = ChartImage::open("chart.png")?;
//! let options = ExtractOptions::new().with_scales(ScaleKind::Linear, ScaleKind::Log);
//!
//! let result = ChartExtractor::new().extract(&image, &options)?;
//! println!("{} points, confidence {:.2}", result.data.len(), result.confidence);
//! for warning in &result.warnings {
//!     println!("{}", warning);
//! }
//! print!("{}", chart_oxide::export::to_csv(&result));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;
pub mod outcome;

// Configuration
pub mod config;
pub mod tuning;

// Image model and raster primitives
pub mod chart_image;
pub mod geometry;
pub mod raster;

// Plot area and axes
pub mod layout;

// Tick-label recognition
pub mod cache;
pub mod ocr;

// Pixel-to-data mapping
pub mod transform;

// Mark extraction
pub mod extractors;

// Orchestration
pub mod hybrid;
pub mod pipeline;
pub mod vision;

// Output
pub mod debug;
pub mod export;

// Re-exports
pub use chart_image::ChartImage;
pub use config::{AxisOverrides, ExtractOptions, OcrBackendKind, RemoteServiceConfig};
pub use error::{Error, Result};
pub use extractors::{ChartType, ScatterMethod};
pub use geometry::{CropBox, DataPoint, PixelPoint};
pub use hybrid::{ChartExtractor, ExtractionMode};
pub use outcome::Outcome;
pub use pipeline::{ChartResult, Warning, WarningCode};
pub use transform::{CalibrationPoint, ManualCalibration, ScaleKind};
pub use tuning::Tuning;

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Total order on floats for sorting: NaN sorts after every number and
    /// equal to itself.
    #[inline]
    pub fn safe_float_cmp(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
