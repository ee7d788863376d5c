//! Vision-model and pipeline arbitration.
//!
//! # Modes
//!
//! - `Vision`: one vision-language request; its failure is returned
//! - `Pipeline`: the computer-vision pipeline only
//! - `Auto`: vision first, the pipeline (with one fallback warning) when the
//!   vision reply is an error or carries no data
//!
//! # Example
//!
//! ```ignore
//! use chart_oxide::hybrid::{ChartExtractor, ExtractionMode};
//! use chart_oxide::ExtractOptions;
//!
//! let extractor = ChartExtractor::new().with_vision_channel(Box::new(channel));
//! let result = extractor.extract(&image, &ExtractOptions::new().with_mode(ExtractionMode::Auto))?;
//! ```

pub mod arbiter;
pub mod extractor;

pub use arbiter::{ArbiterState, ExtractionMode};
pub use extractor::ChartExtractor;
