//! Chart layout analysis.
//!
//! This module locates the geometric frame of a chart:
//! - Plot area detection (axis-line segments, background contour, inset fallback)
//! - Axis line and tick mark location

pub mod axes;
pub mod plot_area;

// Re-export main types
pub use axes::{locate_axes, tick_confidence, AxisLayout};
pub use plot_area::{detect_plot_area, detect_segments};
