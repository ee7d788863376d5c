//! Geometric primitives for chart analysis.
//!
//! Pixel space uses the image convention: origin at the top-left corner,
//! x grows to the right, y grows downwards. Value space is whatever the
//! chart's axes say it is.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A point in pixel space, before calibration is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    /// Column (may be sub-pixel)
    pub x: f64,
    /// Row (may be sub-pixel)
    pub y: f64,
}

impl PixelPoint {
    /// Create a new pixel point.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::geometry::PixelPoint;
    ///
    /// let point = PixelPoint::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Shift the point by a pixel offset.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A point in value space: the final output unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// X value
    pub x: f64,
    /// Y value
    pub y: f64,
}

impl DataPoint {
    /// Create a new data point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A crop rectangle `(x1, y1, x2, y2)` in pixel space, `x2`/`y2` exclusive.
///
/// Construction enforces `0 <= x1 < x2 <= width` and `0 <= y1 < y2 <= height`
/// for the image it was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropBox {
    /// Left edge (inclusive)
    pub x1: u32,
    /// Top edge (inclusive)
    pub y1: u32,
    /// Right edge (exclusive)
    pub x2: u32,
    /// Bottom edge (exclusive)
    pub y2: u32,
}

impl CropBox {
    /// Create a crop box, validating it against the image dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::geometry::CropBox;
    ///
    /// let crop = CropBox::within(50, 40, 550, 360, 600, 400).unwrap();
    /// assert_eq!(crop.width(), 500);
    /// assert!(CropBox::within(50, 40, 700, 360, 600, 400).is_err());
    /// ```
    pub fn within(x1: u32, y1: u32, x2: u32, y2: u32, width: u32, height: u32) -> Result<Self> {
        if x1 >= x2 || y1 >= y2 {
            return Err(Error::InvalidCrop(format!(
                "({}, {}, {}, {}) is empty",
                x1, y1, x2, y2
            )));
        }
        if x2 > width || y2 > height {
            return Err(Error::InvalidCrop(format!(
                "({}, {}, {}, {}) exceeds image {}x{}",
                x1, y1, x2, y2, width, height
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Crop covering the whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x1: 0,
            y1: 0,
            x2: width.max(1),
            y2: height.max(1),
        }
    }

    /// Crop with a fixed fractional inset on every side.
    ///
    /// `inset(600, 400, 0.1)` is `(60, 40, 540, 360)`. Images too small to
    /// inset fall back to the full frame.
    pub fn inset(width: u32, height: u32, fraction: f64) -> Self {
        let mx = (width as f64 * fraction) as u32;
        let my = (height as f64 * fraction) as u32;
        if width <= 2 * mx || height <= 2 * my {
            return Self::full(width, height);
        }
        Self {
            x1: mx,
            y1: my,
            x2: width - mx,
            y2: height - my,
        }
    }

    /// Build a crop from signed, possibly out-of-range corners, clamping to the image.
    ///
    /// Returns `None` when nothing non-empty remains after clamping.
    pub fn clamped(x1: i64, y1: i64, x2: i64, y2: i64, width: u32, height: u32) -> Option<Self> {
        let x1 = x1.clamp(0, width as i64) as u32;
        let y1 = y1.clamp(0, height as i64) as u32;
        let x2 = x2.clamp(0, width as i64) as u32;
        let y2 = y2.clamp(0, height as i64) as u32;
        if x1 < x2 && y1 < y2 {
            Some(Self { x1, y1, x2, y2 })
        } else {
            None
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Area in square pixels.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Check whether a pixel lies inside the box.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    /// Check whether this box satisfies the invariant for an image of the given size.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2 && self.x2 <= width && self.y2 <= height
    }
}

/// Pixel position of both axis lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxesPosition {
    /// Row of the x-axis line
    pub x_axis_row: u32,
    /// Column of the y-axis line
    pub y_axis_col: u32,
}

impl AxesPosition {
    /// Clamp both axes into a crop box.
    pub fn clamp_into(&self, crop: &CropBox) -> Self {
        Self {
            x_axis_row: self.x_axis_row.clamp(crop.y1, crop.y2 - 1),
            y_axis_col: self.y_axis_col.clamp(crop.x1, crop.x2 - 1),
        }
    }
}

/// A straight line segment between two pixel positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    /// Start column
    pub x1: f64,
    /// Start row
    pub y1: f64,
    /// End column
    pub x2: f64,
    /// End row
    pub y2: f64,
}

impl LineSegment {
    /// Create a new segment.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Unsigned angle against the x-axis in degrees, in `[0, 180]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chart_oxide::geometry::LineSegment;
    ///
    /// assert_eq!(LineSegment::new(0.0, 5.0, 10.0, 5.0).angle_degrees(), 0.0);
    /// assert_eq!(LineSegment::new(3.0, 0.0, 3.0, 10.0).angle_degrees(), 90.0);
    /// ```
    pub fn angle_degrees(&self) -> f64 {
        (self.y2 - self.y1).atan2(self.x2 - self.x1).to_degrees().abs()
    }

    /// Segment length in pixels.
    pub fn length(&self) -> f64 {
        ((self.x2 - self.x1).powi(2) + (self.y2 - self.y1).powi(2)).sqrt()
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> PixelPoint {
        PixelPoint::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

/// Axis-aligned bounding box of a pixel region, inclusive on all sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    /// Leftmost column
    pub left: i32,
    /// Topmost row
    pub top: i32,
    /// Rightmost column
    pub right: i32,
    /// Bottommost row
    pub bottom: i32,
}

impl PixelBounds {
    /// Bounds of a set of integer points, `None` for an empty set.
    pub fn of_points(points: impl IntoIterator<Item = (i32, i32)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bounds = Self {
            left: x0,
            top: y0,
            right: x0,
            bottom: y0,
        };
        for (x, y) in iter {
            bounds.left = bounds.left.min(x);
            bounds.right = bounds.right.max(x);
            bounds.top = bounds.top.min(y);
            bounds.bottom = bounds.bottom.max(y);
        }
        Some(bounds)
    }

    /// Width in pixels (inclusive extent).
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Height in pixels (inclusive extent).
    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }
}
