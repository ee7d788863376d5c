//! Contour extraction and shape statistics.

use crate::geometry::{PixelBounds, PixelPoint};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point;

/// Outer borders of the top-level foreground components of a mask.
pub fn external_contours(mask: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Signed shoelace area of a closed polygon.
fn signed_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        twice += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    twice / 2.0
}

/// Absolute area of a closed polygon.
pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    signed_area(points).abs()
}

/// Length of a closed polygon's boundary.
pub fn perimeter(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    arc_length(points, true)
}

/// Geometric description of one contour.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStats {
    /// Enclosed area (px²)
    pub area: f64,
    /// Boundary length (px)
    pub perimeter: f64,
    /// `4π·area / perimeter²`, 1 for a circle
    pub circularity: f64,
    /// Area over convex hull area, 1 for a convex shape
    pub convexity: f64,
    /// Smaller over larger principal moment of inertia, 1 for a disc
    pub inertia_ratio: f64,
    /// Area centroid
    pub centroid: PixelPoint,
    /// Bounding box of the contour pixels
    pub bounds: PixelBounds,
}

impl ShapeStats {
    /// Measure a contour. Returns `None` for an empty point list.
    pub fn measure(points: &[Point<i32>]) -> Option<Self> {
        let bounds = PixelBounds::of_points(points.iter().map(|p| (p.x, p.y)))?;
        let area = polygon_area(points);
        let perimeter = perimeter(points);
        let circularity = if perimeter > 0.0 {
            4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
        } else {
            0.0
        };

        let hull = convex_hull(points);
        let hull_area = polygon_area(&hull);
        let convexity = if hull_area > 0.0 { area / hull_area } else { 0.0 };

        let moments = Moments::of_polygon(points);
        let centroid = moments.centroid().unwrap_or_else(|| {
            let n = points.len() as f64;
            PixelPoint::new(
                points.iter().map(|p| p.x as f64).sum::<f64>() / n,
                points.iter().map(|p| p.y as f64).sum::<f64>() / n,
            )
        });

        Some(Self {
            area,
            perimeter,
            circularity,
            convexity,
            inertia_ratio: moments.inertia_ratio(),
            centroid,
            bounds,
        })
    }

    /// Fraction of the bounding box covered by the shape.
    pub fn fill_ratio(&self) -> f64 {
        // Contour vertices sit on pixel centres, so the polygon spans one pixel less.
        let box_area = ((self.bounds.width() - 1) * (self.bounds.height() - 1)) as f64;
        if box_area > 0.0 {
            self.area / box_area
        } else {
            0.0
        }
    }
}

/// Raw area moments of a polygon up to second order.
struct Moments {
    m00: f64,
    m10: f64,
    m01: f64,
    m20: f64,
    m11: f64,
    m02: f64,
}

impl Moments {
    /// Green's theorem over the polygon edges.
    fn of_polygon(points: &[Point<i32>]) -> Self {
        let mut m = Moments {
            m00: 0.0,
            m10: 0.0,
            m01: 0.0,
            m20: 0.0,
            m11: 0.0,
            m02: 0.0,
        };
        let n = points.len();
        if n < 3 {
            return m;
        }
        for i in 0..n {
            let (x0, y0) = (points[i].x as f64, points[i].y as f64);
            let (x1, y1) = (points[(i + 1) % n].x as f64, points[(i + 1) % n].y as f64);
            let a = x0 * y1 - x1 * y0;
            m.m00 += a;
            m.m10 += (x0 + x1) * a;
            m.m01 += (y0 + y1) * a;
            m.m20 += (x0 * x0 + x0 * x1 + x1 * x1) * a;
            m.m02 += (y0 * y0 + y0 * y1 + y1 * y1) * a;
            m.m11 += (x0 * y1 + 2.0 * x0 * y0 + 2.0 * x1 * y1 + x1 * y0) * a;
        }
        m.m00 /= 2.0;
        m.m10 /= 6.0;
        m.m01 /= 6.0;
        m.m20 /= 12.0;
        m.m02 /= 12.0;
        m.m11 /= 24.0;
        m
    }

    fn centroid(&self) -> Option<PixelPoint> {
        if self.m00.abs() < 1e-9 {
            return None;
        }
        Some(PixelPoint::new(self.m10 / self.m00, self.m01 / self.m00))
    }

    fn inertia_ratio(&self) -> f64 {
        let Some(c) = self.centroid() else {
            return 0.0;
        };
        // Central moments normalised by area; the orientation sign cancels out.
        let mu20 = self.m20 / self.m00 - c.x * c.x;
        let mu02 = self.m02 / self.m00 - c.y * c.y;
        let mu11 = self.m11 / self.m00 - c.x * c.y;

        let mean = (mu20 + mu02) / 2.0;
        let spread = (((mu20 - mu02) / 2.0).powi(2) + mu11 * mu11).sqrt();
        let major = mean + spread;
        let minor = mean - spread;
        if major <= 0.0 {
            0.0
        } else {
            (minor / major).clamp(0.0, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn square(x: i32, y: i32, side: i32) -> Vec<Point<i32>> {
        vec![
            Point::new(x, y),
            Point::new(x + side, y),
            Point::new(x + side, y + side),
            Point::new(x, y + side),
        ]
    }

    #[test]
    fn test_square_stats() {
        let stats = ShapeStats::measure(&square(10, 20, 10)).unwrap();
        assert!((stats.area - 100.0).abs() < 1e-9);
        assert!((stats.perimeter - 40.0).abs() < 1e-9);
        assert!((stats.centroid.x - 15.0).abs() < 1e-9);
        assert!((stats.centroid.y - 25.0).abs() < 1e-9);
        assert!((stats.convexity - 1.0).abs() < 1e-9);
        assert!((stats.inertia_ratio - 1.0).abs() < 1e-9);
        assert!((stats.circularity - std::f64::consts::PI / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_perimeter_closes_the_polygon() {
        let triangle = [Point::new(0, 0), Point::new(3, 0), Point::new(3, 4)];
        assert!((perimeter(&triangle) - 12.0).abs() < 1e-9);
        assert_eq!(perimeter(&[Point::new(5, 5)]), 0.0);
        assert_eq!(perimeter(&[]), 0.0);
    }

    #[test]
    fn test_elongated_rectangle_has_low_inertia_ratio() {
        let rect = vec![
            Point::new(0, 0),
            Point::new(40, 0),
            Point::new(40, 4),
            Point::new(0, 4),
        ];
        let stats = ShapeStats::measure(&rect).unwrap();
        assert!(stats.inertia_ratio < 0.05);
    }

    #[test]
    fn test_drawn_disc_is_round() {
        let mut mask = GrayImage::new(40, 40);
        draw_filled_circle_mut(&mut mask, (20, 20), 6, Luma([255u8]));
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let stats = ShapeStats::measure(&contours[0]).unwrap();
        assert!(stats.circularity > 0.7, "circularity {}", stats.circularity);
        assert!(stats.inertia_ratio > 0.8);
        assert!(stats.convexity > 0.9);
        assert!((stats.centroid.x - 20.0).abs() < 0.5);
        assert!((stats.centroid.y - 20.0).abs() < 0.5);
    }

    #[test]
    fn test_external_contours_ignore_holes() {
        let mut mask = GrayImage::new(50, 50);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(30, 30), Luma([255u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(12, 12).of_size(10, 10), Luma([0u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(15, 15).of_size(3, 3), Luma([255u8]));
        assert_eq!(external_contours(&mask).len(), 1);
    }

    #[test]
    fn test_filled_rectangle_fill_ratio() {
        let mut mask = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut mask, Rect::at(10, 10).of_size(20, 30), Luma([255u8]));
        let contours = external_contours(&mask);
        let stats = ShapeStats::measure(&contours[0]).unwrap();
        assert_eq!(stats.bounds.width(), 20);
        assert_eq!(stats.bounds.height(), 30);
        assert!(stats.fill_ratio() > 0.95);
    }
}
