//! Overlay renderer for extraction results.

use crate::extractors::ChartType;
use crate::geometry::{AxesPosition, CropBox, PixelPoint};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Colors of the overlay layers.
#[derive(Debug, Clone)]
pub struct OverlayColors {
    /// Plot-area outline
    pub crop: Rgb<u8>,
    /// Axis lines
    pub axes: Rgb<u8>,
    /// Extracted data marks
    pub data: Rgb<u8>,
}

impl Default for OverlayColors {
    fn default() -> Self {
        Self {
            crop: Rgb([0, 200, 0]), // Green
            axes: Rgb([0, 0, 255]), // Blue
            data: Rgb([255, 0, 0]), // Red
        }
    }
}

/// Options for overlay rendering.
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Stroke width of outlines and lines in pixels
    pub line_width: u32,
    /// Radius of scatter markers
    pub marker_radius: i32,
    /// Half size of the bar-top crosses
    pub cross_size: f32,
    /// Layer colors
    pub colors: OverlayColors,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            line_width: 2,
            marker_radius: 4,
            cross_size: 5.0,
            colors: OverlayColors::default(),
        }
    }
}

/// Draws the plot area, axes and extracted points over a chart.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    options: OverlayOptions,
}

impl OverlayRenderer {
    /// Create a renderer with the given options.
    pub fn new(options: OverlayOptions) -> Self {
        Self { options }
    }

    /// Render an overlay onto a copy of `base`.
    ///
    /// Scatter points are drawn as filled circles, line points as a
    /// connected polyline, and bar tops as tilted crosses.
    pub fn render(
        &self,
        base: &RgbImage,
        crop: &CropBox,
        axes: &AxesPosition,
        chart_type: ChartType,
        points: &[PixelPoint],
    ) -> RgbImage {
        let mut canvas = base.clone();
        let colors = &self.options.colors;

        for i in 0..self.options.line_width {
            let (w, h) = (crop.width() + 2 * i, crop.height() + 2 * i);
            let rect = Rect::at(crop.x1 as i32 - i as i32, crop.y1 as i32 - i as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, colors.crop);
        }

        let row = axes.x_axis_row as f32;
        let col = axes.y_axis_col as f32;
        self.thick_line(&mut canvas, (crop.x1 as f32, row), (crop.x2 as f32, row), colors.axes);
        self.thick_line(&mut canvas, (col, crop.y1 as f32), (col, crop.y2 as f32), colors.axes);

        match chart_type {
            ChartType::Scatter => {
                for p in points {
                    let center = (p.x.round() as i32, p.y.round() as i32);
                    draw_filled_circle_mut(&mut canvas, center, self.options.marker_radius, colors.data);
                }
            },
            ChartType::Line => {
                for pair in points.windows(2) {
                    let a = (pair[0].x as f32, pair[0].y as f32);
                    let b = (pair[1].x as f32, pair[1].y as f32);
                    self.thick_line(&mut canvas, a, b, colors.data);
                }
            },
            ChartType::Bar => {
                let s = self.options.cross_size;
                for p in points {
                    let (x, y) = (p.x as f32, p.y as f32);
                    self.thick_line(&mut canvas, (x - s, y - s), (x + s, y + s), colors.data);
                    self.thick_line(&mut canvas, (x - s, y + s), (x + s, y - s), colors.data);
                }
            },
        }

        log::debug!("Overlay: {} {} points drawn", points.len(), chart_type);
        canvas
    }

    /// Draw a line `line_width` pixels thick, widened across its dominant direction.
    fn thick_line(&self, canvas: &mut RgbImage, a: (f32, f32), b: (f32, f32), color: Rgb<u8>) {
        let steep = (b.1 - a.1).abs() > (b.0 - a.0).abs();
        let width = self.options.line_width.max(1) as i32;
        for k in 0..width {
            let d = (k - width / 2) as f32;
            let (da, db) = if steep {
                ((a.0 + d, a.1), (b.0 + d, b.1))
            } else {
                ((a.0, a.1 + d), (b.0, b.1 + d))
            };
            draw_line_segment_mut(canvas, da, db, color);
        }
    }
}
