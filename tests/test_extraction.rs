//! End-to-end extraction tests on synthetic charts.

use chart_oxide::extractors::{extract_points, extract_scatter};
use chart_oxide::geometry::CropBox;
use chart_oxide::ocr::TextRecognizer;
use chart_oxide::transform::{CalibrationPoint, ManualCalibration};
use chart_oxide::{
    export, ChartExtractor, ChartImage, ChartType, Error, ExtractOptions, Result, ScatterMethod, Tuning,
    WarningCode,
};
use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Engine that is never installed.
struct NoEngine;

impl TextRecognizer for NoEngine {
    fn name(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn recognize(&self, _region: &GrayImage) -> Result<String> {
        Err(Error::BackendUnavailable("not installed".to_string()))
    }
}

fn extractor() -> ChartExtractor {
    ChartExtractor::new().with_text_recognizer(Box::new(NoEngine))
}

fn white(w: u32, h: u32) -> RgbImage {
    RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
}

fn draw_axes(rgb: &mut RgbImage) {
    draw_filled_rect_mut(rgb, Rect::at(50, 40).of_size(2, 320), Rgb([0, 0, 0]));
    draw_filled_rect_mut(rgb, Rect::at(50, 358).of_size(500, 2), Rgb([0, 0, 0]));
}

/// Axis pixels (50, 350) map to (0, 0); (550, 50) map to (10, 100).
fn calibration() -> ManualCalibration {
    ManualCalibration::new(
        [CalibrationPoint::new(50.0, 0.0), CalibrationPoint::new(550.0, 10.0)],
        [CalibrationPoint::new(350.0, 0.0), CalibrationPoint::new(50.0, 100.0)],
    )
}

fn plot_crop() -> CropBox {
    CropBox::within(55, 45, 545, 355, 600, 400).unwrap()
}

// ============================================================================
// Scatter
// ============================================================================

#[test]
fn test_scatter_without_markers_is_empty() {
    init();
    let blank = ChartImage::from_rgb(white(400, 300)).unwrap();
    let outcome = extract_scatter(&blank, &CropBox::full(400, 300), ScatterMethod::Auto, &Tuning::default());
    assert!(outcome.value.is_empty());
    assert_eq!(outcome.confidence, 0.1);
}

#[test]
fn test_scatter_chart_end_to_end() {
    init();
    let mut rgb = white(600, 400);
    draw_axes(&mut rgb);
    let markers = [(100, 320), (200, 260), (300, 200), (400, 140), (500, 80)];
    for (x, y) in markers {
        draw_filled_circle_mut(&mut rgb, (x, y), 5, Rgb([220, 40, 40]));
    }
    let image = ChartImage::from_rgb(rgb).unwrap();
    let options = ExtractOptions::new()
        .with_chart_type(ChartType::Scatter)
        .with_crop(plot_crop())
        .with_calibration(calibration());

    let result = extractor().extract(&image, &options).unwrap();
    assert_eq!(result.chart_type, ChartType::Scatter);
    assert_eq!(result.data.len(), markers.len());
    for (point, (px, py)) in result.data.iter().zip(markers) {
        let expected_x = (px as f64 - 50.0) / 50.0;
        let expected_y = (350.0 - py as f64) / 3.0;
        assert!((point.x - expected_x).abs() < 0.05, "x {} vs {}", point.x, expected_x);
        assert!((point.y - expected_y).abs() < 0.5, "y {} vs {}", point.y, expected_y);
    }
    assert!((0.0..=1.0).contains(&result.confidence));
    assert!(!result.has_warning(WarningCode::TransformIdentity));

    let csv = export::to_csv(&result);
    assert!(csv.starts_with("x,y\n"));
    assert_eq!(csv.lines().count(), markers.len() + 1);
}

#[test]
fn test_extraction_is_deterministic() {
    let mut rgb = white(600, 400);
    draw_axes(&mut rgb);
    for (x, y) in [(120, 300), (260, 180), (420, 90)] {
        draw_filled_circle_mut(&mut rgb, (x, y), 6, Rgb([20, 20, 20]));
    }
    let image = ChartImage::from_rgb(rgb).unwrap();
    let tuning = Tuning::default();

    let a = extract_points(ChartType::Scatter, &image, &plot_crop(), ScatterMethod::Auto, &tuning);
    let b = extract_points(ChartType::Scatter, &image, &plot_crop(), ScatterMethod::Auto, &tuning);
    assert_eq!(a, b);
    assert_eq!(a.value.len(), 3);
}

// ============================================================================
// Line and bar
// ============================================================================

#[test]
fn test_line_chart_end_to_end() {
    init();
    let mut rgb = white(600, 400);
    draw_axes(&mut rgb);
    // 5px-thick series from (100, 300) rising to (500, 100)
    for x in 100..500 {
        let y = 300 - (x - 100) / 2;
        draw_filled_rect_mut(&mut rgb, Rect::at(x, y - 2).of_size(1, 5), Rgb([30, 30, 200]));
    }
    let image = ChartImage::from_rgb(rgb).unwrap();
    let options = ExtractOptions::new()
        .with_chart_type(ChartType::Line)
        .with_crop(plot_crop())
        .with_calibration(calibration());

    let result = extractor().extract(&image, &options).unwrap();
    assert_eq!(result.chart_type, ChartType::Line);
    assert!(result.data.len() > 300, "{} points", result.data.len());
    assert!(result.data.windows(2).all(|w| w[0].x < w[1].x));
    // Pixel column 300 is x = 5, row 200 is y = 50
    let mid = result
        .data
        .iter()
        .min_by(|a, b| (a.x - 5.0).abs().total_cmp(&(b.x - 5.0).abs()))
        .unwrap();
    assert!((mid.y - 50.0).abs() < 1.0, "y at x=5: {}", mid.y);
}

#[test]
fn test_bar_chart_end_to_end() {
    init();
    let mut rgb = white(600, 400);
    draw_axes(&mut rgb);
    let bars = [(100, 250), (220, 150), (340, 200), (460, 100)];
    for (x, top) in bars {
        draw_filled_rect_mut(&mut rgb, Rect::at(x, top).of_size(60, (350 - top) as u32), Rgb([70, 130, 180]));
    }
    let image = ChartImage::from_rgb(rgb).unwrap();
    let options = ExtractOptions::new()
        .with_crop(plot_crop())
        .with_calibration(calibration());

    let result = extractor().extract(&image, &options).unwrap();
    assert_eq!(result.chart_type, ChartType::Bar);
    assert_eq!(result.data.len(), bars.len());
    let tallest = result.data.iter().map(|p| p.y).fold(f64::MIN, f64::max);
    assert!((tallest - 83.3).abs() < 2.0, "tallest bar {}", tallest);
    assert!(export::to_csv(&result).starts_with("x,value\n"));
}

#[test]
fn test_blank_chart_reports_no_usable_result() {
    let image = ChartImage::from_rgb(white(300, 200)).unwrap();
    let err = extractor().extract(&image, &ExtractOptions::new()).unwrap_err();
    assert!(matches!(err, Error::NoUsableResult(_)));
}
