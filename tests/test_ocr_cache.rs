//! Integration tests for the tick-label cache.

use chart_oxide::cache::{content_hash, CacheEntry, CacheStore, DiskCache, MemoryCache};
use chart_oxide::config::OcrBackendKind;
use chart_oxide::geometry::AxesPosition;
use chart_oxide::layout::AxisLayout;
use chart_oxide::ocr::{TextRecognizer, TickLabelRecognizer, TickMark, TickSet};
use chart_oxide::transform::ScaleKind;
use chart_oxide::tuning::OcrTuning;
use chart_oxide::{ChartExtractor, ChartImage, ChartType, ExtractOptions, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Answers every region with the next label of a fixed cycle and counts calls.
struct CountingEngine {
    labels: &'static [&'static str],
    calls: Arc<AtomicUsize>,
}

impl CountingEngine {
    fn new(labels: &'static [&'static str]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = Self {
            labels,
            calls: Arc::clone(&calls),
        };
        (engine, calls)
    }
}

impl TextRecognizer for CountingEngine {
    fn name(&self) -> &str {
        "counting"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, _region: &GrayImage) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.labels[n % self.labels.len()].to_string())
    }
}

fn layout() -> AxisLayout {
    let lines = AxesPosition {
        x_axis_row: 150,
        y_axis_col: 70,
    };
    AxisLayout {
        position: lines,
        lines,
        x_ticks: vec![100.0, 180.0, 260.0],
        y_ticks: vec![40.0, 120.0],
        x_confidence: 1.0,
        y_confidence: 1.0,
    }
}

fn gray() -> GrayImage {
    GrayImage::from_pixel(320, 200, Luma([255]))
}

// ============================================================================
// Read-through / write-through
// ============================================================================

#[test]
fn test_disk_cache_serves_second_request() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::new(dir.path()).unwrap();
    let (engine, calls) = CountingEngine::new(&["0", "10", "20", "5", "1"]);
    let tuning = OcrTuning::default();
    let recognizer = TickLabelRecognizer::new(&engine, &tuning).with_cache(&cache);

    let first = recognizer.recognize(&gray(), &layout(), OcrBackendKind::Local);
    let after_first = calls.load(Ordering::SeqCst);
    assert_eq!(after_first, 5);
    assert!(!first.value.cached);

    let second = recognizer.recognize(&gray(), &layout(), OcrBackendKind::Local);
    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert!(second.value.cached);
    assert_eq!(second.value.ticks, first.value.ticks);
    assert_eq!(second.confidence, first.confidence);

    let file = dir.path().join(format!("counting_{}.json", content_hash(&gray())));
    assert!(file.exists());
}

#[test]
fn test_different_image_misses() {
    let cache = MemoryCache::new();
    let (engine, calls) = CountingEngine::new(&["1"]);
    let tuning = OcrTuning::default();
    let recognizer = TickLabelRecognizer::new(&engine, &tuning).with_cache(&cache);

    recognizer.recognize(&gray(), &layout(), OcrBackendKind::Local);
    let mut other = gray();
    other.put_pixel(0, 0, Luma([0]));
    recognizer.recognize(&other, &layout(), OcrBackendKind::Local);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_corrupt_entry_is_a_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache = DiskCache::new(dir.path()).unwrap();
    let key = content_hash(&gray());
    std::fs::write(dir.path().join(format!("counting_{}.json", key)), "{ not json").unwrap();
    assert!(cache.get("counting", &key).is_none());

    let entry = CacheEntry {
        result: TickSet {
            x: vec![TickMark::new(100.0, 0.0, "0")],
            y: Vec::new(),
        },
        confidence: 0.5,
        backend: "counting".to_string(),
    };
    cache.put(&key, &entry);
    assert_eq!(cache.get("counting", &key), Some(entry));
    assert_eq!(cache.clear(), 1);
    assert!(cache.get("counting", &key).is_none());
}

#[test]
fn test_backend_is_part_of_the_key() {
    let cache = MemoryCache::new();
    let entry = CacheEntry {
        result: TickSet::default(),
        confidence: 0.0,
        backend: "tesseract".to_string(),
    };
    cache.put("abc", &entry);
    assert!(cache.get("tesseract", "abc").is_some());
    assert!(cache.get("remote", "abc").is_none());
}

#[test]
fn test_cache_key_ignores_layout() {
    let cache = MemoryCache::new();
    let (engine, calls) = CountingEngine::new(&["0", "10", "20", "5", "1"]);
    let tuning = OcrTuning::default();
    let recognizer = TickLabelRecognizer::new(&engine, &tuning).with_cache(&cache);

    let first = recognizer.recognize(&gray(), &layout(), OcrBackendKind::Local);
    let mut moved = layout();
    moved.x_ticks = vec![90.0, 200.0];
    let second = recognizer.recognize(&gray(), &moved, OcrBackendKind::Local);

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert!(second.value.cached);
    assert_eq!(second.value.ticks, first.value.ticks);

    // Without the cache the new layout is read.
    let uncached = TickLabelRecognizer::new(&engine, &tuning);
    uncached.recognize(&gray(), &moved, OcrBackendKind::Local);
    assert_eq!(calls.load(Ordering::SeqCst), 9);
}

// ============================================================================
// Through the extractor
// ============================================================================

#[test]
fn test_repeated_extraction_reuses_labels() {
    init();
    let mut rgb = RgbImage::from_pixel(600, 400, Rgb([255, 255, 255]));
    draw_filled_rect_mut(&mut rgb, Rect::at(60, 30).of_size(1, 331), Rgb([0, 0, 0]));
    draw_filled_rect_mut(&mut rgb, Rect::at(60, 360).of_size(490, 1), Rgb([0, 0, 0]));
    for i in 0..6 {
        draw_filled_rect_mut(&mut rgb, Rect::at(60 + 90 * i, 361).of_size(1, 6), Rgb([0, 0, 0]));
        draw_filled_rect_mut(&mut rgb, Rect::at(54, 360 - 60 * i).of_size(6, 1), Rgb([0, 0, 0]));
    }
    for (x, y) in [(150, 300), (300, 200), (450, 100)] {
        draw_filled_circle_mut(&mut rgb, (x, y), 5, Rgb([200, 30, 30]));
    }
    let image = ChartImage::from_rgb(rgb).unwrap();

    let (engine, calls) = CountingEngine::new(&["0", "1", "2", "3", "4", "5"]);
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let extractor = ChartExtractor::new()
        .with_text_recognizer(Box::new(engine))
        .with_cache(Arc::clone(&cache));
    let options = ExtractOptions::new()
        .with_chart_type(ChartType::Scatter)
        .with_scales(ScaleKind::Linear, ScaleKind::Linear);

    let first = extractor.extract(&image, &options).unwrap();
    let after_first = calls.load(Ordering::SeqCst);
    let second = extractor.extract(&image, &options).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), after_first);
    assert_eq!(first.data, second.data);
    assert_eq!(first.transform, second.transform);

    // Disabling the cache reads the labels again.
    let uncached = options.clone().with_cache(false);
    extractor.extract(&image, &uncached).unwrap();
    if after_first > 0 {
        assert!(calls.load(Ordering::SeqCst) > after_first);
    }
}
