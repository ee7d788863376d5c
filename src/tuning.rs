//! Heuristic tunables for every detection and extraction stage.
//!
//! The defaults reproduce the reference behaviour; individual fields can be
//! adjusted per deployment without touching the algorithms. Pixel sizes are
//! expressed for images whose longest side is at most
//! [`Tuning::max_image_side`].

/// Plot-area detection parameters.
#[derive(Debug, Clone)]
pub struct PlotAreaTuning {
    /// Canny low hysteresis threshold
    pub canny_low: f32,
    /// Canny high hysteresis threshold
    pub canny_high: f32,
    /// Minimum Hough accumulator votes for a line
    pub hough_votes: u32,
    /// Non-maximum suppression radius in Hough space
    pub hough_suppression: u32,
    /// Minimum segment length as a fraction of `min(width, height)`
    pub min_segment_fraction: f64,
    /// Largest gap (pixels) bridged while tracing a segment
    pub max_segment_gap: u32,
    /// Segments within this many degrees of 0/180 are horizontal
    pub horizontal_tolerance_deg: f64,
    /// Segments within this many degrees of 90 are vertical
    pub vertical_tolerance_deg: f64,
    /// Detected region must span at least this fraction of each image dimension
    pub min_region_fraction: f64,
    /// Region spanning this fraction of both dimensions earns the top score
    pub large_region_fraction: f64,
    /// Gray level above which a pixel counts as plot background
    pub background_level: u8,
    /// Contour candidates must cover this fraction of the image area
    pub min_contour_area_fraction: f64,
    /// Polygon approximation epsilon as a fraction of the contour perimeter
    pub polygon_epsilon_fraction: f64,
    /// Margin (px) a contour-fallback region is shrunk by
    pub contour_margin: u32,
    /// Inset used by the geometric fallback
    pub fallback_inset: f64,
    /// Confidence when the region spans `large_region_fraction` in both dims
    pub conf_large: f64,
    /// Confidence when the region passes the size check
    pub conf_sized: f64,
    /// Confidence of a sized contour fallback
    pub conf_contour: f64,
    /// Confidence of an undersized contour fallback
    pub conf_contour_undersized: f64,
    /// Confidence of the geometric fallback
    pub conf_geometric: f64,
}

impl Default for PlotAreaTuning {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            hough_votes: 100,
            hough_suppression: 8,
            min_segment_fraction: 0.25,
            max_segment_gap: 10,
            horizontal_tolerance_deg: 10.0,
            vertical_tolerance_deg: 10.0,
            min_region_fraction: 0.3,
            large_region_fraction: 0.5,
            background_level: 240,
            min_contour_area_fraction: 0.2,
            polygon_epsilon_fraction: 0.02,
            contour_margin: 10,
            fallback_inset: 0.1,
            conf_large: 0.9,
            conf_sized: 0.8,
            conf_contour: 0.7,
            conf_contour_undersized: 0.4,
            conf_geometric: 0.3,
        }
    }
}

/// Axis and tick location parameters.
#[derive(Debug, Clone)]
pub struct AxisTuning {
    /// Gray level below which a pixel is "ink"
    pub ink_level: u8,
    /// Search band (pixels) around the crop edges for axis lines
    pub search_band: u32,
    /// An axis line must cover this fraction of the crop extent
    pub min_axis_coverage: f64,
    /// Closest tick-mark pixel to the axis line that is sampled
    pub tick_near: u32,
    /// Farthest tick-mark pixel from the axis line that is sampled
    pub tick_far: u32,
    /// Ink pixels needed in the sampled band for a tick column/row
    pub tick_min_ink: u32,
    /// Ticks closer than this are merged
    pub min_tick_spacing: f64,
    /// Tick count at which the count term of the confidence saturates
    pub saturating_tick_count: usize,
}

impl Default for AxisTuning {
    fn default() -> Self {
        Self {
            ink_level: 128,
            search_band: 12,
            min_axis_coverage: 0.5,
            tick_near: 2,
            tick_far: 8,
            tick_min_ink: 3,
            min_tick_spacing: 5.0,
            saturating_tick_count: 5,
        }
    }
}

/// Tick-label OCR window geometry.
#[derive(Debug, Clone)]
pub struct OcrTuning {
    /// Half width of the window below an x tick
    pub x_window_half_width: u32,
    /// Window start below the x-axis
    pub x_window_top: u32,
    /// Window end below the x-axis
    pub x_window_bottom: u32,
    /// Window start left of the y-axis (farthest column)
    pub y_window_far: u32,
    /// Window end left of the y-axis (nearest column)
    pub y_window_near: u32,
    /// Half height of the window beside a y tick
    pub y_window_half_height: u32,
    /// Strip height below the x-axis for the batched remote request
    pub x_strip_height: u32,
    /// Strip width left of the y-axis for the batched remote request
    pub y_strip_width: u32,
    /// Adaptive threshold block radius
    pub adaptive_block_radius: u32,
    /// Adaptive threshold offset subtracted from the local mean
    pub adaptive_offset: i32,
}

impl Default for OcrTuning {
    fn default() -> Self {
        Self {
            x_window_half_width: 30,
            x_window_top: 5,
            x_window_bottom: 40,
            y_window_far: 60,
            y_window_near: 5,
            y_window_half_height: 15,
            x_strip_height: 60,
            y_strip_width: 80,
            adaptive_block_radius: 5,
            adaptive_offset: 2,
        }
    }
}

/// Color-based scatter marker detection.
#[derive(Debug, Clone)]
pub struct ScatterColorTuning {
    /// Saturation above which a pixel is chromatic
    pub saturation_level: u8,
    /// Smallest accepted marker area (px²)
    pub min_area: f64,
    /// Largest accepted marker area (px²)
    pub max_area: f64,
    /// Minimum `4π·area/perimeter²`
    pub min_circularity: f64,
    /// Color result is accepted outright at or above this confidence
    pub accept_confidence: f64,
}

impl Default for ScatterColorTuning {
    fn default() -> Self {
        Self {
            saturation_level: 40,
            min_area: 10.0,
            max_area: 5000.0,
            min_circularity: 0.3,
            accept_confidence: 0.7,
        }
    }
}

/// Shape-based (circular blob) scatter marker detection.
#[derive(Debug, Clone)]
pub struct ScatterBlobTuning {
    /// Smallest accepted blob area (px²)
    pub min_area: f64,
    /// Largest accepted blob area (px²)
    pub max_area: f64,
    /// Minimum circularity
    pub min_circularity: f64,
    /// Minimum area / convex hull area
    pub min_convexity: f64,
    /// Minimum ratio of the principal moments of inertia
    pub min_inertia_ratio: f64,
}

impl Default for ScatterBlobTuning {
    fn default() -> Self {
        Self {
            min_area: 15.0,
            max_area: 2000.0,
            min_circularity: 0.5,
            min_convexity: 0.7,
            min_inertia_ratio: 0.4,
        }
    }
}

/// Shared scatter confidence formula.
#[derive(Debug, Clone)]
pub struct ScatterConfidenceTuning {
    /// Starting score
    pub base: f64,
    /// Score for an empty point set
    pub empty: f64,
    /// Plausible point-count window
    pub count_range: (usize, usize),
    /// Bonus inside the count window
    pub count_bonus: f64,
    /// Counts above this are treated as noise
    pub noise_count: usize,
    /// Penalty above the noise count
    pub noise_penalty: f64,
    /// Area coefficient of variation below which sizes are consistent
    pub consistent_cv: f64,
    /// Bonus for consistent marker sizes
    pub consistent_bonus: f64,
    /// Area coefficient of variation above which sizes are mixed
    pub mixed_cv: f64,
    /// Penalty for mixed marker sizes
    pub mixed_penalty: f64,
    /// Pixel spread needed on both axes for the spread bonus
    pub min_spread: f64,
    /// Bonus for well spread points
    pub spread_bonus: f64,
    /// Lower clamp
    pub floor: f64,
}

impl Default for ScatterConfidenceTuning {
    fn default() -> Self {
        Self {
            base: 0.5,
            empty: 0.1,
            count_range: (3, 200),
            count_bonus: 0.2,
            noise_count: 500,
            noise_penalty: 0.2,
            consistent_cv: 0.5,
            consistent_bonus: 0.2,
            mixed_cv: 1.5,
            mixed_penalty: 0.1,
            min_spread: 50.0,
            spread_bonus: 0.1,
            floor: 0.1,
        }
    }
}

/// Grid-line removal shared by the blob, line and bar extractors.
#[derive(Debug, Clone)]
pub struct GridTuning {
    /// Line kernel length as a divisor of the crop extent (`extent / divisor`)
    pub kernel_divisor: u32,
    /// Opening iterations with the line kernel
    pub iterations: u32,
    /// Half size of the square used to protect solid regions from removal
    pub solid_radius: u8,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            kernel_divisor: 30,
            iterations: 2,
            solid_radius: 3,
        }
    }
}

/// Line chart extraction.
#[derive(Debug, Clone)]
pub struct LineTuning {
    /// Confidence with no occupied column
    pub base: f64,
    /// Weight of the occupied-column fraction
    pub coverage_weight: f64,
    /// Confidence when nothing was found
    pub empty: f64,
}

impl Default for LineTuning {
    fn default() -> Self {
        Self {
            base: 0.4,
            coverage_weight: 0.6,
            empty: 0.1,
        }
    }
}

/// Bar chart extraction.
#[derive(Debug, Clone)]
pub struct BarTuning {
    /// Bars must be taller than this (px)
    pub min_height: i32,
    /// Bars must be wider than this (px)
    pub min_width: i32,
    /// Confidence before any bar is found
    pub base: f64,
    /// Flat bonus once at least one bar is found
    pub found_bonus: f64,
    /// Fill ratio (area / bounding box) for a contour to look like a solid bar
    pub solid_fill_ratio: f64,
}

impl Default for BarTuning {
    fn default() -> Self {
        Self {
            min_height: 10,
            min_width: 5,
            base: 0.5,
            found_bonus: 0.4,
            solid_fill_ratio: 0.85,
        }
    }
}

/// Weights of the stage confidences in the overall score.
#[derive(Debug, Clone)]
pub struct CombineWeights {
    /// Plot-area detection
    pub crop: f64,
    /// Axis/tick location
    pub axes: f64,
    /// Tick-label recognition
    pub ocr: f64,
    /// Calibration fit quality (`1 - fit_error`)
    pub fit: f64,
    /// Point extraction
    pub extraction: f64,
}

impl Default for CombineWeights {
    fn default() -> Self {
        Self {
            crop: 0.15,
            axes: 0.15,
            ocr: 0.2,
            fit: 0.2,
            extraction: 0.3,
        }
    }
}

/// Every tunable of the extraction pipeline.
#[derive(Debug, Clone)]
pub struct Tuning {
    /// Longest image side after preprocessing
    pub max_image_side: u32,
    /// Plot-area detection
    pub plot_area: PlotAreaTuning,
    /// Axis/tick location
    pub axes: AxisTuning,
    /// Tick-label OCR windows
    pub ocr: OcrTuning,
    /// Grid removal
    pub grid: GridTuning,
    /// Color scatter detection
    pub scatter_color: ScatterColorTuning,
    /// Blob scatter detection
    pub scatter_blob: ScatterBlobTuning,
    /// Shared scatter confidence
    pub scatter_confidence: ScatterConfidenceTuning,
    /// Line extraction
    pub line: LineTuning,
    /// Bar extraction
    pub bar: BarTuning,
    /// Overall confidence weights
    pub weights: CombineWeights,
    /// Fit error above which a warning is raised
    pub high_fit_error: f64,
    /// OCR confidence below which a warning is raised
    pub low_ocr_confidence: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_image_side: 1200,
            plot_area: PlotAreaTuning::default(),
            axes: AxisTuning::default(),
            ocr: OcrTuning::default(),
            grid: GridTuning::default(),
            scatter_color: ScatterColorTuning::default(),
            scatter_blob: ScatterBlobTuning::default(),
            scatter_confidence: ScatterConfidenceTuning::default(),
            line: LineTuning::default(),
            bar: BarTuning::default(),
            weights: CombineWeights::default(),
            high_fit_error: 0.1,
            low_ocr_confidence: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let w = CombineWeights::default();
        let total = w.crop + w.axes + w.ocr + w.fit + w.extraction;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_plot_area_confidences_are_ordered() {
        let t = PlotAreaTuning::default();
        assert!(t.conf_large > t.conf_sized);
        assert!(t.conf_sized > t.conf_contour);
        assert!(t.conf_contour > t.conf_contour_undersized);
        assert!(t.conf_contour_undersized > t.conf_geometric);
    }
}
