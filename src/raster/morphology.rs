//! Mask morphology: line openings, set operations and grid removal.

use super::FOREGROUND;
use crate::tuning::GridTuning;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, open};

/// Orientation of a 1-D structuring element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunDirection {
    /// Along rows
    Horizontal,
    /// Along columns
    Vertical,
}

/// Keep only foreground runs at least `min_len` pixels long.
///
/// This is a morphological opening with a `min_len`-long line element.
pub fn keep_runs(mask: &GrayImage, direction: RunDirection, min_len: u32) -> GrayImage {
    let (w, h) = mask.dimensions();
    let mut out = GrayImage::new(w, h);
    let min_len = min_len.max(1);

    let (outer, inner) = match direction {
        RunDirection::Horizontal => (h, w),
        RunDirection::Vertical => (w, h),
    };
    let at = |o: u32, i: u32| match direction {
        RunDirection::Horizontal => (i, o),
        RunDirection::Vertical => (o, i),
    };

    for o in 0..outer {
        let mut start = None;
        for i in 0..=inner {
            let on = i < inner && {
                let (x, y) = at(o, i);
                mask.get_pixel(x, y)[0] > 0
            };
            match (on, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if i - s >= min_len {
                        for j in s..i {
                            let (x, y) = at(o, j);
                            out.put_pixel(x, y, Luma([FOREGROUND]));
                        }
                    }
                    start = None;
                },
                _ => {},
            }
        }
    }
    out
}

/// Pixel-wise union of two masks of equal size.
pub fn union(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0].max(b.get_pixel(x, y)[0])])
    })
}

/// Pixels set in `a` but not in `b`.
pub fn and_not(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        if a.get_pixel(x, y)[0] > 0 && b.get_pixel(x, y)[0] == 0 {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Erase grid lines from a foreground mask.
///
/// Long horizontal and vertical runs (relative to the mask size) form the
/// grid; the grid is dilated by one pixel and subtracted. Solid regions that
/// survive a square opening are never part of the grid, so filled bars and
/// large markers are kept intact.
pub fn remove_grid(mask: &GrayImage, tuning: &GridTuning) -> GrayImage {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return mask.clone();
    }

    let divisor = tuning.kernel_divisor.max(1);
    let iterations = tuning.iterations.max(1);
    // Repeated openings with a k-long line equal one opening with a longer line.
    let span = |extent: u32| {
        let k = (extent / divisor).max(2);
        iterations * (k - 1) + 1
    };

    let horizontal = keep_runs(mask, RunDirection::Horizontal, span(w));
    let vertical = keep_runs(mask, RunDirection::Vertical, span(h));
    let grid = dilate(&union(&horizontal, &vertical), Norm::LInf, 1);

    let solid = if tuning.solid_radius > 0 {
        open(mask, Norm::LInf, tuning.solid_radius)
    } else {
        GrayImage::new(w, h)
    };
    let removable = and_not(&grid, &solid);

    log::trace!(
        "Grid removal: {} grid px, {} protected px",
        super::count_foreground(&grid),
        super::count_foreground(&solid)
    );
    and_not(mask, &removable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::count_foreground;

    fn mask_with(w: u32, h: u32, pixels: impl IntoIterator<Item = (u32, u32)>) -> GrayImage {
        let mut mask = GrayImage::new(w, h);
        for (x, y) in pixels {
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
        mask
    }

    #[test]
    fn test_keep_runs_horizontal() {
        let mask = mask_with(20, 3, (0..10).map(|x| (x, 1)).chain([(15, 1), (16, 1)]));
        let kept = keep_runs(&mask, RunDirection::Horizontal, 5);
        assert_eq!(count_foreground(&kept), 10);
        assert_eq!(kept.get_pixel(15, 1)[0], 0);
    }

    #[test]
    fn test_keep_runs_vertical_run_touching_border() {
        let mask = mask_with(3, 10, (4..10).map(|y| (1, y)));
        let kept = keep_runs(&mask, RunDirection::Vertical, 6);
        assert_eq!(count_foreground(&kept), 6);
    }

    #[test]
    fn test_remove_grid_erases_lines_keeps_dots() {
        let mut pixels: Vec<(u32, u32)> = (0..120).map(|x| (x, 30)).collect();
        pixels.extend((0..90).map(|y| (60, y)));
        pixels.extend([(20, 10), (21, 10), (20, 11), (21, 11)]);
        let mask = mask_with(120, 90, pixels);

        let cleaned = remove_grid(&mask, &GridTuning::default());
        assert_eq!(cleaned.get_pixel(100, 30)[0], 0);
        assert_eq!(cleaned.get_pixel(60, 70)[0], 0);
        assert_eq!(cleaned.get_pixel(20, 10)[0], FOREGROUND);
        assert_eq!(count_foreground(&cleaned), 4);
    }

    #[test]
    fn test_remove_grid_keeps_solid_bar() {
        let mut pixels = Vec::new();
        for y in 40..100 {
            for x in 30..60 {
                pixels.push((x, y));
            }
        }
        let mask = mask_with(150, 120, pixels);
        let cleaned = remove_grid(&mask, &GridTuning::default());
        assert_eq!(count_foreground(&cleaned), 30 * 60);
    }
}
