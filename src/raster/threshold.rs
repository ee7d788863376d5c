//! Global and adaptive binarization.

use super::FOREGROUND;
use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::integral_image::{integral_image, sum_image_pixels};

/// Images whose gray range is narrower than this have no foreground.
const MIN_CONTRAST: u8 = 24;

/// Mean gray level of an image, `0.0` for an empty image.
pub fn mean_intensity(gray: &GrayImage) -> f64 {
    let raw = gray.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    raw.iter().map(|&v| v as u64).sum::<u64>() as f64 / raw.len() as f64
}

/// Mask of pixels darker than `level`.
pub fn ink_mask(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] < level {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Otsu binarization with automatic polarity.
///
/// The minority intensity class is the foreground: on a light background
/// (mean above mid-gray) dark pixels are marked, otherwise light ones.
/// Near-uniform images produce an empty mask instead of splitting noise.
pub fn foreground_mask(gray: &GrayImage) -> GrayImage {
    let (lo, hi) = gray
        .as_raw()
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if gray.as_raw().is_empty() || hi.saturating_sub(lo) < MIN_CONTRAST {
        return GrayImage::new(gray.width(), gray.height());
    }

    let level = otsu_level(gray);
    let dark_foreground = mean_intensity(gray) > 127.0;
    log::trace!(
        "Otsu level {} ({} foreground)",
        level,
        if dark_foreground { "dark" } else { "light" }
    );

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        let fg = if dark_foreground { v <= level } else { v > level };
        Luma([if fg { FOREGROUND } else { 0 }])
    })
}

/// Local-mean adaptive threshold with polarity correction.
///
/// A pixel is set when it is brighter than the mean of its
/// `(2r+1)×(2r+1)` neighbourhood minus `offset`. The result is inverted when
/// its mean falls below mid-gray, so text always ends up dark on light.
pub fn adaptive_binarize(gray: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }

    let table = integral_image::<_, u64>(gray);
    let r = block_radius as i64;
    let mut out = GrayImage::from_fn(w, h, |x, y| {
        let x0 = (x as i64 - r).max(0) as u32;
        let y0 = (y as i64 - r).max(0) as u32;
        let x1 = (x as i64 + r + 1).min(w as i64) as u32;
        let y1 = (y as i64 + r + 1).min(h as i64) as u32;
        // Inclusive bounds.
        let sum = sum_image_pixels(&table, x0, y0, x1 - 1, y1 - 1)[0];
        let count = ((x1 - x0) * (y1 - y0)) as f64;
        let local_mean = sum as f64 / count;
        let v = gray.get_pixel(x, y)[0] as f64;
        Luma([if v > local_mean - offset as f64 { FOREGROUND } else { 0 }])
    });

    if mean_intensity(&out) < 127.0 {
        image::imageops::invert(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::count_foreground;

    #[test]
    fn test_foreground_mask_dark_on_light() {
        let mut gray = GrayImage::from_pixel(20, 20, Luma([250]));
        for x in 5..10 {
            gray.put_pixel(x, 5, Luma([10]));
        }
        let mask = foreground_mask(&gray);
        assert_eq!(count_foreground(&mask), 5);
        assert_eq!(mask.get_pixel(7, 5)[0], FOREGROUND);
    }

    #[test]
    fn test_foreground_mask_light_on_dark() {
        let mut gray = GrayImage::from_pixel(20, 20, Luma([5]));
        gray.put_pixel(3, 3, Luma([240]));
        let mask = foreground_mask(&gray);
        assert_eq!(count_foreground(&mask), 1);
    }

    #[test]
    fn test_foreground_mask_uniform_is_empty() {
        let gray = GrayImage::from_pixel(16, 16, Luma([255]));
        assert_eq!(count_foreground(&foreground_mask(&gray)), 0);
    }

    #[test]
    fn test_adaptive_binarize_keeps_text_dark() {
        let mut gray = GrayImage::from_pixel(30, 20, Luma([230]));
        for y in 5..15 {
            gray.put_pixel(12, y, Luma([20]));
            gray.put_pixel(13, y, Luma([20]));
        }
        let bin = adaptive_binarize(&gray, 5, 2);
        assert_eq!(bin.get_pixel(12, 10)[0], 0);
        assert_eq!(bin.get_pixel(2, 2)[0], FOREGROUND);
        assert!(mean_intensity(&bin) >= 127.0);
    }

    #[test]
    fn test_adaptive_binarize_inverts_mostly_dark_result() {
        // Thin bright stripes: only a third of the pixels pass the threshold.
        let gray = GrayImage::from_fn(30, 12, |x, _| Luma([if x % 3 == 0 { 200 } else { 100 }]));
        let bin = adaptive_binarize(&gray, 5, 2);
        assert!(mean_intensity(&bin) >= 127.0);
        assert_eq!(bin.get_pixel(15, 6)[0], 0);
        assert_eq!(bin.get_pixel(16, 6)[0], FOREGROUND);
    }

    #[test]
    fn test_adaptive_binarize_matches_window_mean() {
        let gray = GrayImage::from_fn(17, 11, |x, y| Luma([((x * 37 + y * 91) % 256) as u8]));
        let (radius, offset) = (3i64, 4i32);
        let bin = adaptive_binarize(&gray, radius as u32, offset);

        let mut direct = GrayImage::from_fn(17, 11, |x, y| {
            let (mut sum, mut count) = (0u64, 0u64);
            for wy in (y as i64 - radius).max(0)..(y as i64 + radius + 1).min(11) {
                for wx in (x as i64 - radius).max(0)..(x as i64 + radius + 1).min(17) {
                    sum += gray.get_pixel(wx as u32, wy as u32)[0] as u64;
                    count += 1;
                }
            }
            let mean = sum as f64 / count as f64;
            let v = gray.get_pixel(x, y)[0] as f64;
            Luma([if v > mean - offset as f64 { FOREGROUND } else { 0 }])
        });
        if mean_intensity(&direct) < 127.0 {
            image::imageops::invert(&mut direct);
        }
        assert_eq!(bin, direct);
    }
}
