//! Color channels.

use super::FOREGROUND;
use image::{GrayImage, Luma, RgbImage};

/// HSV saturation of every pixel, scaled to `0..=255`.
pub fn saturation(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if max == 0 {
            Luma([0])
        } else {
            let s = (max - min) as u32 * 255 / max as u32;
            Luma([s as u8])
        }
    })
}

/// Mask of chromatic pixels, those with saturation above `level`.
pub fn chromatic_mask(rgb: &RgbImage, level: u8) -> GrayImage {
    let sat = saturation(rgb);
    GrayImage::from_fn(sat.width(), sat.height(), |x, y| {
        Luma([if sat.get_pixel(x, y)[0] > level { FOREGROUND } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_saturation_of_grays_is_zero() {
        let mut rgb = RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]));
        rgb.put_pixel(0, 0, Rgb([0, 0, 0]));
        let sat = saturation(&rgb);
        assert!(sat.as_raw().iter().all(|&s| s == 0));
    }

    #[test]
    fn test_chromatic_mask_selects_red() {
        let mut rgb = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        rgb.put_pixel(2, 1, Rgb([220, 30, 30]));
        let mask = chromatic_mask(&rgb, 40);
        assert_eq!(mask.get_pixel(2, 1)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }
}
