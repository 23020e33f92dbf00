// ========================= Photo preprocessing =========================
//
// Applied to a photographed page before sampling: a light blur to average out
// print dither and sensor noise inside each block, then a saturation boost so
// washed-out inks move back apart from each other.

use image::{Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use log::debug;

use crate::config::SamplingConfig;

pub fn luma_from_rgb(r: u8, g: u8, b: u8) -> u8 {
    // Integer approx of 0.299R + 0.587G + 0.114B
    let y = (77u16 * (r as u16) + 150u16 * (g as u16) + 29u16 * (b as u16) + 128) >> 8;
    y as u8
}

pub fn blur(img: &RgbImage, sigma: f32) -> RgbImage {
    if sigma <= 0.0 { return img.clone(); }
    gaussian_blur_f32(img, sigma)
}

/// Moves every pixel away from (gain > 1) or toward (gain < 1) its own gray
/// level: `gray + gain * (px - gray)`.
pub fn color_gain(img: &RgbImage, gain: f32) -> RgbImage {
    let mut out = img.clone();
    if (gain - 1.0).abs() < f32::EPSILON { return out; }
    for px in out.pixels_mut() {
        let Rgb([r, g, b]) = *px;
        let gray = luma_from_rgb(r, g, b) as f32;
        let mix = |c: u8| (gray + gain * (c as f32 - gray)).round().clamp(0.0, 255.0) as u8;
        *px = Rgb([mix(r), mix(g), mix(b)]);
    }
    out
}

pub fn preprocess(img: &RgbImage, cfg: &SamplingConfig) -> RgbImage {
    debug!("preprocess: blur sigma={} color gain={}", cfg.blur_sigma, cfg.color_gain);
    color_gain(&blur(img, cfg.blur_sigma), cfg.color_gain)
}
