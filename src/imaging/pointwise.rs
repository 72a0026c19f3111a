//! Per-pixel colour transforms. Output dimensions always equal input
//! dimensions and alpha is left alone unless stated otherwise.

use super::params::PosterizeBands;
use crate::pixels::{ALPHA, BLUE, GREEN, PixelBuffer, RED};
use image::Rgba;

/// `c' = 255 - c` on the colour channels, and on alpha when `include_alpha`.
pub fn negate(input: PixelBuffer, include_alpha: bool) -> PixelBuffer {
    input.map_pixels(|Rgba([r, g, b, a])| {
        let a = if include_alpha { 255 - a } else { a };
        Rgba([255 - r, 255 - g, 255 - b, a])
    })
}

/// Luma-weighted greyscale (`0.3 r + 0.59 g + 0.11 b`).
pub fn greyscale(input: PixelBuffer) -> PixelBuffer {
    input.map_pixels(|p| {
        let luma = 0.3 * p[RED] as f64 + 0.59 * p[GREEN] as f64 + 0.11 * p[BLUE] as f64;
        let v = luma.round().clamp(0.0, 255.0) as u8;
        Rgba([v, v, v, p[ALPHA]])
    })
}

/// Brightness and contrast as percentage changes.
///
/// `out = round((1 + contrast/100) * (in - 127.5) + 127.5 * (1 + brightness/100))`,
/// clamped to `[0, 255]`, per colour channel.
pub fn brightness_contrast(input: PixelBuffer, brightness: i32, contrast: i32) -> PixelBuffer {
    let lut = brightness_contrast_table(brightness, contrast);
    input.map_pixels(|Rgba([r, g, b, a])| {
        Rgba([lut[r as usize], lut[g as usize], lut[b as usize], a])
    })
}

fn brightness_contrast_table(brightness: i32, contrast: i32) -> [u8; 256] {
    let gain = 1.0 + contrast as f64 / 100.0;
    let lift = 127.5 * (1.0 + brightness as f64 / 100.0);
    std::array::from_fn(|v| (gain * (v as f64 - 127.5) + lift).round().clamp(0.0, 255.0) as u8)
}

/// The `n + 1` posterize levels for `n` bands, ascending.
///
/// `level[0] = 0`, `level[n] = 255` and `level[i] = i * 255 / (n + 1)` in
/// between, in integer arithmetic.
pub fn posterize_levels(bands: PosterizeBands) -> Vec<u8> {
    let n = bands.get();
    (0..=n)
        .map(|i| match i {
            0 => 0,
            i if i == n => 255,
            i => (i as u64 * 255 / (n as u64 + 1)) as u8,
        })
        .collect()
}

/// Nearest level to `value`; ties go to the lower level.
fn nearest_level(levels: &[u8], value: u8) -> u8 {
    let upper = levels.partition_point(|&l| l < value);
    match (upper.checked_sub(1).map(|i| levels[i]), levels.get(upper)) {
        (_, Some(&hi)) if hi == value => hi,
        (Some(lo), Some(&hi)) => {
            if value - lo <= hi - value {
                lo
            } else {
                hi
            }
        }
        (Some(lo), None) => lo,
        (None, Some(&hi)) => hi,
        (None, None) => value,
    }
}

pub fn posterize(input: PixelBuffer, bands: PosterizeBands) -> PixelBuffer {
    let levels = posterize_levels(bands);
    let lut: [u8; 256] = std::array::from_fn(|v| nearest_level(&levels, v as u8));
    input.map_pixels(|Rgba([r, g, b, a])| {
        Rgba([lut[r as usize], lut[g as usize], lut[b as usize], a])
    })
}
