//! Median filter: a nonlinear blur with no kernel.
//!
//! For radius `r` each output pixel takes, per channel independently, the
//! median of the `(2r+1)²` edge-clamped neighbourhood. Channels are sorted
//! separately, so the output pixel need not exist in the window.
//!
//! The median is the textbook one: the middle element for odd-length
//! windows, and the floor of the mean of the two middle elements for
//! even-length ones. Square windows are always odd; the even case only
//! matters for [`median_of`] callers.

use super::params::Radius;
use crate::pixels::PixelBuffer;
use rayon::prelude::*;

pub fn median_filter(input: &PixelBuffer, radius: Radius) -> PixelBuffer {
    if input.is_empty() {
        return input.clone();
    }
    let (width, height) = input.dimensions();
    let r = radius.get() as i64;
    let window = radius.diameter() as usize * radius.diameter() as usize;

    let mut output = PixelBuffer::new(width, height);
    output
        .as_rgba_mut()
        .par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            // Reused per row to avoid an allocation per pixel.
            let mut channels: [Vec<u8>; 4] = std::array::from_fn(|_| Vec::with_capacity(window));
            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                for c in &mut channels {
                    c.clear();
                }
                for dy in -r..=r {
                    for dx in -r..=r {
                        let p = input.clamped(x as i64 + dx, y as i64 + dy);
                        for (c, &v) in channels.iter_mut().zip(p.0.iter()) {
                            c.push(v);
                        }
                    }
                }
                let px: [u8; 4] = std::array::from_fn(|i| median_of(&mut channels[i]));
                out.copy_from_slice(&px);
            }
        });
    output
}

/// Median of `values`, sorting them in place. Empty input yields 0.
pub fn median_of(values: &mut [u8]) -> u8 {
    let n = values.len();
    if n == 0 {
        return 0;
    }
    values.sort_unstable();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        ((values[n / 2 - 1] as u16 + values[n / 2] as u16) / 2) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{assert_buffers_eq, uniform, with_outlier};
    use image::Rgba;

    #[test]
    fn median_of_odd_and_even() {
        assert_eq!(median_of(&mut [9, 1, 5]), 5);
        assert_eq!(median_of(&mut [4, 1, 3, 2]), 2);
        assert_eq!(median_of(&mut [255, 254]), 254);
        assert_eq!(median_of(&mut [7]), 7);
        assert_eq!(median_of(&mut []), 0);
    }

    #[test]
    fn removes_isolated_outlier() {
        let background = Rgba([40, 80, 120, 255]);
        for r in 1..=3 {
            let radius = Radius::new(r).unwrap();
            let side = radius.diameter() + 4;
            let outlier = Rgba([255, 0, 255, 0]);
            let noisy = with_outlier(side, side, background, (side / 2, side / 2), outlier);
            let cleaned = median_filter(&noisy, radius);
            assert_buffers_eq(&cleaned, &uniform(side, side, background));
        }
    }

    #[test]
    fn channels_are_sorted_independently() {
        // Column of three pixels; each channel's median comes from a different pixel.
        let pixels = [
            Rgba([10, 200, 0, 255]),
            Rgba([20, 100, 50, 255]),
            Rgba([30, 0, 25, 255]),
        ];
        let input = PixelBuffer::from_fn(1, 3, |_, y| pixels[y as usize]);
        let out = median_filter(&input, Radius::new(1).unwrap());
        // Centre window (with clamping) is exactly the three pixels, each replicated across x.
        assert_eq!(out.pixel(0, 1), Rgba([20, 100, 25, 255]));
    }

    #[test]
    fn keeps_dimensions() {
        let input = uniform(7, 3, Rgba([1, 2, 3, 4]));
        assert_eq!(median_filter(&input, Radius::new(2).unwrap()).dimensions(), (7, 3));
    }
}
