//! Weighted-neighbourhood transforms over a [`PixelBuffer`].
//!
//! The engine picks one of two strategies from the kernel's weight sum,
//! rounded to the nearest integer:
//!
//! | Sum | Strategy | Output channel |
//! |---|---|---|
//! | 0 | [`Strategy::Offset`] | `clamp(128 + Σ w·p)` for colour, alpha copied from the source |
//! | anything else | [`Strategy::EdgeReplicate`] | `clamp(Σ w·p)` for all four channels |
//!
//! Derivative kernels (Sobel, emboss) sum to zero and produce signed
//! responses; the 128 bias keeps negative responses visible. Blur and sharpen
//! kernels sum to one and are applied as-is.
//!
//! In both strategies a neighbour that falls outside the image is replaced by
//! the nearest edge pixel. The image is never wrapped or padded with a
//! constant, so a uniform image stays uniform under any normalised kernel.
//!
//! Rows are computed in parallel with rayon. Each output pixel accumulates its
//! taps in the same fixed order on whichever thread computes it, so the result
//! is bit-identical for any pool size.

use super::kernel::Kernel;
use crate::pixels::{ALPHA, PixelBuffer};
use image::Rgba;
use rayon::prelude::*;

/// Bias added to colour channels by the offset strategy.
pub const OFFSET_BIAS: f32 = 128.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    EdgeReplicate,
    Offset,
}

impl Strategy {
    pub fn for_kernel(kernel: &Kernel) -> Self {
        if kernel.sum().round() as i64 == 0 {
            Strategy::Offset
        } else {
            Strategy::EdgeReplicate
        }
    }
}

pub struct ConvolutionEngine {
    kernel: Kernel,
    strategy: Strategy,
}

impl ConvolutionEngine {
    pub fn new(kernel: Kernel) -> Self {
        let strategy = Strategy::for_kernel(&kernel);
        Self { kernel, strategy }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Convolve `input` into a new buffer of the same dimensions.
    pub fn apply(&self, input: &PixelBuffer) -> PixelBuffer {
        if input.is_empty() {
            return input.clone();
        }
        let (width, height) = input.dimensions();
        let mut output = PixelBuffer::new(width, height);
        output
            .as_rgba_mut()
            .par_chunks_mut(width as usize * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.chunks_exact_mut(4).enumerate() {
                    let Rgba(px) = self.convolve_at(input, x as i64, y as i64);
                    out.copy_from_slice(&px);
                }
            });
        output
    }

    fn convolve_at(&self, input: &PixelBuffer, x: i64, y: i64) -> Rgba<u8> {
        let (cx, cy) = self.kernel.center();
        let mut acc = [0.0f32; 4];
        for ky in 0..self.kernel.height() {
            for kx in 0..self.kernel.width() {
                let w = self.kernel.weight(kx, ky);
                if w == 0.0 {
                    continue;
                }
                let p = input.clamped(x + kx as i64 - cx as i64, y + ky as i64 - cy as i64);
                for (a, &c) in acc.iter_mut().zip(p.0.iter()) {
                    *a += w * c as f32;
                }
            }
        }

        match self.strategy {
            Strategy::EdgeReplicate => Rgba(acc.map(to_channel)),
            Strategy::Offset => {
                let mut px = acc.map(|a| to_channel(OFFSET_BIAS + a));
                px[ALPHA] = input.clamped(x, y)[ALPHA];
                Rgba(px)
            }
        }
    }
}

/// Convolve with a one-off engine.
pub fn convolve(kernel: Kernel, input: &PixelBuffer) -> PixelBuffer {
    ConvolutionEngine::new(kernel).apply(input)
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
