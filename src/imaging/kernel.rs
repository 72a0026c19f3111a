//! Convolution kernels and the filter catalog's kernel builders.
//!
//! A [`Kernel`] is a row-major matrix of `f32` weights with odd width and
//! odd height, so it always has a well-defined centre cell. Weights are
//! applied as a correlation: tap `(kx, ky)` multiplies the source pixel at
//! `(x + kx - cx, y + ky - cy)`.

use super::params::{EmbossDirection, Radius, SobelDirection};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    #[error("kernel dimensions must be odd and non-zero, got {width}x{height}")]
    EvenDimensions { width: u32, height: u32 },
    #[error("kernel data length {len} doesn't match dimensions {width}x{height}")]
    DataLength { len: usize, width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    width: u32,
    height: u32,
    weights: Vec<f32>,
}

impl Kernel {
    pub fn new(width: u32, height: u32, weights: Vec<f32>) -> Result<Self, KernelError> {
        if width % 2 == 0 || height % 2 == 0 {
            return Err(KernelError::EvenDimensions { width, height });
        }
        let expected = (width as usize).checked_mul(height as usize);
        if expected != Some(weights.len()) {
            return Err(KernelError::DataLength {
                len: weights.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            weights,
        })
    }

    /// 3×3 kernel from a literal. Always valid.
    fn square3(weights: [f32; 9]) -> Self {
        Self {
            width: 3,
            height: 3,
            weights: weights.to_vec(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Centre cell `(cx, cy)`; also the half-extent on each axis.
    pub fn center(&self) -> (u32, u32) {
        ((self.width - 1) / 2, (self.height - 1) / 2)
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn weight(&self, kx: u32, ky: u32) -> f32 {
        self.weights[(ky * self.width + kx) as usize]
    }

    pub fn sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// Box blur: every weight is `1 / (2r+1)²`.
    pub fn mean(radius: Radius) -> Self {
        let d = radius.diameter();
        let n = d as usize * d as usize;
        Self {
            width: d,
            height: d,
            weights: vec![1.0 / n as f32; n],
        }
    }

    /// Gaussian blur with σ = r / 3, normalised so the weights sum to 1.
    pub fn gaussian(radius: Radius) -> Self {
        let d = radius.diameter();
        let half = (d / 2) as i32;
        let sigma = radius.get() as f64 / 3.0;
        let two_sigma_sq = 2.0 * sigma * sigma;
        let norm = 1.0 / (std::f64::consts::PI * two_sigma_sq);

        let mut weights = Vec::with_capacity(d as usize * d as usize);
        for ky in 0..d as i32 {
            for kx in 0..d as i32 {
                let (dx, dy) = ((kx - half) as f64, (ky - half) as f64);
                weights.push((norm * (-(dx * dx + dy * dy) / two_sigma_sq).exp()) as f32);
            }
        }
        let sum: f32 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        Self {
            width: d,
            height: d,
            weights,
        }
    }

    pub fn sharpen() -> Self {
        Self::square3([
            0.0, -0.5, 0.0, //
            -0.5, 3.0, -0.5, //
            0.0, -0.5, 0.0,
        ])
    }

    /// One +1 tap and one −1 tap on opposite sides of the centre.
    pub fn emboss(direction: EmbossDirection) -> Self {
        use EmbossDirection::*;
        let taps = match direction {
            NorthWest => [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0],
            North => [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0],
            NorthEast => [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0],
            East => [0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            SouthEast => [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            South => [0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            SouthWest => [0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            West => [0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
        };
        Self::square3(taps)
    }

    /// Half-weighted Sobel derivative.
    pub fn sobel(direction: SobelDirection) -> Self {
        match direction {
            SobelDirection::Vertical => Self::square3([
                -0.5, -1.0, -0.5, //
                0.0, 0.0, 0.0, //
                0.5, 1.0, 0.5,
            ]),
            SobelDirection::Horizontal => Self::square3([
                -0.5, 0.0, 0.5, //
                -1.0, 0.0, 1.0, //
                -0.5, 0.0, 0.5,
            ]),
        }
    }
}
