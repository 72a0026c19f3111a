//! Shared test utilities for the retouch test suite.
//!
//! Buffer fixtures and a buffer comparison that reports the first
//! mismatching pixel instead of dumping two megabyte-sized vectors.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let input = gradient(16, 9);
//! let out = negate(negate(input.clone(), false), false);
//! assert_buffers_eq(&out, &input);
//! ```

use crate::pixels::PixelBuffer;
use image::Rgba;
use std::path::{Path, PathBuf};

// =========================================================================
// Fixtures
// =========================================================================

pub fn uniform(width: u32, height: u32, pixel: Rgba<u8>) -> PixelBuffer {
    PixelBuffer::filled(width, height, pixel)
}

/// Every channel varies with position, so geometric and neighbourhood bugs
/// show up as mismatches. Alpha varies too but stays non-zero.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        Rgba([
            ((x * 37 + y * 11) % 256) as u8,
            ((y * 53 + x * 5) % 256) as u8,
            ((x * y * 7 + 13) % 256) as u8,
            (255 - (x + y) % 64) as u8,
        ])
    })
}

/// Uniform background with one differing pixel at `at`.
pub fn with_outlier(
    width: u32,
    height: u32,
    background: Rgba<u8>,
    at: (u32, u32),
    outlier: Rgba<u8>,
) -> PixelBuffer {
    let mut buf = uniform(width, height, background);
    buf.set_pixel(at.0, at.1, outlier);
    buf
}

/// Write `buffer` as a PNG and return its path.
pub fn write_png(dir: &Path, name: &str, buffer: &PixelBuffer) -> PathBuf {
    let path = dir.join(name);
    buffer.as_rgba().save(&path).unwrap();
    path
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert two buffers are bit-identical. Panics naming the first mismatch.
pub fn assert_buffers_eq(actual: &PixelBuffer, expected: &PixelBuffer) {
    assert_eq!(
        actual.dimensions(),
        expected.dimensions(),
        "buffer dimensions differ"
    );
    let (width, height) = actual.dimensions();
    for y in 0..height {
        for x in 0..width {
            let (a, e) = (actual.pixel(x, y), expected.pixel(x, y));
            if a != e {
                panic!("pixel ({x}, {y}) differs: got {:?}, expected {:?}", a.0, e.0);
            }
        }
    }
}
