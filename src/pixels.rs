//! The in-memory raster every operation reads and writes.
//!
//! [`PixelBuffer`] is a thin newtype over [`image::RgbaImage`]: 8-bit samples,
//! four channels per pixel, stored row-major as `[r, g, b, a]`. The newtype
//! keeps the `image` crate an implementation detail of the editing core while
//! still letting the geometric operations reach for `image::imageops`.
//!
//! Neighbourhood filters never index out of bounds: [`PixelBuffer::clamped`]
//! maps any signed coordinate to the nearest valid pixel (edge replication).

use image::{Rgba, RgbaImage};

/// Channel indices inside a pixel.
pub const RED: usize = 0;
pub const GREEN: usize = 1;
pub const BLUE: usize = 2;
pub const ALPHA: usize = 3;

/// Width × height grid of 4-channel 8-bit samples. The default is 0×0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelBuffer(RgbaImage);

impl PixelBuffer {
    /// A fully transparent black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self(RgbaImage::new(width, height))
    }

    /// A buffer where every pixel is `pixel`.
    pub fn filled(width: u32, height: u32, pixel: Rgba<u8>) -> Self {
        Self(RgbaImage::from_pixel(width, height, pixel))
    }

    pub fn from_fn(width: u32, height: u32, f: impl FnMut(u32, u32) -> Rgba<u8>) -> Self {
        Self(RgbaImage::from_fn(width, height, f))
    }

    /// Wrap raw interleaved RGBA bytes. Returns `None` when the length does
    /// not match `width * height * 4`.
    pub fn from_raw(width: u32, height: u32, raw: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, raw).map(Self)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.0.width() == 0 || self.0.height() == 0
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.0.get_pixel(x, y)
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) {
        self.0.put_pixel(x, y, pixel);
    }

    /// Pixel at a signed coordinate, clamped to the nearest valid one.
    ///
    /// Must not be called on an empty buffer.
    #[inline]
    pub fn clamped(&self, x: i64, y: i64) -> Rgba<u8> {
        let cx = x.clamp(0, self.width() as i64 - 1) as u32;
        let cy = y.clamp(0, self.height() as i64 - 1) as u32;
        *self.0.get_pixel(cx, cy)
    }

    /// Interleaved RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.0
    }

    pub fn as_rgba_mut(&mut self) -> &mut RgbaImage {
        &mut self.0
    }

    /// Apply `f` to every pixel in place.
    pub fn map_pixels(mut self, mut f: impl FnMut(Rgba<u8>) -> Rgba<u8>) -> Self {
        for p in self.0.pixels_mut() {
            *p = f(*p);
        }
        self
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self(image)
    }
}
