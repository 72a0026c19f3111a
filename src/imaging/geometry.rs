//! Geometric operations. These may change the buffer's dimensions.
//!
//! Flip, rotate and resize delegate to `image::imageops`; crop maps a
//! view-space selection into image space first.

use super::params::{FlipAxis, Rect, ResizeTarget, Rotation, ViewTransform};
use crate::pixels::PixelBuffer;
use image::imageops::{self, FilterType};

pub fn flip(input: PixelBuffer, axis: FlipAxis) -> PixelBuffer {
    let image = input.as_rgba();
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(image).into(),
        FlipAxis::Vertical => imageops::flip_vertical(image).into(),
    }
}

/// Clockwise rotation. Quarter turns swap width and height.
pub fn rotate(input: PixelBuffer, rotation: Rotation) -> PixelBuffer {
    let image = input.as_rgba();
    match rotation {
        Rotation::Cw90 => imageops::rotate90(image).into(),
        Rotation::Cw180 => imageops::rotate180(image).into(),
        Rotation::Cw270 => imageops::rotate270(image).into(),
    }
}

/// Lanczos3 resample to exactly `target.width × target.height`.
pub fn resize(input: PixelBuffer, target: &ResizeTarget) -> PixelBuffer {
    if input.is_empty() || input.dimensions() == (target.width, target.height) {
        return input;
    }
    imageops::resize(input.as_rgba(), target.width, target.height, FilterType::Lanczos3).into()
}

/// Integer pixel region inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Smallest integer region enclosing the image-space selection, or `None`
/// when it is empty or not fully inside a `width × height` image.
pub fn selection_region(
    selection: Rect,
    view: &ViewTransform,
    width: u32,
    height: u32,
) -> Option<PixelRegion> {
    let r = view.rect_to_image(selection, width, height);
    let x0 = r.x.floor();
    let y0 = r.y.floor();
    let x1 = (r.x + r.width).ceil();
    let y1 = (r.y + r.height).ceil();
    let inside = x0 >= 0.0 && y0 >= 0.0 && x1 <= width as f64 && y1 <= height as f64;
    if !inside || x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRegion {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// Crop to a view-space selection. A selection that is empty or reaches
/// outside the image leaves the buffer unchanged.
pub fn crop(input: PixelBuffer, selection: Rect, view: &ViewTransform) -> PixelBuffer {
    let Some(region) = selection_region(selection, view, input.width(), input.height()) else {
        log::debug!("crop selection {selection:?} outside {:?}, ignored", input.dimensions());
        return input;
    };
    imageops::crop_imm(input.as_rgba(), region.x, region.y, region.width, region.height)
        .to_image()
        .into()
}
