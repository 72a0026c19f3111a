//! Rasterizes a vector [`Shape`] onto a buffer.
//!
//! The shape arrives in the coordinates of the view it was drawn in and is
//! mapped to image space through the [`ViewTransform`] first. Rasterization
//! is aliased and deterministic: a pixel is covered when its centre lies in
//! the shape (fills) or on the one-pixel path (outlines). Coverage is
//! collected into a mask before blending, so overlapping path segments never
//! blend a pixel twice.

use super::params::{Color, Point, Rect, Shape, ViewTransform};
use crate::pixels::PixelBuffer;
use image::Rgba;

pub fn draw_shape(
    mut input: PixelBuffer,
    shape: &Shape,
    color: Color,
    fill: bool,
    view: &ViewTransform,
) -> PixelBuffer {
    if input.is_empty() {
        return input;
    }
    let (width, height) = input.dimensions();
    let mut mask = Mask::new(width, height);
    let to_image = |p: &Point| view.to_image(*p, width, height);

    match shape {
        Shape::Rectangle { bounds } => {
            let r = view.rect_to_image(*bounds, width, height);
            if fill {
                mask.fill_rect(r);
            } else {
                let corners = [
                    Point::new(r.x, r.y),
                    Point::new(r.x + r.width, r.y),
                    Point::new(r.x + r.width, r.y + r.height),
                    Point::new(r.x, r.y + r.height),
                ];
                mask.stroke_closed(&corners);
            }
        }
        Shape::Ellipse { bounds } => {
            let r = view.rect_to_image(*bounds, width, height);
            mask.ellipse(r, fill);
        }
        Shape::Line { from, to } => mask.line(to_image(from), to_image(to)),
        Shape::Polygon { points } => {
            let points: Vec<Point> = points.iter().map(to_image).collect();
            if fill && points.len() > 2 {
                mask.fill_polygon(&points);
            } else {
                mask.stroke_closed(&points);
            }
        }
    }

    mask.blend_into(&mut input, color);
    input
}

/// Source-over blend of straight-alpha `src` onto `dst`.
fn blend(dst: Rgba<u8>, src: Color) -> Rgba<u8> {
    let a = src.a as u32;
    if a == 255 {
        return Rgba([src.r, src.g, src.b, 255]);
    }
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
    let out_a = a + (dst[3] as u32 * inv + 127) / 255;
    Rgba([mix(src.r, dst[0]), mix(src.g, dst[1]), mix(src.b, dst[2]), out_a.min(255) as u8])
}

struct Mask {
    width: u32,
    height: u32,
    covered: Vec<bool>,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            covered: vec![false; width as usize * height as usize],
        }
    }

    fn set(&mut self, x: i64, y: i64) {
        if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
            self.covered[y as usize * self.width as usize + x as usize] = true;
        }
    }

    /// Pixel index range whose centres fall in `[lo, hi)`, clipped to `0..len`.
    fn span(lo: f64, hi: f64, len: u32) -> std::ops::Range<i64> {
        let start = (lo - 0.5).ceil().max(0.0);
        let end = (hi - 0.5).ceil().min(len as f64);
        if end <= start {
            return 0..0;
        }
        start as i64..end as i64
    }

    fn fill_rect(&mut self, r: Rect) {
        for y in Self::span(r.y, r.y + r.height, self.height) {
            for x in Self::span(r.x, r.x + r.width, self.width) {
                self.set(x, y);
            }
        }
    }

    fn ellipse(&mut self, r: Rect, fill: bool) {
        let (rx, ry) = (r.width / 2.0, r.height / 2.0);
        if rx < 0.5 || ry < 0.5 {
            // Degenerate: collapses to a line along its long axis.
            let a = Point::new(r.x, r.y);
            let b = Point::new(r.x + r.width, r.y + r.height);
            self.line(a, b);
            return;
        }
        let (cx, cy) = (r.x + rx, r.y + ry);
        let inside = |x: i64, y: i64| {
            let dx = (x as f64 + 0.5 - cx) / rx;
            let dy = (y as f64 + 0.5 - cy) / ry;
            dx * dx + dy * dy <= 1.0
        };
        for y in Self::span(r.y, r.y + r.height + 1.0, self.height) {
            for x in Self::span(r.x, r.x + r.width + 1.0, self.width) {
                if !inside(x, y) {
                    continue;
                }
                let edge = !inside(x - 1, y)
                    || !inside(x + 1, y)
                    || !inside(x, y - 1)
                    || !inside(x, y + 1);
                if fill || edge {
                    self.set(x, y);
                }
            }
        }
    }

    /// Even-odd scanline fill sampled at pixel centres.
    fn fill_polygon(&mut self, points: &[Point]) {
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let mut crossings = Vec::with_capacity(points.len());
        for y in Self::span(min_y, max_y, self.height) {
            let sy = y as f64 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = &points[(i + 1) % points.len()];
                if (a.y <= sy) != (b.y <= sy) {
                    crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(f64::total_cmp);
            for pair in crossings.chunks_exact(2) {
                for x in Self::span(pair[0], pair[1], self.width) {
                    self.set(x, y);
                }
            }
        }
    }

    fn stroke_closed(&mut self, points: &[Point]) {
        match points {
            [] => {}
            [p] => self.line(*p, *p),
            [a, b] => self.line(*a, *b),
            _ => {
                for (i, a) in points.iter().enumerate() {
                    self.line(*a, points[(i + 1) % points.len()]);
                }
            }
        }
    }

    /// Bresenham line between the pixels containing `a` and `b`, clipped
    /// to the image first so far-away endpoints cost nothing.
    fn line(&mut self, a: Point, b: Point) {
        let Some((a, b)) = clip_segment(a, b, self.width as f64, self.height as f64) else {
            return;
        };
        let (mut x0, mut y0) = (a.x.floor() as i64, a.y.floor() as i64);
        let (x1, y1) = (b.x.floor() as i64, b.y.floor() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.set(x0, y0);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn blend_into(&self, buffer: &mut PixelBuffer, color: Color) {
        for (i, _) in self.covered.iter().enumerate().filter(|(_, c)| **c) {
            let x = (i % self.width as usize) as u32;
            let y = (i / self.width as usize) as u32;
            buffer.set_pixel(x, y, blend(buffer.pixel(x, y), color));
        }
    }
}

/// Liang–Barsky clip of segment `a→b` against `[-1, w+1] × [-1, h+1]`.
fn clip_segment(a: Point, b: Point, w: f64, h: f64) -> Option<(Point, Point)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, a.x + 1.0),
        (dx, w + 1.0 - a.x),
        (-dy, a.y + 1.0),
        (dy, h + 1.0 - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        Point::new(a.x + t0 * dx, a.y + t0 * dy),
        Point::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}
