//! Parameter types for image operations.
//!
//! These types describe *what* an operation does, not *how*. Everything that
//! can be out of range is validated on construction so that an
//! [`Operation`](crate::operation::Operation) is always well formed by the time
//! `apply` runs; `apply` itself never fails.
//!
//! ## Types
//!
//! - [`Radius`] — neighbourhood radius for blurs (≥ 1). A radius of 1 is a 3×3 window.
//! - [`PosterizeBands`] — number of posterize bands (≥ 1).
//! - [`Rotation`], [`FlipAxis`], [`EmbossDirection`], [`SobelDirection`] — closed choices.
//! - [`ResizeTarget`] — target width/height plus the scale the caller derived them from.
//! - [`ViewTransform`] — zoom + pan of the view a selection or shape was made in.
//! - [`Shape`], [`Rect`], [`Point`], [`Color`] — vector input for the drawing operation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("radius must be 1-{max}, got {0}", max = MAX_RADIUS)]
    Radius(u32),
    #[error("posterize needs 1-{max} bands, got {0}", max = MAX_BANDS)]
    Bands(u32),
    #[error("resize target must be at least 1x1, got {width}x{height}")]
    ResizeTarget { width: u32, height: u32 },
    #[error("view scale must be a positive finite number, got {0}")]
    Scale(f64),
    #[error("invalid shape: {0}")]
    Shape(String),
}

/// Largest blur radius: a 201×201 window.
pub const MAX_RADIUS: u32 = 100;

/// More bands than this cannot produce distinct 8-bit levels.
pub const MAX_BANDS: u32 = 255;

/// Neighbourhood radius of a blur window, `1..=MAX_RADIUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radius(u32);

impl Radius {
    pub fn new(value: u32) -> Result<Self, OperationError> {
        if !(1..=MAX_RADIUS).contains(&value) {
            return Err(OperationError::Radius(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Side length of the square window, `2r + 1`.
    pub fn diameter(self) -> u32 {
        2 * self.0 + 1
    }

    pub(crate) fn validate(self) -> Result<(), OperationError> {
        Self::new(self.0).map(|_| ())
    }
}

impl Default for Radius {
    fn default() -> Self {
        Self(1)
    }
}

/// Number of posterize bands, `1..=MAX_BANDS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PosterizeBands(u32);

impl PosterizeBands {
    pub fn new(value: u32) -> Result<Self, OperationError> {
        if !(1..=MAX_BANDS).contains(&value) {
            return Err(OperationError::Bands(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn validate(self) -> Result<(), OperationError> {
        Self::new(self.0).map(|_| ())
    }
}

/// Clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipAxis {
    /// Mirror left to right.
    Horizontal,
    /// Mirror top to bottom.
    Vertical,
}

/// Light direction of the emboss filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbossDirection {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl EmbossDirection {
    pub const ALL: [EmbossDirection; 8] = [
        EmbossDirection::NorthWest,
        EmbossDirection::North,
        EmbossDirection::NorthEast,
        EmbossDirection::East,
        EmbossDirection::SouthEast,
        EmbossDirection::South,
        EmbossDirection::SouthWest,
        EmbossDirection::West,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SobelDirection {
    /// Responds to intensity changes along y (horizontal edges).
    Vertical,
    /// Responds to intensity changes along x (vertical edges).
    Horizontal,
}

/// Target of a resize. `scale` is informational: the caller derived
/// `width`/`height` from it and is responsible for keeping them consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeTarget {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl ResizeTarget {
    pub fn new(width: u32, height: u32, scale: f64) -> Result<Self, OperationError> {
        let target = Self {
            width,
            height,
            scale,
        };
        target.validate()?;
        Ok(target)
    }

    pub(crate) fn validate(&self) -> Result<(), OperationError> {
        if self.width == 0 || self.height == 0 {
            return Err(OperationError::ResizeTarget {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(OperationError::Scale(self.scale));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `width`/`height` may be negative when the user
/// dragged up or left, [`Rect::normalized`] fixes that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn normalized(self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Zoom and pan of the view a selection or shape was drawn in.
///
/// A view-space point maps to image space as
/// `(p - offset - c) / scale + c`, where `c` is the image centre with
/// integer halving (`(w / 2, h / 2)`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub x_offset: i32,
    pub y_offset: i32,
}

impl ViewTransform {
    pub fn new(scale: f64, x_offset: i32, y_offset: i32) -> Result<Self, OperationError> {
        let transform = Self {
            scale,
            x_offset,
            y_offset,
        };
        transform.validate()?;
        Ok(transform)
    }

    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            x_offset: 0,
            y_offset: 0,
        }
    }

    pub fn to_image(&self, p: Point, width: u32, height: u32) -> Point {
        let cx = (width / 2) as f64;
        let cy = (height / 2) as f64;
        Point {
            x: (p.x - self.x_offset as f64 - cx) / self.scale + cx,
            y: (p.y - self.y_offset as f64 - cy) / self.scale + cy,
        }
    }

    /// Map a view rectangle to image space. Scaling is uniform, so the
    /// result stays axis aligned.
    pub fn rect_to_image(&self, rect: Rect, width: u32, height: u32) -> Rect {
        let r = rect.normalized();
        let min = self.to_image(Point::new(r.x, r.y), width, height);
        let max = self.to_image(Point::new(r.x + r.width, r.y + r.height), width, height);
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub(crate) fn validate(&self) -> Result<(), OperationError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(OperationError::Scale(self.scale));
        }
        Ok(())
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Vector shape rasterized by the drawing operation, in view coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Rectangle { bounds: Rect },
    Ellipse { bounds: Rect },
    Line { from: Point, to: Point },
    Polygon { points: Vec<Point> },
}

impl Shape {
    pub(crate) fn validate(&self) -> Result<(), OperationError> {
        let finite = |p: &Point| p.x.is_finite() && p.y.is_finite();
        match self {
            Shape::Rectangle { bounds } | Shape::Ellipse { bounds } => {
                if !bounds.is_finite() {
                    return Err(OperationError::Shape("non-finite bounds".into()));
                }
            }
            Shape::Line { from, to } => {
                if !finite(from) || !finite(to) {
                    return Err(OperationError::Shape("non-finite line endpoint".into()));
                }
            }
            Shape::Polygon { points } => {
                if points.len() < 2 {
                    return Err(OperationError::Shape(format!(
                        "polygon needs at least 2 points, got {}",
                        points.len()
                    )));
                }
                if !points.iter().all(finite) {
                    return Err(OperationError::Shape("non-finite polygon vertex".into()));
                }
            }
        }
        Ok(())
    }
}
