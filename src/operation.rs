//! The closed set of edits a document can record.
//!
//! An [`Operation`] is plain data: its parameters are checked when it is built
//! (through the constructors here, or [`Operation::validate`] after
//! deserialization), so [`Operation::apply`] is total. Every variant is a pure
//! function of the input buffer and its own fields.
//!
//! | Family | Variants | Implemented in |
//! |---|---|---|
//! | Pointwise | `Negate`, `Greyscale`, `BrightnessContrast`, `Posterize` | [`pointwise`](crate::imaging::pointwise) |
//! | Geometric | `Flip`, `Rotate`, `Resize`, `Crop` | [`geometry`](crate::imaging::geometry) |
//! | Convolution | `MeanBlur`, `GaussianBlur`, `Sharpen`, `Emboss`, `Sobel` | [`convolution`](crate::imaging::convolution) |
//! | Median | `MedianBlur` | [`median`](crate::imaging::median) |
//! | Drawing | `Draw` | [`drawing`](crate::imaging::drawing) |

use crate::imaging::convolution::convolve;
use crate::imaging::params::{
    Color, EmbossDirection, FlipAxis, PosterizeBands, Radius, Rect, ResizeTarget, Rotation, Shape,
    SobelDirection, ViewTransform,
};
use crate::imaging::{drawing, geometry, kernel::Kernel, median, pointwise};
use crate::pixels::PixelBuffer;
use serde::{Deserialize, Serialize};

pub use crate::imaging::params::OperationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Negate {
        #[serde(default)]
        include_alpha: bool,
    },
    Greyscale,
    /// Percentage changes, `-100..=100` in practice but not limited.
    BrightnessContrast {
        brightness: i32,
        contrast: i32,
    },
    Posterize {
        bands: PosterizeBands,
    },
    Flip {
        axis: FlipAxis,
    },
    Rotate {
        rotation: Rotation,
    },
    Resize {
        target: ResizeTarget,
    },
    /// `selection` is in view coordinates; `view` maps it onto the image.
    Crop {
        selection: Rect,
        #[serde(default)]
        view: ViewTransform,
    },
    MeanBlur {
        radius: Radius,
    },
    GaussianBlur {
        radius: Radius,
    },
    MedianBlur {
        radius: Radius,
    },
    Sharpen,
    Emboss {
        direction: EmbossDirection,
    },
    Sobel {
        direction: SobelDirection,
    },
    Draw {
        shape: Shape,
        color: Color,
        fill: bool,
        #[serde(default)]
        view: ViewTransform,
    },
}

impl Operation {
    pub fn negate() -> Self {
        Operation::Negate {
            include_alpha: false,
        }
    }

    pub fn brightness_contrast(brightness: i32, contrast: i32) -> Self {
        Operation::BrightnessContrast {
            brightness,
            contrast,
        }
    }

    pub fn posterize(bands: u32) -> Result<Self, OperationError> {
        Ok(Operation::Posterize {
            bands: PosterizeBands::new(bands)?,
        })
    }

    pub fn resize(width: u32, height: u32, scale: f64) -> Result<Self, OperationError> {
        Ok(Operation::Resize {
            target: ResizeTarget::new(width, height, scale)?,
        })
    }

    /// Crop never fails to build: a selection outside the image turns into a
    /// no-op when applied.
    pub fn crop(selection: Rect, view: ViewTransform) -> Self {
        Operation::Crop { selection, view }
    }

    pub fn mean_blur(radius: u32) -> Result<Self, OperationError> {
        Ok(Operation::MeanBlur {
            radius: Radius::new(radius)?,
        })
    }

    pub fn gaussian_blur(radius: u32) -> Result<Self, OperationError> {
        Ok(Operation::GaussianBlur {
            radius: Radius::new(radius)?,
        })
    }

    pub fn median_blur(radius: u32) -> Result<Self, OperationError> {
        Ok(Operation::MedianBlur {
            radius: Radius::new(radius)?,
        })
    }

    pub fn draw(
        shape: Shape,
        color: Color,
        fill: bool,
        view: ViewTransform,
    ) -> Result<Self, OperationError> {
        let op = Operation::Draw {
            shape,
            color,
            fill,
            view,
        };
        op.validate()?;
        Ok(op)
    }

    /// Re-check parameters that the type system cannot. Needed after
    /// deserialization, where the newtypes are built without their
    /// constructors.
    pub fn validate(&self) -> Result<(), OperationError> {
        match self {
            Operation::Posterize { bands } => bands.validate(),
            Operation::Resize { target } => target.validate(),
            Operation::MeanBlur { radius }
            | Operation::GaussianBlur { radius }
            | Operation::MedianBlur { radius } => radius.validate(),
            Operation::Crop { selection, view } => {
                view.validate()?;
                if !selection.is_finite() {
                    return Err(OperationError::Shape("non-finite crop selection".into()));
                }
                Ok(())
            }
            Operation::Draw { shape, view, .. } => {
                view.validate()?;
                shape.validate()
            }
            Operation::Negate { .. }
            | Operation::Greyscale
            | Operation::BrightnessContrast { .. }
            | Operation::Flip { .. }
            | Operation::Rotate { .. }
            | Operation::Sharpen
            | Operation::Emboss { .. }
            | Operation::Sobel { .. } => Ok(()),
        }
    }

    /// The kernel a convolution-based variant builds, `None` for the rest.
    pub fn kernel(&self) -> Option<Kernel> {
        match self {
            Operation::MeanBlur { radius } => Some(Kernel::mean(*radius)),
            Operation::GaussianBlur { radius } => Some(Kernel::gaussian(*radius)),
            Operation::Sharpen => Some(Kernel::sharpen()),
            Operation::Emboss { direction } => Some(Kernel::emboss(*direction)),
            Operation::Sobel { direction } => Some(Kernel::sobel(*direction)),
            Operation::Negate { .. }
            | Operation::Greyscale
            | Operation::BrightnessContrast { .. }
            | Operation::Posterize { .. }
            | Operation::Flip { .. }
            | Operation::Rotate { .. }
            | Operation::Resize { .. }
            | Operation::Crop { .. }
            | Operation::MedianBlur { .. }
            | Operation::Draw { .. } => None,
        }
    }

    /// Run the edit. Deterministic and total for a validated operation.
    pub fn apply(&self, input: PixelBuffer) -> PixelBuffer {
        match self {
            Operation::Negate { include_alpha } => pointwise::negate(input, *include_alpha),
            Operation::Greyscale => pointwise::greyscale(input),
            Operation::BrightnessContrast {
                brightness,
                contrast,
            } => pointwise::brightness_contrast(input, *brightness, *contrast),
            Operation::Posterize { bands } => pointwise::posterize(input, *bands),
            Operation::Flip { axis } => geometry::flip(input, *axis),
            Operation::Rotate { rotation } => geometry::rotate(input, *rotation),
            Operation::Resize { target } => geometry::resize(input, target),
            Operation::Crop { selection, view } => geometry::crop(input, *selection, view),
            Operation::MeanBlur { radius } => convolve(Kernel::mean(*radius), &input),
            Operation::GaussianBlur { radius } => convolve(Kernel::gaussian(*radius), &input),
            Operation::MedianBlur { radius } => median::median_filter(&input, *radius),
            Operation::Sharpen => convolve(Kernel::sharpen(), &input),
            Operation::Emboss { direction } => convolve(Kernel::emboss(*direction), &input),
            Operation::Sobel { direction } => convolve(Kernel::sobel(*direction), &input),
            Operation::Draw {
                shape,
                color,
                fill,
                view,
            } => drawing::draw_shape(input, shape, *color, *fill, view),
        }
    }

    /// Short human-readable name, used for undo/redo labels.
    pub fn description(&self) -> String {
        match self {
            Operation::Negate {
                include_alpha: false,
            } => "Negate".to_string(),
            Operation::Negate {
                include_alpha: true,
            } => "Negate (with alpha)".to_string(),
            Operation::Greyscale => "Greyscale".to_string(),
            Operation::BrightnessContrast {
                brightness,
                contrast,
            } => format!("Brightness {brightness:+}%, contrast {contrast:+}%"),
            Operation::Posterize { bands } => format!("Posterize ({} bands)", bands.get()),
            Operation::Flip { axis } => match axis {
                FlipAxis::Horizontal => "Flip horizontal".to_string(),
                FlipAxis::Vertical => "Flip vertical".to_string(),
            },
            Operation::Rotate { rotation } => format!("Rotate {}°", rotation.degrees()),
            Operation::Resize { target } => {
                format!("Resize to {}x{}", target.width, target.height)
            }
            Operation::Crop { .. } => "Crop".to_string(),
            Operation::MeanBlur { radius } => format!("Mean blur (radius {})", radius.get()),
            Operation::GaussianBlur { radius } => {
                format!("Gaussian blur (radius {})", radius.get())
            }
            Operation::MedianBlur { radius } => format!("Median blur (radius {})", radius.get()),
            Operation::Sharpen => "Sharpen".to_string(),
            Operation::Emboss { direction } => format!("Emboss ({direction:?})"),
            Operation::Sobel { direction } => format!("Sobel ({direction:?})"),
            Operation::Draw { shape, fill, .. } => {
                let kind = match shape {
                    Shape::Rectangle { .. } => "rectangle",
                    Shape::Ellipse { .. } => "ellipse",
                    Shape::Line { .. } => "line",
                    Shape::Polygon { .. } => "polygon",
                };
                if *fill {
                    format!("Draw filled {kind}")
                } else {
                    format!("Draw {kind}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::Point;
    use crate::test_helpers::{assert_buffers_eq, gradient, uniform, with_outlier};
    use image::Rgba;

    #[test]
    fn constructors_validate_parameters() {
        assert_eq!(Operation::posterize(0), Err(OperationError::Bands(0)));
        assert_eq!(Operation::mean_blur(0), Err(OperationError::Radius(0)));
        assert_eq!(Operation::gaussian_blur(0), Err(OperationError::Radius(0)));
        assert_eq!(Operation::median_blur(0), Err(OperationError::Radius(0)));
        assert_eq!(
            Operation::median_blur(u32::MAX),
            Err(OperationError::Radius(u32::MAX))
        );
        assert_eq!(
            Operation::posterize(u32::MAX),
            Err(OperationError::Bands(u32::MAX))
        );
        assert!(Operation::resize(0, 5, 1.0).is_err());
        let degenerate = Shape::Polygon {
            points: vec![Point::new(1.0, 1.0)],
        };
        assert!(
            Operation::draw(degenerate, Color::BLACK, true, ViewTransform::identity()).is_err()
        );
    }

    #[test]
    fn serialized_form_is_tagged() {
        let json = serde_json::to_value(Operation::posterize(4).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "op": "posterize", "bands": 4 }));
        let json = serde_json::to_value(Operation::Sharpen).unwrap();
        assert_eq!(json, serde_json::json!({ "op": "sharpen" }));
    }

    #[test]
    fn deserialized_zero_radius_fails_validation() {
        let op: Operation =
            serde_json::from_value(serde_json::json!({ "op": "mean_blur", "radius": 0 })).unwrap();
        assert_eq!(op.validate(), Err(OperationError::Radius(0)));
    }

    #[test]
    fn crop_view_defaults_to_identity() {
        let op: Operation = serde_json::from_value(serde_json::json!({
            "op": "crop",
            "selection": { "x": 0.0, "y": 0.0, "width": 2.0, "height": 2.0 }
        }))
        .unwrap();
        assert_eq!(
            op,
            Operation::crop(Rect::new(0.0, 0.0, 2.0, 2.0), ViewTransform::identity())
        );
    }

    #[test]
    fn only_convolution_variants_have_kernels() {
        assert!(Operation::Sharpen.kernel().is_some());
        assert!(Operation::gaussian_blur(1).unwrap().kernel().is_some());
        assert!(Operation::median_blur(1).unwrap().kernel().is_none());
        assert!(Operation::negate().kernel().is_none());
    }

    #[test]
    fn apply_dispatches_pointwise() {
        let input = uniform(3, 3, Rgba([100, 100, 100, 255]));
        let out = Operation::brightness_contrast(50, 0).apply(input);
        assert_buffers_eq(&out, &uniform(3, 3, Rgba([164, 164, 164, 255])));
    }

    #[test]
    fn apply_dispatches_convolution() {
        let input = uniform(5, 5, Rgba([40, 80, 120, 200]));
        let out = Operation::Sobel {
            direction: SobelDirection::Horizontal,
        }
        .apply(input);
        assert_buffers_eq(&out, &uniform(5, 5, Rgba([128, 128, 128, 200])));
    }

    #[test]
    fn convolution_variants_apply_their_kernel() {
        let input = gradient(9, 7);
        let ops = [
            Operation::mean_blur(2).unwrap(),
            Operation::gaussian_blur(1).unwrap(),
            Operation::Sharpen,
            Operation::Emboss {
                direction: EmbossDirection::SouthWest,
            },
            Operation::Sobel {
                direction: SobelDirection::Vertical,
            },
        ];
        for op in ops {
            let kernel = op.kernel().unwrap();
            let out = op.apply(input.clone());
            assert_ne!(out, input, "{op:?} left the gradient untouched");
            assert_buffers_eq(&out, &convolve(kernel, &input));
        }
    }

    #[test]
    fn apply_dispatches_median() {
        let bg = Rgba([10, 20, 30, 255]);
        let input = with_outlier(7, 7, bg, (3, 3), Rgba([255, 0, 255, 255]));
        let out = Operation::median_blur(1).unwrap().apply(input);
        assert_buffers_eq(&out, &uniform(7, 7, bg));
    }

    #[test]
    fn apply_dispatches_geometry() {
        let out = Operation::Rotate {
            rotation: Rotation::Cw270,
        }
        .apply(gradient(6, 2));
        assert_eq!(out.dimensions(), (2, 6));
    }

    #[test]
    fn crop_outside_is_identity() {
        let input = gradient(8, 8);
        let op = Operation::crop(Rect::new(50.0, 50.0, 4.0, 4.0), ViewTransform::identity());
        assert_buffers_eq(&op.apply(input.clone()), &input);
    }

    #[test]
    fn descriptions_name_the_edit() {
        assert_eq!(Operation::negate().description(), "Negate");
        assert_eq!(
            Operation::gaussian_blur(3).unwrap().description(),
            "Gaussian blur (radius 3)"
        );
        assert_eq!(
            Operation::brightness_contrast(50, -10).description(),
            "Brightness +50%, contrast -10%"
        );
        assert_eq!(
            Operation::Rotate {
                rotation: Rotation::Cw90
            }
            .description(),
            "Rotate 90°"
        );
    }
}
