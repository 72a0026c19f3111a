//! Pixel transforms and the raster codec.
//!
//! | Concern | Module | Built on |
//! |---|---|---|
//! | **Parameters** | [`params`] | validated value types, serde |
//! | **Kernels** | [`kernel`] | mean, Gaussian, sharpen, emboss, Sobel |
//! | **Convolution** | [`convolution`] | edge-replicated or offset, rayon rows |
//! | **Median** | [`median`] | per-channel exact median, rayon rows |
//! | **Pointwise** | [`pointwise`] | negate, greyscale, brightness/contrast, posterize |
//! | **Geometry** | [`geometry`] | `image::imageops` flip/rotate/resize/crop |
//! | **Drawing** | [`drawing`] | coverage mask + source-over blend |
//! | **Codec** | [`rust_codec`] | `image` crate encoders and decoders |
//!
//! Everything except the codec is a pure function from one
//! [`PixelBuffer`](crate::pixels::PixelBuffer) to another.

pub mod convolution;
pub mod drawing;
pub mod geometry;
pub mod kernel;
pub mod median;
pub mod params;
pub mod pointwise;
pub mod rust_codec;

pub use convolution::{ConvolutionEngine, Strategy};
pub use kernel::{Kernel, KernelError};
pub use params::{
    Color, EmbossDirection, FlipAxis, OperationError, Point, PosterizeBands, Radius, Rect,
    ResizeTarget, Rotation, Shape, SobelDirection, ViewTransform,
};
pub use rust_codec::RustCodec;
