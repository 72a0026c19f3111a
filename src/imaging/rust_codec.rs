//! Raster codec on top of the `image` crate.
//!
//! ## Format mapping
//!
//! | Format | Encoder | Notes |
//! |---|---|---|
//! | PNG, TIFF, WebP, BMP, GIF | `DynamicImage::write_to` | RGBA written as-is (WebP is lossless) |
//! | JPEG | `JpegEncoder::new_with_quality` | alpha dropped, quality from config |
//!
//! Decoding sniffs the format from the bytes and converts to RGBA8.

use crate::config::EditorConfig;
use crate::persistence::{CodecError, PersistenceCodec};
use crate::pixels::PixelBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Formats this codec will write.
const WRITABLE: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Bmp,
    ImageFormat::Gif,
];

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// `image`-crate codec. See the [module docs](self) for the format table.
#[derive(Debug, Clone, Copy)]
pub struct RustCodec {
    jpeg_quality: u8,
}

impl RustCodec {
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Quality is clamped to 1-100.
    pub fn with_jpeg_quality(quality: u8) -> Self {
        Self {
            jpeg_quality: quality.clamp(1, 100),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::with_jpeg_quality(config.encoding.jpeg_quality)
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceCodec for RustCodec {
    fn encode_image(
        &self,
        buffer: &PixelBuffer,
        format: ImageFormat,
    ) -> Result<Vec<u8>, CodecError> {
        if !WRITABLE.contains(&format) || !format.writing_enabled() {
            return Err(CodecError::UnsupportedFormat(format!("{format:?}")));
        }
        let image = DynamicImage::ImageRgba8(buffer.as_rgba().clone());
        let mut bytes = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality);
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(|e| CodecError::Encode(format!("JPEG: {e}")))?;
            }
            other => {
                image
                    .write_to(&mut Cursor::new(&mut bytes), other)
                    .map_err(|e| CodecError::Encode(format!("{other:?}: {e}")))?;
            }
        }
        Ok(bytes)
    }

    fn decode_image(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
        let image =
            image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(image.to_rgba8().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{assert_buffers_eq, gradient, uniform};
    use image::Rgba;

    #[test]
    fn png_round_trip_is_lossless() {
        let codec = RustCodec::new();
        let buf = gradient(17, 9);
        let bytes = codec.encode_image(&buf, ImageFormat::Png).unwrap();
        assert_buffers_eq(&codec.decode_image(&bytes).unwrap(), &buf);
    }

    #[test]
    fn jpeg_drops_alpha_and_keeps_dimensions() {
        let codec = RustCodec::with_jpeg_quality(95);
        let buf = uniform(16, 8, Rgba([200, 100, 50, 10]));
        let bytes = codec.encode_image(&buf, ImageFormat::Jpeg).unwrap();
        let decoded = codec.decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.pixel(4, 4)[3], 255);
    }

    #[test]
    fn jpeg_quality_changes_output_size() {
        let buf = gradient(64, 64);
        let low = RustCodec::with_jpeg_quality(10)
            .encode_image(&buf, ImageFormat::Jpeg)
            .unwrap();
        let high = RustCodec::with_jpeg_quality(100)
            .encode_image(&buf, ImageFormat::Jpeg)
            .unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(RustCodec::with_jpeg_quality(0).jpeg_quality(), 1);
        assert_eq!(RustCodec::with_jpeg_quality(250).jpeg_quality(), 100);
    }

    #[test]
    fn unwritable_format_errors() {
        let result = RustCodec::new().encode_image(&gradient(2, 2), ImageFormat::Hdr);
        assert!(matches!(result, Err(CodecError::UnsupportedFormat(_))));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = RustCodec::new().decode_image(b"definitely not an image");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn quality_comes_from_config() {
        let mut config = EditorConfig::default();
        config.encoding.jpeg_quality = 42;
        assert_eq!(RustCodec::from_config(&config).jpeg_quality(), 42);
    }
}
