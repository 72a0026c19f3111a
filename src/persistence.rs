//! Persistence seam: operation sequences and raster bytes.
//!
//! The [`PersistenceCodec`] trait is everything the document needs from the
//! outside world. Operation sequences (history files and macro files alike)
//! use one versioned JSON envelope:
//!
//! ```json
//! {
//!   "format": "retouch-operations",
//!   "version": 1,
//!   "operations": [
//!     { "op": "negate", "include_alpha": false },
//!     { "op": "posterize", "bands": 4 }
//!   ]
//! }
//! ```
//!
//! Decoding checks `format`, then `version`, then re-validates the parameters
//! of every operation. Any failure is a [`DeserializationError`], which the
//! document treats as recoverable. Raster encode/decode is left to the
//! implementor; the production one is
//! [`RustCodec`](crate::imaging::rust_codec::RustCodec).

use crate::operation::{Operation, OperationError};
use crate::pixels::PixelBuffer;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Envelope tag identifying an operation-sequence file.
pub const FORMAT_TAG: &str = "retouch-operations";

/// Bump when the encoding of [`Operation`] changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Image encode failed: {0}")]
    Encode(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum DeserializationError {
    #[error("Malformed operation data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not an operation file (format tag {0:?})")]
    ForeignFormat(String),
    #[error("Unsupported operation file version {0} (expected {FORMAT_VERSION})")]
    UnsupportedVersion(u32),
    #[error("Operation {index} has invalid parameters: {source}")]
    InvalidOperation {
        index: usize,
        #[source]
        source: OperationError,
    },
    #[error("Cannot read operation file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    format: &'a str,
    version: u32,
    operations: &'a [Operation],
}

/// `operations` stays raw until the header has been checked, so a newer
/// version reports `UnsupportedVersion` rather than a parse error.
#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    operations: serde_json::Value,
}

/// Encode an operation sequence in the versioned envelope.
pub fn encode_operations(operations: &[Operation]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(&EnvelopeRef {
        format: FORMAT_TAG,
        version: FORMAT_VERSION,
        operations,
    })
}

/// Decode and validate an operation sequence.
pub fn decode_operations(bytes: &[u8]) -> Result<Vec<Operation>, DeserializationError> {
    let envelope: Envelope = serde_json::from_slice(bytes)?;
    if envelope.format != FORMAT_TAG {
        return Err(DeserializationError::ForeignFormat(envelope.format));
    }
    if envelope.version != FORMAT_VERSION {
        return Err(DeserializationError::UnsupportedVersion(envelope.version));
    }
    let operations: Vec<Operation> = serde_json::from_value(envelope.operations)?;
    for (index, op) in operations.iter().enumerate() {
        op.validate()
            .map_err(|source| DeserializationError::InvalidOperation { index, source })?;
    }
    Ok(operations)
}

/// Image format implied by a path's extension.
pub fn format_for_path(path: &Path) -> Result<ImageFormat, CodecError> {
    ImageFormat::from_path(path).map_err(|_| {
        CodecError::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("no extension on {}", path.display())),
        )
    })
}

/// What the document needs to persist itself.
///
/// The operation-sequence methods default to the shared envelope; an
/// implementor normally only supplies the raster half.
pub trait PersistenceCodec {
    fn serialize_operations(
        &self,
        operations: &[Operation],
    ) -> Result<Vec<u8>, serde_json::Error> {
        encode_operations(operations)
    }

    fn deserialize_operations(
        &self,
        bytes: &[u8],
    ) -> Result<Vec<Operation>, DeserializationError> {
        decode_operations(bytes)
    }

    /// Encode `buffer` as `format`.
    fn encode_image(&self, buffer: &PixelBuffer, format: ImageFormat)
    -> Result<Vec<u8>, CodecError>;

    /// Decode raster bytes, sniffing the format from the content.
    fn decode_image(&self, bytes: &[u8]) -> Result<PixelBuffer, CodecError>;
}
