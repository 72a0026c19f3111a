//! # Retouch
//!
//! The editing core of a non-destructive raster image editor. An open image
//! keeps its decoded pixels untouched; every edit is a recorded
//! [`Operation`], and what the user sees is the original with the recorded
//! operations replayed over it.
//!
//! ```text
//! original ──op₁──▶ ··· ──opₙ──▶ current
//!            └──── undo stack ────┘
//! ```
//!
//! Saving writes the original pixels plus the operation list, so reopening a
//! file brings back the full, still-undoable edit sequence.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pixels`] | `PixelBuffer`: RGBA8 raster with edge-clamped neighbour access |
//! | [`imaging`] | Filters, kernels, geometry, drawing, and the `image`-crate codec |
//! | [`operation`] | The closed, serializable set of edits |
//! | [`history`] | Undo/redo stacks and macro capture |
//! | [`persistence`] | `PersistenceCodec` trait and the versioned operation file format |
//! | [`document`] | `ImageDocument`: open, apply, undo, redo, save, macros |
//! | [`config`] | `EditorConfig` loaded from TOML |
//!
//! # Design Decisions
//!
//! ## Undo By Replay
//!
//! Undo pops the newest operation and recomputes `current` from `original`.
//! Blurs, crops and posterization have no inverse, and replay is correct for
//! all of them at the cost of O(history) work per undo.
//!
//! ## A Closed Operation Enum
//!
//! Operations are one `serde`-tagged enum rather than trait objects. History
//! and macro files are plain versioned JSON that any build can read, and
//! every parameter is re-validated when a file is loaded.
//!
//! ## Deterministic Parallelism
//!
//! Convolution and median filters split rows across a rayon pool. Each pixel
//! is computed by exactly one thread in a fixed order, so output is
//! bit-identical whatever `processing.max_threads` is set to, and an
//! incrementally built `current` always equals a full replay.
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade and installs no logger itself.

pub mod config;
pub mod document;
pub mod history;
pub mod imaging;
pub mod operation;
pub mod persistence;
pub mod pixels;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::{ConfigError, EditorConfig};
pub use document::{DocumentError, ImageDocument};
pub use history::{History, MacroRecording};
pub use operation::{Operation, OperationError};
pub use persistence::{CodecError, DeserializationError, PersistenceCodec};
pub use pixels::PixelBuffer;
