//! A single open image and its edit history.
//!
//! [`ImageDocument`] owns two buffers: `original`, exactly as decoded, and
//! `current`, which is always `original` with the undo stack folded over it.
//! Undo never inverts an operation; it recomputes `current` from `original`.
//!
//! ## Files
//!
//! | File | Content | Written by |
//! |---|---|---|
//! | `photo.png` | the original pixels, never the rendered ones | [`save`](ImageDocument::save) |
//! | `photo.png.ops` | the undo stack | [`save`](ImageDocument::save) |
//! | `*.macro` | a recorded operation sequence | [`stop_recording`](ImageDocument::stop_recording) |
//! | anything | the rendered `current` pixels | [`export`](ImageDocument::export) |
//!
//! A missing history file means a fresh image. A corrupt or foreign one is
//! logged and surfaced through [`load_warning`](ImageDocument::load_warning),
//! and the image opens with an empty history.
//!
//! Every fallible call leaves the document exactly as it was when it fails.

use crate::config::{EditorConfig, effective_threads};
use crate::history::History;
use crate::imaging::rust_codec::RustCodec;
use crate::operation::Operation;
use crate::persistence::{CodecError, DeserializationError, PersistenceCodec, format_for_path};
use crate::pixels::PixelBuffer;
use rayon::ThreadPool;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Failed to encode operations: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
    #[error("Document has no file path; use save_as")]
    NoPath,
    #[error("No macro recording in progress")]
    NotRecording,
}

impl DocumentError {
    fn io(path: &Path, source: io::Error) -> Self {
        DocumentError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Sibling history path: the image path with `suffix` appended.
pub fn history_path_for(image_path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = image_path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Give `path` the macro extension when it has none.
pub fn macro_path_for(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// What `open` produces before it is swapped into a document.
struct Loaded {
    original: PixelBuffer,
    history: History,
    warning: Option<DeserializationError>,
}

pub struct ImageDocument<C: PersistenceCodec = RustCodec> {
    codec: C,
    config: EditorConfig,
    pool: Option<ThreadPool>,
    path: Option<PathBuf>,
    original: PixelBuffer,
    current: PixelBuffer,
    history: History,
    dirty: bool,
    load_warning: Option<DeserializationError>,
}

impl ImageDocument<RustCodec> {
    /// Open an image with the default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        Self::open_with_config(path, EditorConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: EditorConfig,
    ) -> Result<Self, DocumentError> {
        let codec = RustCodec::from_config(&config);
        Self::open_with(path, codec, config)
    }

    /// A document with no backing file. `save` fails until `save_as`.
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        Self::from_buffer_with(buffer, RustCodec::new(), EditorConfig::default())
    }
}

impl<C: PersistenceCodec> ImageDocument<C> {
    pub fn open_with(
        path: impl AsRef<Path>,
        codec: C,
        config: EditorConfig,
    ) -> Result<Self, DocumentError> {
        let mut document = Self::empty(codec, config);
        document.reopen(path)?;
        Ok(document)
    }

    pub fn from_buffer_with(buffer: PixelBuffer, codec: C, config: EditorConfig) -> Self {
        let mut document = Self::empty(codec, config);
        document.current = buffer.clone();
        document.original = buffer;
        document
    }

    fn empty(codec: C, config: EditorConfig) -> Self {
        let pool = build_pool(&config);
        Self {
            codec,
            config,
            pool,
            path: None,
            original: PixelBuffer::default(),
            current: PixelBuffer::default(),
            history: History::new(),
            dirty: false,
            load_warning: None,
        }
    }

    /// Replace the image and history with the file at `path`.
    ///
    /// On failure the previous image, history and path are kept.
    pub fn reopen(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let Loaded {
            original,
            history,
            warning,
        } = self.load(path)?;
        self.current = self.render(|| history.replay(&original));
        self.original = original;
        self.history = history;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        self.load_warning = warning;
        log::info!(
            "Opened {} ({}x{}, {} operations in history)",
            path.display(),
            self.original.width(),
            self.original.height(),
            self.history.applied().len()
        );
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Loaded, DocumentError> {
        let bytes = fs::read(path).map_err(|e| DocumentError::io(path, e))?;
        let original = self.codec.decode_image(&bytes)?;

        let history_path = history_path_for(path, &self.config.history_suffix);
        let operations = match fs::read(&history_path) {
            Ok(bytes) => self.codec.deserialize_operations(&bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(DeserializationError::Io(e)),
        };
        let (history, warning) = match operations {
            Ok(ops) => (History::from_operations(ops), None),
            Err(e) => {
                log::warn!(
                    "Ignoring history {}: {e}; opening with empty history",
                    history_path.display()
                );
                (History::new(), Some(e))
            }
        };
        Ok(Loaded {
            original,
            history,
            warning,
        })
    }

    /// Run pixel work inside the configured pool, if any.
    fn render<R: Send>(&self, work: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    fn refresh(&mut self) {
        let (history, original) = (&self.history, &self.original);
        let current = self.render(|| history.replay(original));
        self.current = current;
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Apply `op` to the current buffer and record it. Clears the redo stack.
    pub fn apply(&mut self, op: Operation) {
        let input = std::mem::take(&mut self.current);
        self.current = self.render(|| op.apply(input));
        log::debug!(
            "Applied {} (history depth {})",
            op.description(),
            self.history.applied().len() + 1
        );
        self.history.push(op);
        self.dirty = true;
    }

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(op) = self.history.undo() else {
            return false;
        };
        log::debug!(
            "Undid {} (history depth {})",
            op.description(),
            self.history.applied().len()
        );
        self.refresh();
        self.dirty = true;
        true
    }

    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(op) = self.history.take_redo() else {
            return false;
        };
        let input = std::mem::take(&mut self.current);
        self.current = self.render(|| op.apply(input));
        log::debug!(
            "Redid {} (history depth {})",
            op.description(),
            self.history.applied().len() + 1
        );
        self.history.push_redone(op);
        self.dirty = true;
        true
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Write the original image and its history back to the document's path.
    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        self.write_to(&path)?;
        self.dirty = false;
        Ok(())
    }

    /// Write to `path` and make it the document's path.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), DocumentError> {
        let format = format_for_path(path)?;
        let image = self.codec.encode_image(&self.original, format)?;
        let operations = self.codec.serialize_operations(self.history.applied())?;
        let history_path = history_path_for(path, &self.config.history_suffix);

        // History first: an image must never land next to a stale history.
        fs::write(&history_path, operations).map_err(|e| DocumentError::io(&history_path, e))?;
        fs::write(path, image).map_err(|e| DocumentError::io(path, e))?;
        log::info!(
            "Saved {} with {} operations",
            path.display(),
            self.history.applied().len()
        );
        Ok(())
    }

    /// Write the rendered `current` buffer to `path`. The document's path,
    /// history and dirty flag are untouched.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let format = format_for_path(path)?;
        let image = self.codec.encode_image(&self.current, format)?;
        fs::write(path, image).map_err(|e| DocumentError::io(path, e))?;
        log::info!("Exported {}", path.display());
        Ok(())
    }

    // =========================================================================
    // Macros
    // =========================================================================

    /// Start capturing applied operations. Restarts any recording in progress.
    pub fn start_recording(&mut self) {
        self.history.start_recording();
        log::debug!("Macro recording started");
    }

    pub fn is_recording(&self) -> bool {
        self.history.is_recording()
    }

    /// Write the recorded operations to `path` and end the recording.
    ///
    /// Returns the path actually written, which gains the configured macro
    /// extension when `path` has none. When the write fails the recording
    /// keeps going.
    pub fn stop_recording(&mut self, path: impl AsRef<Path>) -> Result<PathBuf, DocumentError> {
        let recording = self.history.recording().ok_or(DocumentError::NotRecording)?;
        let path = macro_path_for(path.as_ref(), &self.config.macro_extension);
        if recording.is_empty() {
            log::warn!("Macro {} has no operations", path.display());
        }
        let bytes = self.codec.serialize_operations(recording.operations())?;
        fs::write(&path, bytes).map_err(|e| DocumentError::io(&path, e))?;
        let count = recording.len();
        self.history.stop_recording();
        log::info!("Saved macro {} ({count} operations)", path.display());
        Ok(path)
    }

    /// Append the operations stored at `path` to the history and re-render.
    ///
    /// Returns how many operations were added. Corrupt or foreign data is
    /// reported and leaves the document unchanged.
    pub fn load_macro(&mut self, path: impl AsRef<Path>) -> Result<usize, DocumentError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| DocumentError::io(path, e))?;
        let operations = self.codec.deserialize_operations(&bytes).map_err(|e| {
            log::warn!("Ignoring macro {}: {e}", path.display());
            e
        })?;
        let count = operations.len();
        if count == 0 {
            return Ok(0);
        }
        for op in operations {
            self.history.push(op);
        }
        self.refresh();
        self.dirty = true;
        log::info!("Loaded macro {} ({count} operations)", path.display());
        Ok(count)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn original(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn current(&self) -> &PixelBuffer {
        &self.current
    }

    /// The undo stack, oldest first.
    pub fn history(&self) -> &[Operation] {
        self.history.applied()
    }

    /// The redo stack, with the next operation to redo last.
    pub fn redo_stack(&self) -> &[Operation] {
        self.history.undone()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.path
            .as_deref()
            .map(|p| history_path_for(p, &self.config.history_suffix))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// True when there are edits, undos or redos since the last open or save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_description()
    }

    /// Why the history file was ignored on the last open, if it was.
    pub fn load_warning(&self) -> Option<&DeserializationError> {
        self.load_warning.as_ref()
    }
}

/// A private pool when the config caps the thread count, otherwise `None`
/// and work runs on rayon's global pool.
fn build_pool(config: &EditorConfig) -> Option<ThreadPool> {
    if config.processing.max_threads.is_none() {
        return None;
    }
    let threads = effective_threads(&config.processing);
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => Some(pool),
        Err(e) => {
            log::warn!("Falling back to the global thread pool: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{FlipAxis, Rect, ViewTransform};
    use crate::persistence::tests::{MockCodec, RecordedCall};
    use crate::test_helpers::{assert_buffers_eq, gradient, uniform, write_png};
    use image::{ImageFormat, Rgba};
    use tempfile::TempDir;

    fn mock_document(buffer: PixelBuffer) -> ImageDocument<MockCodec> {
        ImageDocument::from_buffer_with(buffer, MockCodec::new(), EditorConfig::default())
    }

    // =========================================================================
    // Paths
    // =========================================================================

    #[test]
    fn history_path_appends_suffix() {
        assert_eq!(
            history_path_for(Path::new("/tmp/photo.png"), ".ops"),
            PathBuf::from("/tmp/photo.png.ops")
        );
    }

    #[test]
    fn macro_path_gains_extension_only_when_missing() {
        assert_eq!(
            macro_path_for(Path::new("dir/warm"), "macro"),
            PathBuf::from("dir/warm.macro")
        );
        assert_eq!(
            macro_path_for(Path::new("dir/warm.json"), "macro"),
            PathBuf::from("dir/warm.json")
        );
    }

    // =========================================================================
    // Apply / undo / redo
    // =========================================================================

    #[test]
    fn apply_marks_dirty_and_records() {
        let mut doc = mock_document(gradient(4, 4));
        assert!(!doc.is_dirty());
        assert!(!doc.can_undo());
        doc.apply(Operation::negate());
        assert!(doc.is_dirty());
        assert_eq!(doc.history(), &[Operation::negate()]);
        assert_eq!(doc.undo_description().as_deref(), Some("Negate"));
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_do_nothing() {
        let mut doc = mock_document(gradient(3, 3));
        assert!(!doc.undo());
        assert!(!doc.redo());
        assert!(!doc.is_dirty());
    }

    #[test]
    fn undo_recomputes_from_original() {
        let original = gradient(6, 4);
        let mut doc = mock_document(original.clone());
        doc.apply(Operation::Greyscale);
        doc.apply(Operation::posterize(2).unwrap());
        assert!(doc.undo());
        assert_buffers_eq(doc.current(), &Operation::Greyscale.apply(original.clone()));
        assert!(doc.undo());
        assert_buffers_eq(doc.current(), &original);
        assert_eq!(doc.redo_description().as_deref(), Some("Greyscale"));
    }

    #[test]
    fn redo_restores_pre_undo_buffer() {
        let mut doc = mock_document(gradient(9, 7));
        doc.apply(Operation::gaussian_blur(1).unwrap());
        doc.apply(Operation::Flip {
            axis: FlipAxis::Vertical,
        });
        let before = doc.current().clone();
        doc.undo();
        doc.redo();
        assert_buffers_eq(doc.current(), &before);
        assert!(!doc.can_redo());
    }

    #[test]
    fn apply_after_undo_clears_redo() {
        let mut doc = mock_document(gradient(4, 4));
        doc.apply(Operation::negate());
        doc.undo();
        doc.apply(Operation::Greyscale);
        assert!(!doc.can_redo());
        assert_eq!(doc.history(), &[Operation::Greyscale]);
    }

    #[test]
    fn crop_outside_still_enters_history() {
        let original = gradient(5, 5);
        let mut doc = mock_document(original.clone());
        let op = Operation::crop(Rect::new(10.0, 10.0, 2.0, 2.0), ViewTransform::identity());
        doc.apply(op.clone());
        assert_eq!(doc.history(), &[op]);
        assert_buffers_eq(doc.current(), &original);
    }

    #[test]
    fn bounded_pool_gives_same_result() {
        let mut config = EditorConfig::default();
        config.processing.max_threads = Some(1);
        let input = gradient(23, 11);
        let mut single = ImageDocument::from_buffer_with(input.clone(), MockCodec::new(), config);
        let mut global = mock_document(input);
        for doc in [&mut single, &mut global] {
            doc.apply(Operation::median_blur(2).unwrap());
            doc.apply(Operation::Sharpen);
        }
        assert_buffers_eq(single.current(), global.current());
    }

    // =========================================================================
    // Save / open
    // =========================================================================

    #[test]
    fn save_without_path_fails() {
        let mut doc = mock_document(gradient(2, 2));
        doc.apply(Operation::negate());
        assert!(matches!(doc.save(), Err(DocumentError::NoPath)));
        assert!(doc.is_dirty());
    }

    #[test]
    fn save_as_writes_original_and_history() {
        let tmp = TempDir::new().unwrap();
        let original = gradient(3, 2);
        let mut doc = mock_document(original.clone());
        doc.apply(Operation::negate());
        let path = tmp.path().join("edit.png");
        doc.save_as(&path).unwrap();

        assert!(!doc.is_dirty());
        assert_eq!(doc.path(), Some(path.as_path()));
        assert_eq!(
            doc.codec.get_calls(),
            vec![RecordedCall::Encode {
                width: 3,
                height: 2,
                format: ImageFormat::Png
            }]
        );
        let image = doc.codec.decode_image(&fs::read(&path).unwrap()).unwrap();
        assert_buffers_eq(&image, &original);
        let ops = crate::persistence::decode_operations(
            &fs::read(tmp.path().join("edit.png.ops")).unwrap(),
        )
        .unwrap();
        assert_eq!(ops, vec![Operation::negate()]);
    }

    #[test]
    fn save_as_unknown_extension_keeps_state() {
        let tmp = TempDir::new().unwrap();
        let mut doc = mock_document(gradient(2, 2));
        doc.apply(Operation::negate());
        let result = doc.save_as(tmp.path().join("edit.xyz"));
        assert!(matches!(result, Err(DocumentError::Codec(_))));
        assert!(doc.path().is_none());
        assert!(doc.is_dirty());
    }

    #[test]
    fn failed_history_write_leaves_no_image() {
        let tmp = TempDir::new().unwrap();
        let mut doc = mock_document(gradient(2, 2));
        doc.apply(Operation::negate());
        let path = tmp.path().join("edit.png");
        fs::create_dir(tmp.path().join("edit.png.ops")).unwrap();

        let result = doc.save_as(&path);
        assert!(matches!(result, Err(DocumentError::Io { .. })));
        assert!(!path.exists());
        assert!(doc.path().is_none());
        assert!(doc.is_dirty());
    }

    #[test]
    fn reopen_failure_keeps_previous_document() {
        let tmp = TempDir::new().unwrap();
        let path = write_png(tmp.path(), "a.png", &gradient(4, 4));
        let mut doc = ImageDocument::open(&path).unwrap();
        doc.apply(Operation::negate());
        let before = doc.current().clone();

        let result = doc.reopen(tmp.path().join("missing.png"));
        assert!(matches!(result, Err(DocumentError::Io { .. })));
        assert_eq!(doc.path(), Some(path.as_path()));
        assert_eq!(doc.history(), &[Operation::negate()]);
        assert_buffers_eq(doc.current(), &before);
    }

    #[test]
    fn reopen_replaces_history() {
        let tmp = TempDir::new().unwrap();
        let first = write_png(tmp.path(), "first.png", &gradient(4, 4));
        let second = write_png(tmp.path(), "second.png", &uniform(2, 2, Rgba([1, 2, 3, 255])));
        let mut doc = ImageDocument::open(&first).unwrap();
        doc.apply(Operation::negate());
        doc.undo();
        doc.reopen(&second).unwrap();
        assert!(doc.history().is_empty());
        assert!(!doc.can_redo());
        assert!(!doc.is_dirty());
        assert_eq!(doc.current().dimensions(), (2, 2));
    }

    #[test]
    fn unreadable_history_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        let path = write_png(tmp.path(), "a.png", &gradient(4, 4));
        // A directory where the history file should be.
        fs::create_dir(tmp.path().join("a.png.ops")).unwrap();
        let doc = ImageDocument::open(&path).unwrap();
        assert!(doc.history().is_empty());
        assert!(doc.load_warning().is_some());
    }

    #[test]
    fn export_writes_current_and_keeps_dirty() {
        let tmp = TempDir::new().unwrap();
        let mut doc = mock_document(gradient(3, 3));
        doc.apply(Operation::negate());
        let out = tmp.path().join("render.png");
        doc.export(&out).unwrap();
        let written = doc.codec.decode_image(&fs::read(&out).unwrap()).unwrap();
        assert_buffers_eq(&written, doc.current());
        assert!(doc.is_dirty());
        assert!(doc.path().is_none());
    }

    // =========================================================================
    // Macros
    // =========================================================================

    #[test]
    fn stop_without_recording_fails() {
        let tmp = TempDir::new().unwrap();
        let mut doc = mock_document(gradient(2, 2));
        let result = doc.stop_recording(tmp.path().join("m"));
        assert!(matches!(result, Err(DocumentError::NotRecording)));
    }

    #[test]
    fn recording_captures_only_after_start() {
        let tmp = TempDir::new().unwrap();
        let mut doc = mock_document(gradient(4, 4));
        doc.apply(Operation::Greyscale);
        doc.start_recording();
        assert!(doc.is_recording());
        doc.apply(Operation::negate());
        let path = doc.stop_recording(tmp.path().join("invert")).unwrap();
        assert_eq!(path, tmp.path().join("invert.macro"));
        assert!(!doc.is_recording());
        let ops = crate::persistence::decode_operations(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(ops, vec![Operation::negate()]);
    }

    #[test]
    fn failed_macro_write_keeps_recording() {
        let tmp = TempDir::new().unwrap();
        let mut doc = mock_document(gradient(2, 2));
        doc.start_recording();
        doc.apply(Operation::negate());
        let result = doc.stop_recording(tmp.path().join("no/such/dir/m.macro"));
        assert!(matches!(result, Err(DocumentError::Io { .. })));
        assert!(doc.is_recording());
    }

    #[test]
    fn corrupt_macro_leaves_document_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.macro");
        fs::write(&path, b"{ not json").unwrap();
        let mut doc = mock_document(gradient(4, 4));
        doc.apply(Operation::negate());
        let before = doc.current().clone();
        let result = doc.load_macro(&path);
        assert!(matches!(result, Err(DocumentError::Deserialization(_))));
        assert_eq!(doc.history(), &[Operation::negate()]);
        assert_buffers_eq(doc.current(), &before);
    }

    #[test]
    fn loaded_macro_is_recorded_while_recording() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("grey.macro");
        fs::write(
            &path,
            crate::persistence::encode_operations(&[Operation::Greyscale]).unwrap(),
        )
        .unwrap();
        let mut doc = mock_document(gradient(4, 4));
        doc.start_recording();
        assert_eq!(doc.load_macro(&path).unwrap(), 1);
        let saved = doc.stop_recording(tmp.path().join("copy.macro")).unwrap();
        let ops = crate::persistence::decode_operations(&fs::read(saved).unwrap()).unwrap();
        assert_eq!(ops, vec![Operation::Greyscale]);
    }
}
