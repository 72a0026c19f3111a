//! Undo/redo bookkeeping and macro capture.
//!
//! [`History`] only stores operations; it never touches pixels except in
//! [`History::replay`]. The document keeps `current == replay(original)` true
//! after every call.

use crate::operation::Operation;
use crate::pixels::PixelBuffer;

/// Operations captured between record-start and record-stop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroRecording {
    operations: Vec<Operation>,
}

impl MacroRecording {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    applied: Vec<Operation>,
    undone: Vec<Operation>,
    recording: Option<MacroRecording>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history whose undo stack is `operations`, oldest first.
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self {
            applied: operations,
            ..Self::default()
        }
    }

    /// The undo stack, oldest first.
    pub fn applied(&self) -> &[Operation] {
        &self.applied
    }

    /// The redo stack, with the next operation to redo last.
    pub fn undone(&self) -> &[Operation] {
        &self.undone
    }

    /// Record a fresh edit. Clears the redo stack.
    pub fn push(&mut self, op: Operation) {
        self.undone.clear();
        self.record(op);
    }

    /// Move the newest applied operation onto the redo stack.
    pub fn undo(&mut self) -> Option<&Operation> {
        let op = self.applied.pop()?;
        self.undone.push(op);
        self.undone.last()
    }

    /// Take the next operation to redo. The caller applies it and hands it
    /// back through [`History::push_redone`].
    pub fn take_redo(&mut self) -> Option<Operation> {
        self.undone.pop()
    }

    /// Record a redone edit without touching the rest of the redo stack.
    pub fn push_redone(&mut self, op: Operation) {
        self.record(op);
    }

    fn record(&mut self, op: Operation) {
        if let Some(recording) = &mut self.recording {
            recording.operations.push(op.clone());
        }
        self.applied.push(op);
    }

    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.applied.last().map(Operation::description)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.undone.last().map(Operation::description)
    }

    /// Fold the undo stack over `original`.
    pub fn replay(&self, original: &PixelBuffer) -> PixelBuffer {
        self.applied
            .iter()
            .fold(original.clone(), |buffer, op| op.apply(buffer))
    }

    /// Start a fresh recording, dropping any recording in progress.
    pub fn start_recording(&mut self) {
        self.recording = Some(MacroRecording::default());
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn recording(&self) -> Option<&MacroRecording> {
        self.recording.as_ref()
    }

    pub fn stop_recording(&mut self) -> Option<MacroRecording> {
        self.recording.take()
    }
}
