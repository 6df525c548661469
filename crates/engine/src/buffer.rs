//! Append-only frame timeline for one stream session.

use std::sync::Arc;

use tv_common::{Frame, TrackedObject};

/// Ordered frames of the current session plus a read cursor.
///
/// Frames are only ever appended; nothing is removed short of a full
/// [`reset`](Self::reset). `cursor <= len()` always holds.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<Arc<Frame>>,
    cursor: usize,
    complete: bool,
    roster: Vec<TrackedObject>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame to the tail and return the new length.
    pub fn append(&mut self, frame: Frame) -> usize {
        self.frames.push(Arc::new(frame));
        self.frames.len()
    }

    /// The producer has nothing more for this session.
    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn peek(&self, index: usize) -> Option<Arc<Frame>> {
        self.frames.get(index).cloned()
    }

    /// Drop every frame and the roster, rewinding to an empty, incomplete
    /// buffer.
    pub fn reset(&mut self) {
        self.frames.clear();
        self.roster.clear();
        self.cursor = 0;
        self.complete = false;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the next frame to present.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Buffered frames not yet presented.
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn roster(&self) -> &[TrackedObject] {
        &self.roster
    }

    pub fn set_roster(&mut self, roster: Vec<TrackedObject>) {
        self.roster = roster;
    }

    /// Hand out the frame under the cursor and move past it.
    pub(crate) fn advance(&mut self) -> Option<(usize, Arc<Frame>)> {
        let index = self.cursor;
        let frame = self.frames.get(index)?.clone();
        self.cursor += 1;
        Some((index, frame))
    }

    pub(crate) fn rewind(&mut self) {
        self.cursor = 0;
    }
}
