//! Scroll position over the persistent chat log.
//!
//! The cursor is the log index of the topmost visible line in the chat
//! window. Its legal range is `min(0, count - capacity) ..= count -
//! capacity`: with a full log the window slides, with a short log the
//! cursor sits below zero and the missing indices simply render nothing,
//! keeping the newest line glued to the bottom row either way.

/// Scroll cursor for a window of fixed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCursor {
    offset: i32,
    capacity: usize,
}

impl ScrollCursor {
    /// Creates a cursor pinned to the tail of an empty log.
    pub fn new(capacity: usize) -> Self {
        Self {
            offset: -to_i32(capacity),
            capacity,
        }
    }

    /// The window capacity this cursor clamps against.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Log index of the topmost visible line. May be negative while the
    /// log holds fewer lines than the window.
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// The pinned-to-newest position for a log of `count` lines.
    pub fn tail(&self, count: usize) -> i32 {
        to_i32(count) - to_i32(self.capacity)
    }

    /// Whether the cursor sits at the tail for a log of `count` lines.
    pub fn is_pinned(&self, count: usize) -> bool {
        self.offset == self.tail(count)
    }

    /// Constrains the cursor to the legal range for `count` lines.
    pub fn clamp(&mut self, count: usize) {
        let max = self.tail(count);
        let min = max.min(0);
        self.offset = self.offset.clamp(min, max);
    }

    /// Moves the cursor by `delta` lines, clamped. Returns whether the
    /// clamped position actually changed, so callers can skip a refill
    /// on a no-op scroll.
    pub fn scroll_by(&mut self, delta: i32, count: usize) -> bool {
        let before = self.offset;
        self.offset = self.offset.saturating_add(delta);
        self.clamp(count);
        self.offset != before
    }

    /// Snaps the cursor to the tail. Returns whether it moved.
    pub fn jump_to_tail(&mut self, count: usize) -> bool {
        let before = self.offset;
        self.offset = self.tail(count);
        self.offset != before
    }

    /// Advances by one line after an append that found the cursor
    /// pinned, keeping it pinned to the new tail.
    pub fn advance(&mut self) {
        self.offset += 1;
    }
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
