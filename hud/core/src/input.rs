//! The chat input buffer.
//!
//! Holds the text being typed, the caret, and the history of sent lines.
//! Long input wraps into fixed 64-character rows, the classic protocol
//! line width, up to three rows; layout and the caret position both fall
//! out of that chunking, so no measurement is needed to edit.

use std::mem;

use crate::gfx::{FontKind, Gfx, Rgba, Texture};

/// Hard cap on typed characters: three protocol lines.
pub const MAX_INPUT_CHARS: usize = CHARS_PER_ROW * 3;

/// Characters per visual row, the classic protocol line width.
pub const CHARS_PER_ROW: usize = 64;

/// Sent lines remembered for Up/Down recall.
const MAX_HISTORY: usize = 64;

const CARET_COLOR: Rgba = Rgba::new(255, 255, 255, 180);

/// The console's edit state.
pub struct InputLine {
    buffer: String,
    caret: usize,
    history: Vec<String>,
    browse: Option<usize>,
    stash: String,
    textures: Vec<Texture>,
}

impl InputLine {
    /// Creates an empty buffer with empty history.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            caret: 0,
            history: Vec::new(),
            browse: None,
            stash: String::new(),
            textures: Vec::new(),
        }
    }

    /// The full typed text.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Whether nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Caret position as a character index.
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Replaces the whole buffer, truncating to the cap, caret at the
    /// end. Ends any history browse.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.chars().take(MAX_INPUT_CHARS).collect();
        self.caret = self.char_len();
        self.browse = None;
        self.dirty();
    }

    /// Discards the buffer.
    pub fn clear(&mut self) {
        self.set_text("");
    }

    /// Inserts one character at the caret. Returns false at the cap.
    pub fn insert_char(&mut self, ch: char) -> bool {
        if self.char_len() >= MAX_INPUT_CHARS {
            return false;
        }
        let at = self.byte_at(self.caret);
        self.buffer.insert(at, ch);
        self.caret += 1;
        self.dirty();
        true
    }

    /// Inserts text at the caret, stopping silently at the cap.
    pub fn append(&mut self, text: &str) {
        for ch in text.chars() {
            if !self.insert_char(ch) {
                break;
            }
        }
    }

    /// Removes the character before the caret.
    pub fn backspace(&mut self) {
        if self.caret == 0 {
            return;
        }
        let at = self.byte_at(self.caret - 1);
        self.buffer.remove(at);
        self.caret -= 1;
        self.dirty();
    }

    /// Removes the character under the caret.
    pub fn delete(&mut self) {
        if self.caret >= self.char_len() {
            return;
        }
        let at = self.byte_at(self.caret);
        self.buffer.remove(at);
        self.dirty();
    }

    /// Moves the caret one character left.
    pub fn move_left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    /// Moves the caret one character right.
    pub fn move_right(&mut self) {
        self.caret = (self.caret + 1).min(self.char_len());
    }

    /// Moves the caret to the start of the buffer.
    pub fn move_home(&mut self) {
        self.caret = 0;
    }

    /// Moves the caret past the last character.
    pub fn move_end(&mut self) {
        self.caret = self.char_len();
    }

    /// Places the caret at a character index, clamped.
    pub fn set_caret(&mut self, index: usize) {
        self.caret = index.min(self.char_len());
    }

    /// Steps back through sent history. The first step stashes the
    /// partially typed line so it can come back.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let target = match self.browse {
            None => {
                self.stash = self.buffer.clone();
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.browse = Some(target);
        self.load(self.history[target].clone());
    }

    /// Steps forward through history; past the newest entry, restores
    /// the stashed line.
    pub fn history_next(&mut self) {
        match self.browse {
            None => {}
            Some(i) if i + 1 < self.history.len() => {
                self.browse = Some(i + 1);
                self.load(self.history[i + 1].clone());
            }
            Some(_) => {
                self.browse = None;
                let stash = mem::take(&mut self.stash);
                self.load(stash);
            }
        }
    }

    /// Takes the buffer for submission, recording it in history (unless
    /// empty or identical to the previous entry) and resetting the edit
    /// state.
    pub fn take_submit(&mut self) -> String {
        let text = mem::take(&mut self.buffer);
        if !text.is_empty() && self.history.last() != Some(&text) {
            self.history.push(text.clone());
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
        self.caret = 0;
        self.browse = None;
        self.stash.clear();
        self.dirty();
        text
    }

    /// The buffer split into protocol-width rows. Always at least one
    /// row, so an empty console still has a line to draw the caret on.
    pub fn rows(&self) -> Vec<&str> {
        let mut rows = Vec::new();
        let mut rest = self.buffer.as_str();
        loop {
            let cut = rest
                .char_indices()
                .nth(CHARS_PER_ROW)
                .map_or(rest.len(), |(at, _)| at);
            rows.push(&rest[..cut]);
            rest = &rest[cut..];
            if rest.is_empty() {
                break;
            }
        }
        rows
    }

    /// The caret's visual row and column under protocol-width wrapping.
    /// A caret exactly at the end of a full row sits at the start of the
    /// next one, which may be one past the last textured row.
    pub fn caret_row_col(&self) -> (usize, usize) {
        (self.caret / CHARS_PER_ROW, self.caret % CHARS_PER_ROW)
    }

    /// Layout height in rows (the caret row counts even when empty).
    pub fn row_count(&self) -> usize {
        self.rows().len().max(self.caret / CHARS_PER_ROW + 1)
    }

    /// Drops cached textures so the next prepare re-rasterises.
    pub fn invalidate(&mut self) {
        self.textures.clear();
    }

    /// Rasterises one texture per row if needed. Skipped while lost.
    pub fn prepare<G: Gfx>(&mut self, gfx: &mut G) {
        if gfx.context_lost() || !self.textures.is_empty() {
            return;
        }
        self.textures = self
            .rows()
            .iter()
            .map(|row| gfx.make_text(row, FontKind::Chat))
            .collect();
    }

    /// Draws the rows top-down from `(x, y)` plus the caret block.
    pub fn render<G: Gfx>(&self, gfx: &mut G, x: i32, y: i32) {
        let line_height = gfx.line_height(FontKind::Chat);
        for (row, texture) in self.textures.iter().enumerate() {
            let row_y = y + i32::from(line_height) * to_i32(row);
            gfx.draw_texture(texture, x, row_y);
        }

        let (caret_row, caret_col) = self.caret_row_col();
        let prefix: String = self
            .rows()
            .get(caret_row)
            .map_or(String::new(), |row| row.chars().take(caret_col).collect());
        let caret_x = x + i32::from(gfx.measure(&prefix, FontKind::Chat).width);
        let caret_y = y + i32::from(line_height) * to_i32(caret_row);
        let caret_w = gfx.measure("_", FontKind::Chat).width.max(1);
        gfx.fill_rect(
            crate::gfx::Rect::new(caret_x, caret_y, caret_w, line_height),
            CARET_COLOR,
        );
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_at(&self, char_index: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_index)
            .map_or(self.buffer.len(), |(at, _)| at)
    }

    fn load(&mut self, text: String) {
        self.buffer = text;
        self.caret = self.char_len();
        self.dirty();
    }

    fn dirty(&mut self) {
        self.textures.clear();
    }
}

impl Default for InputLine {
    fn default() -> Self {
        Self::new()
    }
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
