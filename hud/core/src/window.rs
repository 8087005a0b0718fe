//! Fixed-capacity text windows.
//!
//! Every on-screen text area is a [`TextWindow`]: a column of slots, each
//! holding at most one line. Slot 0 is the newest line; whether that puts
//! it at the bottom (chat and its relatives) or the top (the status area)
//! is the window's growth direction.
//!
//! Slots keep their text across context loss and re-rasterise lazily in
//! [`TextWindow::prepare`], so text mutations are cheap and never touch
//! the graphics surface.

use crate::gfx::{anchored, Anchor, FontKind, Gfx, Rect, Size, Texture};

/// Which way slot indices stack visually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Slot 0 is the bottommost row; higher indices stack above it.
    Upward,
    /// Slot 0 is the topmost row; higher indices stack below it.
    Downward,
}

#[derive(Debug, Default)]
struct Slot {
    text: Option<String>,
    texture: Option<Texture>,
    rect: Rect,
    placeholder: bool,
}

/// A column of text slots anchored to a screen corner.
pub struct TextWindow {
    slots: Vec<Slot>,
    font: FontKind,
    grows: Growth,
    h_anchor: Anchor,
    v_anchor: Anchor,
    x_offset: i32,
    y_offset: i32,
    line_height: u16,
    bounds: Rect,
}

impl TextWindow {
    /// Creates a window of `capacity` empty slots. All slots start with
    /// placeholder spacing enabled.
    pub fn new(
        capacity: usize,
        font: FontKind,
        grows: Growth,
        h_anchor: Anchor,
        v_anchor: Anchor,
        x_offset: i32,
        y_offset: i32,
    ) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                placeholder: true,
                ..Slot::default()
            })
            .collect();
        Self {
            slots,
            font,
            grows,
            h_anchor,
            v_anchor,
            x_offset,
            y_offset,
            line_height: 0,
            bounds: Rect::default(),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Replaces one slot's text. Empty text clears the slot. The old
    /// texture is dropped either way and rebuilt on the next prepare.
    pub fn set_slot(&mut self, index: usize, text: &str) {
        let Some(slot) = self.slots.get_mut(index) else {
            debug_assert!(false, "slot {index} out of range");
            return;
        };
        slot.texture = None;
        slot.text = if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        };
    }

    /// Ring-shift: every line moves one visual row away from slot 0, the
    /// oldest falls off, and `text` lands in slot 0. Textures move with
    /// their lines, so nothing re-rasterises. Drops the text silently
    /// when capacity is zero.
    pub fn push_up(&mut self, text: &str) {
        if self.slots.is_empty() {
            return;
        }
        for i in (1..self.slots.len()).rev() {
            let (text, texture) = {
                let prev = &mut self.slots[i - 1];
                (prev.text.take(), prev.texture.take())
            };
            let slot = &mut self.slots[i];
            slot.text = text;
            slot.texture = texture;
        }
        self.set_slot(0, text);
    }

    /// Drops every texture, keeping every text. Used on font changes and
    /// context loss; lines re-rasterise on the next prepare.
    pub fn invalidate_all(&mut self) {
        for slot in &mut self.slots {
            slot.texture = None;
        }
    }

    /// Drops textures only for lines containing the colour escape
    /// `&<code>` exactly.
    pub fn invalidate_matching(&mut self, code: char) {
        let needle = format!("&{code}");
        for slot in &mut self.slots {
            if slot.text.as_deref().is_some_and(|t| t.contains(&needle)) {
                slot.texture = None;
            }
        }
    }

    /// Per-slot control of placeholder spacing: with it disabled, an
    /// empty slot contributes nothing to the layout extent.
    pub fn set_placeholder(&mut self, index: usize, enabled: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.placeholder = enabled;
        }
    }

    /// Sets the vertical offset used when anchoring, for stacking.
    pub fn set_y_offset(&mut self, y_offset: i32) {
        self.y_offset = y_offset;
    }

    /// The vertical offset currently used when anchoring.
    pub fn y_offset(&self) -> i32 {
        self.y_offset
    }

    /// Sum of the heights of slots that currently hold a texture.
    /// Placeholder rows contribute nothing.
    pub fn used_height(&self) -> u16 {
        self.slots
            .iter()
            .filter_map(|s| s.texture.as_ref())
            .map(Texture::height)
            .sum()
    }

    /// The window's layout rectangle from the last prepare/reposition.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Rasterises dirty slots (unless the context is lost) and lays the
    /// window out against the given screen size.
    pub fn prepare<G: Gfx>(&mut self, gfx: &mut G, screen: Size) {
        if !gfx.context_lost() {
            self.line_height = gfx.line_height(self.font);
            for slot in &mut self.slots {
                if slot.texture.is_none() {
                    if let Some(text) = &slot.text {
                        slot.texture = Some(gfx.make_text(text, self.font));
                    }
                }
            }
        }
        self.layout(screen);
    }

    /// Recomputes positions for a new screen size without touching any
    /// texture.
    pub fn reposition(&mut self, screen: Size) {
        self.layout(screen);
    }

    /// Draws every slot that holds a texture.
    pub fn render<G: Gfx>(&self, gfx: &mut G) {
        for slot in &self.slots {
            if let Some(texture) = &slot.texture {
                gfx.draw_texture(texture, slot.rect.x, slot.rect.y);
            }
        }
    }

    /// Draws a single slot, if it holds a texture. Lets the caller apply
    /// its own visibility rule per row.
    pub fn render_slot<G: Gfx>(&self, gfx: &mut G, index: usize) {
        if let Some(slot) = self.slots.get(index) {
            if let Some(texture) = &slot.texture {
                gfx.draw_texture(texture, slot.rect.x, slot.rect.y);
            }
        }
    }

    /// The text of one slot, if any.
    pub fn slot_text(&self, index: usize) -> Option<&str> {
        self.slots.get(index)?.text.as_deref()
    }

    /// The laid-out rectangle of one slot.
    pub fn slot_rect(&self, index: usize) -> Option<Rect> {
        self.slots.get(index).map(|s| s.rect)
    }

    /// The slot under a screen point, with its text. Only slots holding
    /// a texture are hit.
    pub fn line_at(&self, x: i32, y: i32) -> Option<(usize, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.texture.is_some())
            .find(|(_, s)| s.rect.contains(x, y))
            .and_then(|(i, s)| Some((i, s.text.as_deref()?)))
    }

    fn layout(&mut self, screen: Size) {
        let width = self
            .slots
            .iter()
            .filter_map(|s| s.texture.as_ref())
            .map(Texture::width)
            .max()
            .unwrap_or(0);
        let total: u16 = self
            .slots
            .iter()
            .map(|s| slot_extent(s, self.line_height))
            .sum();

        let x = anchored(self.h_anchor, self.x_offset, width, screen.width);
        let y = anchored(self.v_anchor, self.y_offset, total, screen.height);
        self.bounds = Rect::new(x, y, width, total);

        let mut cursor_y = y;
        let indices: Vec<usize> = match self.grows {
            Growth::Downward => (0..self.slots.len()).collect(),
            Growth::Upward => (0..self.slots.len()).rev().collect(),
        };
        for i in indices {
            let extent = slot_extent(&self.slots[i], self.line_height);
            let slot_width = self.slots[i].texture.as_ref().map_or(0, Texture::width);
            let sx = anchored(self.h_anchor, self.x_offset, slot_width, screen.width);
            self.slots[i].rect = Rect::new(sx, cursor_y, slot_width, extent);
            cursor_y += i32::from(extent);
        }
    }
}

fn slot_extent(slot: &Slot, line_height: u16) -> u16 {
    match &slot.texture {
        Some(texture) => texture.height(),
        None if slot.placeholder => line_height,
        None => 0,
    }
}
