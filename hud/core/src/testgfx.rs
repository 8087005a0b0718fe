//! In-memory graphics double for unit tests.
//!
//! Fixed metrics: chat glyphs are 8x10, announcement glyphs 16x16, and
//! `&` plus a hex digit measures zero wide like a real colour escape.
//! Rasterisation and drawing panic while the context is lost, which is
//! the trait contract the coordinator must uphold.

use crate::gfx::{FontKind, Gfx, Rect, Rgba, Size, Texture};

pub(crate) struct FakeGfx {
    pub lost: bool,
    next_id: u32,
    pub made: Vec<(String, FontKind)>,
    pub draws: Vec<(u32, i32, i32)>,
    pub fills: Vec<(Rect, Rgba)>,
}

impl FakeGfx {
    pub fn new() -> Self {
        Self {
            lost: false,
            next_id: 0,
            made: Vec::new(),
            draws: Vec::new(),
            fills: Vec::new(),
        }
    }

    pub fn made_texts(&self) -> Vec<&str> {
        self.made.iter().map(|(text, _)| text.as_str()).collect()
    }

    fn glyph_width(font: FontKind) -> u16 {
        match font {
            FontKind::Chat => 8,
            FontKind::Announcement => 16,
        }
    }

    fn visible_chars(text: &str) -> u16 {
        let mut count: u16 = 0;
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '&' {
                if let Some(next) = chars.peek() {
                    if next.is_ascii_hexdigit() {
                        chars.next();
                        continue;
                    }
                }
            }
            count += 1;
        }
        count
    }
}

impl Gfx for FakeGfx {
    fn context_lost(&self) -> bool {
        self.lost
    }

    fn line_height(&self, font: FontKind) -> u16 {
        match font {
            FontKind::Chat => 10,
            FontKind::Announcement => 16,
        }
    }

    fn measure(&self, text: &str, font: FontKind) -> Size {
        Size::new(
            Self::visible_chars(text) * Self::glyph_width(font),
            self.line_height(font),
        )
    }

    fn make_text(&mut self, text: &str, font: FontKind) -> Texture {
        assert!(!self.lost, "make_text while context lost");
        self.next_id += 1;
        self.made.push((text.to_string(), font));
        Texture {
            id: self.next_id,
            size: self.measure(text, font),
        }
    }

    fn draw_texture(&mut self, texture: &Texture, x: i32, y: i32) {
        assert!(!self.lost, "draw_texture while context lost");
        self.draws.push((texture.id, x, y));
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        assert!(!self.lost, "fill_rect while context lost");
        self.fills.push((rect, color));
    }
}
