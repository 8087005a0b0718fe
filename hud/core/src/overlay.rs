//! Special-character overlay.
//!
//! A picker shown beside the open console for glyphs that have no key:
//! a row of section tabs, then the active section's characters in a
//! grid. The Colours section is rebuilt from the live palette whenever a
//! code is defined or redefined, so server extensions show up too.

use crate::gfx::{FontKind, Gfx, Rect, Rgba, Texture};
use crate::palette::ColorPalette;

const SECTION_TITLES: [&str; 5] = ["Colours", "Math", "Lines", "Letters", "Other"];

const MATH_CHARS: &str = "±×÷≈≡√∞¹²³½¼°";
const LINE_CHARS: &str = "─│┌┐└┘├┤┬┴┼═║╔╗╚╝▀▄█▌▐░▒▓";
const LETTER_CHARS: &str = "ÀÁÂÄÅÆÇÈÉÊËÌÍÎÏÑÒÓÔÖØÙÚÛÜßàáâäåæçèéêëìíîïñòóôöøùúûüÿ";
const OTHER_CHARS: &str = "☺☻♥♦♣♠•○♂♀♪♫☼►◄↕‼¶§▬↨↑↓→←∟↔▲▼";

const PAD: i32 = 4;
const TITLE_GAP: i32 = 12;
const CELL_GAP: i32 = 2;
const GRID_COLS: usize = 16;

const BACKGROUND: Rgba = Rgba::new(0, 0, 0, 160);

/// What a click inside the overlay did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayAction {
    /// A tab or dead space was hit; the click is spent.
    Consumed,
    /// A character cell was hit; insert this text at the caret.
    Insert(String),
}

struct Entry {
    display: String,
    insert: String,
    texture: Option<Texture>,
    rect: Rect,
}

impl Entry {
    fn plain(ch: char) -> Self {
        Self {
            display: ch.to_string(),
            insert: ch.to_string(),
            texture: None,
            rect: Rect::default(),
        }
    }
}

struct Section {
    title: &'static str,
    title_texture: Option<Texture>,
    title_rect: Rect,
    entries: Vec<Entry>,
}

impl Section {
    fn new(title: &'static str, chars: &str) -> Self {
        Self {
            title,
            title_texture: None,
            title_rect: Rect::default(),
            entries: chars.chars().map(Entry::plain).collect(),
        }
    }
}

/// The overlay widget.
pub struct CharOverlay {
    open: bool,
    active: usize,
    sections: Vec<Section>,
    bounds: Rect,
}

impl CharOverlay {
    /// Creates the overlay with its static sections and an empty
    /// Colours section; call [`CharOverlay::set_palette`] to fill it.
    pub fn new() -> Self {
        Self {
            open: false,
            active: 0,
            sections: vec![
                Section::new(SECTION_TITLES[0], ""),
                Section::new(SECTION_TITLES[1], MATH_CHARS),
                Section::new(SECTION_TITLES[2], LINE_CHARS),
                Section::new(SECTION_TITLES[3], LETTER_CHARS),
                Section::new(SECTION_TITLES[4], OTHER_CHARS),
            ],
            bounds: Rect::default(),
        }
    }

    /// Whether the picker is currently shown.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Flips the picker open or closed.
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Closes the picker.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Rebuilds the Colours section from the live palette. Each cell
    /// shows the code character in its own colour and inserts the
    /// escape.
    pub fn set_palette(&mut self, palette: &ColorPalette) {
        self.sections[0].entries = palette
            .defined_codes()
            .map(|code| Entry {
                display: format!("&{code}{code}"),
                insert: format!("&{code}"),
                texture: None,
                rect: Rect::default(),
            })
            .collect();
    }

    /// Drops every cached texture; used on font change, colour change,
    /// and context loss.
    pub fn invalidate(&mut self) {
        for section in &mut self.sections {
            section.title_texture = None;
            for entry in &mut section.entries {
                entry.texture = None;
            }
        }
    }

    /// The overlay's rectangle from the last prepare.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Rasterises and lays out the overlay with its top-left at
    /// `(x, y)`. Does nothing while the context is lost.
    pub fn prepare<G: Gfx>(&mut self, gfx: &mut G, x: i32, y: i32) {
        if gfx.context_lost() {
            return;
        }
        let line_height = i32::from(gfx.line_height(FontKind::Chat));

        // Tab row.
        let mut tab_x = x + PAD;
        let tab_y = y + PAD;
        for (index, section) in self.sections.iter_mut().enumerate() {
            if section.title_texture.is_none() {
                let tone = if index == self.active { 'e' } else { '7' };
                let display = format!("&{tone}{}", section.title);
                section.title_texture = Some(gfx.make_text(&display, FontKind::Chat));
            }
            let texture = section.title_texture.unwrap_or(Texture {
                id: 0,
                size: crate::gfx::Size::default(),
            });
            section.title_rect = Rect::new(tab_x, tab_y, texture.width(), texture.height());
            tab_x += i32::from(texture.width()) + TITLE_GAP;
        }
        let tabs_width = tab_x - TITLE_GAP - x;

        // Grid of the active section.
        let section = &mut self.sections[self.active];
        for entry in &mut section.entries {
            if entry.texture.is_none() {
                entry.texture = Some(gfx.make_text(&entry.display, FontKind::Chat));
            }
        }
        let cell_width = section
            .entries
            .iter()
            .filter_map(|e| e.texture.as_ref())
            .map(|t| i32::from(t.width()))
            .max()
            .unwrap_or(0);

        let grid_y = tab_y + line_height + PAD;
        let mut grid_rows = 0;
        for (index, entry) in section.entries.iter_mut().enumerate() {
            let col = to_i32(index % GRID_COLS);
            let row = to_i32(index / GRID_COLS);
            grid_rows = grid_rows.max(row + 1);
            entry.rect = Rect::new(
                x + PAD + col * (cell_width + CELL_GAP),
                grid_y + row * (line_height + CELL_GAP),
                clamp_u16(cell_width),
                clamp_u16(line_height),
            );
        }

        let cols = to_i32(section.entries.len().min(GRID_COLS));
        let grid_width = (cols * (cell_width + CELL_GAP) - CELL_GAP).max(0);
        let width = tabs_width.max(grid_width) + PAD * 2;
        let height = (grid_y + grid_rows * (line_height + CELL_GAP)) - y + PAD;
        self.bounds = Rect::new(x, y, clamp_u16(width), clamp_u16(height));
    }

    /// Draws the backing quad, tabs, and the active section's grid.
    pub fn render<G: Gfx>(&self, gfx: &mut G) {
        gfx.fill_rect(self.bounds, BACKGROUND);
        for section in &self.sections {
            if let Some(texture) = &section.title_texture {
                gfx.draw_texture(texture, section.title_rect.x, section.title_rect.y);
            }
        }
        for entry in &self.sections[self.active].entries {
            if let Some(texture) = &entry.texture {
                gfx.draw_texture(texture, entry.rect.x, entry.rect.y);
            }
        }
    }

    /// Resolves a click. `None` means the click was outside the overlay
    /// and should fall through to whatever is underneath.
    pub fn click(&mut self, x: i32, y: i32) -> Option<OverlayAction> {
        if !self.open || !self.bounds.contains(x, y) {
            return None;
        }
        if let Some(index) = self
            .sections
            .iter()
            .position(|s| s.title_rect.contains(x, y))
        {
            if index != self.active {
                self.active = index;
                // Tab tones change with the selection.
                for section in &mut self.sections {
                    section.title_texture = None;
                }
            }
            return Some(OverlayAction::Consumed);
        }
        if let Some(entry) = self.sections[self.active]
            .entries
            .iter()
            .find(|e| e.rect.contains(x, y))
        {
            return Some(OverlayAction::Insert(entry.insert.clone()));
        }
        Some(OverlayAction::Consumed)
    }
}

impl Default for CharOverlay {
    fn default() -> Self {
        Self::new()
    }
}

fn to_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn clamp_u16(value: i32) -> u16 {
    u16::try_from(value.max(0)).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testgfx::FakeGfx;
    use pretty_assertions::assert_eq;

    fn prepared() -> (CharOverlay, FakeGfx) {
        let mut overlay = CharOverlay::new();
        overlay.set_palette(&ColorPalette::new());
        overlay.toggle();
        let mut gfx = FakeGfx::new();
        overlay.prepare(&mut gfx, 0, 0);
        (overlay, gfx)
    }

    #[test]
    fn test_toggle() {
        let mut overlay = CharOverlay::new();
        assert!(!overlay.is_open());
        overlay.toggle();
        assert!(overlay.is_open());
        overlay.close();
        assert!(!overlay.is_open());
    }

    #[test]
    fn test_colours_section_follows_palette() {
        let mut overlay = CharOverlay::new();
        let mut palette = ColorPalette::new();
        overlay.set_palette(&palette);
        assert_eq!(overlay.sections[0].entries.len(), 16);

        palette.define('z', Rgba::opaque(200, 10, 10));
        overlay.set_palette(&palette);
        assert_eq!(overlay.sections[0].entries.len(), 17);
        assert_eq!(overlay.sections[0].entries[16].insert, "&z");
    }

    #[test]
    fn test_click_on_colour_cell_inserts_escape() {
        let (mut overlay, _gfx) = prepared();
        let cell = overlay.sections[0].entries[0].rect;

        let action = overlay.click(cell.x + 1, cell.y + 1);
        assert_eq!(action, Some(OverlayAction::Insert("&0".to_string())));
    }

    #[test]
    fn test_click_on_tab_switches_section() {
        let (mut overlay, mut gfx) = prepared();
        let tab = overlay.sections[1].title_rect;

        let action = overlay.click(tab.x + 1, tab.y + 1);
        assert_eq!(action, Some(OverlayAction::Consumed));

        overlay.prepare(&mut gfx, 0, 0);
        let cell = overlay.sections[1].entries[0].rect;
        let action = overlay.click(cell.x + 1, cell.y + 1);
        assert_eq!(action, Some(OverlayAction::Insert("±".to_string())));
    }

    #[test]
    fn test_click_outside_falls_through() {
        let (mut overlay, _gfx) = prepared();
        let bounds = overlay.bounds();
        assert_eq!(
            overlay.click(bounds.x + i32::from(bounds.width) + 5, bounds.y),
            None
        );
    }

    #[test]
    fn test_click_while_closed_falls_through() {
        let (mut overlay, _gfx) = prepared();
        overlay.close();
        assert_eq!(overlay.click(1, 1), None);
    }

    #[test]
    fn test_prepare_while_lost_is_inert() {
        let mut overlay = CharOverlay::new();
        overlay.set_palette(&ColorPalette::new());
        let mut gfx = FakeGfx::new();
        gfx.lost = true;
        overlay.prepare(&mut gfx, 0, 0);
        assert!(gfx.made.is_empty());
        assert_eq!(overlay.bounds(), Rect::default());
    }
}
