//! Terminal implementation of the core graphics trait.
//!
//! Surface units are terminal cells: a glyph is as wide as
//! unicode-width says, a text line is one row tall, and colour escapes
//! are zero wide. "Rasterising" text here means parsing it into
//! coloured runs once, capturing the palette state at that moment the
//! way a real texture captures pixels; the runs are painted into the
//! ratatui buffer at draw time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ratatui::layout::Position;
use ratatui::style::{Color, Modifier, Style};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;

use hud_core::{ColorPalette, FontKind, Gfx, Rect, Rgba, Size, Texture};

/// Foreground for text before any colour escape.
const DEFAULT_FG: Color = Color::White;

/// One colour run of a rasterised line.
struct Run {
    text: String,
    color: Color,
}

struct Raster {
    runs: Vec<Run>,
    font: FontKind,
}

enum Command {
    Draw { id: u32, x: i32, y: i32 },
    Fill { rect: Rect, color: Rgba },
}

/// A cell-based [`Gfx`] backend over a ratatui frame.
pub struct TermGfx {
    lost: bool,
    palette: Rc<RefCell<ColorPalette>>,
    next_id: u32,
    rasters: HashMap<u32, Raster>,
    commands: Vec<Command>,
}

impl TermGfx {
    pub fn new(palette: Rc<RefCell<ColorPalette>>) -> Self {
        Self {
            lost: false,
            palette,
            next_id: 0,
            rasters: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Flips the simulated context. Losing it drops every raster, which
    /// is exactly what happens to textures on a real device loss.
    pub fn set_lost(&mut self, lost: bool) {
        self.lost = lost;
        if lost {
            self.rasters.clear();
            self.commands.clear();
        }
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// Starts a fresh command list for the coming frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
    }

    /// Paints the recorded frame into the ratatui buffer, clipping
    /// whatever falls outside it.
    pub fn blit(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let buf = frame.buffer_mut();

        for command in &self.commands {
            match command {
                Command::Fill { rect, color } => {
                    let fill = fill_color(*color);
                    for row in rect.y..rect.y + i32::from(rect.height) {
                        for col in rect.x..rect.x + i32::from(rect.width) {
                            let (Ok(x), Ok(y)) = (u16::try_from(col), u16::try_from(row)) else {
                                continue;
                            };
                            if x >= area.width || y >= area.height {
                                continue;
                            }
                            if let Some(cell) = buf.cell_mut(Position::new(x, y)) {
                                cell.set_bg(fill);
                            }
                        }
                    }
                }
                Command::Draw { id, x, y } => {
                    let Some(raster) = self.rasters.get(id) else {
                        continue;
                    };
                    let Ok(y) = u16::try_from(*y) else { continue };
                    if y >= area.height {
                        continue;
                    }
                    let mut col = *x;
                    for run in &raster.runs {
                        let mut style = Style::default().fg(run.color);
                        if raster.font == FontKind::Announcement {
                            style = style.add_modifier(Modifier::BOLD);
                        }
                        for ch in run.text.chars() {
                            let width = i32::from(glyph_width(ch));
                            if let Ok(x) = u16::try_from(col) {
                                if x < area.width {
                                    if let Some(cell) = buf.cell_mut(Position::new(x, y)) {
                                        cell.set_symbol(ch.to_string().as_str());
                                        cell.set_style(style);
                                    }
                                    // Blank the continuation cell of a
                                    // double-width glyph.
                                    if width == 2 {
                                        if let Some(cell) =
                                            buf.cell_mut(Position::new(x + 1, y))
                                        {
                                            cell.set_symbol(" ");
                                        }
                                    }
                                }
                            }
                            col += width;
                        }
                    }
                }
            }
        }
    }

    fn visible_width(&self, text: &str) -> u16 {
        let palette = self.palette.borrow();
        palette
            .spans(text)
            .iter()
            .flat_map(|span| span.text.chars())
            .map(glyph_width)
            .sum()
    }
}

impl Gfx for TermGfx {
    fn context_lost(&self) -> bool {
        self.lost
    }

    fn line_height(&self, _font: FontKind) -> u16 {
        1
    }

    fn measure(&self, text: &str, font: FontKind) -> Size {
        Size::new(self.visible_width(text), self.line_height(font))
    }

    fn make_text(&mut self, text: &str, font: FontKind) -> Texture {
        debug_assert!(!self.lost, "rasterised while the context was lost");
        let size = self.measure(text, font);

        let palette = self.palette.borrow();
        let runs = palette
            .spans(text)
            .iter()
            .map(|span| Run {
                text: span.text.to_string(),
                color: span
                    .code
                    .and_then(|code| palette.get(code))
                    .map_or(DEFAULT_FG, |rgba| Color::Rgb(rgba.r, rgba.g, rgba.b)),
            })
            .collect();
        drop(palette);

        self.next_id += 1;
        self.rasters.insert(self.next_id, Raster { runs, font });
        Texture {
            id: self.next_id,
            size,
        }
    }

    fn draw_texture(&mut self, texture: &Texture, x: i32, y: i32) {
        debug_assert!(!self.lost, "drew while the context was lost");
        self.commands.push(Command::Draw {
            id: texture.id,
            x,
            y,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        debug_assert!(!self.lost, "filled while the context was lost");
        self.commands.push(Command::Fill { rect, color });
    }
}

fn glyph_width(ch: char) -> u16 {
    u16::try_from(ch.width().unwrap_or(1)).unwrap_or(1)
}

/// Cells cannot blend, so translucent fills lift toward gray instead.
fn fill_color(color: Rgba) -> Color {
    if color.a == 255 {
        Color::Rgb(color.r, color.g, color.b)
    } else {
        Color::Rgb(color.r / 2 + 24, color.g / 2 + 24, color.b / 2 + 24)
    }
}
