//! Surface-level checks of the terminal backend: the coordinator's
//! draw calls must land in the right cells, with the right styling,
//! once blitted into a ratatui frame.

use std::cell::RefCell;
use std::rc::Rc;

use ratatui::backend::TestBackend;
use ratatui::style::{Color, Modifier};
use ratatui::Terminal;

use cobble_tui::gfx::TermGfx;
use hud_core::{ColorPalette, FontKind, Gfx, Rect, Rgba};

fn rig() -> (TermGfx, Terminal<TestBackend>) {
    let palette = Rc::new(RefCell::new(ColorPalette::new()));
    let gfx = TermGfx::new(palette);
    let terminal = Terminal::new(TestBackend::new(40, 10)).expect("test terminal");
    (gfx, terminal)
}

fn row_text(terminal: &Terminal<TestBackend>, y: u16, x: std::ops::Range<u16>) -> String {
    let buffer = terminal.backend().buffer();
    x.map(|col| buffer.cell((col, y)).expect("cell").symbol().to_string())
        .collect()
}

#[test]
fn test_text_lands_where_drawn() {
    let (mut gfx, mut terminal) = rig();

    gfx.begin_frame();
    let texture = gfx.make_text("hello", FontKind::Chat);
    gfx.draw_texture(&texture, 2, 3);
    terminal.draw(|frame| gfx.blit(frame)).expect("draw");

    assert_eq!(row_text(&terminal, 3, 2..7), "hello");
    assert_eq!(row_text(&terminal, 3, 0..2), "  ");
}

#[test]
fn test_colour_escapes_colour_cells_without_occupying_them() {
    let (mut gfx, mut terminal) = rig();

    gfx.begin_frame();
    let texture = gfx.make_text("&chot", FontKind::Chat);
    assert_eq!(texture.width(), 3, "the escape is zero cells wide");
    gfx.draw_texture(&texture, 0, 0);
    terminal.draw(|frame| gfx.blit(frame)).expect("draw");

    assert_eq!(row_text(&terminal, 0, 0..3), "hot");
    let buffer = terminal.backend().buffer();
    let cell = buffer.cell((0u16, 0u16)).expect("cell");
    assert_eq!(cell.fg, Color::Rgb(255, 64, 64));
}

#[test]
fn test_backdrop_survives_under_glyphs() {
    let (mut gfx, mut terminal) = rig();

    gfx.begin_frame();
    gfx.fill_rect(Rect::new(0, 5, 10, 1), Rgba::new(0, 0, 0, 127));
    let texture = gfx.make_text("on top", FontKind::Chat);
    gfx.draw_texture(&texture, 1, 5);
    terminal.draw(|frame| gfx.blit(frame)).expect("draw");

    let buffer = terminal.backend().buffer();
    let under = buffer.cell((1u16, 5u16)).expect("cell");
    assert_eq!(under.symbol(), "o");
    assert_ne!(under.bg, Color::Reset, "the fill stays behind the glyph");
}

#[test]
fn test_announcement_renders_bold() {
    let (mut gfx, mut terminal) = rig();

    gfx.begin_frame();
    let texture = gfx.make_text("Welcome!", FontKind::Announcement);
    gfx.draw_texture(&texture, 0, 1);
    terminal.draw(|frame| gfx.blit(frame)).expect("draw");

    let buffer = terminal.backend().buffer();
    let cell = buffer.cell((0u16, 1u16)).expect("cell");
    assert!(cell.modifier.contains(Modifier::BOLD));
}

#[test]
fn test_lost_context_blits_nothing() {
    let (mut gfx, mut terminal) = rig();

    gfx.begin_frame();
    let texture = gfx.make_text("doomed", FontKind::Chat);
    gfx.draw_texture(&texture, 0, 0);
    gfx.set_lost(true);
    terminal.draw(|frame| gfx.blit(frame)).expect("draw");

    assert_eq!(row_text(&terminal, 0, 0..6), "      ");
}

#[test]
fn test_drawing_clips_to_the_frame() {
    let (mut gfx, mut terminal) = rig();

    gfx.begin_frame();
    let texture = gfx.make_text("edge", FontKind::Chat);
    gfx.draw_texture(&texture, 38, 0);
    gfx.draw_texture(&texture, -2, 2);
    gfx.fill_rect(Rect::new(-5, -5, 100, 100), Rgba::new(0, 0, 0, 127));
    terminal.draw(|frame| gfx.blit(frame)).expect("draw");

    assert_eq!(row_text(&terminal, 0, 38..40), "ed");
    assert_eq!(row_text(&terminal, 2, 0..2), "ge");
}
