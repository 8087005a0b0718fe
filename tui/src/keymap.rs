//! Crossterm-to-core input translation.
//!
//! The coordinator speaks its own key model so it can sit under a GPU
//! client or a terminal alike; this module is the terminal side of that
//! seam. Terminals never deliver key releases, so the app synthesises a
//! release right after each press.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton as CtButton};

use hud_core::{Key, MouseButton};

/// Maps a crossterm key code onto the coordinator's key model.
pub fn translate_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Char(c) => Some(Key::Char(c.to_ascii_lowercase())),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Delete => Some(Key::Delete),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Home => Some(Key::Home),
        KeyCode::End => Some(Key::End),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::PageDown => Some(Key::PageDown),
        KeyCode::F(n) => Some(Key::F(n)),
        _ => None,
    }
}

/// The typed character carried by a key event, if any. Control chords
/// are commands, not text.
pub fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(c),
        _ => None,
    }
}

/// Maps a crossterm mouse button onto the coordinator's model.
pub fn translate_button(button: CtButton) -> MouseButton {
    match button {
        CtButton::Left => MouseButton::Left,
        CtButton::Right => MouseButton::Right,
        CtButton::Middle => MouseButton::Middle,
    }
}
