//! Key and mouse input model.
//!
//! The host translates its own input events (GLFW scancodes, crossterm
//! events) into these before handing them to the coordinator. Character
//! input arrives separately from key-downs, the way both backends
//! deliver it.

/// A non-character-specific view of a pressed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable key, identified by its lowercase character.
    Char(char),
    /// Main Enter.
    Enter,
    /// Enter on the keypad; submits like [`Key::Enter`].
    KeypadEnter,
    /// Escape.
    Escape,
    /// Backspace.
    Backspace,
    /// Forward delete.
    Delete,
    /// Tab.
    Tab,
    /// Cursor left.
    Left,
    /// Cursor right.
    Right,
    /// Cursor up.
    Up,
    /// Cursor down.
    Down,
    /// Home.
    Home,
    /// End.
    End,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// A function key, 1 to 35.
    F(u8),
}

impl Key {
    /// Whether this is a function key. Function keys pass through the
    /// open console so client-level binds keep working.
    pub fn is_function(&self) -> bool {
        matches!(self, Key::F(_))
    }
}

/// Mouse buttons the coordinator cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left button; the only one that interacts with chat.
    Left,
    /// Right button.
    Right,
    /// Wheel click.
    Middle,
}

/// The key binds the coordinator consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    /// Opens the console empty.
    pub open_chat: Key,
    /// Submits the typed line.
    pub send_chat: Key,
    /// Discards the typed line and closes.
    pub cancel: Key,
    /// Toggles the special-character overlay (acts on release).
    pub toggle_overlay: Key,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            open_chat: Key::Char('t'),
            send_chat: Key::Enter,
            cancel: Key::Escape,
            toggle_overlay: Key::Tab,
        }
    }
}
