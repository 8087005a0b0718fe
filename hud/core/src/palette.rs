//! Colour codes for chat text.
//!
//! Text carries inline colour escapes: `&` followed by a code character.
//! Codes `0`-`9` and `a`-`f` are the classic sixteen, derivable from the
//! code's bit pattern; servers may define further single-character codes
//! at runtime and may redefine the classics. An `&` followed by anything
//! undefined is plain text.

use crate::gfx::Rgba;

/// The sixteen classic code characters, in canonical order.
pub const CLASSIC_CODES: &str = "0123456789abcdef";

/// Colour of one classic code from its bit pattern.
///
/// Bits 0..2 select blue, green, and red at 75% intensity; bit 3 adds a
/// 25% white floor, which is what turns `4` maroon and `c` light red.
pub const fn classic_color(index: u8) -> Rgba {
    let floor = if index >= 8 { 64 } else { 0 };
    let r = floor + 191 * ((index >> 2) & 1);
    let g = floor + 191 * ((index >> 1) & 1);
    let b = floor + 191 * (index & 1);
    Rgba::opaque(r, g, b)
}

/// One parsed run of text in a single colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan<'a> {
    /// The code in force, or `None` before any escape.
    pub code: Option<char>,
    /// The visible characters of the run.
    pub text: &'a str,
}

/// The live colour table: classic codes plus server extensions.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // Indexed by ASCII value; non-ASCII codes are never defined.
    colors: [Option<Rgba>; 128],
}

impl ColorPalette {
    /// Creates a palette holding only the sixteen classic codes.
    pub fn new() -> Self {
        let mut colors = [None; 128];
        for (index, code) in CLASSIC_CODES.bytes().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let rgba = classic_color(index as u8);
            colors[code as usize] = Some(rgba);
        }
        Self { colors }
    }

    /// Looks up a code. Uppercase hex folds to lowercase.
    pub fn get(&self, code: char) -> Option<Rgba> {
        let code = Self::fold(code);
        if code.is_ascii() {
            self.colors[code as usize]
        } else {
            None
        }
    }

    /// Whether the code currently has a colour.
    pub fn is_defined(&self, code: char) -> bool {
        self.get(code).is_some()
    }

    /// Defines or redefines a code.
    ///
    /// Returns false and changes nothing for characters that can never be
    /// codes: non-ASCII, control characters, space, `&` and `%`.
    pub fn define(&mut self, code: char, color: Rgba) -> bool {
        let code = Self::fold(code);
        if !Self::definable(code) {
            return false;
        }
        self.colors[code as usize] = Some(color);
        true
    }

    /// Removes a code, restoring the classic colour for the classic
    /// sixteen and clearing extensions outright.
    pub fn undefine(&mut self, code: char) {
        let code = Self::fold(code);
        if !code.is_ascii() {
            return;
        }
        self.colors[code as usize] = CLASSIC_CODES
            .bytes()
            .position(|c| c == code as u8)
            .map(|index| {
                #[allow(clippy::cast_possible_truncation)]
                let rgba = classic_color(index as u8);
                rgba
            });
    }

    /// Every defined code, classics first, extensions in ASCII order.
    pub fn defined_codes(&self) -> impl Iterator<Item = char> + '_ {
        let classics = CLASSIC_CODES
            .chars()
            .filter(|&c| self.colors[c as usize].is_some());
        let extensions = (0u8..128)
            .map(char::from)
            .filter(|&c| !CLASSIC_CODES.contains(c))
            .filter(|&c| self.colors[c as usize].is_some());
        classics.chain(extensions)
    }

    /// Splits text into single-colour runs, consuming valid escapes.
    pub fn spans<'a>(&self, text: &'a str) -> Vec<TextSpan<'a>> {
        let mut spans = Vec::new();
        let mut code = None;
        let mut run_start = 0;
        let mut iter = text.char_indices().peekable();

        while let Some((at, ch)) = iter.next() {
            if ch != '&' {
                continue;
            }
            let Some(&(_, next)) = iter.peek() else {
                break;
            };
            if !self.is_defined(next) {
                continue;
            }
            if at > run_start {
                spans.push(TextSpan {
                    code,
                    text: &text[run_start..at],
                });
            }
            code = Some(Self::fold(next));
            iter.next();
            run_start = at + '&'.len_utf8() + next.len_utf8();
        }

        if run_start < text.len() {
            spans.push(TextSpan {
                code,
                text: &text[run_start..],
            });
        }
        spans
    }

    /// The text with every valid colour escape removed.
    pub fn strip(&self, text: &str) -> String {
        self.spans(text).iter().map(|span| span.text).collect()
    }

    fn fold(code: char) -> char {
        match code {
            'A'..='F' => code.to_ascii_lowercase(),
            _ => code,
        }
    }

    fn definable(code: char) -> bool {
        code.is_ascii_graphic() && code != '&' && code != '%'
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::new()
    }
}
