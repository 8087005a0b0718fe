//! Graphics collaborator surface.
//!
//! The coordinator never draws directly. It measures and rasterises text
//! through the [`Gfx`] trait and keeps the opaque [`Texture`] handles it
//! gets back. The real client binds this to its GL context; the terminal
//! preview binds it to styled cell rows.
//!
//! # Design
//!
//! Texture handles have no explicit free. When the underlying context is
//! lost every handle dies with it, so owners drop their `Texture` values
//! and re-rasterise once the context returns. A backend that can free
//! textures eagerly may do so by tracking live handles itself.

// ===== Geometry =====

/// Width and height of a measured or rasterised region, in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    /// Horizontal extent.
    pub width: u16,
    /// Vertical extent.
    pub height: u16,
}

impl Size {
    /// Creates a size from explicit extents.
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned screen rectangle in surface units.
///
/// Positions are signed: widgets anchored near an edge can sit partly
/// off-screen while a window is very small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Horizontal extent.
    pub width: u16,
    /// Vertical extent.
    pub height: u16,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and extents.
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the point lies inside the rectangle.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + i32::from(self.width)
            && y < self.y + i32::from(self.height)
    }

    /// The rectangle grown by `pad` units on every side.
    pub fn expanded(&self, pad: u16) -> Rect {
        Rect {
            x: self.x - i32::from(pad),
            y: self.y - i32::from(pad),
            width: self.width + pad * 2,
            height: self.height + pad * 2,
        }
    }
}

/// Where a widget sits along one axis of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Measured from the near edge (left or top).
    Min,
    /// Centred on the axis.
    Centre,
    /// Measured back from the far edge (right or bottom).
    Max,
}

/// Resolves an anchored position along one axis.
///
/// `offset` is the distance from the anchor point, `span` the widget
/// extent, `extent` the screen extent on that axis.
pub fn anchored(anchor: Anchor, offset: i32, span: u16, extent: u16) -> i32 {
    match anchor {
        Anchor::Min => offset,
        Anchor::Centre => (i32::from(extent) - i32::from(span)) / 2 + offset,
        Anchor::Max => i32::from(extent) - i32::from(span) - offset,
    }
}

/// An RGBA colour, straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
    /// Alpha, 255 = opaque.
    pub a: u8,
}

impl Rgba {
    /// Creates a colour with explicit alpha.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a fully opaque colour.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

// ===== Textures =====

/// Opaque handle to a piece of rasterised text owned by the backend.
///
/// The id means nothing to the coordinator; only the recorded size is
/// read back, for layout. Handles from before a context loss must not be
/// drawn again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    /// Backend-assigned handle.
    pub id: u32,
    /// Size recorded at rasterisation time.
    pub size: Size,
}

impl Texture {
    /// Horizontal extent of the rasterised text.
    pub fn width(&self) -> u16 {
        self.size.width
    }

    /// Vertical extent of the rasterised text.
    pub fn height(&self) -> u16 {
        self.size.height
    }
}

/// Which logical font a piece of text rasterises with.
///
/// Font identity (face, point size, bitmap vs vector) belongs to the
/// backend. The coordinator only distinguishes the two roles it lays out
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Regular chat, status, and input text.
    Chat,
    /// The large centred announcement line.
    Announcement,
}

// ===== Collaborator trait =====

/// The drawing surface the coordinator renders through.
///
/// Measurement and rasterisation must agree, and both must treat colour
/// escapes (`&` followed by a defined code) as zero-width. All calls are
/// forbidden while [`Gfx::context_lost`] reports true; the coordinator
/// upholds that, and backends may panic on violation in debug builds.
pub trait Gfx {
    /// Whether the underlying context is currently lost.
    fn context_lost(&self) -> bool;

    /// Height of one text line in the given font.
    fn line_height(&self, font: FontKind) -> u16;

    /// Measures text without rasterising it.
    fn measure(&self, text: &str, font: FontKind) -> Size;

    /// Rasterises text into a texture.
    fn make_text(&mut self, text: &str, font: FontKind) -> Texture;

    /// Draws a texture at a screen position.
    fn draw_texture(&mut self, texture: &Texture, x: i32, y: i32);

    /// Fills a rectangle with a translucent colour.
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rect_contains_edges() {
        let r = Rect::new(10, 20, 5, 3);
        assert!(r.contains(10, 20));
        assert!(r.contains(14, 22));
        assert!(!r.contains(15, 22));
        assert!(!r.contains(14, 23));
        assert!(!r.contains(9, 20));
    }

    #[test]
    fn test_rect_expanded() {
        let r = Rect::new(10, 10, 4, 4).expanded(2);
        assert_eq!(r, Rect::new(8, 8, 8, 8));
    }

    #[test]
    fn test_anchored_min_is_plain_offset() {
        assert_eq!(anchored(Anchor::Min, 5, 40, 100), 5);
    }

    #[test]
    fn test_anchored_max_measures_back_from_far_edge() {
        assert_eq!(anchored(Anchor::Max, 5, 40, 100), 55);
    }

    #[test]
    fn test_anchored_centre() {
        assert_eq!(anchored(Anchor::Centre, 0, 40, 100), 30);
        assert_eq!(anchored(Anchor::Centre, -10, 40, 100), 20);
    }

    #[test]
    fn test_anchored_span_wider_than_screen_goes_negative() {
        assert_eq!(anchored(Anchor::Max, 0, 120, 100), -20);
        assert_eq!(anchored(Anchor::Centre, 0, 120, 100), -10);
    }
}
