#![forbid(unsafe_code)]

//! Screen and frame geometry.
//!
//! Uses terminal coordinates (0-indexed, origin at top-left; the ANSI wire
//! layer converts to the terminal's 1-indexed form).

/// Negotiated terminal size in character cells.
///
/// Starts at the conventional 24x80 and changes only through the
/// cursor-position-report round trip driven by the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    /// Rows (height).
    pub rows: u16,
    /// Columns (width).
    pub cols: u16,
}

impl ScreenSize {
    /// The size assumed before any negotiation completes.
    pub const DEFAULT: ScreenSize = ScreenSize { rows: 24, cols: 80 };

    /// Create a screen size.
    #[inline]
    #[must_use]
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A frame rectangle in screen cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Top edge (inclusive).
    pub row: u16,
    /// Left edge (inclusive).
    pub col: u16,
    /// Height in cells.
    pub height: u16,
    /// Width in cells.
    pub width: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(row: u16, col: u16, height: u16, width: u16) -> Self {
        Self {
            row,
            col,
            height,
            width,
        }
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u16 {
        self.row.saturating_add(self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u16 {
        self.col.saturating_add(self.width)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }
}

/// One of the nine frame placements within the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Centered both ways.
    #[default]
    Center,
    /// Top edge, centered horizontally.
    Top,
    /// Top-right corner.
    TopRight,
    /// Right edge, centered vertically.
    Right,
    /// Bottom-right corner.
    BottomRight,
    /// Bottom edge, centered horizontally.
    Bottom,
    /// Bottom-left corner.
    BottomLeft,
    /// Left edge, centered vertically.
    Left,
    /// Top-left corner.
    TopLeft,
}

impl Anchor {
    /// Place a frame of the given size on the screen.
    ///
    /// The size is clamped to the screen first, so the result always lies
    /// within it.
    #[must_use]
    pub fn place(self, height: u16, width: u16, screen: ScreenSize) -> Rect {
        let height = height.min(screen.rows);
        let width = width.min(screen.cols);
        let row = match self {
            Anchor::Top | Anchor::TopRight | Anchor::TopLeft => 0,
            Anchor::Bottom | Anchor::BottomRight | Anchor::BottomLeft => screen.rows - height,
            Anchor::Center | Anchor::Left | Anchor::Right => (screen.rows - height) / 2,
        };
        let col = match self {
            Anchor::Left | Anchor::TopLeft | Anchor::BottomLeft => 0,
            Anchor::Right | Anchor::TopRight | Anchor::BottomRight => screen.cols - width,
            Anchor::Center | Anchor::Top | Anchor::Bottom => (screen.cols - width) / 2,
        };
        Rect::new(row, col, height, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_placement_on_default_screen() {
        let r = Anchor::Center.place(7, 40, ScreenSize::DEFAULT);
        assert_eq!(r, Rect::new(8, 20, 7, 40));
    }

    #[test]
    fn corner_placements() {
        let screen = ScreenSize::new(24, 80);
        assert_eq!(Anchor::TopLeft.place(5, 10, screen), Rect::new(0, 0, 5, 10));
        assert_eq!(Anchor::TopRight.place(5, 10, screen), Rect::new(0, 70, 5, 10));
        assert_eq!(Anchor::BottomLeft.place(5, 10, screen), Rect::new(19, 0, 5, 10));
        assert_eq!(
            Anchor::BottomRight.place(5, 10, screen),
            Rect::new(19, 70, 5, 10)
        );
    }

    #[test]
    fn edge_placements_center_the_other_axis() {
        let screen = ScreenSize::new(24, 80);
        assert_eq!(Anchor::Top.place(5, 10, screen), Rect::new(0, 35, 5, 10));
        assert_eq!(Anchor::Bottom.place(5, 10, screen), Rect::new(19, 35, 5, 10));
        assert_eq!(Anchor::Left.place(5, 10, screen), Rect::new(9, 0, 5, 10));
        assert_eq!(Anchor::Right.place(5, 10, screen), Rect::new(9, 70, 5, 10));
    }

    #[test]
    fn oversized_frames_clamp_to_screen() {
        let screen = ScreenSize::new(24, 80);
        let r = Anchor::Center.place(100, 200, screen);
        assert_eq!(r, Rect::new(0, 0, 24, 80));
        assert_eq!(r.bottom(), 24);
        assert_eq!(r.right(), 80);
    }
}
