//! Core geometric types
//!
//! Integer rectangles in real pixels, used for laying out the window. They
//! have no knowledge of Win32 or DPI; the platform layer converts.

/// Rectangle in real pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a new rectangle
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the right edge coordinate
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Returns the bottom edge coordinate
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Shrinks the rectangle by `amount` on every side, never below zero size
    pub fn inset(&self, amount: i32) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            (self.w - 2 * amount).max(0),
            (self.h - 2 * amount).max(0),
        )
    }

    /// Splits off a band of `height` pixels from the bottom
    ///
    /// Returns `(rest, band)`. The band is clamped to the available height.
    pub fn split_bottom(&self, height: i32) -> (Rect, Rect) {
        let height = height.clamp(0, self.h.max(0));
        let rest = Rect::new(self.x, self.y, self.w, self.h - height);
        let band = Rect::new(self.x, self.bottom() - height, self.w, height);
        (rest, band)
    }

    /// Splits off a column of `width` pixels from the left
    ///
    /// Returns `(column, rest)`. The column is clamped to the available width.
    pub fn split_left(&self, width: i32) -> (Rect, Rect) {
        let width = width.clamp(0, self.w.max(0));
        let column = Rect::new(self.x, self.y, width, self.h);
        let rest = Rect::new(self.x + width, self.y, self.w - width, self.h);
        (column, rest)
    }

    /// Splits off a column of `width` pixels from the right
    ///
    /// Returns `(rest, column)`. The column is clamped to the available width.
    pub fn split_right(&self, width: i32) -> (Rect, Rect) {
        let width = width.clamp(0, self.w.max(0));
        let rest = Rect::new(self.x, self.y, self.w - width, self.h);
        let column = Rect::new(self.right() - width, self.y, width, self.h);
        (rest, column)
    }
}
