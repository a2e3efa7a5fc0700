//! Dirty-region accumulator
//!
//! Every mutating panel operation folds the touched rectangle (in memory
//! coordinates) into one bounding box. A flush streams that box and resets
//! it; a failed flush leaves it intact so the next attempt retransmits the
//! same pixels.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// Bounding box of pixels modified since the last successful flush.
///
/// Empty is encoded as an inverted range, so growth is plain min/max with
/// no separate emptiness flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRegion {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl DirtyRegion {
    /// An empty region.
    pub const fn new() -> Self {
        Self {
            left: i32::MAX,
            top: i32::MAX,
            right: i32::MIN,
            bottom: i32::MIN,
        }
    }

    /// Whether nothing has been marked since the last reset.
    pub const fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    /// Fold one pixel in.
    pub fn mark_point(&mut self, x: i32, y: i32) {
        self.mark_rect(x, y, 1, 1);
    }

    /// Fold a `w × h` rectangle at `(x, y)` in. Zero-sized rectangles are
    /// ignored.
    pub fn mark_rect(&mut self, x: i32, y: i32, w: u32, h: u32) {
        if w == 0 || h == 0 {
            return;
        }
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x + w as i32 - 1);
        self.bottom = self.bottom.max(y + h as i32 - 1);
    }

    /// Fold another region in.
    pub fn merge(&mut self, other: &DirtyRegion) {
        if !other.is_empty() {
            self.left = self.left.min(other.left);
            self.top = self.top.min(other.top);
            self.right = self.right.max(other.right);
            self.bottom = self.bottom.max(other.bottom);
        }
    }

    /// The accumulated bounding box, or `None` when empty.
    pub fn to_rect(&self) -> Option<Rectangle> {
        if self.is_empty() {
            return None;
        }
        Some(Rectangle::new(
            Point::new(self.left, self.top),
            Size::new(
                (self.right - self.left + 1) as u32,
                (self.bottom - self.top + 1) as u32,
            ),
        ))
    }

    /// Forget everything marked so far.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The accumulated bounding box, resetting the region.
    pub fn take(&mut self) -> Option<Rectangle> {
        let rect = self.to_rect();
        self.reset();
        rect
    }
}

impl Default for DirtyRegion {
    fn default() -> Self {
        Self::new()
    }
}
