//! Rotation and coordinate remapping
//!
//! A panel stores pixels in one fixed memory orientation; callers draw in
//! logical coordinates under a rotation setting 0..=7 (four orientations,
//! each optionally mirrored). The remap is three steps in a fixed order:
//! Y-mirror, X-mirror, then axis swap. Every primitive, from a single pixel
//! to a streamed run, goes through the same [`Transform`] so the mapping
//! cannot drift between code paths.

use glint_pixel::PixelCursor;

/// One of the eight rotation settings.
///
/// Bit 0 swaps the axes, bit 1 mirrors X; settings 1, 2, 4 and 7 mirror Y.
/// Settings 4..=7 are the mirrored counterparts of 0..=3.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rotation(u8);

impl Rotation {
    /// Wrap a raw setting, masking to the valid range.
    pub const fn new(r: u8) -> Self {
        Self(r & 7)
    }

    /// The raw setting, 0..=7.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Combine a user rotation with a panel's mounting offset.
    ///
    /// The quarter-turns add modulo 4; the mirror halves exclusive-or.
    pub const fn compose(self, offset: Rotation) -> Rotation {
        Rotation(((self.0 + offset.0) & 3) | ((self.0 & 4) ^ (offset.0 & 4)))
    }

    /// Whether logical X and Y trade places.
    pub const fn swaps_axes(self) -> bool {
        self.0 & 1 != 0
    }

    /// Whether logical X runs against memory X.
    pub const fn mirrors_x(self) -> bool {
        self.0 & 2 != 0
    }

    /// Whether logical Y runs against memory Y.
    pub const fn mirrors_y(self) -> bool {
        (1u16 << self.0) & 0b1001_0110 != 0
    }

    /// Identity mapping; every fast path keys off this.
    pub const fn is_identity(self) -> bool {
        self.0 == 0
    }
}

/// The remap from logical coordinates to memory coordinates for one
/// rotation setting on one panel geometry.
///
/// Width and height here are logical (post-rotation): odd settings swap the
/// panel's memory dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transform {
    rotation: Rotation,
    width: u32,
    height: u32,
}

impl Transform {
    /// Build the remap for `rotation` on a panel whose memory is
    /// `panel_width × panel_height`.
    pub const fn new(panel_width: u32, panel_height: u32, rotation: Rotation) -> Self {
        let (width, height) = if rotation.swaps_axes() {
            (panel_height, panel_width)
        } else {
            (panel_width, panel_height)
        };
        Self { rotation, width, height }
    }

    /// The rotation this transform applies.
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Logical width as the caller sees it.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Logical height as the caller sees it.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Map one logical pixel to memory coordinates.
    pub fn point_to_memory(&self, mut x: u32, mut y: u32) -> (u32, u32) {
        let r = self.rotation;
        if !r.is_identity() {
            if r.mirrors_y() {
                y = self.height - (y + 1);
            }
            if r.mirrors_x() {
                x = self.width - (x + 1);
            }
            if r.swaps_axes() {
                core::mem::swap(&mut x, &mut y);
            }
        }
        (x, y)
    }

    /// Map a logical rectangle to memory coordinates.
    pub fn rect_to_memory(&self, mut x: u32, mut y: u32, mut w: u32, mut h: u32) -> (u32, u32, u32, u32) {
        let r = self.rotation;
        if !r.is_identity() {
            if r.mirrors_y() {
                y = self.height - (y + h);
            }
            if r.mirrors_x() {
                x = self.width - (x + w);
            }
            if r.swaps_axes() {
                core::mem::swap(&mut x, &mut y);
                core::mem::swap(&mut w, &mut h);
            }
        }
        (x, y, w, h)
    }

    /// Map a logical rectangle while redirecting a cursor's stepping so the
    /// source is read in the order the memory rows will be written.
    ///
    /// `nextx`/`nexty` are the per-destination-row advance of the cursor
    /// (normally `0` and `1 << FP_SCALE`); mirrored settings pre-advance the
    /// position to the far edge and negate the step, swapped settings trade
    /// the row advance with the per-pixel step.
    pub fn rect_to_memory_with_cursor(
        &self,
        mut x: u32,
        mut y: u32,
        mut w: u32,
        mut h: u32,
        cur: &mut PixelCursor<'_>,
        nextx: &mut u32,
        nexty: &mut u32,
    ) -> (u32, u32, u32, u32) {
        let mut addx = cur.src_x32_add;
        let mut addy = cur.src_y32_add;
        let r = self.rotation;
        if r.mirrors_y() {
            cur.src_y32 = cur.src_y32.wrapping_add(nexty.wrapping_mul(h - 1));
            *nexty = nexty.wrapping_neg();
            y = self.height - (y + h);
        }
        if r.mirrors_x() {
            cur.src_x32 = cur.src_x32.wrapping_add(addx.wrapping_mul(w - 1));
            cur.src_y32 = cur.src_y32.wrapping_add(addy.wrapping_mul(w - 1));
            addx = addx.wrapping_neg();
            addy = addy.wrapping_neg();
            x = self.width - (x + w);
        }
        if r.swaps_axes() {
            core::mem::swap(&mut x, &mut y);
            core::mem::swap(&mut w, &mut h);
            core::mem::swap(nextx, &mut addx);
            core::mem::swap(nexty, &mut addy);
        }
        cur.src_x32_add = addx;
        cur.src_y32_add = addy;
        (x, y, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_pixel::ColorDepth;

    #[test]
    fn rotation_bit_tests() {
        assert!(!Rotation::new(0).mirrors_y());
        assert!(Rotation::new(1).mirrors_y());
        assert!(Rotation::new(2).mirrors_y());
        assert!(!Rotation::new(3).mirrors_y());
        assert!(Rotation::new(4).mirrors_y());
        assert!(Rotation::new(7).mirrors_y());
        assert!(Rotation::new(2).mirrors_x());
        assert!(Rotation::new(3).mirrors_x());
        assert!(!Rotation::new(4).mirrors_x());
        assert!(Rotation::new(1).swaps_axes());
        assert!(!Rotation::new(6).swaps_axes());
    }

    #[test]
    fn compose_adds_turns_and_xors_mirror() {
        let offset = Rotation::new(1);
        assert_eq!(Rotation::new(3).compose(offset), Rotation::new(0));
        assert_eq!(Rotation::new(0).compose(offset), Rotation::new(1));
        assert_eq!(Rotation::new(4).compose(Rotation::new(4)), Rotation::new(0));
        assert_eq!(Rotation::new(5).compose(Rotation::new(2)), Rotation::new(7));
    }

    #[test]
    fn odd_rotations_swap_logical_size() {
        let t = Transform::new(320, 240, Rotation::new(1));
        assert_eq!((t.width(), t.height()), (240, 320));
        let t = Transform::new(320, 240, Rotation::new(2));
        assert_eq!((t.width(), t.height()), (320, 240));
    }

    #[test]
    fn identity_maps_straight_through() {
        let t = Transform::new(320, 240, Rotation::new(0));
        assert_eq!(t.point_to_memory(5, 9), (5, 9));
        assert_eq!(t.rect_to_memory(5, 9, 10, 20), (5, 9, 10, 20));
    }

    #[test]
    fn rotation_three_on_240x320_logical() {
        // memory 320x240, rotated so callers see 240x320: swap + X-mirror
        let t = Transform::new(320, 240, Rotation::new(3));
        assert_eq!((t.width(), t.height()), (240, 320));
        assert_eq!(t.rect_to_memory(0, 0, 10, 20), (0, 230, 20, 10));
        assert_eq!(t.point_to_memory(0, 0), (0, 239));
        assert_eq!(t.point_to_memory(239, 319), (319, 0));
    }

    #[test]
    fn rotation_one_pre_advances_and_negates_row_step() {
        // swap + Y-mirror: rows walk the source backwards
        let t = Transform::new(320, 240, Rotation::new(1));
        let src = [0u8; 4];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Grayscale8,
            ColorDepth::Grayscale8,
            false,
            None,
            None,
        );
        let mut nextx: u32 = 0;
        let mut nexty: u32 = 1 << PixelCursor::FP_SCALE;
        let (x, y, w, h) = t.rect_to_memory_with_cursor(0, 0, 10, 20, &mut cur, &mut nextx, &mut nexty);
        assert_eq!((x, y, w, h), (300, 0, 20, 10));
        // source Y was advanced to the last row and the row step negated,
        // then swapped into the per-pixel step
        assert_eq!(cur.src_y32, 19 << PixelCursor::FP_SCALE);
        assert_eq!(cur.src_y32_add, (1u32 << PixelCursor::FP_SCALE).wrapping_neg());
        // per-pixel X step became the per-row step
        assert_eq!(nextx, 1 << PixelCursor::FP_SCALE);
        assert_eq!(nexty, 0);
        assert_eq!(cur.src_x32_add, 0);
    }

    #[test]
    fn every_rotation_is_a_bijection_on_points() {
        for r in 0..8 {
            let t = Transform::new(8, 4, Rotation::new(r));
            let mut seen = [[false; 8]; 4];
            for y in 0..t.height() {
                for x in 0..t.width() {
                    let (mx, my) = t.point_to_memory(x, y);
                    assert!(mx < 8 && my < 4, "r={r} ({x},{y}) -> ({mx},{my})");
                    assert!(!seen[my as usize][mx as usize], "r={r} collision");
                    seen[my as usize][mx as usize] = true;
                }
            }
        }
    }

    #[test]
    fn rect_and_point_transforms_agree_on_corners() {
        for r in 0..8 {
            let t = Transform::new(16, 12, Rotation::new(r));
            let (x, y, w, h) = (3, 2, 5, 4);
            let (rx, ry, rw, rh) = t.rect_to_memory(x, y, w, h);
            // every pixel of the logical rect lands inside the memory rect
            for ly in y..y + h {
                for lx in x..x + w {
                    let (mx, my) = t.point_to_memory(lx, ly);
                    assert!(
                        mx >= rx && mx < rx + rw && my >= ry && my < ry + rh,
                        "r={r} pixel ({lx},{ly}) -> ({mx},{my}) outside ({rx},{ry},{rw},{rh})"
                    );
                }
            }
        }
    }
}
