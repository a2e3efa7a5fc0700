//! Pixel cursor: the unit of work of the copy engine
//!
//! A [`PixelCursor`] borrows a source pixel buffer (and optionally a
//! palette), carries a 16.16 fixed-point read position and per-pixel step,
//! and exposes two bound operations:
//!
//! - `copy(dst, first, last)` converts source pixels into `dst[first..last]`
//!   and returns the index reached — `last`, or the first index whose source
//!   pixel equals the transparent key;
//! - `skip(first, last)` advances past transparent source pixels and returns
//!   the first index whose pixel is opaque.
//!
//! Callers alternate the two to blit masked sprites without touching the
//! destination under transparent runs. The concrete loop for each
//! (source, destination) encoding pair is chosen once at construction and
//! monomorphized, so the per-pixel path never branches on encodings.
//!
//! The cursor borrows everything and owns nothing; it lives for one draw
//! call. Rectangles must lie inside the declared source extent — indexing is
//! checked, so a violated precondition panics instead of reading a
//! neighbouring allocation.

use crate::color::{
    Argb8888, Bgr666, Bgr888, Bgra8888, CanonicalColor, Gray8, RawPixel, Rgb332, Rgb565, Rgb888,
    Swap565,
};
use crate::color::convert_raw;
use crate::depth::ColorDepth;
use crate::packed::{PackedRow, PackedRowMut};

type CopyFn = for<'c, 's, 'd> fn(&'c mut PixelCursor<'s>, &'d mut [u8], u32, u32) -> u32;
type SkipFn = for<'c, 's> fn(&'c mut PixelCursor<'s>, u32, u32) -> u32;

/// Copy-engine cursor over a borrowed source buffer.
///
/// Position fields are public: the panel transform layer rewrites them when
/// a rotation turns a left-to-right read into a right-to-left one.
pub struct PixelCursor<'a> {
    /// Source X position, 16.16 fixed point.
    pub src_x32: u32,
    /// Source Y position, 16.16 fixed point.
    pub src_y32: u32,
    /// Footprint end X (box filter only), 16.16 fixed point.
    pub src_xe32: u32,
    /// Footprint end Y (box filter only), 16.16 fixed point.
    pub src_ye32: u32,
    /// Per-destination-pixel X step, 16.16 fixed point (wrapping; negative
    /// steps are two's-complement).
    pub src_x32_add: u32,
    /// Per-destination-pixel Y step, 16.16 fixed point.
    pub src_y32_add: u32,
    /// Source row stride in pixels. May exceed the rectangle being read.
    pub src_stride: u32,
    /// Declared source width in pixels (box filter bounds).
    pub src_width: u32,
    /// Declared source height in pixels (box filter bounds).
    pub src_height: u32,
    /// Transparent key in source raw encoding, or [`Self::NON_TRANSP`].
    pub transp: u32,
    /// Source encoding.
    pub src_depth: ColorDepth,
    /// Destination encoding.
    pub dst_depth: ColorDepth,
    /// Foreground for grayscale-source expansion (`0xRRGGBB`).
    pub fore_rgb888: u32,
    /// Background for grayscale-source expansion (`0xRRGGBB`).
    pub back_rgb888: u32,
    /// Source and destination encodings are identical.
    pub no_convert: bool,
    src_data: &'a [u8],
    palette: Option<&'a [CanonicalColor]>,
    copy_fn: CopyFn,
    skip_fn: SkipFn,
}

impl<'a> PixelCursor<'a> {
    /// Fixed-point fraction bits of the position/step fields.
    pub const FP_SCALE: u32 = 16;
    /// Sentinel meaning "no transparent key" (outside any 24-bit raw).
    pub const NON_TRANSP: u32 = 1 << 24;

    /// Build a cursor for `src_depth` → `dst_depth`.
    ///
    /// `dst_palette` marks an indexed destination of `dst_depth.bits()`
    /// width: raws are then copied as indices, without color math.
    /// `transparent` is compared against raw source values before any
    /// conversion, so it must be expressed in the source encoding.
    pub fn new(
        src_data: &'a [u8],
        dst_depth: ColorDepth,
        src_depth: ColorDepth,
        dst_palette: bool,
        palette: Option<&'a [CanonicalColor]>,
        transparent: Option<u32>,
    ) -> Self {
        let (copy_fn, skip_fn) = select_fns(dst_depth, src_depth, dst_palette, palette.is_some());
        Self {
            src_x32: 0,
            src_y32: 0,
            src_xe32: 0,
            src_ye32: 0,
            src_x32_add: 1 << Self::FP_SCALE,
            src_y32_add: 0,
            src_stride: 0,
            src_width: 0,
            src_height: 0,
            transp: transparent.unwrap_or(Self::NON_TRANSP),
            src_depth,
            dst_depth,
            fore_rgb888: 0xFF_FFFF,
            back_rgb888: 0,
            no_convert: src_depth == dst_depth,
            src_data,
            palette,
            copy_fn,
            skip_fn,
        }
    }

    /// Build a box-filter (antialiased) cursor. Output is always
    /// [`Argb8888`]; the footprint per destination pixel spans the current
    /// position to the end position, weighted `256 - frac` at the edges and
    /// 256 internally. A footprint with zero accumulated opacity writes
    /// transparent black.
    pub fn new_antialias(
        src_data: &'a [u8],
        src_depth: ColorDepth,
        palette: Option<&'a [CanonicalColor]>,
        transparent: Option<u32>,
    ) -> Self {
        let mut cur = Self::new(src_data, ColorDepth::Argb8888, src_depth, false, palette, transparent);
        cur.copy_fn = if src_depth.has_palette() || src_depth.is_sub_byte() {
            copy_palette_antialias
        } else {
            match src_depth {
                ColorDepth::Rgb332 => copy_rgb_antialias::<Rgb332>,
                ColorDepth::Rgb565 => copy_rgb_antialias::<Rgb565>,
                ColorDepth::Swapped565 => copy_rgb_antialias::<Swap565>,
                ColorDepth::Bgr666 => copy_rgb_antialias::<Bgr666>,
                ColorDepth::Bgr888 => copy_rgb_antialias::<Bgr888>,
                ColorDepth::Rgb888 => copy_rgb_antialias::<Rgb888>,
                ColorDepth::Bgra8888 => copy_rgb_antialias::<Bgra8888>,
                ColorDepth::Grayscale8 => copy_rgb_antialias::<Gray8>,
                _ => copy_rgb_antialias::<Argb8888>,
            }
        };
        cur
    }

    /// Build a blending cursor: the source is [`Argb8888`] rows (the box
    /// filter's output) composited over the destination's existing pixels.
    /// Alpha 0 leaves the destination untouched, 255 overwrites, anything
    /// between mixes per channel.
    pub fn new_blend(src_data: &'a [u8], dst_depth: ColorDepth) -> Self {
        let mut cur = Self::new(src_data, dst_depth, ColorDepth::Argb8888, false, None, None);
        cur.copy_fn = blend_copy_for(dst_depth);
        cur
    }

    /// Declare the source extent: logical width/height and row stride, all
    /// in source pixels.
    pub fn set_source_size(&mut self, width: u32, height: u32, stride: u32) {
        debug_assert!(stride >= width);
        self.src_width = width;
        self.src_height = height;
        self.src_stride = stride;
    }

    /// Place the read position on an integer pixel.
    pub fn set_position(&mut self, x: u32, y: u32) {
        self.src_x32 = x << Self::FP_SCALE;
        self.src_y32 = y << Self::FP_SCALE;
    }

    /// Integer part of the X position (signed).
    #[inline]
    pub fn src_x(&self) -> i32 {
        (self.src_x32 as i32) >> Self::FP_SCALE
    }

    /// Integer part of the Y position (signed).
    #[inline]
    pub fn src_y(&self) -> i32 {
        (self.src_y32 as i32) >> Self::FP_SCALE
    }

    /// Integer part of the footprint-end X position (signed).
    #[inline]
    pub fn src_xe(&self) -> i32 {
        (self.src_xe32 as i32) >> Self::FP_SCALE
    }

    /// Integer part of the footprint-end Y position (signed).
    #[inline]
    pub fn src_ye(&self) -> i32 {
        (self.src_ye32 as i32) >> Self::FP_SCALE
    }

    /// True when `copy` may be replaced by a raw byte copy: identical
    /// encodings and no transparent key.
    pub fn is_passthrough(&self) -> bool {
        self.no_convert && self.transp == Self::NON_TRANSP
    }

    /// The borrowed source bytes.
    pub fn source(&self) -> &'a [u8] {
        self.src_data
    }

    /// Produce converted pixels into `dst[first..last]` (pixel indices).
    ///
    /// Returns the index reached: `last`, or where a transparent source
    /// pixel stopped the run. The position advances by `step × produced`.
    #[inline]
    pub fn copy(&mut self, dst: &mut [u8], first: u32, last: u32) -> u32 {
        let f = self.copy_fn;
        f(self, dst, first, last)
    }

    /// Advance past transparent source pixels; returns the first opaque
    /// index, or `last`.
    #[inline]
    pub fn skip(&mut self, first: u32, last: u32) -> u32 {
        let f = self.skip_fn;
        f(self, first, last)
    }

    #[inline]
    fn src_index(&self) -> usize {
        ((self.src_x32 >> Self::FP_SCALE)
            + (self.src_y32 >> Self::FP_SCALE) * self.src_stride) as usize
    }

    #[inline]
    fn advance(&mut self) {
        self.src_x32 = self.src_x32.wrapping_add(self.src_x32_add);
        self.src_y32 = self.src_y32.wrapping_add(self.src_y32_add);
    }
}

fn select_fns(
    dst_depth: ColorDepth,
    src_depth: ColorDepth,
    dst_palette: bool,
    has_palette: bool,
) -> (CopyFn, SkipFn) {
    if dst_palette || dst_depth.is_sub_byte() {
        if has_palette && dst_depth.bits() == 8 && src_depth.bits() == 8 {
            // index-to-index at equal depth: raw copy, no remap
            (copy_rgb_affine::<Gray8, Gray8>, skip_rgb_affine::<Gray8>)
        } else {
            (copy_bits_affine, skip_bits_affine)
        }
    } else if src_depth.has_palette() {
        (palette_copy_for(dst_depth), skip_bits_affine)
    } else if src_depth.is_grayscale() && src_depth.is_sub_byte() {
        (gray_copy_for(dst_depth), skip_bits_affine)
    } else {
        match src_depth {
            ColorDepth::Rgb332 => (direct_copy_for::<Rgb332>(dst_depth), skip_rgb_affine::<Rgb332>),
            ColorDepth::Rgb565 => (direct_copy_for::<Rgb565>(dst_depth), skip_rgb_affine::<Rgb565>),
            ColorDepth::Swapped565 => {
                (direct_copy_for::<Swap565>(dst_depth), skip_rgb_affine::<Swap565>)
            }
            ColorDepth::Bgr666 => (direct_copy_for::<Bgr666>(dst_depth), skip_rgb_affine::<Bgr666>),
            ColorDepth::Bgr888 => (direct_copy_for::<Bgr888>(dst_depth), skip_rgb_affine::<Bgr888>),
            ColorDepth::Rgb888 => (direct_copy_for::<Rgb888>(dst_depth), skip_rgb_affine::<Rgb888>),
            ColorDepth::Bgra8888 => {
                (direct_copy_for::<Bgra8888>(dst_depth), skip_rgb_affine::<Bgra8888>)
            }
            ColorDepth::Argb8888 => {
                (direct_copy_for::<Argb8888>(dst_depth), skip_rgb_affine::<Argb8888>)
            }
            _ => (direct_copy_for::<Gray8>(dst_depth), skip_rgb_affine::<Gray8>),
        }
    }
}

fn direct_copy_for<Src: RawPixel>(dst: ColorDepth) -> CopyFn {
    match dst {
        ColorDepth::Rgb332 => copy_rgb_affine::<Rgb332, Src>,
        ColorDepth::Rgb565 => copy_rgb_affine::<Rgb565, Src>,
        ColorDepth::Swapped565 => copy_rgb_affine::<Swap565, Src>,
        ColorDepth::Bgr666 => copy_rgb_affine::<Bgr666, Src>,
        ColorDepth::Bgr888 => copy_rgb_affine::<Bgr888, Src>,
        ColorDepth::Rgb888 => copy_rgb_affine::<Rgb888, Src>,
        ColorDepth::Bgra8888 => copy_rgb_affine::<Bgra8888, Src>,
        ColorDepth::Argb8888 => copy_rgb_affine::<Argb8888, Src>,
        ColorDepth::Grayscale8 => copy_rgb_affine::<Gray8, Src>,
        _ => copy_bits_affine,
    }
}

fn palette_copy_for(dst: ColorDepth) -> CopyFn {
    match dst {
        ColorDepth::Rgb332 => copy_palette_affine::<Rgb332>,
        ColorDepth::Rgb565 => copy_palette_affine::<Rgb565>,
        ColorDepth::Swapped565 => copy_palette_affine::<Swap565>,
        ColorDepth::Bgr666 => copy_palette_affine::<Bgr666>,
        ColorDepth::Bgr888 => copy_palette_affine::<Bgr888>,
        ColorDepth::Rgb888 => copy_palette_affine::<Rgb888>,
        ColorDepth::Bgra8888 => copy_palette_affine::<Bgra8888>,
        ColorDepth::Argb8888 => copy_palette_affine::<Argb8888>,
        ColorDepth::Grayscale8 => copy_palette_affine::<Gray8>,
        _ => copy_bits_affine,
    }
}

fn blend_copy_for(dst: ColorDepth) -> CopyFn {
    match dst {
        ColorDepth::Rgb332 => blend_rgb_affine::<Rgb332>,
        ColorDepth::Rgb565 => blend_rgb_affine::<Rgb565>,
        ColorDepth::Swapped565 => blend_rgb_affine::<Swap565>,
        ColorDepth::Bgr666 => blend_rgb_affine::<Bgr666>,
        ColorDepth::Bgr888 => blend_rgb_affine::<Bgr888>,
        ColorDepth::Rgb888 => blend_rgb_affine::<Rgb888>,
        ColorDepth::Bgra8888 => blend_rgb_affine::<Bgra8888>,
        ColorDepth::Argb8888 => blend_rgb_affine::<Argb8888>,
        _ => blend_rgb_affine::<Gray8>,
    }
}

fn gray_copy_for(dst: ColorDepth) -> CopyFn {
    match dst {
        ColorDepth::Rgb332 => copy_gray_affine::<Rgb332>,
        ColorDepth::Rgb565 => copy_gray_affine::<Rgb565>,
        ColorDepth::Swapped565 => copy_gray_affine::<Swap565>,
        ColorDepth::Bgr666 => copy_gray_affine::<Bgr666>,
        ColorDepth::Bgr888 => copy_gray_affine::<Bgr888>,
        ColorDepth::Rgb888 => copy_gray_affine::<Rgb888>,
        ColorDepth::Bgra8888 => copy_gray_affine::<Bgra8888>,
        ColorDepth::Argb8888 => copy_gray_affine::<Argb8888>,
        ColorDepth::Grayscale8 => copy_gray_affine::<Gray8>,
        _ => copy_bits_affine,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Direct-color runs
// ─────────────────────────────────────────────────────────────────────────────

fn copy_rgb_affine<Dst: RawPixel, Src: RawPixel>(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    while index != last {
        let i = cur.src_index();
        let raw = Src::load(&cur.src_data[i * Src::BYTES..]).to_raw();
        if raw == cur.transp {
            break;
        }
        Dst::from_raw(convert_raw::<Dst, Src>(raw)).store(&mut dst[index as usize * Dst::BYTES..]);
        cur.advance();
        index += 1;
    }
    index
}

fn skip_rgb_affine<Src: RawPixel>(cur: &mut PixelCursor<'_>, mut index: u32, last: u32) -> u32 {
    while index != last {
        let i = cur.src_index();
        if Src::load(&cur.src_data[i * Src::BYTES..]).to_raw() != cur.transp {
            break;
        }
        cur.advance();
        index += 1;
    }
    index
}

/// ARGB source composited over the destination's current pixels.
///
/// Weights follow the hardware-friendly fixed-point form: `inv = 256 - a`
/// against `a + 1`, so full alpha reproduces the source exactly.
fn blend_rgb_affine<Dst: RawPixel>(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    while index != last {
        let i = cur.src_index();
        let s = Argb8888::load(&cur.src_data[i * 4..]);
        let a = u32::from(s.a8());
        let off = index as usize * Dst::BYTES;
        if a == 255 {
            Dst::from_rgb(s.r8(), s.g8(), s.b8()).store(&mut dst[off..]);
        } else if a != 0 {
            let d = Dst::load(&dst[off..]);
            let inv = 256 - a;
            let mix = a + 1;
            Dst::from_rgb(
                ((u32::from(d.r8()) * inv + u32::from(s.r8()) * mix) >> 8) as u8,
                ((u32::from(d.g8()) * inv + u32::from(s.g8()) * mix) >> 8) as u8,
                ((u32::from(d.b8()) * inv + u32::from(s.b8()) * mix) >> 8) as u8,
            )
            .store(&mut dst[off..]);
        }
        cur.advance();
        index += 1;
    }
    last
}

// ─────────────────────────────────────────────────────────────────────────────
// Indexed and packed runs
// ─────────────────────────────────────────────────────────────────────────────

fn copy_palette_affine<Dst: RawPixel>(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    let Some(pal) = cur.palette else {
        return copy_gray_affine::<Dst>(cur, dst, index, last);
    };
    let bits = cur.src_depth.bits();
    while index != last {
        let raw = u32::from(PackedRow::new(cur.src_data, bits).get(cur.src_index()));
        if raw == cur.transp {
            break;
        }
        Dst::from_canonical(pal[raw as usize]).store(&mut dst[index as usize * Dst::BYTES..]);
        cur.advance();
        index += 1;
    }
    index
}

/// Sub-byte (or index-passthrough) destination: read-modify-write so the
/// neighbouring pixel in the shared byte survives.
fn copy_bits_affine(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    let src_bits = cur.src_depth.bits();
    let dst_bits = cur.dst_depth.bits();
    let mut dst_row = PackedRowMut::new(dst, dst_bits);
    while index != last {
        let raw = u32::from(PackedRow::new(cur.src_data, src_bits).get(cur.src_index()));
        cur.advance();
        if raw != cur.transp {
            dst_row.set(index as usize, raw as u8);
        }
        index += 1;
    }
    index
}

fn skip_bits_affine(cur: &mut PixelCursor<'_>, mut index: u32, last: u32) -> u32 {
    let bits = cur.src_depth.bits();
    while index != last {
        if u32::from(PackedRow::new(cur.src_data, bits).get(cur.src_index())) != cur.transp {
            break;
        }
        cur.advance();
        index += 1;
    }
    index
}

/// Grayscale source expanded between `back_rgb888` and `fore_rgb888`.
/// Used by font/mask producers; total, no transparency.
fn copy_gray_affine<Dst: RawPixel>(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    let bits = cur.src_depth.bits();
    // replicate an n-bit level across 8 bits before weighting
    let k: u32 = match bits {
        1 => 0xFF,
        2 => 0x55,
        4 => 0x11,
        _ => 0x01,
    };
    let rb = ((cur.back_rgb888 >> 16) & 0xFF) as i32;
    let gb = ((cur.back_rgb888 >> 8) & 0xFF) as i32;
    let bb = (cur.back_rgb888 & 0xFF) as i32;
    let rf = ((cur.fore_rgb888 >> 16) & 0xFF) as i32 - rb;
    let gf = ((cur.fore_rgb888 >> 8) & 0xFF) as i32 - gb;
    let bf = (cur.fore_rgb888 & 0xFF) as i32 - bb;
    while index != last {
        let level = u32::from(PackedRow::new(cur.src_data, bits).get(cur.src_index()));
        let alp = (k * level + 1) as i32;
        Dst::from_rgb(
            (rb + ((rf * alp) >> 8)) as u8,
            (gb + ((gf * alp) >> 8)) as u8,
            (bb + ((bf * alp) >> 8)) as u8,
        )
        .store(&mut dst[index as usize * Dst::BYTES..]);
        cur.advance();
        index += 1;
    }
    index
}

// ─────────────────────────────────────────────────────────────────────────────
// Box-filter (antialiased) runs
// ─────────────────────────────────────────────────────────────────────────────

struct BoxAccum {
    b: u64,
    g: u64,
    r: u64,
    a: u64,
    total: u64,
}

impl BoxAccum {
    fn new() -> Self {
        Self { b: 0, g: 0, r: 0, a: 0, total: 0 }
    }

    fn add(&mut self, c: CanonicalColor, rate: u64, weight_alpha: bool) {
        let rate_a = if weight_alpha { rate * u64::from(c.a) } else { rate };
        self.a += rate_a;
        self.r += u64::from(c.r) * rate_a;
        self.g += u64::from(c.g) * rate_a;
        self.b += u64::from(c.b) * rate_a;
    }

    fn resolve(&self, weight_alpha: bool) -> Argb8888 {
        if self.a == 0 {
            // zero accumulated opacity: transparent black, the caller's
            // blend leaves the destination unchanged
            return Argb8888(0);
        }
        let a = if weight_alpha { self.a } else { self.a * 255 } / self.total;
        Argb8888::from_argb(
            a as u8,
            (self.r / self.a) as u8,
            (self.g / self.a) as u8,
            (self.b / self.a) as u8,
        )
    }
}

/// Walk the footprint `[x..=xe] × [y..=ye]`, feeding edge-weighted samples
/// into `acc`. `sample` returns `None` for transparent or out-of-palette
/// pixels.
fn accumulate_footprint(
    cur: &PixelCursor<'_>,
    acc: &mut BoxAccum,
    weight_alpha: bool,
    mut sample: impl FnMut(i32, i32) -> Option<CanonicalColor>,
) {
    let sw = cur.src_width as i32;
    let sh = cur.src_height as i32;
    let x0 = cur.src_x();
    let xe = cur.src_xe();
    let ye = cur.src_ye();
    let first_rate_x = 256 - u64::from((cur.src_x32 & 0xFFFF) >> 8);
    let mut rate_x = first_rate_x;
    let mut rate_y = 256 - u64::from((cur.src_y32 & 0xFFFF) >> 8);
    let mut x = x0;
    let mut y = cur.src_y();
    loop {
        let rate = rate_x * rate_y;
        acc.total += rate;
        if (0..sh).contains(&y) && (0..sw).contains(&x) {
            if let Some(c) = sample(x, y) {
                acc.add(c, rate, weight_alpha);
            }
        }
        if x < xe {
            x += 1;
            rate_x = if x == xe {
                u64::from((cur.src_xe32 & 0xFFFF) >> 8) + 1
            } else {
                256
            };
        } else {
            y += 1;
            if y > ye {
                break;
            }
            rate_y = if y == ye {
                u64::from((cur.src_ye32 & 0xFFFF) >> 8) + 1
            } else {
                256
            };
            x = x0;
            rate_x = first_rate_x;
        }
    }
}

fn step_back(cur: &mut PixelCursor<'_>) {
    cur.src_x32 = cur.src_x32.wrapping_sub(cur.src_x32_add);
    cur.src_xe32 = cur.src_xe32.wrapping_sub(cur.src_x32_add);
    cur.src_y32 = cur.src_y32.wrapping_sub(cur.src_y32_add);
    cur.src_ye32 = cur.src_ye32.wrapping_sub(cur.src_y32_add);
}

fn step_forward(cur: &mut PixelCursor<'_>) {
    cur.src_x32 = cur.src_x32.wrapping_add(cur.src_x32_add);
    cur.src_xe32 = cur.src_xe32.wrapping_add(cur.src_x32_add);
    cur.src_y32 = cur.src_y32.wrapping_add(cur.src_y32_add);
    cur.src_ye32 = cur.src_ye32.wrapping_add(cur.src_y32_add);
}

fn copy_rgb_antialias<Src: RawPixel>(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    let weight_alpha = Src::DEPTH.bits() == 32;
    // the loop advances at the top so the positions end past the run
    step_back(cur);
    while index != last {
        step_forward(cur);
        let x = cur.src_x();
        let y = cur.src_y();
        let out = if x == cur.src_xe()
            && y == cur.src_ye()
            && (0..cur.src_width as i32).contains(&x)
            && (0..cur.src_height as i32).contains(&y)
        {
            let i = (x as u32 + y as u32 * cur.src_stride) as usize;
            let px = Src::load(&cur.src_data[i * Src::BYTES..]);
            if px.to_raw() == cur.transp {
                Argb8888(0)
            } else {
                Argb8888::from_canonical(px.to_canonical())
            }
        } else {
            let mut acc = BoxAccum::new();
            let stride = cur.src_stride;
            let data = cur.src_data;
            let transp = cur.transp;
            accumulate_footprint(cur, &mut acc, weight_alpha, |x, y| {
                let i = (x as u32 + y as u32 * stride) as usize;
                let px = Src::load(&data[i * Src::BYTES..]);
                (px.to_raw() != transp).then(|| px.to_canonical())
            });
            acc.resolve(weight_alpha)
        };
        out.store(&mut dst[index as usize * 4..]);
        index += 1;
    }
    last
}

fn copy_palette_antialias(
    cur: &mut PixelCursor<'_>,
    dst: &mut [u8],
    mut index: u32,
    last: u32,
) -> u32 {
    let bits = cur.src_depth.bits();
    let pal = cur.palette.unwrap_or(&[]);
    step_back(cur);
    while index != last {
        step_forward(cur);
        let x = cur.src_x();
        let y = cur.src_y();
        let out = if x == cur.src_xe()
            && y == cur.src_ye()
            && (0..cur.src_width as i32).contains(&x)
            && (0..cur.src_height as i32).contains(&y)
        {
            let i = (x as u32 + y as u32 * cur.src_stride) as usize;
            let raw = u32::from(PackedRow::new(cur.src_data, bits).get(i));
            match pal.get(raw as usize) {
                Some(c) if raw != cur.transp => Argb8888::from_canonical(*c),
                _ => Argb8888(0),
            }
        } else {
            let mut acc = BoxAccum::new();
            let stride = cur.src_stride;
            let data = cur.src_data;
            let transp = cur.transp;
            accumulate_footprint(cur, &mut acc, true, |x, y| {
                let i = (x as u32 + y as u32 * stride) as usize;
                let raw = u32::from(PackedRow::new(data, bits).get(i));
                if raw == transp {
                    return None;
                }
                pal.get(raw as usize).copied()
            });
            acc.resolve(true)
        };
        out.store(&mut dst[index as usize * 4..]);
        index += 1;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    const FP1: u32 = 1 << PixelCursor::FP_SCALE;

    #[test]
    fn unit_step_visits_every_source_pixel_once() {
        let src: [u8; 8] = [10, 20, 30, 40, 50, 60, 70, 80];
        let mut dst = [0u8; 8];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Grayscale8,
            ColorDepth::Grayscale8,
            false,
            None,
            None,
        );
        cur.set_source_size(8, 1, 8);
        let reached = cur.copy(&mut dst, 0, 8);
        assert_eq!(reached, 8);
        assert_eq!(dst, src);
        assert_eq!(cur.src_x(), 8); // advanced exactly step * count
    }

    #[test]
    fn copy_stops_at_transparent_key_and_skip_resumes() {
        // key = 0x22; layout: opaque, opaque, key, key, opaque
        let src: [u8; 5] = [0x11, 0x33, 0x22, 0x22, 0x44];
        let mut dst = [0xEEu8; 5];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Rgb332,
            ColorDepth::Rgb332,
            false,
            None,
            Some(0x22),
        );
        cur.set_source_size(5, 1, 5);

        let pos = cur.copy(&mut dst, 0, 5);
        assert_eq!(pos, 2);
        let pos = cur.skip(pos, 5);
        assert_eq!(pos, 4);
        let pos = cur.copy(&mut dst, pos, 5);
        assert_eq!(pos, 5);
        assert_eq!(dst, [0x11, 0x33, 0xEE, 0xEE, 0x44]);
    }

    #[test]
    fn converts_while_copying() {
        // two RGB888 pixels into Swapped565
        let mut src = [0u8; 6];
        Rgb888(0xFF0000).store(&mut src[0..]);
        Rgb888(0x00FF00).store(&mut src[3..]);
        let mut dst = [0u8; 4];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Swapped565,
            ColorDepth::Rgb888,
            false,
            None,
            None,
        );
        cur.set_source_size(2, 1, 2);
        cur.copy(&mut dst, 0, 2);
        assert_eq!(Swap565::load(&dst[0..]).to_raw(), 0x00F8);
        assert_eq!(Swap565::load(&dst[2..]).to_raw(), 0xE007);
    }

    #[test]
    fn palette_source_resolves_through_palette() {
        let pal = [
            CanonicalColor::rgb(0, 0, 0),
            CanonicalColor::rgb(255, 255, 255),
        ];
        // 4-bit indices: 0,1,1,0
        let src = [0x01u8, 0x10];
        let mut dst = [0u8; 8];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Swapped565,
            ColorDepth::Palette4,
            false,
            Some(&pal),
            None,
        );
        cur.set_source_size(4, 1, 4);
        cur.copy(&mut dst, 0, 4);
        assert_eq!(Swap565::load(&dst[0..]).to_raw(), 0x0000);
        assert_eq!(Swap565::load(&dst[2..]).to_raw(), 0xFFFF);
        assert_eq!(Swap565::load(&dst[4..]).to_raw(), 0xFFFF);
        assert_eq!(Swap565::load(&dst[6..]).to_raw(), 0x0000);
    }

    #[test]
    fn sub_byte_destination_preserves_byte_mates() {
        // 4-bit src indices 0xA,0xB into a 4-bit dst already holding 0xFF
        let src = [0xABu8];
        let mut dst = [0xFFu8, 0xFF];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Palette4,
            ColorDepth::Palette4,
            true,
            None,
            None,
        );
        cur.set_source_size(2, 1, 2);
        cur.copy(&mut dst, 1, 3);
        assert_eq!(dst, [0xFA, 0xBF]);
    }

    #[test]
    fn scaled_read_selects_integer_positions() {
        let src: [u8; 4] = [1, 2, 3, 4];
        let mut dst = [0u8; 8];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Grayscale8,
            ColorDepth::Grayscale8,
            false,
            None,
            None,
        );
        cur.set_source_size(4, 1, 4);
        cur.src_x32_add = FP1 / 2; // 2x upscale
        cur.copy(&mut dst, 0, 8);
        assert_eq!(dst, [1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn stride_skips_packing_between_rows() {
        // 2x2 rectangle inside a 4-wide bitmap
        let src: [u8; 8] = [1, 2, 9, 9, 3, 4, 9, 9];
        let mut dst = [0u8; 2];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Grayscale8,
            ColorDepth::Grayscale8,
            false,
            None,
            None,
        );
        cur.set_source_size(2, 2, 4);
        cur.copy(&mut dst, 0, 2);
        assert_eq!(dst, [1, 2]);
        cur.set_position(0, 1);
        cur.copy(&mut dst, 0, 2);
        assert_eq!(dst, [3, 4]);
    }

    #[test]
    fn gray_source_expands_between_back_and_fore() {
        // 1-bit source 0b10 -> fore, back
        let src = [0b1000_0000u8];
        let mut dst = [0u8; 6];
        let mut cur = PixelCursor::new(
            &src,
            ColorDepth::Rgb888,
            ColorDepth::Grayscale1,
            false,
            None,
            None,
        );
        cur.set_source_size(2, 1, 2);
        cur.fore_rgb888 = 0xFF_FFFF;
        cur.back_rgb888 = 0x00_0000;
        cur.copy(&mut dst, 0, 2);
        assert_eq!(Rgb888::load(&dst[0..]).to_raw(), 0xFF_FFFF);
        assert_eq!(Rgb888::load(&dst[3..]).to_raw(), 0x00_0000);
    }

    #[test]
    fn blend_weighs_source_by_alpha() {
        let mut src = [0u8; 12];
        Argb8888::from_argb(255, 0x10, 0x20, 0x30).store(&mut src[0..]);
        Argb8888::from_argb(0, 0xFF, 0xFF, 0xFF).store(&mut src[4..]);
        Argb8888::from_argb(0x80, 0xFF, 0xFF, 0xFF).store(&mut src[8..]);
        let mut dst = [0u8; 9];
        for chunk in dst.chunks_exact_mut(3) {
            Rgb888(0x404040).store(chunk);
        }
        let mut cur = PixelCursor::new_blend(&src, ColorDepth::Rgb888);
        cur.set_source_size(3, 1, 3);
        let reached = cur.copy(&mut dst, 0, 3);
        assert_eq!(reached, 3);
        // opaque replaces
        assert_eq!(Rgb888::load(&dst[0..]).to_raw(), 0x102030);
        // fully transparent leaves the destination
        assert_eq!(Rgb888::load(&dst[3..]).to_raw(), 0x404040);
        // half alpha: (0x40 * 128 + 0xFF * 129) >> 8 per channel
        let mixed = (0x40u32 * 128 + 0xFF * 129) >> 8;
        assert_eq!(
            Rgb888::load(&dst[6..]).to_raw(),
            mixed << 16 | mixed << 8 | mixed
        );
    }

    #[test]
    fn blend_converts_into_the_destination_depth() {
        let mut src = [0u8; 4];
        Argb8888::from_argb(255, 0xFF, 0, 0).store(&mut src);
        let mut dst = [0u8; 2];
        let mut cur = PixelCursor::new_blend(&src, ColorDepth::Swapped565);
        cur.set_source_size(1, 1, 1);
        cur.copy(&mut dst, 0, 1);
        assert_eq!(Swap565::load(&dst).to_raw(), 0x00F8);
    }

    // ── box filter ──────────────────────────────────────────────────────────

    fn rgb888_row(colors: &[u32]) -> Vec<u8> {
        let mut buf = vec![0u8; colors.len() * 3];
        for (i, c) in colors.iter().enumerate() {
            Rgb888(*c).store(&mut buf[i * 3..]);
        }
        buf
    }

    #[test]
    fn box_filter_single_pixel_footprint_passes_through() {
        let src = rgb888_row(&[0x102030, 0x405060]);
        let mut dst = [0u8; 4];
        let mut cur = PixelCursor::new_antialias(&src, ColorDepth::Rgb888, None, None);
        cur.set_source_size(2, 1, 2);
        cur.src_x32 = FP1; // exactly on pixel 1
        cur.src_xe32 = FP1;
        cur.src_ye32 = 0;
        cur.copy(&mut dst, 0, 1);
        assert_eq!(Argb8888::load(&dst).to_raw(), 0xFF40_5060);
    }

    #[test]
    fn box_filter_weights_literal_footprint_boundaries() {
        // footprint covers pixel 0 fully (weight 256) and pixel 1 fully
        // (edge weight (0xFFFF >> 8) + 1 == 256): an exact 50/50 blend
        let src = rgb888_row(&[0xFF0000, 0x0000FF]);
        let mut dst = [0u8; 4];
        let mut cur = PixelCursor::new_antialias(&src, ColorDepth::Rgb888, None, None);
        cur.set_source_size(2, 1, 2);
        cur.src_x32 = 0;
        cur.src_xe32 = 2 * FP1 - 1;
        cur.src_ye32 = 0;
        cur.copy(&mut dst, 0, 1);
        let out = Argb8888::load(&dst);
        assert_eq!(out.a8(), 255);
        assert_eq!(out.r8(), 127);
        assert_eq!(out.g8(), 0);
        assert_eq!(out.b8(), 127);
    }

    #[test]
    fn box_filter_half_edge_weights() {
        // start half into pixel 0, end half into pixel 1: both weigh 128
        let src = rgb888_row(&[0xFF0000, 0x0000FF]);
        let mut dst = [0u8; 4];
        let mut cur = PixelCursor::new_antialias(&src, ColorDepth::Rgb888, None, None);
        cur.set_source_size(2, 1, 2);
        cur.src_x32 = FP1 / 2;
        cur.src_xe32 = FP1 + FP1 / 2 - 1;
        cur.src_ye32 = 0;
        cur.copy(&mut dst, 0, 1);
        let out = Argb8888::load(&dst);
        assert_eq!(out.r8(), 127);
        assert_eq!(out.b8(), 127);
    }

    #[test]
    fn box_filter_out_of_bounds_footprint_is_transparent() {
        let src = rgb888_row(&[0xFF0000]);
        let mut dst = [0xAAu8; 4];
        let mut cur = PixelCursor::new_antialias(&src, ColorDepth::Rgb888, None, None);
        cur.set_source_size(1, 1, 1);
        cur.src_x32 = 5 * FP1;
        cur.src_xe32 = 6 * FP1 - 1;
        cur.src_ye32 = 0;
        cur.copy(&mut dst, 0, 1);
        assert_eq!(Argb8888::load(&dst).to_raw(), 0);
    }

    #[test]
    fn passthrough_detection() {
        let src = [0u8; 2];
        let cur = PixelCursor::new(
            &src,
            ColorDepth::Swapped565,
            ColorDepth::Swapped565,
            false,
            None,
            None,
        );
        assert!(cur.is_passthrough());
        let cur = PixelCursor::new(
            &src,
            ColorDepth::Swapped565,
            ColorDepth::Swapped565,
            false,
            None,
            Some(0),
        );
        assert!(!cur.is_passthrough());
    }
}
