//! Concrete pixel encodings and the canonical interchange color
//!
//! Each type wraps the raw bit pattern of one encoding and knows how to
//! widen its channels to 8 bits and back. Widening replicates the channel's
//! own bits into the vacated low bits so that a pure color stays pure
//! (`0b11111` widens to `0b1111_1111`, never `0b1111_1000`); the one
//! deliberate exception is [`Bgr666`], whose controllers define the 6-bit
//! channel as the top bits of an 8-bit value (`<< 2` / `>> 2`).
//!
//! Conversions between any two encodings pivot through [`CanonicalColor`];
//! see [`convert_raw`].

use crate::depth::ColorDepth;

/// 32-bit ARGB interchange color. Every encoding converts to and from this.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanonicalColor {
    /// Alpha, 255 = opaque.
    pub a: u8,
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl CanonicalColor {
    /// Opaque color from 8-bit channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { a: 255, r, g, b }
    }

    /// Color from alpha and 8-bit channels.
    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    /// Unpack a `0xAARRGGBB` value.
    pub const fn from_argb8888(raw: u32) -> Self {
        Self {
            a: (raw >> 24) as u8,
            r: (raw >> 16) as u8,
            g: (raw >> 8) as u8,
            b: raw as u8,
        }
    }

    /// Pack into a `0xAARRGGBB` value.
    pub const fn to_argb8888(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

/// A raw pixel value in one specific encoding.
///
/// `load`/`store` define the byte-buffer layout: little-endian bytes of
/// [`to_raw`](Self::to_raw), `BYTES` wide. That reproduces the packed
/// structs the controllers consume, including the byte-swapped variants.
pub trait RawPixel: Copy + PartialEq + Sized {
    /// The [`ColorDepth`] this type encodes.
    const DEPTH: ColorDepth;
    /// Bytes per pixel in a buffer of this encoding.
    const BYTES: usize;

    /// Reinterpret a raw bit pattern (truncates to the encoding's width).
    fn from_raw(raw: u32) -> Self;
    /// The raw bit pattern.
    fn to_raw(self) -> u32;
    /// Encode 8-bit channels (narrowing truncates high bits).
    fn from_rgb(r: u8, g: u8, b: u8) -> Self;

    /// Encode alpha plus channels; encodings without alpha drop it.
    fn from_argb(_a: u8, r: u8, g: u8, b: u8) -> Self {
        Self::from_rgb(r, g, b)
    }

    /// Red widened to 8 bits.
    fn r8(self) -> u8;
    /// Green widened to 8 bits.
    fn g8(self) -> u8;
    /// Blue widened to 8 bits.
    fn b8(self) -> u8;
    /// Alpha widened to 8 bits; opaque for encodings without alpha.
    fn a8(self) -> u8 {
        255
    }

    /// Widen to the interchange color.
    fn to_canonical(self) -> CanonicalColor {
        CanonicalColor::argb(self.a8(), self.r8(), self.g8(), self.b8())
    }

    /// Narrow from the interchange color.
    fn from_canonical(c: CanonicalColor) -> Self {
        Self::from_argb(c.a, c.r, c.g, c.b)
    }

    /// Read one pixel from the head of `buf` (little-endian raw bytes).
    fn load(buf: &[u8]) -> Self {
        let mut raw = 0u32;
        for (i, byte) in buf.iter().take(Self::BYTES).enumerate() {
            raw |= u32::from(*byte) << (8 * i);
        }
        Self::from_raw(raw)
    }

    /// Write one pixel to the head of `buf` (little-endian raw bytes).
    fn store(self, buf: &mut [u8]) {
        let raw = self.to_raw();
        for (i, byte) in buf.iter_mut().take(Self::BYTES).enumerate() {
            *byte = (raw >> (8 * i)) as u8;
        }
    }
}

/// Convert one raw value between encodings, pivoting through
/// [`CanonicalColor`]. Monomorphizes to straight-line bit math per pair;
/// the identical-encoding case collapses to a move.
#[inline]
pub fn convert_raw<Dst: RawPixel, Src: RawPixel>(raw: u32) -> u32 {
    if Dst::DEPTH == Src::DEPTH {
        return raw;
    }
    Dst::from_canonical(Src::from_raw(raw).to_canonical()).to_raw()
}

// ─────────────────────────────────────────────────────────────────────────────
// Direct-color encodings
// ─────────────────────────────────────────────────────────────────────────────

/// `RRRGGGBB` in one byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb332(pub u8);

impl RawPixel for Rgb332 {
    const DEPTH: ColorDepth = ColorDepth::Rgb332;
    const BYTES: usize = 1;

    fn from_raw(raw: u32) -> Self {
        Self(raw as u8)
    }
    fn to_raw(self) -> u32 {
        u32::from(self.0)
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self((r >> 5) << 5 | (g >> 5) << 2 | b >> 6)
    }
    fn r8(self) -> u8 {
        // 3-bit replication: (r << 5) | (r << 2) | (r >> 1)
        ((u32::from(self.0 >> 5) * 0x49) >> 1) as u8
    }
    fn g8(self) -> u8 {
        ((u32::from((self.0 >> 2) & 0x07) * 0x49) >> 1) as u8
    }
    fn b8(self) -> u8 {
        // 2-bit replication: b * 0b0101_0101
        (self.0 & 0x03) * 0x55
    }
}

/// `RRRRRGGG GGGBBBBB` in host order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl RawPixel for Rgb565 {
    const DEPTH: ColorDepth = ColorDepth::Rgb565;
    const BYTES: usize = 2;

    fn from_raw(raw: u32) -> Self {
        Self(raw as u16)
    }
    fn to_raw(self) -> u32 {
        u32::from(self.0)
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(u16::from(r >> 3) << 11 | u16::from(g >> 2) << 5 | u16::from(b >> 3))
    }
    fn r8(self) -> u8 {
        // (r << 3) | (r >> 2)
        ((u32::from(self.0 >> 11) * 0x21) >> 2) as u8
    }
    fn g8(self) -> u8 {
        // (g << 2) | (g >> 4)
        ((u32::from((self.0 >> 5) & 0x3F) * 0x41) >> 4) as u8
    }
    fn b8(self) -> u8 {
        ((u32::from(self.0 & 0x1F) * 0x21) >> 2) as u8
    }
}

/// RGB565 with its two bytes swapped, the order SPI panels consume.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Swap565(pub u16);

impl Swap565 {
    fn unswapped(self) -> Rgb565 {
        Rgb565(self.0.swap_bytes())
    }
}

impl RawPixel for Swap565 {
    const DEPTH: ColorDepth = ColorDepth::Swapped565;
    const BYTES: usize = 2;

    fn from_raw(raw: u32) -> Self {
        Self(raw as u16)
    }
    fn to_raw(self) -> u32 {
        u32::from(self.0)
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Rgb565::from_rgb(r, g, b).0.swap_bytes())
    }
    fn r8(self) -> u8 {
        self.unswapped().r8()
    }
    fn g8(self) -> u8 {
        self.unswapped().g8()
    }
    fn b8(self) -> u8 {
        self.unswapped().b8()
    }
}

/// 18-bit color, one channel per byte in R,G,B order, six significant bits.
///
/// The controller contract defines the channel as the top six bits of the
/// 8-bit value, so widening is `<< 2`, not replication.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bgr666(pub u32);

impl RawPixel for Bgr666 {
    const DEPTH: ColorDepth = ColorDepth::Bgr666;
    const BYTES: usize = 3;

    fn from_raw(raw: u32) -> Self {
        Self(raw & 0x003F_3F3F)
    }
    fn to_raw(self) -> u32 {
        self.0
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(u32::from(r >> 2) | u32::from(g >> 2) << 8 | u32::from(b >> 2) << 16)
    }
    fn r8(self) -> u8 {
        ((self.0 & 0x3F) << 2) as u8
    }
    fn g8(self) -> u8 {
        (((self.0 >> 8) & 0x3F) << 2) as u8
    }
    fn b8(self) -> u8 {
        (((self.0 >> 16) & 0x3F) << 2) as u8
    }
}

/// 24-bit color stored R,G,B in memory (bus order).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bgr888(pub u32);

impl RawPixel for Bgr888 {
    const DEPTH: ColorDepth = ColorDepth::Bgr888;
    const BYTES: usize = 3;

    fn from_raw(raw: u32) -> Self {
        Self(raw & 0x00FF_FFFF)
    }
    fn to_raw(self) -> u32 {
        self.0
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(u32::from(r) | u32::from(g) << 8 | u32::from(b) << 16)
    }
    fn r8(self) -> u8 {
        self.0 as u8
    }
    fn g8(self) -> u8 {
        (self.0 >> 8) as u8
    }
    fn b8(self) -> u8 {
        (self.0 >> 16) as u8
    }
}

/// 24-bit color in host order, raw value `0x00RRGGBB`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb888(pub u32);

impl RawPixel for Rgb888 {
    const DEPTH: ColorDepth = ColorDepth::Rgb888;
    const BYTES: usize = 3;

    fn from_raw(raw: u32) -> Self {
        Self(raw & 0x00FF_FFFF)
    }
    fn to_raw(self) -> u32 {
        self.0
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b))
    }
    fn r8(self) -> u8 {
        (self.0 >> 16) as u8
    }
    fn g8(self) -> u8 {
        (self.0 >> 8) as u8
    }
    fn b8(self) -> u8 {
        self.0 as u8
    }
}

/// 32-bit color with alpha in host order, raw value `0xAARRGGBB`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Argb8888(pub u32);

impl RawPixel for Argb8888 {
    const DEPTH: ColorDepth = ColorDepth::Argb8888;
    const BYTES: usize = 4;

    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn to_raw(self) -> u32 {
        self.0
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(255, r, g, b)
    }
    fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(u32::from(a) << 24 | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b))
    }
    fn r8(self) -> u8 {
        (self.0 >> 16) as u8
    }
    fn g8(self) -> u8 {
        (self.0 >> 8) as u8
    }
    fn b8(self) -> u8 {
        self.0 as u8
    }
    fn a8(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

/// 32-bit color with alpha, byte-swapped: memory order A,R,G,B.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bgra8888(pub u32);

impl RawPixel for Bgra8888 {
    const DEPTH: ColorDepth = ColorDepth::Bgra8888;
    const BYTES: usize = 4;

    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    fn to_raw(self) -> u32 {
        self.0
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(255, r, g, b)
    }
    fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(u32::from(a) | u32::from(r) << 8 | u32::from(g) << 16 | u32::from(b) << 24)
    }
    fn r8(self) -> u8 {
        (self.0 >> 8) as u8
    }
    fn g8(self) -> u8 {
        (self.0 >> 16) as u8
    }
    fn b8(self) -> u8 {
        (self.0 >> 24) as u8
    }
    fn a8(self) -> u8 {
        self.0 as u8
    }
}

/// 8-bit luminance.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Gray8(pub u8);

impl RawPixel for Gray8 {
    const DEPTH: ColorDepth = ColorDepth::Grayscale8;
    const BYTES: usize = 1;

    fn from_raw(raw: u32) -> Self {
        Self(raw as u8)
    }
    fn to_raw(self) -> u32 {
        u32::from(self.0)
    }
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        // green-weighted luma, matches the panel-side dither input
        Self(((u32::from(r) + 2 * u32::from(g) + u32::from(b)) >> 2) as u8)
    }
    fn r8(self) -> u8 {
        self.0
    }
    fn g8(self) -> u8 {
        self.0
    }
    fn b8(self) -> u8 {
        self.0
    }
}
