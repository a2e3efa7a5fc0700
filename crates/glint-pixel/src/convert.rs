//! Conversion dispatch bound to one destination encoding
//!
//! A panel builds a [`ConversionTable`] once when its working depth is set
//! and reuses it for every subsequent draw; selection happens here, at the
//! configuration boundary, so the per-pixel loops run a single direct
//! function with no branching on encodings.

use crate::color::{
    convert_raw, Argb8888, Bgr666, Bgr888, Bgra8888, CanonicalColor, Gray8, RawPixel, Rgb332,
    Rgb565, Rgb888, Swap565,
};
use crate::depth::ColorDepth;

/// A specialized raw-to-raw conversion, already bound to a (src, dst) pair.
pub type RawConvertFn = fn(u32) -> u32;

fn passthrough(raw: u32) -> u32 {
    raw
}

/// Quantize a canonical color to an n-bit luminance value.
fn canonical_to_level(c: CanonicalColor, bits: u32) -> u32 {
    let luma = (u32::from(c.r) + 2 * u32::from(c.g) + u32::from(c.b)) >> 2;
    luma >> (8 - bits)
}

fn to_level<Src: RawPixel, const BITS: u32>(raw: u32) -> u32 {
    canonical_to_level(Src::from_raw(raw).to_canonical(), BITS)
}

/// One conversion function per well-known source encoding, all bound to the
/// same destination. Rebuilt whenever the destination depth changes; never
/// consulted per pixel for the encodings the cursor specializes itself.
#[derive(Debug, Copy, Clone)]
pub struct ConversionTable {
    /// Destination this table narrows into.
    pub dst: ColorDepth,
    /// From [`Rgb332`] raws.
    pub from_rgb332: RawConvertFn,
    /// From host-order [`Rgb565`] raws.
    pub from_rgb565: RawConvertFn,
    /// From byte-swapped [`Swap565`] raws.
    pub from_swap565: RawConvertFn,
    /// From 18-bit [`Bgr666`] raws.
    pub from_bgr666: RawConvertFn,
    /// From host-order [`Rgb888`] raws.
    pub from_rgb888: RawConvertFn,
    /// From bus-order [`Bgr888`] raws.
    pub from_bgr888: RawConvertFn,
    /// From [`Argb8888`] raws.
    pub from_argb8888: RawConvertFn,
    /// From [`Bgra8888`] raws.
    pub from_bgra8888: RawConvertFn,
    /// From [`Gray8`] raws.
    pub from_gray8: RawConvertFn,
}

fn table_for<Dst: RawPixel>() -> ConversionTable {
    ConversionTable {
        dst: Dst::DEPTH,
        from_rgb332: convert_raw::<Dst, Rgb332>,
        from_rgb565: convert_raw::<Dst, Rgb565>,
        from_swap565: convert_raw::<Dst, Swap565>,
        from_bgr666: convert_raw::<Dst, Bgr666>,
        from_rgb888: convert_raw::<Dst, Rgb888>,
        from_bgr888: convert_raw::<Dst, Bgr888>,
        from_argb8888: convert_raw::<Dst, Argb8888>,
        from_bgra8888: convert_raw::<Dst, Bgra8888>,
        from_gray8: convert_raw::<Dst, Gray8>,
    }
}

fn level_table(dst: ColorDepth) -> ConversionTable {
    // Indexed and sub-byte destinations quantize through luminance; a
    // palette-aware remap is the cursor's job, not the table's.
    fn build<const BITS: u32>(dst: ColorDepth) -> ConversionTable {
        ConversionTable {
            dst,
            from_rgb332: to_level::<Rgb332, BITS>,
            from_rgb565: to_level::<Rgb565, BITS>,
            from_swap565: to_level::<Swap565, BITS>,
            from_bgr666: to_level::<Bgr666, BITS>,
            from_rgb888: to_level::<Rgb888, BITS>,
            from_bgr888: to_level::<Bgr888, BITS>,
            from_argb8888: to_level::<Argb8888, BITS>,
            from_bgra8888: to_level::<Bgra8888, BITS>,
            from_gray8: to_level::<Gray8, BITS>,
        }
    }
    match dst.bits() {
        1 => build::<1>(dst),
        2 => build::<2>(dst),
        4 => build::<4>(dst),
        _ => build::<8>(dst),
    }
}

impl ConversionTable {
    /// Bind a table to `dst`. Total for every supported destination.
    pub fn build(dst: ColorDepth) -> Self {
        match dst {
            ColorDepth::Rgb332 => table_for::<Rgb332>(),
            ColorDepth::Rgb565 => table_for::<Rgb565>(),
            ColorDepth::Swapped565 => table_for::<Swap565>(),
            ColorDepth::Bgr666 => table_for::<Bgr666>(),
            ColorDepth::Rgb888 => table_for::<Rgb888>(),
            ColorDepth::Bgr888 => table_for::<Bgr888>(),
            ColorDepth::Argb8888 => table_for::<Argb8888>(),
            ColorDepth::Bgra8888 => table_for::<Bgra8888>(),
            ColorDepth::Grayscale8 => table_for::<Gray8>(),
            _ => level_table(dst),
        }
    }

    /// Look up the bound function for a source encoding.
    ///
    /// Indexed and sub-byte sources yield the identity: their raws are
    /// palette indices or levels the cursor resolves itself.
    pub fn get(&self, src: ColorDepth) -> RawConvertFn {
        if src == self.dst {
            return passthrough;
        }
        match src {
            ColorDepth::Rgb332 => self.from_rgb332,
            ColorDepth::Rgb565 => self.from_rgb565,
            ColorDepth::Swapped565 => self.from_swap565,
            ColorDepth::Bgr666 => self.from_bgr666,
            ColorDepth::Rgb888 => self.from_rgb888,
            ColorDepth::Bgr888 => self.from_bgr888,
            ColorDepth::Argb8888 => self.from_argb8888,
            ColorDepth::Bgra8888 => self.from_bgra8888,
            ColorDepth::Grayscale8 => self.from_gray8,
            ColorDepth::Grayscale1
            | ColorDepth::Grayscale2
            | ColorDepth::Grayscale4
            | ColorDepth::Palette1
            | ColorDepth::Palette2
            | ColorDepth::Palette4
            | ColorDepth::Palette8 => passthrough,
        }
    }

    /// Convert one raw value through the bound table.
    #[inline]
    pub fn convert_from(&self, src: ColorDepth, raw: u32) -> u32 {
        (self.get(src))(raw)
    }
}

/// One-shot conversion between arbitrary encodings. Total: any pair the
/// table does not specialize pivots through [`CanonicalColor`].
pub fn convert(dst: ColorDepth, src: ColorDepth, raw: u32) -> u32 {
    if dst == src {
        return raw;
    }
    ConversionTable::build(dst).convert_from(src, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_identity_per_depth() {
        // convert(E, E, v) == v for representable v
        for depth in [
            ColorDepth::Rgb332,
            ColorDepth::Rgb565,
            ColorDepth::Swapped565,
            ColorDepth::Rgb888,
            ColorDepth::Bgr888,
            ColorDepth::Argb8888,
            ColorDepth::Grayscale8,
            ColorDepth::Palette4,
        ] {
            for v in [0u32, 1, 0x5A, 0xF800, 0xFFFF, 0xFF_FFFF, 0xDEAD_BEEF] {
                let v = v & depth.bit_mask();
                assert_eq!(convert(depth, depth, v), v, "{depth:?}");
            }
        }
    }

    #[test]
    fn widen_narrow_recovers_original() {
        // narrow(widen(v)) == v across every 565 value's red channel
        for r5 in 0u32..32 {
            let narrow = r5 << 11;
            let wide = convert(ColorDepth::Rgb888, ColorDepth::Rgb565, narrow);
            assert_eq!(convert(ColorDepth::Rgb565, ColorDepth::Rgb888, wide), narrow);
        }
        for v in 0u32..=255 {
            let wide = convert(ColorDepth::Rgb888, ColorDepth::Rgb332, v);
            assert_eq!(convert(ColorDepth::Rgb332, ColorDepth::Rgb888, wide), v);
        }
    }

    #[test]
    fn pure_red_565_to_888() {
        assert_eq!(
            convert(ColorDepth::Rgb888, ColorDepth::Rgb565, 0xF800),
            0xFF0000
        );
    }

    #[test]
    fn swapped_pair_is_byteswap() {
        assert_eq!(
            convert(ColorDepth::Swapped565, ColorDepth::Rgb565, 0xF800),
            0x00F8
        );
        assert_eq!(
            convert(ColorDepth::Rgb565, ColorDepth::Swapped565, 0x00F8),
            0xF800
        );
    }

    #[test]
    fn table_rebinds_on_depth_change() {
        let t16 = ConversionTable::build(ColorDepth::Swapped565);
        let t24 = ConversionTable::build(ColorDepth::Bgr888);
        assert_eq!(t16.convert_from(ColorDepth::Rgb888, 0xFF0000), 0x00F8);
        assert_eq!(t24.convert_from(ColorDepth::Rgb888, 0xFF0000), 0x0000FF);
    }

    #[test]
    fn sub_byte_destination_quantizes_luma() {
        // white -> top level, black -> 0
        assert_eq!(
            convert(ColorDepth::Grayscale4, ColorDepth::Rgb888, 0xFFFFFF),
            0xF
        );
        assert_eq!(convert(ColorDepth::Grayscale4, ColorDepth::Rgb888, 0), 0);
        assert_eq!(
            convert(ColorDepth::Grayscale1, ColorDepth::Rgb565, 0xFFFF),
            1
        );
    }

    #[test]
    fn alpha_source_reaches_rgb_destinations() {
        let raw = 0x80FF_0000; // half-alpha red
        assert_eq!(
            convert(ColorDepth::Rgb565, ColorDepth::Argb8888, raw),
            0xF800
        );
    }

    #[test]
    fn bgr666_source_widens_instead_of_passing_through() {
        // pure red: 6-bit 0x3F widens to 0xFC
        assert_eq!(
            convert(ColorDepth::Rgb888, ColorDepth::Bgr666, 0x3F),
            0xFC0000
        );
        assert_eq!(
            convert(ColorDepth::Rgb565, ColorDepth::Bgr666, 0x3F),
            0xF800
        );
    }

    #[test]
    fn bgra_source_keeps_its_own_channel_order() {
        let red = Bgra8888::from_argb(0xFF, 0xFF, 0, 0).to_raw();
        assert_eq!(convert(ColorDepth::Rgb565, ColorDepth::Bgra8888, red), 0xF800);
        assert_eq!(
            convert(ColorDepth::Rgb888, ColorDepth::Bgra8888, red),
            0xFF0000
        );
    }

    #[test]
    fn every_source_depth_converts_totally() {
        // white in each source encoding lands on white (or the top level)
        let t = ConversionTable::build(ColorDepth::Rgb888);
        let cases = [
            (ColorDepth::Rgb332, 0xFF),
            (ColorDepth::Rgb565, 0xFFFF),
            (ColorDepth::Swapped565, 0xFFFF),
            (ColorDepth::Bgr888, 0xFF_FFFF),
            (ColorDepth::Argb8888, 0xFFFF_FFFF),
            (ColorDepth::Bgra8888, 0xFFFF_FFFF),
            (ColorDepth::Grayscale8, 0xFF),
        ];
        for (src, raw) in cases {
            assert_eq!(t.convert_from(src, raw), 0xFF_FFFF, "{src:?}");
        }
        // 666 widens with a shift, so its top value tops out at 0xFC
        assert_eq!(t.convert_from(ColorDepth::Bgr666, 0x3F_3F3F), 0xFC_FCFC);
        // indexed raws pass through untouched
        assert_eq!(t.convert_from(ColorDepth::Palette4, 0x7), 0x7);
        assert_eq!(t.convert_from(ColorDepth::Grayscale2, 0x3), 0x3);
    }
}
