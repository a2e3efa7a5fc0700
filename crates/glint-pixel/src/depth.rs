//! Color depth descriptors
//!
//! A [`ColorDepth`] names one pixel encoding: bit width, byte order and
//! whether the stored value is a palette index. It is a closed enum on
//! purpose; an unsupported depth is a compile error, not a runtime check.

/// Byte order of a multi-byte encoding as it sits in memory.
///
/// `Swapped` is the order most SPI controllers consume directly (high byte
/// first on the wire); `Normal` is the host-arithmetic order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ByteOrder {
    /// Host arithmetic order.
    Normal,
    /// Bus transfer order (byte-swapped relative to `Normal`).
    Swapped,
}

/// One supported pixel encoding.
///
/// Compared by value throughout the engine; identical source and destination
/// depths enable the zero-cost passthrough path.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorDepth {
    /// 1-bit luminance (fore/back expanded on copy).
    Grayscale1,
    /// 2-bit luminance.
    Grayscale2,
    /// 4-bit luminance.
    Grayscale4,
    /// 8-bit luminance.
    Grayscale8,
    /// 1-bit palette index (2 colors).
    Palette1,
    /// 2-bit palette index (4 colors).
    Palette2,
    /// 4-bit palette index (16 colors).
    Palette4,
    /// 8-bit palette index (256 colors).
    Palette8,
    /// RRRGGGBB in one byte.
    Rgb332,
    /// RGB565, byte-swapped for bus transfer.
    Swapped565,
    /// RGB565 in host order.
    Rgb565,
    /// 18-bit color, one channel per byte, six significant bits each
    /// (`__RRRRRR __GGGGGG __BBBBBB` as some OLED controllers want it).
    Bgr666,
    /// 24-bit color stored R,G,B (bus order).
    Bgr888,
    /// 24-bit color in host order (raw value `0x00RRGGBB`).
    Rgb888,
    /// 32-bit color with alpha, byte-swapped.
    Bgra8888,
    /// 32-bit color with alpha in host order (raw value `0xAARRGGBB`).
    Argb8888,
}

impl ColorDepth {
    /// Significant bits per pixel.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Grayscale1 | Self::Palette1 => 1,
            Self::Grayscale2 | Self::Palette2 => 2,
            Self::Grayscale4 | Self::Palette4 => 4,
            Self::Grayscale8 | Self::Palette8 | Self::Rgb332 => 8,
            Self::Swapped565 | Self::Rgb565 => 16,
            Self::Bgr666 => 18,
            Self::Bgr888 | Self::Rgb888 => 24,
            Self::Bgra8888 | Self::Argb8888 => 32,
        }
    }

    /// Bytes one pixel occupies in a byte-addressed buffer.
    ///
    /// Sub-byte encodings report 1; their packing is handled by
    /// [`crate::packed`].
    pub const fn bytes(self) -> usize {
        match self.bits() {
            1..=8 => 1,
            16 => 2,
            18 | 24 => 3,
            _ => 4,
        }
    }

    /// Whether the raw value is an index into a palette.
    pub const fn has_palette(self) -> bool {
        matches!(
            self,
            Self::Palette1 | Self::Palette2 | Self::Palette4 | Self::Palette8
        )
    }

    /// Whether the raw value is a luminance level rather than color channels.
    pub const fn is_grayscale(self) -> bool {
        matches!(
            self,
            Self::Grayscale1 | Self::Grayscale2 | Self::Grayscale4 | Self::Grayscale8
        )
    }

    /// Whether several pixels share one byte.
    pub const fn is_sub_byte(self) -> bool {
        self.bits() < 8
    }

    /// Byte order in memory.
    pub const fn byte_order(self) -> ByteOrder {
        match self {
            Self::Swapped565 | Self::Bgr666 | Self::Bgr888 | Self::Bgra8888 => ByteOrder::Swapped,
            _ => ByteOrder::Normal,
        }
    }

    /// Mask covering one raw value of this depth (sub-byte and 8-bit only
    /// meaningful for packed access).
    pub const fn bit_mask(self) -> u32 {
        match self.bits() {
            32 => u32::MAX,
            b => (1 << b) - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_and_bytes_agree() {
        assert_eq!(ColorDepth::Palette4.bits(), 4);
        assert_eq!(ColorDepth::Palette4.bytes(), 1);
        assert_eq!(ColorDepth::Swapped565.bytes(), 2);
        assert_eq!(ColorDepth::Bgr666.bytes(), 3);
        assert_eq!(ColorDepth::Rgb888.bytes(), 3);
        assert_eq!(ColorDepth::Argb8888.bytes(), 4);
    }

    #[test]
    fn palette_flag() {
        assert!(ColorDepth::Palette1.has_palette());
        assert!(!ColorDepth::Grayscale1.has_palette());
        assert!(!ColorDepth::Rgb332.has_palette());
    }

    #[test]
    fn byte_order_split() {
        assert_eq!(ColorDepth::Swapped565.byte_order(), ByteOrder::Swapped);
        assert_eq!(ColorDepth::Rgb565.byte_order(), ByteOrder::Normal);
        assert_eq!(ColorDepth::Bgr888.byte_order(), ByteOrder::Swapped);
        assert_eq!(ColorDepth::Rgb888.byte_order(), ByteOrder::Normal);
    }

    #[test]
    fn equality_is_identity() {
        // identical depths enable the passthrough path
        assert_eq!(ColorDepth::Swapped565, ColorDepth::Swapped565);
        assert_ne!(ColorDepth::Swapped565, ColorDepth::Rgb565);
    }

    #[test]
    fn masks() {
        assert_eq!(ColorDepth::Palette2.bit_mask(), 0b11);
        assert_eq!(ColorDepth::Rgb332.bit_mask(), 0xFF);
        assert_eq!(ColorDepth::Argb8888.bit_mask(), u32::MAX);
    }
}
