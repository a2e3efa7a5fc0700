//! Bit-packed row views for sub-byte pixels
//!
//! 1/2/4-bit pixels pack most-significant-first within each byte (pixel 0
//! occupies the top bits), the order every packed framebuffer in the driver
//! family uses. Writes are read-modify-write so the neighbouring pixels in
//! the same byte survive.

/// Read-only view of a packed pixel row.
#[derive(Debug, Copy, Clone)]
pub struct PackedRow<'a> {
    data: &'a [u8],
    bits: u32,
    mask: u8,
}

impl<'a> PackedRow<'a> {
    /// View `data` as pixels of `bits` width (1, 2, 4 or 8).
    pub fn new(data: &'a [u8], bits: u32) -> Self {
        debug_assert!(matches!(bits, 1 | 2 | 4 | 8));
        Self {
            data,
            bits,
            mask: (((1u32 << bits) - 1) & 0xFF) as u8,
        }
    }

    /// Raw value of the pixel at `index`. Panics if `index` is past the row.
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        let bitpos = index * self.bits as usize;
        let shift = 8 - (bitpos & 7) - self.bits as usize;
        (self.data[bitpos >> 3] >> shift) & self.mask
    }
}

/// Mutable view of a packed pixel row.
#[derive(Debug)]
pub struct PackedRowMut<'a> {
    data: &'a mut [u8],
    bits: u32,
    mask: u8,
}

impl<'a> PackedRowMut<'a> {
    /// View `data` as pixels of `bits` width (1, 2, 4 or 8).
    pub fn new(data: &'a mut [u8], bits: u32) -> Self {
        debug_assert!(matches!(bits, 1 | 2 | 4 | 8));
        Self {
            data,
            bits,
            mask: (((1u32 << bits) - 1) & 0xFF) as u8,
        }
    }

    /// Raw value of the pixel at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        PackedRow::new(self.data, self.bits).get(index)
    }

    /// Overwrite the pixel at `index`, leaving its byte-mates untouched.
    #[inline]
    pub fn set(&mut self, index: usize, raw: u8) {
        let bitpos = index * self.bits as usize;
        let shift = 8 - (bitpos & 7) - self.bits as usize;
        let byte = &mut self.data[bitpos >> 3];
        *byte = (*byte & !(self.mask << shift)) | ((raw & self.mask) << shift);
    }
}
