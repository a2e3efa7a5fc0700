//! Pixel format model and copy engine for embedded displays
//!
//! This crate is the format-agnostic half of the display stack: it knows how
//! color encodings relate to each other, and how to move runs of pixels
//! between buffers that disagree about encoding, packing, scale or
//! transparency. It never touches hardware.
//!
//! # Layers
//!
//! ```text
//! Panel write pipeline (glint-panel)
//!         ↓
//! PixelCursor (this crate - copy/skip runs, fixed-point stepping)
//!         ↓
//! ConversionTable / RawPixel types (this crate - per-encoding math)
//! ```
//!
//! # Conversion model
//!
//! Every concrete encoding pivots through [`CanonicalColor`] (32-bit ARGB).
//! Widening replicates bits (5-bit `v` becomes `(v << 3) | (v >> 2)`, not
//! `v << 3`) so colors survive round trips through narrower storage without
//! drifting darker; narrowing truncates.
//!
//! # Features
//!
//! - `defmt`: derive `defmt::Format` on public value types

// ── Lint policy ─────────────────────────────────────────────────────────────
// The inner copy loops are offset arithmetic over caller-validated
// rectangles; the bounds audit lives at the public entry points
// (debug_assert + checked slice indexing, which panics instead of aliasing).
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod color;
pub mod convert;
pub mod cursor;
pub mod depth;
pub mod packed;

pub use color::{
    convert_raw, Argb8888, Bgr666, Bgr888, Bgra8888, CanonicalColor, Gray8, RawPixel, Rgb332,
    Rgb565, Rgb888, Swap565,
};
pub use convert::{convert, ConversionTable, RawConvertFn};
pub use cursor::PixelCursor;
pub use depth::{ByteOrder, ColorDepth};
pub use packed::{PackedRow, PackedRowMut};
