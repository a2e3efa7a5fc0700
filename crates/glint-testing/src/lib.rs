//! Headless panel testing utilities
//!
//! A [`TestPanel`] is a [`MemoryPanel`] over heap storage behind a
//! [`RecordingBus`], so a test can draw through the full pipeline, inspect
//! any pixel in logical coordinates, script bus busy/failure behavior and
//! assert on exactly what a flush put on the wire.
//!
//! # Quick start
//!
//! ```
//! use glint_testing::TestPanel;
//! use glint_panel::Panel;
//!
//! let mut t = TestPanel::new(32, 32);
//! t.fill_rect_preclipped(4, 4, 8, 8, 0xFFFF);
//! t.assert_raw(5, 5, 0xFFFF).unwrap();
//! t.assert_raw(3, 4, 0x0000).unwrap();
//!
//! t.display(None).unwrap();
//! assert_eq!(t.bus().flushed_rows(), 8);
//! ```
//!
//! [`TestPanel`] also implements embedded-graphics [`DrawTarget`] for
//! `Rgb565`, so primitives and fonts can be drawn straight onto it.

#![warn(clippy::all)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
// Harness code: indexing into its own sized buffers.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]

use core::convert::Infallible;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use glint_panel::{Bus, BusError, MemoryPanel, Panel, PanelConfig, Rotation};
use glint_pixel::{ColorDepth, PixelCursor, RawPixel, Swap565};

/// A scriptable [`Bus`] that records everything written through it.
#[derive(Debug, Default)]
pub struct RecordingBus {
    /// Every `write_bytes` payload, in order, with its D/C flag.
    pub writes: Vec<(Vec<u8>, bool)>,
    /// Transactions opened so far.
    pub transactions_opened: u32,
    /// Transactions closed so far.
    pub transactions_closed: u32,
    /// Remaining polls for which `is_busy` reports true.
    pub busy_polls: u32,
    /// When true, `wait` reports a timeout instead of draining `busy_polls`.
    pub stuck_busy: bool,
    /// Fail every write with a communication error.
    pub fail_writes: bool,
}

impl RecordingBus {
    /// A bus that is idle and accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data payloads flushed (command writes excluded).
    pub fn flushed_rows(&self) -> usize {
        self.writes.iter().filter(|(_, data)| *data).count()
    }

    /// All data bytes written, concatenated in wire order.
    pub fn data_stream(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (bytes, data) in &self.writes {
            if *data {
                out.extend_from_slice(bytes);
            }
        }
        out
    }

    /// Forget recorded traffic, keeping the scripted behavior.
    pub fn clear(&mut self) {
        self.writes.clear();
        self.transactions_opened = 0;
        self.transactions_closed = 0;
    }
}

impl Bus for RecordingBus {
    fn begin_transaction(&mut self) {
        self.transactions_opened += 1;
    }

    fn end_transaction(&mut self) {
        self.transactions_closed += 1;
    }

    fn write_bytes(&mut self, bytes: &[u8], data: bool) -> Result<(), BusError> {
        if self.fail_writes {
            return Err(BusError::Communication);
        }
        self.writes.push((bytes.to_vec(), data));
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.stuck_busy || self.busy_polls > 0
    }

    fn wait(&mut self) -> Result<(), BusError> {
        if self.stuck_busy {
            return Err(BusError::Timeout);
        }
        self.busy_polls = 0;
        Ok(())
    }
}

/// Mismatch reported by [`TestPanel::assert_raw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMismatch {
    /// Logical position inspected.
    pub x: u32,
    /// Logical position inspected.
    pub y: u32,
    /// Raw value the test expected.
    pub expected: u32,
    /// Raw value actually stored.
    pub actual: u32,
}

impl core::fmt::Display for PixelMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "pixel ({}, {}): expected {:#06X}, found {:#06X}",
            self.x, self.y, self.expected, self.actual
        )
    }
}

impl std::error::Error for PixelMismatch {}

/// A framebuffer panel wired to a [`RecordingBus`], with logical-coordinate
/// inspection helpers.
pub struct TestPanel {
    panel: MemoryPanel<Vec<u8>, RecordingBus>,
}

impl TestPanel {
    /// A `width × height` panel at the default 16-bit depth, zero-filled.
    pub fn new(width: u32, height: u32) -> Self {
        let cfg = PanelConfig::new(width, height);
        let buffer = vec![0u8; (width * height) as usize * 2];
        Self {
            panel: MemoryPanel::new(cfg, buffer, RecordingBus::new()),
        }
    }

    /// Same, with a mounting offset composed into every rotation.
    pub fn with_offset_rotation(width: u32, height: u32, offset: Rotation) -> Self {
        let mut cfg = PanelConfig::new(width, height);
        cfg.offset_rotation = offset;
        let buffer = vec![0u8; (width * height) as usize * 2];
        Self {
            panel: MemoryPanel::new(cfg, buffer, RecordingBus::new()),
        }
    }

    /// The wrapped panel.
    pub fn panel(&self) -> &MemoryPanel<Vec<u8>, RecordingBus> {
        &self.panel
    }

    /// The recorded bus.
    pub fn bus(&self) -> &RecordingBus {
        self.panel.bus()
    }

    /// Script the bus (busy polls, failures).
    pub fn bus_mut(&mut self) -> &mut RecordingBus {
        self.panel.bus_mut()
    }

    /// Raw pixel value at logical coordinates, read back through the
    /// rotation transform.
    pub fn raw_at(&self, x: u32, y: u32) -> u32 {
        let mut out = [0u8; 4];
        let depth = self.panel.color_depth();
        self.panel.read_rect(x, y, 1, 1, &mut out, depth);
        let mut raw = 0u32;
        for (i, b) in out.iter().take(depth.bytes()).enumerate() {
            raw |= u32::from(*b) << (8 * i);
        }
        raw
    }

    /// Assert the raw pixel value at logical coordinates.
    pub fn assert_raw(&self, x: u32, y: u32, expected: u32) -> Result<(), PixelMismatch> {
        let actual = self.raw_at(x, y);
        if actual == expected {
            Ok(())
        } else {
            Err(PixelMismatch { x, y, expected, actual })
        }
    }

    /// Blit `width × height` pixels of `src_depth` source data at `(x, y)`,
    /// building the cursor the way a decoder would.
    pub fn blit(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        src: &[u8],
        src_depth: ColorDepth,
        transparent: Option<u32>,
    ) {
        let mut cursor = PixelCursor::new(
            src,
            self.panel.color_depth(),
            src_depth,
            false,
            None,
            transparent,
        );
        cursor.set_source_size(width, height, width);
        self.panel.write_image(x, y, width, height, &mut cursor);
    }
}

impl core::ops::Deref for TestPanel {
    type Target = MemoryPanel<Vec<u8>, RecordingBus>;

    fn deref(&self) -> &Self::Target {
        &self.panel
    }
}

impl core::ops::DerefMut for TestPanel {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.panel
    }
}

impl OriginDimensions for TestPanel {
    fn size(&self) -> Size {
        Size::new(self.panel.width(), self.panel.height())
    }
}

impl DrawTarget for TestPanel {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (w, h) = (self.panel.width() as i32, self.panel.height() as i32);
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 || point.x >= w || point.y >= h {
                continue;
            }
            let raw = u32::from(RawU16::from(color).into_inner());
            let converted = self.panel.prepare_raw(ColorDepth::Rgb565, raw);
            self.panel
                .draw_pixel(point.x as u32, point.y as u32, converted);
        }
        Ok(())
    }
}

/// Convenience: host-order RGB565 to the panel's default swapped storage.
pub fn swap565(raw565: u16) -> u32 {
    Swap565::from_raw(u32::from(raw565.swap_bytes())).to_raw()
}
