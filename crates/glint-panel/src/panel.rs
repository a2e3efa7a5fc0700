//! The panel contract
//!
//! Every concrete panel (in-memory framebuffer, streamed SPI LCD, e-paper
//! with a waveform task behind it) implements [`Panel`]. Drivers differ in
//! how `fill_rect_preclipped` and `write_image` ultimately reach hardware;
//! the coordinate, window and transaction semantics are fixed here.

use embedded_graphics::primitives::Rectangle;
use glint_pixel::{ColorDepth, PixelCursor};

use crate::error::PanelError;
use crate::transform::Rotation;

/// A display panel with a windowed, rotation-aware write pipeline.
///
/// Coordinates in every method are logical (post-rotation). Degenerate
/// rectangles are no-ops. Raw color arguments are in the panel's current
/// write depth.
pub trait Panel {
    /// Logical width under the current rotation.
    fn width(&self) -> u32;
    /// Logical height under the current rotation.
    fn height(&self) -> u32;

    /// Current rotation setting.
    fn rotation(&self) -> Rotation;
    /// Change the rotation. Resets the stream window to the full panel.
    fn set_rotation(&mut self, rotation: Rotation);

    /// Encoding of the panel's pixel storage.
    fn color_depth(&self) -> ColorDepth;
    /// Change the storage encoding. Conversion state bound to the old
    /// depth is rebuilt before this returns.
    fn set_color_depth(&mut self, depth: ColorDepth);

    /// Open a write transaction. Reentrant; only the outermost call
    /// brackets the bus.
    fn begin_write(&mut self);
    /// Close a write transaction. The outermost close triggers an implicit
    /// flush on auto-display panels.
    fn end_write(&mut self) -> Result<(), PanelError>;

    /// Set the streaming window, clipped to logical bounds. Subsequent
    /// [`write_pixel_stream`](Self::write_pixel_stream) and
    /// [`write_block`](Self::write_block) calls wrap within it.
    fn set_window(&mut self, xs: u32, ys: u32, xe: u32, ye: u32);

    /// Write one pixel. The caller has already clipped.
    fn draw_pixel(&mut self, x: u32, y: u32, raw: u32);

    /// Fill a rectangle the caller has already clipped.
    fn fill_rect_preclipped(&mut self, x: u32, y: u32, w: u32, h: u32, raw: u32);

    /// Fill `length` pixels of one color through the window, wrapping at
    /// its right edge.
    fn write_block(&mut self, raw: u32, length: u32);

    /// Blit a rectangle from the cursor's source, alternating copy and
    /// skip runs so transparent pixels leave the destination untouched.
    fn write_image(&mut self, x: u32, y: u32, w: u32, h: u32, cursor: &mut PixelCursor<'_>);

    /// Composite a rectangle of ARGB pixels over the panel's current
    /// contents. The cursor must come from
    /// [`PixelCursor::new_blend`]; alpha 0 leaves pixels untouched.
    fn write_image_argb(&mut self, x: u32, y: u32, w: u32, h: u32, cursor: &mut PixelCursor<'_>);

    /// Stream `length` pixels from the cursor through the window.
    fn write_pixel_stream(&mut self, cursor: &mut PixelCursor<'_>, length: u32);

    /// Read a rectangle back, converted to `dst_depth`, into `dst`.
    fn read_rect(&self, x: u32, y: u32, w: u32, h: u32, dst: &mut [u8], dst_depth: ColorDepth);

    /// Move a rectangle within the panel. Handles overlap.
    fn copy_rect(&mut self, dst_x: u32, dst_y: u32, w: u32, h: u32, src_x: u32, src_y: u32);

    /// Flush accumulated changes to the hardware.
    ///
    /// `region` (logical coordinates) forces extra area into the flush; the
    /// accumulated dirty region is always included. On success the dirty
    /// region resets; on `Timeout` it is retained so a retry retransmits
    /// the same pixels.
    fn display(&mut self, region: Option<Rectangle>) -> Result<(), PanelError>;
}
