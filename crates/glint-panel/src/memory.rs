//! In-memory framebuffer panel
//!
//! [`MemoryPanel`] owns a flat byte buffer in the panel's memory
//! orientation and implements the whole [`Panel`] pipeline against it.
//! Hardware is reached only through the [`Bus`] at flush time, which is
//! what makes this type double as the framebuffer stage in front of a
//! streamed controller and as the reference panel in host tests.
//!
//! The buffer is addressed row-major at the configured write depth (whole
//! bytes per pixel; packed sub-byte framebuffers belong to the concrete
//! driver that owns their layout). Rectangles are caller-clipped, matching
//! the `_preclipped` contract; checked slice indexing turns a violated
//! precondition into a panic rather than a neighbouring-row write.

use embedded_graphics::primitives::Rectangle;
use glint_pixel::{ColorDepth, ConversionTable, PixelCursor};

use crate::bus::Bus;
use crate::dirty::DirtyRegion;
use crate::error::PanelError;
use crate::panel::Panel;
use crate::transform::{Rotation, Transform};

/// Geometry and flush policy of one panel instance.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// Memory-orientation width in pixels.
    pub panel_width: u32,
    /// Memory-orientation height in pixels.
    pub panel_height: u32,
    /// How the glass is mounted relative to memory; composed into every
    /// user rotation.
    pub offset_rotation: Rotation,
    /// Flush automatically when the outermost write transaction closes.
    pub auto_display: bool,
}

impl PanelConfig {
    /// Plain panel: no mounting offset, explicit flushes.
    pub const fn new(panel_width: u32, panel_height: u32) -> Self {
        Self {
            panel_width,
            panel_height,
            offset_rotation: Rotation::new(0),
            auto_display: false,
        }
    }
}

/// Framebuffer-backed panel over storage `S`, flushed through bus `B`.
pub struct MemoryPanel<S, B> {
    cfg: PanelConfig,
    buffer: S,
    bus: B,
    rotation: Rotation,
    transform: Transform,
    write_depth: ColorDepth,
    table: ConversionTable,
    start_count: u32,
    xs: u32,
    xe: u32,
    ys: u32,
    ye: u32,
    xpos: u32,
    ypos: u32,
    dirty: DirtyRegion,
}

impl<S, B> MemoryPanel<S, B>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
    B: Bus,
{
    /// Default storage encoding; the depth most controllers stream.
    pub const DEFAULT_DEPTH: ColorDepth = ColorDepth::Swapped565;

    /// Wrap `buffer` as a panel. The buffer must hold
    /// `panel_width * panel_height` pixels at the write depth.
    pub fn new(cfg: PanelConfig, buffer: S, bus: B) -> Self {
        let write_depth = Self::DEFAULT_DEPTH;
        debug_assert!(cfg.panel_width > 0 && cfg.panel_height > 0);
        debug_assert!(
            buffer.as_ref().len()
                >= (cfg.panel_width * cfg.panel_height) as usize * write_depth.bytes()
        );
        let transform = Transform::new(
            cfg.panel_width,
            cfg.panel_height,
            Rotation::new(0).compose(cfg.offset_rotation),
        );
        let mut panel = Self {
            cfg,
            buffer,
            bus,
            rotation: Rotation::new(0),
            transform,
            write_depth,
            table: ConversionTable::build(write_depth),
            start_count: 0,
            xs: 0,
            xe: 0,
            ys: 0,
            ye: 0,
            xpos: 0,
            ypos: 0,
            dirty: DirtyRegion::new(),
        };
        panel.reset_window();
        panel
    }

    /// The conversion table bound to the current write depth.
    pub fn conversion(&self) -> &ConversionTable {
        &self.table
    }

    /// Convert a raw color from `src_depth` into the write depth.
    pub fn prepare_raw(&self, src_depth: ColorDepth, raw: u32) -> u32 {
        self.table.convert_from(src_depth, raw)
    }

    /// The backing pixel bytes, memory orientation, row-major.
    pub fn framebuffer(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// The bus behind this panel.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutable access to the bus (test scripting, controller commands).
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Dirty bounding box in memory coordinates, if any.
    pub fn dirty_rect(&self) -> Option<Rectangle> {
        self.dirty.to_rect()
    }

    /// Raw pixel value at memory coordinates, for inspection.
    pub fn raw_at(&self, mx: u32, my: u32) -> u32 {
        let bytes = self.write_depth.bytes();
        let off = (my as usize * self.cfg.panel_width as usize + mx as usize) * bytes;
        let mut raw = 0u32;
        for (i, b) in self.buffer.as_ref()[off..off + bytes].iter().enumerate() {
            raw |= u32::from(*b) << (8 * i);
        }
        raw
    }

    fn stride_bytes(&self) -> usize {
        self.cfg.panel_width as usize * self.write_depth.bytes()
    }

    fn row_range(&self, my: u32) -> core::ops::Range<usize> {
        let stride = self.stride_bytes();
        let start = my as usize * stride;
        start..start + stride
    }

    fn reset_window(&mut self) {
        self.xs = 0;
        self.ys = 0;
        self.xe = self.transform.width() - 1;
        self.ye = self.transform.height() - 1;
        self.xpos = 0;
        self.ypos = 0;
    }

    fn store_raw(row: &mut [u8], bytes: usize, index: usize, raw: u32) {
        let off = index * bytes;
        for (i, b) in row[off..off + bytes].iter_mut().enumerate() {
            *b = (raw >> (8 * i)) as u8;
        }
    }

    fn flush_rect(&mut self, rect: Rectangle) -> Result<(), PanelError> {
        let bytes = self.write_depth.bytes();
        let stride = self.stride_bytes();
        let x = rect.top_left.x.max(0) as usize;
        let y = rect.top_left.y.max(0) as usize;
        let w = (rect.size.width as usize).min(self.cfg.panel_width as usize - x);
        let h = (rect.size.height as usize).min(self.cfg.panel_height as usize - y);

        self.bus.wait()?;
        let own_transaction = self.start_count == 0;
        let Self { buffer, bus, .. } = self;
        let buf = buffer.as_ref();
        if own_transaction {
            bus.begin_transaction();
        }
        let mut result = Ok(());
        for row in 0..h {
            let off = (y + row) * stride + x * bytes;
            if let Err(e) = bus.write_bytes(&buf[off..off + w * bytes], true) {
                result = Err(e.into());
                break;
            }
        }
        if own_transaction {
            bus.end_transaction();
        }
        result
    }
}

impl<S, B> Panel for MemoryPanel<S, B>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
    B: Bus,
{
    fn width(&self) -> u32 {
        self.transform.width()
    }

    fn height(&self) -> u32 {
        self.transform.height()
    }

    fn rotation(&self) -> Rotation {
        self.rotation
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        self.transform = Transform::new(
            self.cfg.panel_width,
            self.cfg.panel_height,
            rotation.compose(self.cfg.offset_rotation),
        );
        self.reset_window();
    }

    fn color_depth(&self) -> ColorDepth {
        self.write_depth
    }

    fn set_color_depth(&mut self, depth: ColorDepth) {
        debug_assert!(!depth.is_sub_byte());
        debug_assert!(
            self.buffer.as_ref().len()
                >= (self.cfg.panel_width * self.cfg.panel_height) as usize * depth.bytes()
        );
        self.write_depth = depth;
        self.table = ConversionTable::build(depth);
    }

    fn begin_write(&mut self) {
        if self.start_count == 0 {
            self.bus.begin_transaction();
        }
        self.start_count += 1;
    }

    fn end_write(&mut self) -> Result<(), PanelError> {
        if self.start_count == 0 {
            return Ok(());
        }
        self.start_count -= 1;
        if self.start_count == 0 {
            self.bus.end_transaction();
            if self.cfg.auto_display {
                self.display(None)?;
            }
        }
        Ok(())
    }

    fn set_window(&mut self, xs: u32, ys: u32, xe: u32, ye: u32) {
        let xmax = self.transform.width() - 1;
        let ymax = self.transform.height() - 1;
        self.xs = xs.min(xmax);
        self.xe = xe.min(xmax);
        self.ys = ys.min(ymax);
        self.ye = ye.min(ymax);
        self.xpos = self.xs;
        self.ypos = self.ys;
    }

    fn draw_pixel(&mut self, x: u32, y: u32, raw: u32) {
        let (mx, my) = self.transform.point_to_memory(x, y);
        let bytes = self.write_depth.bytes();
        let range = self.row_range(my);
        let row = &mut self.buffer.as_mut()[range];
        Self::store_raw(row, bytes, mx as usize, raw);
        self.dirty.mark_point(mx as i32, my as i32);
    }

    fn fill_rect_preclipped(&mut self, x: u32, y: u32, w: u32, h: u32, raw: u32) {
        if w == 0 || h == 0 {
            return;
        }
        let (mx, my, mw, mh) = self.transform.rect_to_memory(x, y, w, h);
        let bytes = self.write_depth.bytes();
        for yy in my..my + mh {
            let range = self.row_range(yy);
            let row = &mut self.buffer.as_mut()[range];
            for xx in mx..mx + mw {
                Self::store_raw(row, bytes, xx as usize, raw);
            }
        }
        self.dirty.mark_rect(mx as i32, my as i32, mw, mh);
    }

    fn write_block(&mut self, raw: u32, mut length: u32) {
        while length != 0 {
            let mut h = 1;
            let w = length.min(self.xe + 1 - self.xpos);
            if length >= w * 2 && self.xpos == self.xs {
                h = (length / w).min(self.ye + 1 - self.ypos);
            }
            self.fill_rect_preclipped(self.xpos, self.ypos, w, h, raw);
            self.xpos += w;
            if self.xpos <= self.xe {
                return;
            }
            self.xpos = self.xs;
            self.ypos += h;
            if self.ye < self.ypos {
                self.ypos = self.ys;
            }
            length -= w * h;
        }
    }

    fn write_image(&mut self, x: u32, y: u32, w: u32, h: u32, cursor: &mut PixelCursor<'_>) {
        if w == 0 || h == 0 {
            return;
        }
        let bytes = self.write_depth.bytes();
        let rotation = self.transform.rotation();

        if rotation.is_identity() && cursor.is_passthrough() {
            // raw row copies; required on latency-sensitive panels
            let src = cursor.source();
            let src_stride = cursor.src_stride as usize * bytes;
            let wb = w as usize * bytes;
            let mut src_off =
                (cursor.src_y() as usize * cursor.src_stride as usize + cursor.src_x() as usize)
                    * bytes;
            for yy in y..y + h {
                let range = self.row_range(yy);
                let row = &mut self.buffer.as_mut()[range];
                row[x as usize * bytes..][..wb].copy_from_slice(&src[src_off..src_off + wb]);
                src_off += src_stride;
            }
            self.dirty.mark_rect(x as i32, y as i32, w, h);
            return;
        }

        let mut nextx: u32 = 0;
        let mut nexty: u32 = 1 << PixelCursor::FP_SCALE;
        let (x, y, w, h) = if rotation.is_identity() {
            (x, y, w, h)
        } else {
            self.transform
                .rect_to_memory_with_cursor(x, y, w, h, cursor, &mut nextx, &mut nexty)
        };
        let mut sx32 = cursor.src_x32;
        let mut sy32 = cursor.src_y32;
        for yy in y..y + h {
            let range = self.row_range(yy);
            let row = &mut self.buffer.as_mut()[range];
            let end = x + w;
            let mut pos = x;
            loop {
                pos = cursor.copy(row, pos, end);
                if pos == end {
                    break;
                }
                pos = cursor.skip(pos, end);
                if pos == end {
                    break;
                }
            }
            sx32 = sx32.wrapping_add(nextx);
            sy32 = sy32.wrapping_add(nexty);
            cursor.src_x32 = sx32;
            cursor.src_y32 = sy32;
        }
        self.dirty.mark_rect(x as i32, y as i32, w, h);
    }

    fn write_image_argb(&mut self, x: u32, y: u32, w: u32, h: u32, cursor: &mut PixelCursor<'_>) {
        if w == 0 || h == 0 {
            return;
        }
        let rotation = self.transform.rotation();
        let mut nextx: u32 = 0;
        let mut nexty: u32 = 1 << PixelCursor::FP_SCALE;
        let (x, y, w, h) = if rotation.is_identity() {
            (x, y, w, h)
        } else {
            self.transform
                .rect_to_memory_with_cursor(x, y, w, h, cursor, &mut nextx, &mut nexty)
        };
        let mut sx32 = cursor.src_x32;
        let mut sy32 = cursor.src_y32;
        for yy in y..y + h {
            let range = self.row_range(yy);
            let row = &mut self.buffer.as_mut()[range];
            cursor.copy(row, x, x + w);
            sx32 = sx32.wrapping_add(nextx);
            sy32 = sy32.wrapping_add(nexty);
            cursor.src_x32 = sx32;
            cursor.src_y32 = sy32;
        }
        self.dirty.mark_rect(x as i32, y as i32, w, h);
    }

    fn write_pixel_stream(&mut self, cursor: &mut PixelCursor<'_>, mut length: u32) {
        if length == 0 {
            return;
        }
        let rotation = self.transform.rotation();
        let (mut xs, mut xe) = (self.xs, self.xe);
        let (mut ys, mut ye) = (self.ys, self.ye);
        let mut x = self.xpos;
        let mut y = self.ypos;

        if rotation.is_identity() {
            loop {
                let linelength = (xe - x + 1).min(length);
                let range = self.row_range(y);
                let row = &mut self.buffer.as_mut()[range];
                cursor.copy(row, x, x + linelength);
                self.dirty.mark_rect(x as i32, y as i32, linelength, 1);
                x += linelength;
                if x > xe {
                    x = xs;
                    y = if y != ye { y + 1 } else { ys };
                }
                length -= linelength;
                if length == 0 {
                    break;
                }
            }
            self.xpos = x;
            self.ypos = y;
            return;
        }

        let mut ax: i32 = 1;
        let mut ay: i32 = 1;
        if rotation.mirrors_y() {
            let hh = self.transform.height();
            y = hh - (y + 1);
            ys = hh - (ys + 1);
            ye = hh - (ye + 1);
            ay = -1;
        }
        if rotation.mirrors_x() {
            let ww = self.transform.width();
            x = ww - (x + 1);
            xs = ww - (xs + 1);
            xe = ww - (xe + 1);
            ax = -1;
        }

        if rotation.swaps_axes() {
            // buffer row is the (mirrored) logical X, column the logical Y
            loop {
                let range = self.row_range(x);
                let row = &mut self.buffer.as_mut()[range];
                cursor.copy(row, y, y + 1);
                self.dirty.mark_point(y as i32, x as i32);
                if x != xe {
                    x = x.wrapping_add_signed(ax);
                } else {
                    x = xs;
                    y = if y != ye { y.wrapping_add_signed(ay) } else { ys };
                }
                length -= 1;
                if length == 0 {
                    break;
                }
            }
        } else {
            loop {
                let range = self.row_range(y);
                let row = &mut self.buffer.as_mut()[range];
                cursor.copy(row, x, x + 1);
                self.dirty.mark_point(x as i32, y as i32);
                if x != xe {
                    x = x.wrapping_add_signed(ax);
                } else {
                    x = xs;
                    y = if y != ye { y.wrapping_add_signed(ay) } else { ys };
                }
                length -= 1;
                if length == 0 {
                    break;
                }
            }
        }

        if rotation.mirrors_y() {
            y = self.transform.height() - (y + 1);
        }
        if rotation.mirrors_x() {
            x = self.transform.width() - (x + 1);
        }
        self.xpos = x;
        self.ypos = y;
    }

    fn read_rect(&self, x: u32, y: u32, w: u32, h: u32, dst: &mut [u8], dst_depth: ColorDepth) {
        if w == 0 || h == 0 {
            return;
        }
        let rotation = self.transform.rotation();
        let buf = self.buffer.as_ref();
        let stride = self.stride_bytes();
        let bytes = self.write_depth.bytes();

        if rotation.is_identity() && dst_depth == self.write_depth {
            let wb = w as usize * bytes;
            let mut out = 0;
            for yy in y..y + h {
                let off = yy as usize * stride + x as usize * bytes;
                dst[out..out + wb].copy_from_slice(&buf[off..off + wb]);
                out += wb;
            }
            return;
        }

        let mut addx: i32 = 1;
        let mut addy: i32 = 1;
        let mut x_add: u32 = 1 << PixelCursor::FP_SCALE;
        let mut y_add: u32 = 0;
        let (mut x, mut y, mut w, mut h) = (x, y, w, h);
        let mut wlen: u32 = 1;
        if !rotation.is_identity() {
            if rotation.mirrors_x() {
                x = self.transform.width() - (x + 1);
                x_add = x_add.wrapping_neg();
                addx = -1;
            }
            if rotation.mirrors_y() {
                y = self.transform.height() - (y + 1);
                addy = -1;
            }
            if rotation.swaps_axes() {
                core::mem::swap(&mut x, &mut y);
                core::mem::swap(&mut w, &mut h);
                core::mem::swap(&mut addx, &mut addy);
                core::mem::swap(&mut wlen, &mut w);
                core::mem::swap(&mut x_add, &mut y_add);
            }
        }

        let y_end = (y as i32) + (h as i32) * addy;
        let mut pos: u32 = 0;
        let y_first = y;
        loop {
            let mut yy = y_first as i32;
            let x32 = x << PixelCursor::FP_SCALE;
            loop {
                let row_off = yy as usize * stride;
                let row = &buf[row_off..row_off + stride];
                let mut cursor =
                    PixelCursor::new(row, dst_depth, self.write_depth, false, None, None);
                cursor.set_source_size(self.cfg.panel_width, 1, self.cfg.panel_width);
                cursor.src_x32 = x32;
                cursor.src_x32_add = x_add;
                cursor.src_y32_add = y_add;
                cursor.copy(dst, pos, pos + w);
                pos += w;
                yy += addy;
                if yy == y_end {
                    break;
                }
            }
            x = x.wrapping_add_signed(addx);
            wlen -= 1;
            if wlen == 0 {
                break;
            }
        }
    }

    fn copy_rect(&mut self, dst_x: u32, dst_y: u32, w: u32, h: u32, src_x: u32, src_y: u32) {
        if w == 0 || h == 0 {
            return;
        }
        let (mut sx, mut sy, mut dx, mut dy, mut w, mut h) = (src_x, src_y, dst_x, dst_y, w, h);
        let rotation = self.transform.rotation();
        if !rotation.is_identity() {
            if rotation.mirrors_y() {
                let hh = self.transform.height();
                sy = hh - (sy + h);
                dy = hh - (dy + h);
            }
            if rotation.mirrors_x() {
                let ww = self.transform.width();
                sx = ww - (sx + w);
                dx = ww - (dx + w);
            }
            if rotation.swaps_axes() {
                core::mem::swap(&mut sx, &mut sy);
                core::mem::swap(&mut dx, &mut dy);
                core::mem::swap(&mut w, &mut h);
            }
        }
        let bytes = self.write_depth.bytes();
        let stride = self.stride_bytes();
        let len = w as usize * bytes;
        // bottom-up when the destination is below the source, so
        // overlapping rows are read before they are overwritten
        let downward = sy < dy;
        let buf = self.buffer.as_mut();
        for i in 0..h {
            let row = if downward { h - 1 - i } else { i };
            let s = (sy + row) as usize * stride + sx as usize * bytes;
            let d = (dy + row) as usize * stride + dx as usize * bytes;
            buf.copy_within(s..s + len, d);
        }
        self.dirty.mark_rect(dx as i32, dy as i32, w, h);
    }

    fn display(&mut self, region: Option<Rectangle>) -> Result<(), PanelError> {
        let mut want = self.dirty;
        if let Some(r) = region {
            let (mx, my, mw, mh) = self.transform.rect_to_memory(
                r.top_left.x.max(0) as u32,
                r.top_left.y.max(0) as u32,
                r.size.width,
                r.size.height,
            );
            want.mark_rect(mx as i32, my as i32, mw, mh);
        }
        let Some(rect) = want.to_rect() else {
            return Ok(());
        };
        self.flush_rect(rect)?;
        self.dirty.reset();
        Ok(())
    }
}
