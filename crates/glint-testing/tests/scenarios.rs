//! Full-stack scenarios: embedded-graphics drawing through the panel
//! pipeline down to recorded bus traffic.

#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use glint_panel::{Panel, PanelError, RefreshQueue, Rotation};
use glint_pixel::{ColorDepth, RawPixel, Rgb888};
use glint_testing::TestPanel;

#[test]
fn primitives_draw_through_the_pipeline() {
    let mut t = TestPanel::new(64, 64);
    Rectangle::new(Point::new(10, 10), Size::new(8, 4))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
        .draw(&mut t)
        .unwrap();

    t.assert_raw(10, 10, 0x00F8).unwrap();
    t.assert_raw(17, 13, 0x00F8).unwrap();
    t.assert_raw(18, 10, 0x0000).unwrap();
    assert_eq!(
        t.dirty_rect(),
        Some(Rectangle::new(Point::new(10, 10), Size::new(8, 4)))
    );
}

#[test]
fn rotated_drawing_reads_back_where_it_was_drawn() {
    for r in 0..8u8 {
        let mut t = TestPanel::new(48, 32);
        t.set_rotation(Rotation::new(r));
        Rectangle::new(Point::new(3, 5), Size::new(4, 2))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
            .draw(&mut t)
            .unwrap();
        // logical read-back goes through the same transform as the write
        t.assert_raw(3, 5, 0xFFFF).unwrap();
        t.assert_raw(6, 6, 0xFFFF).unwrap();
        t.assert_raw(7, 5, 0x0000).unwrap();
        t.assert_raw(2, 5, 0x0000).unwrap();
    }
}

#[test]
fn converted_blit_then_flush_puts_swapped_bytes_on_the_wire() {
    let mut t = TestPanel::new(16, 16);

    // one row of RGB888 pixels: red, green, blue
    let mut src = [0u8; 9];
    Rgb888(0xFF0000).store(&mut src[0..]);
    Rgb888(0x00FF00).store(&mut src[3..]);
    Rgb888(0x0000FF).store(&mut src[6..]);
    t.blit(0, 0, 3, 1, &src, ColorDepth::Rgb888, None);

    t.display(None).unwrap();
    // wire order is the panel's byte-swapped 565: high byte first
    assert_eq!(t.bus().data_stream(), vec![0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F]);
    assert_eq!(t.bus().transactions_opened, 1);
    assert_eq!(t.bus().transactions_closed, 1);
}

#[test]
fn masked_blit_skips_the_transparent_key() {
    let mut t = TestPanel::new(8, 8);
    t.fill_rect_preclipped(0, 0, 8, 8, 0xE007); // green field

    // RGB332 source, key 0x00
    let src = [0xE0u8, 0x00, 0xE0, 0x00]; // red, key, red, key
    t.blit(2, 2, 4, 1, &src, ColorDepth::Rgb332, Some(0x00));

    let red = t.prepare_raw(ColorDepth::Rgb332, 0xE0);
    t.assert_raw(2, 2, red).unwrap();
    t.assert_raw(3, 2, 0xE007).unwrap();
    t.assert_raw(4, 2, red).unwrap();
    t.assert_raw(5, 2, 0xE007).unwrap();
}

#[test]
fn failed_flush_retries_cleanly() {
    let mut t = TestPanel::new(8, 8);
    t.fill_rect_preclipped(1, 1, 2, 2, 0xABCD);

    t.bus_mut().stuck_busy = true;
    assert_eq!(t.display(None), Err(PanelError::Timeout));
    assert!(t.dirty_rect().is_some(), "dirty retained after timeout");
    assert_eq!(t.bus().flushed_rows(), 0);

    t.bus_mut().stuck_busy = false;
    assert_eq!(t.display(None), Ok(()));
    assert_eq!(t.bus().flushed_rows(), 2);
    assert_eq!(t.dirty_rect(), None);
}

#[test]
fn refresh_queue_carries_updates_between_draw_and_waveform_sides() {
    let mut t = TestPanel::new(32, 32);
    let mut queue: RefreshQueue<4> = RefreshQueue::new();

    // foreground: draw, then hand the dirty box to the background task
    t.fill_rect_preclipped(4, 4, 8, 8, 0xFFFF);
    let Some(dirty) = t.dirty_rect() else {
        panic!("draw left no dirty region");
    };
    let generation = queue.submit(dirty).unwrap();

    // background: consume and flush exactly that region
    let Some(request) = queue.pop() else {
        panic!("request lost");
    };
    assert_eq!(request.generation, generation);
    assert!(!queue.is_stale(&request));
    t.display(Some(request.region)).unwrap();
    assert_eq!(t.bus().flushed_rows(), 8);

    // new drawing supersedes anything still stamped with the old generation
    queue.advance_generation();
    assert!(queue.is_stale(&request));
}

#[test]
fn queue_backpressure_rejects_when_full() {
    let mut queue: RefreshQueue<2> = RefreshQueue::new();
    let r = Rectangle::new(Point::zero(), Size::new(1, 1));
    assert!(queue.submit(r).is_ok());
    assert!(queue.submit(r).is_ok());
    assert_eq!(queue.submit(r), Err(PanelError::QueueFull));
    assert_eq!(queue.len(), 2);
}
