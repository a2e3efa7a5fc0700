//! Bounded refresh queue for slow-media panels
//!
//! E-paper class panels step a multi-frame waveform in a background task
//! while the foreground keeps drawing. The two sides share nothing but this
//! queue: the foreground submits update requests, the background consumes
//! them against its own snapshot of the framebuffer. A full queue rejects
//! the request (back-pressure) instead of growing or blocking.
//!
//! The generation counter orders requests across the two sides: the
//! consumer compares a request's generation with the panel's current one to
//! detect that newer drawing has already superseded an update.

use core::sync::atomic::{AtomicU32, Ordering};

use embedded_graphics::primitives::Rectangle;
use heapless::Deque;

use crate::error::PanelError;

/// One requested hardware refresh.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UpdateRequest {
    /// Memory-coordinate rectangle to refresh.
    pub region: Rectangle,
    /// Generation at submit time; see [`RefreshQueue::generation`].
    pub generation: u32,
}

/// Bounded queue of [`UpdateRequest`]s, capacity `N`.
#[derive(Debug, Default)]
pub struct RefreshQueue<const N: usize> {
    requests: Deque<UpdateRequest, N>,
    generation: AtomicU32,
}

impl<const N: usize> RefreshQueue<N> {
    /// An empty queue at generation 0.
    pub fn new() -> Self {
        Self {
            requests: Deque::new(),
            generation: AtomicU32::new(0),
        }
    }

    /// Bump and return the new generation. Call once per flush of drawing
    /// work so consumers can recognize superseded requests.
    pub fn advance_generation(&self) -> u32 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Current generation.
    pub fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Submit a refresh for `region`, stamped with the current generation.
    ///
    /// Returns the stamped generation, or [`PanelError::QueueFull`] with no
    /// state change when the queue is at capacity.
    pub fn submit(&mut self, region: Rectangle) -> Result<u32, PanelError> {
        let generation = self.generation();
        self.requests
            .push_back(UpdateRequest { region, generation })
            .map_err(|_| PanelError::QueueFull)?;
        Ok(generation)
    }

    /// Take the oldest pending request.
    pub fn pop(&mut self) -> Option<UpdateRequest> {
        self.requests.pop_front()
    }

    /// Whether a request's work is already superseded by newer drawing.
    pub fn is_stale(&self, request: &UpdateRequest) -> bool {
        request.generation != self.generation()
    }

    /// Pending request count.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Whether no requests are pending.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    use super::*;
    use embedded_graphics::prelude::{Point, Size};

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn fifo_order() {
        let mut q: RefreshQueue<4> = RefreshQueue::new();
        q.submit(rect(0, 0, 1, 1)).ok();
        q.submit(rect(1, 0, 1, 1)).ok();
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().map(|r| r.region), Some(rect(0, 0, 1, 1)));
        assert_eq!(q.pop().map(|r| r.region), Some(rect(1, 0, 1, 1)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn full_queue_rejects_without_losing_requests() {
        let mut q: RefreshQueue<2> = RefreshQueue::new();
        assert!(q.submit(rect(0, 0, 1, 1)).is_ok());
        assert!(q.submit(rect(1, 0, 1, 1)).is_ok());
        assert_eq!(q.submit(rect(2, 0, 1, 1)), Err(PanelError::QueueFull));
        assert_eq!(q.len(), 2);
        // draining makes room again
        assert!(q.pop().is_some());
        assert!(q.submit(rect(2, 0, 1, 1)).is_ok());
    }

    #[test]
    fn generation_stamps_and_staleness() {
        let mut q: RefreshQueue<4> = RefreshQueue::new();
        assert_eq!(q.submit(rect(0, 0, 1, 1)).ok(), Some(0));
        let Some(first) = q.pop() else {
            panic!("request lost");
        };
        assert!(!q.is_stale(&first));

        assert_eq!(q.advance_generation(), 1);
        // drawing moved on since the first request was stamped
        assert!(q.is_stale(&first));

        q.submit(rect(0, 0, 2, 2)).ok();
        assert_eq!(q.pop().map(|r| r.generation), Some(1));
    }
}
