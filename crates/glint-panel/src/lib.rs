//! Panel layer: rotation, windows, dirty tracking and flush
//!
//! Sits between drawing code and hardware:
//!
//! ```text
//! drawing API
//!     ↓ logical coordinates
//! Transform (rotation 0..=7)      ──  transform
//!     ↓ memory coordinates
//! Panel write pipeline            ──  panel, memory
//!     ↓ dirty rows at flush
//! Bus (SPI/parallel, abstract)    ──  bus
//! ```
//!
//! [`MemoryPanel`] is the framebuffer-backed implementation of the
//! [`Panel`] contract; concrete controller drivers wrap it (or implement
//! [`Panel`] directly for streamed writes) and provide the [`Bus`].
//! E-paper class drivers additionally coordinate with their waveform task
//! through a [`RefreshQueue`].

// ── Lint policy ─────────────────────────────────────────────────────────────
// The write pipeline is offset arithmetic over caller-clipped rectangles;
// bounds are enforced by checked slice indexing, which panics instead of
// writing a neighbouring row.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod dirty;
pub mod error;
pub mod memory;
pub mod panel;
pub mod refresh;
pub mod transform;

pub use bus::{poll_ready, Bus, NoopBus};
pub use dirty::DirtyRegion;
pub use error::{BusError, PanelError};
pub use memory::{MemoryPanel, PanelConfig};
pub use panel::Panel;
pub use refresh::{RefreshQueue, UpdateRequest};
pub use transform::{Rotation, Transform};
