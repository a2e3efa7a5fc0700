//! Transport seam between a panel and its controller
//!
//! The panel layer never talks to SPI or parallel registers directly; it
//! hands byte runs to a [`Bus`]. Implementations live with the board
//! support code. [`NoopBus`] backs pure in-memory panels and tests.

use embedded_hal::delay::DelayNs;

use crate::error::BusError;

/// Byte transport to a display controller.
pub trait Bus {
    /// Bracket a burst of writes. Nesting is the caller's concern; a bus
    /// sees only the outermost pair.
    fn begin_transaction(&mut self);
    /// Close the bracket opened by [`begin_transaction`](Self::begin_transaction).
    fn end_transaction(&mut self);

    /// Send `bytes`. `data` distinguishes pixel data from command bytes
    /// (the D/C line on most controllers).
    fn write_bytes(&mut self, bytes: &[u8], data: bool) -> Result<(), BusError>;

    /// Whether the controller is still executing a previous operation.
    fn is_busy(&self) -> bool;

    /// Block until the controller is ready. Implementations bound the wait
    /// and return [`BusError::Timeout`] when the budget runs out.
    fn wait(&mut self) -> Result<(), BusError>;
}

/// Poll `is_busy` with 1 ms pacing until ready or `budget_ms` expires.
///
/// The standard way to implement [`Bus::wait`] for controllers that expose
/// only a busy flag (e-paper BUSY pins, status-register polling).
pub fn poll_ready<D: DelayNs>(
    delay: &mut D,
    budget_ms: u32,
    mut is_busy: impl FnMut() -> bool,
) -> Result<(), BusError> {
    let mut remaining = budget_ms;
    while is_busy() {
        if remaining == 0 {
            return Err(BusError::Timeout);
        }
        remaining -= 1;
        delay.delay_ms(1);
    }
    Ok(())
}

/// A bus that accepts everything and is never busy.
#[derive(Debug, Default)]
pub struct NoopBus;

impl Bus for NoopBus {
    fn begin_transaction(&mut self) {}
    fn end_transaction(&mut self) {}

    fn write_bytes(&mut self, _bytes: &[u8], _data: bool) -> Result<(), BusError> {
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn wait(&mut self) -> Result<(), BusError> {
        Ok(())
    }
}
