//! Error taxonomy of the panel layer
//!
//! Bus faults and panel-level faults are separate types: a driver can retry
//! a bus transfer without knowing anything about windows or refresh queues,
//! and the panel layer wraps whatever the bus reports.

/// Fault raised by a [`Bus`](crate::bus::Bus) implementation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The transfer failed (NAK, framing, DMA abort).
    Communication,
    /// The controller stayed busy past the wait budget.
    Timeout,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Communication => write!(f, "bus transfer failed"),
            Self::Timeout => write!(f, "bus busy past wait budget"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BusError {}

/// Fault raised by panel operations.
///
/// `Timeout` and `Busy` leave the framebuffer and dirty region untouched;
/// the caller may retry the same call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// A refresh is still in progress and the operation cannot overlap it.
    Busy,
    /// The panel did not become ready within the wait budget.
    Timeout,
    /// The refresh queue is full; the request was not accepted.
    QueueFull,
    /// The underlying bus reported a fault.
    Bus(BusError),
}

impl From<BusError> for PanelError {
    fn from(e: BusError) -> Self {
        match e {
            BusError::Timeout => Self::Timeout,
            other => Self::Bus(other),
        }
    }
}

impl core::fmt::Display for PanelError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "panel busy"),
            Self::Timeout => write!(f, "panel not ready within wait budget"),
            Self::QueueFull => write!(f, "refresh queue full"),
            Self::Bus(e) => write!(f, "bus: {e}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PanelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bus(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_timeout_maps_to_panel_timeout() {
        assert_eq!(PanelError::from(BusError::Timeout), PanelError::Timeout);
        assert_eq!(
            PanelError::from(BusError::Communication),
            PanelError::Bus(BusError::Communication)
        );
    }
}
