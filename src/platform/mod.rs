//! Host-side collaborators the driver binds to.
//!
//! Everything in here is an interface boundary: the host implements these
//! traits for its bus, interrupt controller and device-node publisher, and the
//! lifecycle in [`Attachment`](crate::Attachment) drives them.

mod chrdev;
mod gpio;
mod irq;

pub use chrdev::*;
pub use gpio::*;
pub use irq::*;

use core::fmt;

/// Failure code reported by a host collaborator (errno style, negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostError(pub i32);

impl HostError {
    /// No such device or resource.
    pub const NO_DEVICE: Self = Self(-19);
    /// Resource busy.
    pub const BUSY: Self = Self(-16);
    /// Out of memory.
    pub const NO_MEMORY: Self = Self(-12);
    /// Invalid argument.
    pub const INVALID: Self = Self(-22);

    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "host error {}", self.0)
    }
}
