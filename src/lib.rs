//! Interrupt-driven rotary encoder driver.
//!
//! Channel A of the encoder raises an interrupt on every edge; the handler
//! samples channel B to pick the direction and updates a signed position.
//! The push-button raises a second interrupt that zeroes the position. The
//! current value is served as a line of decimal text through a readable
//! endpoint.
//!
//! The crate owns the decode logic and the attach/detach lifecycle. The bus
//! device, the interrupt controller and the endpoint publisher belong to the
//! host, which implements [`PlatformDevice`], [`InterruptController`] and
//! [`EndpointPublisher`] for them.
//!
//! # Features
//!
//! - **`defmt`**: log lifecycle events and positions through `defmt`, and
//!   derive [`defmt::Format`] on the public types.

#![cfg_attr(not(test), no_std)]

mod fmt;

mod platform;
mod rotary;

#[cfg(test)]
mod testing;

pub use platform::*;
pub use rotary::*;
