//! Platform-agnostic core of the BLE relay.
//!
//! The relay samples eight digital inputs once a second and forwards the
//! manufacturer data of selected BLE advertisements, writing both as framed
//! lines to a serial stream (see `relay_proto` for the wire format). This
//! crate holds the loop logic without any platform-specific dependencies, so
//! it runs the same on the device and in host tests.
//!
//! # Overview
//!
//! - [`timer`]: Periodic timers on a wrapping millisecond clock ([`PeriodicTimer`], [`Clock`])
//! - [`inputs`]: Digital input sampling ([`InputLines`], [`sample`])
//! - [`advertising`]: AD structure parsing, filtering and the [`Scanner`] seam
//! - [`relay`]: The cooperative loop ([`Relay`])
//! - [`config`]: Compile-time intervals and limits
//!
//! # Collaborators
//!
//! | Concern | Trait |
//! |---------|-------|
//! | Tick source | [`Clock`] |
//! | BLE scanning | [`Scanner`] |
//! | Input lines | [`InputLines`] (any array of `embedded_hal::digital::InputPin`) |
//! | Restart pause | `embedded_hal::delay::DelayNs` |
//! | Serial stream | `embedded_io::Write` |
//!
//! # Example
//!
//! ```rust
//! use relay_core::{Clock, Discovered, InputLines, Relay, Scanner};
//!
//! struct Uptime(u32);
//! impl Clock for Uptime {
//!     fn now_ms(&self) -> u32 { self.0 }
//! }
//!
//! struct Idle;
//! impl Scanner for Idle {
//!     type Error = ();
//!     fn start(&mut self) -> Result<(), ()> { Ok(()) }
//!     fn stop(&mut self) {}
//!     fn poll(&mut self) -> Option<Discovered> { None }
//! }
//!
//! struct Lines;
//! impl InputLines for Lines {
//!     fn line_count(&self) -> usize { 8 }
//!     fn is_high(&mut self, line: usize) -> bool { line == 0 }
//! }
//!
//! struct NoDelay;
//! impl embedded_hal::delay::DelayNs for NoDelay {
//!     fn delay_ns(&mut self, _ns: u32) {}
//! }
//!
//! let mut out = [0u8; 64];
//! let mut relay = Relay::new(Uptime(0), Idle, Lines, NoDelay, &mut out[..]);
//! relay.start().unwrap();
//!
//! let report = relay.tick();
//! assert_eq!(report.inputs, Some(0x01));
//! drop(relay);
//! assert!(out.starts_with(b"{{{"));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to the other modules.
mod fmt;

pub mod advertising;
pub mod config;
pub mod inputs;
pub mod relay;
pub mod timer;

// Re-export main types at crate root
pub use advertising::{
    manufacturer_data, relay_payload, Discovered, ManufacturerData, Scanner,
    AD_TYPE_MANUFACTURER_DATA,
};
pub use inputs::{sample, InputLines};
pub use relay::{Relay, RelayError, TickReport};
pub use timer::{Clock, PeriodicTimer};
