//! BLE advertisement and digital input relay for the nRF52840.
//!
//! This crate wires the platform-agnostic relay in `relay_core` to the
//! SoftDevice scanner, the UARTE transmitter, GPIO inputs and the Embassy
//! time driver.

#![no_std]

// Re-export core types for convenience
pub use relay_core::{Clock, Discovered, Relay, RelayError, Scanner, TickReport};

pub mod ble;
pub mod serial;

pub use ble::{scan_task, ScanFailed, SoftdeviceScanner};
pub use serial::SerialSink;

/// Milliseconds since boot from the Embassy time driver, wrapping at `u32::MAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uptime;

impl Clock for Uptime {
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}
