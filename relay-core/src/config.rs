//! Compile-time configuration.
//!
//! Timing parameters and protocol constants live here so they can be tuned
//! in one place. There is no runtime configuration.

use relay_proto::MAX_APP_PAYLOAD;

pub use relay_proto::{ADVERTISEMENT_SIGNATURE, INPUT_REPORT_TAG};

// Scanning

/// How often the BLE scan is stopped and restarted (ms).
pub const SCAN_RESTART_INTERVAL_MS: u32 = 60_000;

/// Pause between stopping and restarting the scan (ms).
///
/// The whole loop is blocked for this long.
pub const SCAN_RESTART_PAUSE_MS: u32 = 100;

/// Largest manufacturer data block accepted from the scanner.
///
/// Anything longer is dropped before a frame is built for it.
pub const MAX_MANUFACTURER_DATA: usize = MAX_APP_PAYLOAD;

/// Discovered peripherals buffered between the scanner and the loop.
pub const SCAN_QUEUE_DEPTH: usize = 8;

// Digital inputs

/// Number of sampled input lines (one bit each in the report).
pub const INPUT_LINE_COUNT: usize = 8;

/// How often the input lines are sampled and reported (ms).
pub const INPUT_SAMPLE_INTERVAL_MS: u32 = 1_000;
