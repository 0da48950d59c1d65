//! The relay loop: periodic input reports, periodic scan restarts and
//! advertisement forwarding onto one serial stream.

use embedded_hal::delay::DelayNs;
use relay_proto::{input_report, FramePayload};

use crate::advertising::{relay_payload, Scanner};
use crate::config::{INPUT_SAMPLE_INTERVAL_MS, SCAN_RESTART_INTERVAL_MS, SCAN_RESTART_PAUSE_MS};
use crate::inputs::{sample, InputLines};
use crate::timer::{Clock, PeriodicTimer};

/// What a single [`Relay::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// The scan was stopped and restarted.
    pub scan_restarted: bool,
    /// Input mask reported on this tick.
    pub inputs: Option<u8>,
    /// An advertisement was forwarded.
    pub relayed: bool,
}

/// Forwards input snapshots and selected advertisements to a serial stream.
///
/// The relay owns its collaborators and both timers. Each [`tick`](Self::tick)
/// runs one loop iteration to completion:
///
/// 1. scan restart, if due (stop, blocking pause, start)
/// 2. input report, if due
/// 3. at most one advertisement from the scanner
///
/// Every message is written with a single contiguous write, so messages never
/// interleave on the stream.
pub struct Relay<C, S, L, D, W> {
    clock: C,
    scanner: S,
    lines: L,
    delay: D,
    serial: W,
    scan_restart: PeriodicTimer,
    input_sample: PeriodicTimer,
}

impl<C, S, L, D, W> Relay<C, S, L, D, W>
where
    C: Clock,
    S: Scanner,
    L: InputLines,
    D: DelayNs,
    W: embedded_io::Write,
{
    /// Create a relay with both timers due on the first tick.
    pub fn new(clock: C, scanner: S, lines: L, delay: D, serial: W) -> Self {
        Self {
            clock,
            scanner,
            lines,
            delay,
            serial,
            scan_restart: PeriodicTimer::new(SCAN_RESTART_INTERVAL_MS),
            input_sample: PeriodicTimer::new(INPUT_SAMPLE_INTERVAL_MS),
        }
    }

    /// Start scanning.
    ///
    /// Failure here is fatal for the caller; there is nothing to relay
    /// without a scanner.
    pub fn start(&mut self) -> Result<(), RelayError<S::Error>> {
        self.scanner.start().map_err(RelayError::ScanStart)?;
        info!("relay started");
        Ok(())
    }

    /// Run one loop iteration.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if self.scan_restart.is_due(self.clock.now_ms()) {
            self.restart_scan();
            report.scan_restarted = true;
        }

        if self.input_sample.is_due(self.clock.now_ms()) {
            let mask = sample(&mut self.lines);
            debug!("inputs {=u8:#x}", mask);
            self.emit(input_report(mask));
            report.inputs = Some(mask);
        }

        report.relayed = self.poll_advertisement();
        report
    }

    fn restart_scan(&mut self) {
        self.scanner.stop();
        self.delay.delay_ms(SCAN_RESTART_PAUSE_MS);
        if self.scanner.start().is_err() {
            warn!("scan restart failed, retrying on next interval");
        } else {
            trace!("scan restarted");
        }
    }

    fn poll_advertisement(&mut self) -> bool {
        let Some(discovered) = self.scanner.poll() else {
            return false;
        };
        let Some(payload) = relay_payload(&discovered) else {
            return false;
        };
        debug!(
            "relaying {=usize} bytes from {=[u8]:x} ({=i8} dBm)",
            payload.app_len(),
            &discovered.address[..],
            discovered.rssi
        );
        self.emit(payload);
        true
    }

    fn emit(&mut self, mut payload: FramePayload) {
        if payload.write_to(&mut self.serial).is_err() {
            trace!("serial write failed, message dropped");
        }
    }

    /// Get a reference to the scanner.
    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    /// Get a mutable reference to the scanner.
    pub fn scanner_mut(&mut self) -> &mut S {
        &mut self.scanner
    }

    /// Get a reference to the serial stream.
    pub fn serial(&self) -> &W {
        &self.serial
    }

    /// Get a mutable reference to the input lines.
    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    /// Decompose the relay into its collaborators.
    pub fn into_parts(self) -> (C, S, L, D, W) {
        (self.clock, self.scanner, self.lines, self.delay, self.serial)
    }
}

/// Error type for relay operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayError<E> {
    /// The scanner could not be started.
    ScanStart(E),
}

impl<E: core::fmt::Debug> core::fmt::Display for RelayError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RelayError::ScanStart(e) => write!(f, "failed to start scanning: {:?}", e),
        }
    }
}
