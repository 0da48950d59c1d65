//! SoftDevice-backed BLE scanner.
//!
//! Scanning runs in [`scan_task`]; the relay loop drives it through
//! [`SoftdeviceScanner`], which implements [`relay_core::Scanner`]:
//!
//! - `stop` halts the radio scan immediately
//! - `start` asks the task to begin a fresh scan
//! - `poll` drains one report from a bounded channel
//!
//! When the channel is full, new reports are dropped.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::central;
use nrf_softdevice::{raw, Softdevice};
use relay_core::config::SCAN_QUEUE_DEPTH;
use relay_core::{Discovered, Scanner};

static DISCOVERED: Channel<CriticalSectionRawMutex, Discovered, SCAN_QUEUE_DEPTH> = Channel::new();
static RESTART: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static SCAN_FAILED: AtomicBool = AtomicBool::new(false);

/// The SoftDevice refused to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct ScanFailed;

/// Handle used by the relay loop to control [`scan_task`].
pub struct SoftdeviceScanner {
    _private: (),
}

impl SoftdeviceScanner {
    /// Create the handle. There is one scan task, so there should be one handle.
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Report a failure from the most recent scan attempt, clearing it.
    pub fn take_error(&mut self) -> Result<(), ScanFailed> {
        if SCAN_FAILED.swap(false, Ordering::AcqRel) {
            Err(ScanFailed)
        } else {
            Ok(())
        }
    }
}

impl Default for SoftdeviceScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner for SoftdeviceScanner {
    type Error = ScanFailed;

    /// Request a new scan.
    ///
    /// The scan itself starts when [`scan_task`] next runs, so an immediate
    /// failure shows up on the following call (or via [`take_error`](Self::take_error)).
    /// A new scan is requested even when an earlier failure is reported.
    fn start(&mut self) -> Result<(), ScanFailed> {
        let prior = self.take_error();
        RESTART.signal(());
        prior
    }

    fn stop(&mut self) {
        // NRF_ERROR_INVALID_STATE when no scan is running, which is fine.
        let _ = unsafe { raw::sd_ble_gap_scan_stop() };
    }

    fn poll(&mut self) -> Option<Discovered> {
        DISCOVERED.try_receive().ok()
    }
}

/// Scan for advertisements, restarting whenever the relay asks.
#[embassy_executor::task]
pub async fn scan_task(sd: &'static Softdevice) -> ! {
    let config = central::ScanConfig::default();

    RESTART.wait().await;
    loop {
        let scan = central::scan(sd, &config, |params| {
            let data =
                unsafe { core::slice::from_raw_parts(params.data.p_data, params.data.len as usize) };
            let discovered =
                Discovered::from_advertising_data(params.peer_addr.addr, params.rssi, data);
            if discovered.manufacturer_data.is_some() && DISCOVERED.try_send(discovered).is_err() {
                debug!("scan queue full, report dropped");
            }
            None::<()>
        });

        match select(scan, RESTART.wait()).await {
            Either::First(Err(e)) => {
                warn!("BLE scan failed: {:?}", e);
                SCAN_FAILED.store(true, Ordering::Release);
                RESTART.wait().await;
            }
            // Scanning ran until stopped; wait for the restart request.
            Either::First(Ok(())) => RESTART.wait().await,
            Either::Second(()) => {}
        }
    }
}
