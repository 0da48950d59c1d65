//! Advertisement parsing, filtering and the scanner seam.

use heapless::Vec;
use relay_proto::{has_signature, FramePayload};

use crate::config::MAX_MANUFACTURER_DATA;

/// AD type of a manufacturer specific data structure.
pub const AD_TYPE_MANUFACTURER_DATA: u8 = 0xFF;

/// Bounded copy of a peripheral's manufacturer data.
pub type ManufacturerData = Vec<u8, MAX_MANUFACTURER_DATA>;

/// Find the manufacturer specific data in raw advertising data.
///
/// Walks the `length, type, data...` AD structures and returns the data of
/// the first structure of type `0xFF`. Parsing stops at a zero length or a
/// structure that runs past the end of the buffer.
///
/// ```
/// use relay_core::manufacturer_data;
///
/// let ad = [0x02, 0x01, 0x06, 0x04, 0xFF, 0x99, 0x04, 0x05];
/// assert_eq!(manufacturer_data(&ad), Some(&[0x99, 0x04, 0x05][..]));
/// ```
pub fn manufacturer_data(ad: &[u8]) -> Option<&[u8]> {
    let mut i = 0;
    while i < ad.len() {
        let len = ad[i] as usize;
        if len == 0 || i + len >= ad.len() {
            break;
        }
        if ad[i + 1] == AD_TYPE_MANUFACTURER_DATA {
            return Some(&ad[i + 2..i + 1 + len]);
        }
        i += len + 1;
    }
    None
}

/// A peripheral reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Discovered {
    /// Peer device address, as reported by the radio.
    pub address: [u8; 6],
    /// Received signal strength in dBm.
    pub rssi: i8,
    /// Manufacturer data, if the advertisement carried any that fit.
    pub manufacturer_data: Option<ManufacturerData>,
}

impl Discovered {
    /// Build a record from raw advertising data.
    ///
    /// Manufacturer data longer than [`MAX_MANUFACTURER_DATA`] is dropped.
    pub fn from_advertising_data(address: [u8; 6], rssi: i8, ad: &[u8]) -> Self {
        Self {
            address,
            rssi,
            manufacturer_data: manufacturer_data(ad).and_then(|data| Vec::from_slice(data).ok()),
        }
    }
}

/// A BLE scanner the relay can start, stop and poll.
///
/// `poll` never blocks; it hands back at most one buffered peripheral.
pub trait Scanner {
    /// Error reported when scanning cannot be started.
    type Error;

    /// Start (or resume) scanning.
    ///
    /// A scanner that learns of failures late may return an earlier
    /// attempt's error here, but must still attempt a fresh start.
    fn start(&mut self) -> Result<(), Self::Error>;

    /// Stop scanning. Stopping an idle scanner is a no-op.
    fn stop(&mut self);

    /// Take the next discovered peripheral, if any.
    fn poll(&mut self) -> Option<Discovered>;
}

impl<S: Scanner + ?Sized> Scanner for &mut S {
    type Error = S::Error;

    fn start(&mut self) -> Result<(), Self::Error> {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn poll(&mut self) -> Option<Discovered> {
        (**self).poll()
    }
}

/// Build the frame payload for a peripheral, if it should be relayed.
///
/// Only manufacturer data starting with
/// [`ADVERTISEMENT_SIGNATURE`](crate::config::ADVERTISEMENT_SIGNATURE) is
/// relayed, verbatim.
pub fn relay_payload(discovered: &Discovered) -> Option<FramePayload> {
    let data = discovered.manufacturer_data.as_deref()?;
    if !has_signature(data) {
        return None;
    }
    FramePayload::from_app(data).ok()
}
