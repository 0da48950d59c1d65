//! Application payloads carried inside frames.
//!
//! Two kinds of message share the serial link:
//!
//! - **Input report**: the 4-byte tag [`INPUT_REPORT_TAG`] followed by one
//!   bitmask byte (bit *i* set when input line *i* is high).
//! - **Relayed advertisement**: the manufacturer data of a BLE advertisement
//!   that starts with [`ADVERTISEMENT_SIGNATURE`], forwarded verbatim.

use crate::frame::{FramePayload, MAX_APP_PAYLOAD};

/// Manufacturer data prefix of advertisements worth relaying: Ruuvi
/// company id `0x0499` (little-endian) followed by data format 5.
pub const ADVERTISEMENT_SIGNATURE: [u8; 3] = [0x99, 0x04, 0x05];

/// ASCII tag that starts every input report.
pub const INPUT_REPORT_TAG: [u8; 4] = *b"GPIO";

/// Application length of an input report (tag plus bitmask).
pub const INPUT_REPORT_LEN: usize = INPUT_REPORT_TAG.len() + 1;

const _: () = assert!(INPUT_REPORT_LEN <= MAX_APP_PAYLOAD);

/// Whether `data` is long enough and starts with [`ADVERTISEMENT_SIGNATURE`].
#[inline]
#[must_use]
pub fn has_signature(data: &[u8]) -> bool {
    data.len() > 2 && data[..3] == ADVERTISEMENT_SIGNATURE
}

/// Build the frame for an input report carrying `mask`.
#[must_use]
pub fn input_report(mask: u8) -> FramePayload {
    let [a, b, c, d] = INPUT_REPORT_TAG;
    FramePayload::from_array([a, b, c, d, mask])
}

/// A classified application payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayMessage<'a> {
    /// Input report with its line bitmask.
    Inputs(u8),
    /// Relayed manufacturer data (signature included).
    Advertisement(&'a [u8]),
    /// Anything else.
    Unknown(&'a [u8]),
}

/// Classify the application payload of a decoded frame.
///
/// # Example
///
/// ```
/// use relay_proto::{parse_message, RelayMessage};
///
/// assert_eq!(parse_message(b"GPIO\x15"), RelayMessage::Inputs(0x15));
/// assert!(matches!(parse_message(&[0x99, 0x04, 0x05, 0x01]), RelayMessage::Advertisement(_)));
/// ```
#[must_use]
pub fn parse_message(app: &[u8]) -> RelayMessage<'_> {
    if app.len() == INPUT_REPORT_LEN && app[..INPUT_REPORT_TAG.len()] == INPUT_REPORT_TAG {
        RelayMessage::Inputs(app[INPUT_REPORT_TAG.len()])
    } else if has_signature(app) {
        RelayMessage::Advertisement(app)
    } else {
        RelayMessage::Unknown(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_requires_three_bytes() {
        assert!(!has_signature(&[]));
        assert!(!has_signature(&[0x99, 0x04]));
        assert!(has_signature(&[0x99, 0x04, 0x05]));
        assert!(has_signature(&[0x99, 0x04, 0x05, 0xFF]));
    }

    #[test]
    fn test_signature_mismatch() {
        assert!(!has_signature(&[0x99, 0x04, 0x03, 0x00]));
        assert!(!has_signature(&[0x4C, 0x00, 0x05]));
        assert!(!has_signature(&[0x04, 0x99, 0x05]));
    }

    #[test]
    fn test_input_report_layout() {
        let payload = input_report(0x15);
        assert_eq!(payload.app_payload(), b"GPIO\x15");
        assert_eq!(payload.app_len(), INPUT_REPORT_LEN);
    }

    #[test]
    fn test_parse_message_kinds() {
        assert_eq!(parse_message(b"GPIO\x00"), RelayMessage::Inputs(0));
        assert_eq!(parse_message(b"GPIO\xFF"), RelayMessage::Inputs(0xFF));

        let adv = [0x99, 0x04, 0x05, 0x12, 0xFC];
        assert_eq!(parse_message(&adv), RelayMessage::Advertisement(&adv));

        // Tag with the wrong length is not an input report.
        assert_eq!(parse_message(b"GPIO"), RelayMessage::Unknown(b"GPIO"));
        assert_eq!(parse_message(b"GPIO\x01\x02"), RelayMessage::Unknown(b"GPIO\x01\x02"));
        assert_eq!(parse_message(&[]), RelayMessage::Unknown(&[]));
    }
}
