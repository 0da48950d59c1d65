//! Serial wire protocol for the BLE relay.
//!
//! The relay firmware reports two kinds of message to a host over a serial
//! link: digital input snapshots and the manufacturer data of selected BLE
//! advertisements. This crate holds everything both ends agree on:
//!
//! - **Checksum**: [`calculate_crc32`], [`Crc32Digest`] (CRC-32/ISO-HDLC)
//! - **Framing**: [`FramePayload`], [`seal`], [`encode`], [`frame`]
//! - **Decoding**: [`FrameDecoder`] recovers and verifies frames on the host
//! - **Messages**: [`parse_message`], [`input_report`], [`has_signature`]
//! - **Sensor data**: [`RuuviReport`] decodes relayed Ruuvi format 5 data
//!
//! # Protocol Format
//!
//! ```text
//! {{{<checksum><payload>}}}\r\n
//! ```
//!
//! - `{{{` / `}}}` - Frame delimiters
//! - `checksum` - 8 hex digits, CRC-32 of the payload bytes, big-endian
//! - `payload` - 2 uppercase hex digits per byte, zero-padded
//!
//! The receiver ignores everything between frames, so the line terminator
//! and any boot noise on the link are harmless.
//!
//! # Example
//!
//! ```
//! use relay_proto::{input_report, parse_message, FrameDecoder, RelayMessage, MAX_ENCODED_LEN};
//!
//! // Device side
//! let mut report = input_report(0b0001_0101);
//! let mut line = [0u8; MAX_ENCODED_LEN];
//! let len = report.encode(&mut line).unwrap();
//!
//! // Host side
//! let mut decoder = FrameDecoder::new();
//! for &byte in &line[..len] {
//!     if let Ok(Some(frame)) = decoder.push_byte(byte) {
//!         assert_eq!(parse_message(frame.app_payload()), RelayMessage::Inputs(0x15));
//!     }
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`embedded-io`**: Enable [`write_frame`] and `FramePayload::write_to`
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod crc;
pub mod decoder;
mod fmt;
pub mod frame;
pub mod message;
pub mod ruuvi;

// Re-export types at crate root for convenience
pub use crc::{calculate_crc32, Crc32Digest};
pub use decoder::{DecodeError, Frame, FrameDecoder};
#[cfg(feature = "embedded-io")]
pub use frame::write_frame;
pub use frame::{
    encode, encoded_len, frame, seal, FrameError, FramePayload, CHECKSUM_LEN, FRAME_CLOSE,
    FRAME_OPEN, LINE_TERMINATOR, MAX_APP_PAYLOAD, MAX_ENCODED_LEN, MAX_FRAME_LEN,
};
pub use message::{
    has_signature, input_report, parse_message, RelayMessage, ADVERTISEMENT_SIGNATURE,
    INPUT_REPORT_LEN, INPUT_REPORT_TAG,
};
pub use ruuvi::{RuuviReport, RAWV2_LEN};
