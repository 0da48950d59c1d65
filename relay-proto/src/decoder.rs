//! Host-side frame decoder.
//!
//! Recovers frames from the serial byte stream one byte at a time. Anything
//! between frames (line terminators, boot noise, partial frames after a
//! reconnect) is skipped until the next opening delimiter.

use crate::crc::Crc32Digest;
use crate::fmt::hex_nibble;
use crate::frame::{CHECKSUM_LEN, MAX_FRAME_LEN};
use heapless::Vec;

/// Error type for decoding operations.
///
/// After any error the decoder has already reset and is looking for the
/// next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// A byte that is neither a hex digit nor a delimiter appeared inside a frame.
    InvalidByte,
    /// The frame is longer than the decoder capacity.
    Overflow,
    /// The frame is shorter than the checksum prefix.
    TooShort,
    /// The checksum prefix does not match the payload.
    Checksum,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidByte => write!(f, "invalid byte in frame"),
            Self::Overflow => write!(f, "frame too long"),
            Self::TooShort => write!(f, "frame too short"),
            Self::Checksum => write!(f, "checksum mismatch"),
        }
    }
}

/// A decoded frame whose checksum has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8, MAX_FRAME_LEN>,
}

impl Frame {
    /// Checksum carried in the frame prefix.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]])
    }

    /// The application payload (everything after the prefix).
    #[inline]
    #[must_use]
    pub fn app_payload(&self) -> &[u8] {
        &self.bytes[CHECKSUM_LEN..]
    }

    /// The whole decoded frame, prefix included.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecoderState {
    /// Between frames.
    Idle,
    /// Counting opening braces.
    Opening(u8),
    /// Expecting the first digit of a byte (or the closing delimiter).
    HighNibble,
    /// Expecting the second digit of a byte.
    LowNibble(u8),
    /// Counting closing braces.
    Closing(u8),
}

/// Byte-at-a-time frame decoder.
///
/// # Example
///
/// ```
/// use relay_proto::{FrameDecoder, FramePayload};
///
/// let mut payload = FramePayload::from_app(&[0x99, 0x04, 0x05]).unwrap();
/// let mut line = [0u8; 64];
/// let len = payload.encode(&mut line).unwrap();
///
/// let mut decoder = FrameDecoder::new();
/// let mut frames = line[..len].iter().filter_map(|&b| decoder.push_byte(b).ok().flatten());
/// let frame = frames.next().unwrap();
/// assert_eq!(frame.app_payload(), &[0x99, 0x04, 0x05]);
/// ```
pub struct FrameDecoder {
    buffer: Vec<u8, MAX_FRAME_LEN>,
    /// Running checksum of the bytes after the prefix.
    digest: Crc32Digest,
    state: DecoderState,
}

impl FrameDecoder {
    /// Create a new decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            digest: Crc32Digest::new(),
            state: DecoderState::Idle,
        }
    }

    /// Drop any partial frame and wait for the next opening delimiter.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.digest = Crc32Digest::new();
        self.state = DecoderState::Idle;
    }

    /// Feed a byte to the decoder.
    ///
    /// Returns `Some(frame)` when a complete frame with a valid checksum has
    /// been received.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when a frame in progress is abandoned.
    pub fn push_byte(&mut self, byte: u8) -> Result<Option<Frame>, DecodeError> {
        match self.state {
            DecoderState::Idle => {
                if byte == b'{' {
                    self.state = DecoderState::Opening(1);
                }
                Ok(None)
            }
            DecoderState::Opening(count) => {
                if byte != b'{' {
                    self.state = DecoderState::Idle;
                } else if count + 1 == 3 {
                    self.buffer.clear();
                    self.digest = Crc32Digest::new();
                    self.state = DecoderState::HighNibble;
                } else {
                    self.state = DecoderState::Opening(count + 1);
                }
                Ok(None)
            }
            DecoderState::HighNibble => {
                if let Some(high) = hex_nibble(byte) {
                    self.state = DecoderState::LowNibble(high);
                    Ok(None)
                } else if byte == b'}' {
                    self.state = DecoderState::Closing(1);
                    Ok(None)
                } else if byte == b'{' && self.buffer.is_empty() {
                    // Extra opening braces before the first digit.
                    Ok(None)
                } else {
                    self.abandon(byte, DecodeError::InvalidByte)
                }
            }
            DecoderState::LowNibble(high) => match hex_nibble(byte) {
                Some(low) => {
                    let decoded = (high << 4) | low;
                    if self.buffer.push(decoded).is_err() {
                        return self.abandon(byte, DecodeError::Overflow);
                    }
                    if self.buffer.len() > CHECKSUM_LEN {
                        self.digest.update(decoded);
                    }
                    self.state = DecoderState::HighNibble;
                    Ok(None)
                }
                None => self.abandon(byte, DecodeError::InvalidByte),
            },
            DecoderState::Closing(count) => {
                if byte != b'}' {
                    return self.abandon(byte, DecodeError::InvalidByte);
                }
                if count + 1 < 3 {
                    self.state = DecoderState::Closing(count + 1);
                    return Ok(None);
                }
                self.state = DecoderState::Idle;
                self.finish().map(Some)
            }
        }
    }

    /// Validate the buffered bytes as a frame.
    fn finish(&mut self) -> Result<Frame, DecodeError> {
        let bytes = core::mem::take(&mut self.buffer);
        let crc = core::mem::take(&mut self.digest).finalize();
        if bytes.len() < CHECKSUM_LEN {
            return Err(DecodeError::TooShort);
        }
        let frame = Frame { bytes };
        if crc != frame.checksum() {
            return Err(DecodeError::Checksum);
        }
        Ok(frame)
    }

    /// Abandon the current frame. An opening brace may begin the next one.
    fn abandon(&mut self, byte: u8, err: DecodeError) -> Result<Option<Frame>, DecodeError> {
        self.buffer.clear();
        self.digest = Crc32Digest::new();
        self.state = if byte == b'{' {
            DecoderState::Opening(1)
        } else {
            DecoderState::Idle
        };
        Err(err)
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::crc::calculate_crc32;
    use crate::frame::{FramePayload, MAX_APP_PAYLOAD, MAX_ENCODED_LEN};
    use std::vec::Vec;

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Result<Frame, DecodeError>> {
        bytes
            .iter()
            .filter_map(|&b| decoder.push_byte(b).transpose())
            .collect()
    }

    fn encoded(app: &[u8]) -> Vec<u8> {
        let mut payload = FramePayload::from_app(app).unwrap();
        let mut line = [0u8; MAX_ENCODED_LEN];
        let len = payload.encode(&mut line).unwrap();
        line[..len].to_vec()
    }

    #[test]
    fn test_round_trip_reconstructs_prefix_and_payload() {
        let app = [0x99, 0x04, 0x05, 0x12, 0xFC, 0x53, 0x94, 0xC3, 0x7C];
        let mut sealed = FramePayload::from_app(&app).unwrap();
        let checksum = sealed.seal();

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &encoded(&app));
        assert_eq!(results.len(), 1);

        let frame = results[0].as_ref().unwrap();
        assert_eq!(frame.as_bytes(), sealed.as_bytes());
        assert_eq!(frame.checksum(), checksum);
        assert_eq!(calculate_crc32(frame.app_payload()), checksum);
    }

    #[test]
    fn test_accepts_lowercase_digits() {
        let line = std::string::String::from_utf8(encoded(b"GPIO\x15"))
            .unwrap()
            .to_lowercase();
        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, line.as_bytes());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().app_payload(), b"GPIO\x15");
    }

    #[test]
    fn test_skips_noise_between_frames() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"boot\r\n{{x{");
        stream.extend_from_slice(&encoded(b"one"));
        stream.extend_from_slice(b"}}}garbage");
        stream.extend_from_slice(&encoded(b"two"));

        let mut decoder = FrameDecoder::new();
        let frames: Vec<_> = decode_all(&mut decoder, &stream)
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].app_payload(), b"one");
        assert_eq!(frames[1].app_payload(), b"two");
    }

    #[test]
    fn test_rejects_corrupted_checksum() {
        let mut line = encoded(b"payload");
        // Change the last payload digit.
        let pos = line.len() - 6;
        line[pos] = if line[pos] == b'0' { b'1' } else { b'0' };

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &line);
        assert_eq!(results, std::vec![Err(DecodeError::Checksum)]);
    }

    #[test]
    fn test_rejects_short_frame() {
        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, b"{{{0102}}}");
        assert_eq!(results, std::vec![Err(DecodeError::TooShort)]);
    }

    #[test]
    fn test_invalid_byte_then_resync() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"{{{01G2");
        stream.extend_from_slice(&encoded(b"ok"));

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &stream);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Err(DecodeError::InvalidByte));
        assert_eq!(results[1].as_ref().unwrap().app_payload(), b"ok");
    }

    #[test]
    fn test_interrupted_frame_restarts_on_open() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"{{{0A0B");
        stream.extend_from_slice(&encoded(b"next"));

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &stream);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Err(DecodeError::InvalidByte));
        assert_eq!(results[1].as_ref().unwrap().app_payload(), b"next");
    }

    #[test]
    fn test_round_trip_largest_payload() {
        let app: [u8; MAX_APP_PAYLOAD] = core::array::from_fn(|i| (i * 7) as u8);
        let line = encoded(&app);
        assert_eq!(line.len(), MAX_ENCODED_LEN);

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &line);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().app_payload(), &app);
    }

    #[test]
    fn test_checksum_restarts_with_each_frame() {
        let mut stream = Vec::new();
        // Abandoned mid-payload, then two good frames back to back.
        stream.extend_from_slice(b"{{{00112233445566");
        stream.extend_from_slice(&encoded(b"first"));
        stream.extend_from_slice(&encoded(b"second"));

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &stream);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Err(DecodeError::InvalidByte));
        assert_eq!(results[1].as_ref().unwrap().app_payload(), b"first");
        assert_eq!(results[2].as_ref().unwrap().app_payload(), b"second");
    }

    #[test]
    fn test_overflow() {
        let mut stream = Vec::new();
        stream.extend_from_slice(b"{{{");
        for _ in 0..(MAX_APP_PAYLOAD + 5) {
            stream.extend_from_slice(b"00");
        }
        stream.extend_from_slice(b"}}}");

        let mut decoder = FrameDecoder::new();
        let results = decode_all(&mut decoder, &stream);
        assert_eq!(results, std::vec![Err(DecodeError::Overflow)]);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut decoder = FrameDecoder::new();
        for &b in b"{{{0102" {
            assert_eq!(decoder.push_byte(b), Ok(None));
        }
        decoder.reset();
        let results = decode_all(&mut decoder, &encoded(b"fresh"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_ref().unwrap().app_payload(), b"fresh");
    }
}
