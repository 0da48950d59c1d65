//! Message framing for the serial link.
//!
//! A frame is a payload buffer whose first [`CHECKSUM_LEN`] bytes are
//! reserved for the CRC-32 of the bytes that follow. Framing seals the
//! checksum into that prefix (big-endian) and renders the whole buffer as
//! uppercase hex between fixed delimiters.
//!
//! # Wire Format
//!
//! ```text
//! {{{<crc32 as 8 hex digits><payload as 2 hex digits per byte>}}}\r\n
//! ```
//!
//! # Example
//!
//! ```
//! use relay_proto::FramePayload;
//!
//! let mut payload = FramePayload::from_app(b"123456789").unwrap();
//! let mut line = [0u8; 64];
//! let len = payload.encode(&mut line).unwrap();
//!
//! assert_eq!(&line[..len], b"{{{CBF43926313233343536373839}}}\r\n");
//! ```

use crate::crc::calculate_crc32;
use crate::fmt::write_hex;
use heapless::Vec;

/// Number of bytes reserved at the start of a frame for the checksum.
pub const CHECKSUM_LEN: usize = 4;

/// Opening delimiter of a frame on the wire.
pub const FRAME_OPEN: &[u8] = b"{{{";

/// Closing delimiter of a frame on the wire.
pub const FRAME_CLOSE: &[u8] = b"}}}";

/// Line terminator emitted after the closing delimiter.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Largest application payload a frame can carry.
pub const MAX_APP_PAYLOAD: usize = 64;

/// Largest frame (checksum prefix plus application payload).
pub const MAX_FRAME_LEN: usize = CHECKSUM_LEN + MAX_APP_PAYLOAD;

/// Largest encoded line, delimiters and terminator included.
pub const MAX_ENCODED_LEN: usize = encoded_len(MAX_FRAME_LEN);

/// Length of the encoded line for a frame of `frame_len` bytes.
#[inline]
#[must_use]
pub const fn encoded_len(frame_len: usize) -> usize {
    FRAME_OPEN.len() + 2 * frame_len + FRAME_CLOSE.len() + LINE_TERMINATOR.len()
}

/// Error type for framing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// The buffer is shorter than the reserved checksum prefix.
    PrefixMissing,
    /// The application payload exceeds [`MAX_APP_PAYLOAD`].
    PayloadTooLarge,
    /// The output buffer is too small to hold the encoded line.
    BufferTooSmall,
    /// A write operation failed (for I/O adapters).
    WriteError,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PrefixMissing => write!(f, "frame shorter than checksum prefix"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Compute the checksum of `frame[CHECKSUM_LEN..]` and store it big-endian
/// in `frame[..CHECKSUM_LEN]`.
///
/// Returns the checksum.
///
/// # Errors
///
/// Returns [`FrameError::PrefixMissing`] if `frame` cannot hold the prefix.
pub fn seal(frame: &mut [u8]) -> Result<u32, FrameError> {
    if frame.len() < CHECKSUM_LEN {
        return Err(FrameError::PrefixMissing);
    }
    let (prefix, app) = frame.split_at_mut(CHECKSUM_LEN);
    let checksum = calculate_crc32(app);
    prefix.copy_from_slice(&checksum.to_be_bytes());
    Ok(checksum)
}

/// Render an already sealed frame as a delimited hex line into `out`.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`FrameError::PrefixMissing`] if `frame` is shorter than the
/// prefix, or [`FrameError::BufferTooSmall`] if `out` cannot hold the line.
pub fn encode(frame: &[u8], out: &mut [u8]) -> Result<usize, FrameError> {
    if frame.len() < CHECKSUM_LEN {
        return Err(FrameError::PrefixMissing);
    }
    let total = encoded_len(frame.len());
    if out.len() < total {
        return Err(FrameError::BufferTooSmall);
    }

    let mut pos = 0;
    out[pos..pos + FRAME_OPEN.len()].copy_from_slice(FRAME_OPEN);
    pos += FRAME_OPEN.len();
    pos += write_hex(&mut out[pos..], frame);
    out[pos..pos + FRAME_CLOSE.len()].copy_from_slice(FRAME_CLOSE);
    pos += FRAME_CLOSE.len();
    out[pos..pos + LINE_TERMINATOR.len()].copy_from_slice(LINE_TERMINATOR);
    pos += LINE_TERMINATOR.len();

    debug_assert_eq!(pos, total);
    Ok(pos)
}

/// Seal the checksum into `frame` and render it into `out`.
///
/// # Errors
///
/// See [`seal`] and [`encode`].
pub fn frame(frame: &mut [u8], out: &mut [u8]) -> Result<usize, FrameError> {
    seal(frame)?;
    encode(frame, out)
}

/// Seal `frame` and write the encoded line to `writer` in one `write_all`.
///
/// The line is assembled on the stack first, so a message is never split
/// across other writes to the same stream.
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] for frames over [`MAX_FRAME_LEN`],
/// or [`FrameError::WriteError`] if the writer fails.
#[cfg(feature = "embedded-io")]
pub fn write_frame<W: embedded_io::Write>(writer: &mut W, frame: &mut [u8]) -> Result<(), FrameError> {
    if frame.len() > MAX_FRAME_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    let mut line = [0u8; MAX_ENCODED_LEN];
    let len = self::frame(frame, &mut line)?;
    writer
        .write_all(&line[..len])
        .map_err(|_| FrameError::WriteError)
}

/// A bounded frame buffer with the checksum prefix reserved up front.
///
/// The application payload starts at offset [`CHECKSUM_LEN`]; the prefix is
/// zero until [`seal`](Self::seal) runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePayload {
    buf: Vec<u8, MAX_FRAME_LEN>,
}

impl FramePayload {
    /// Create an empty frame (reserved prefix only).
    #[must_use]
    pub fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend([0u8; CHECKSUM_LEN]);
        Self { buf }
    }

    /// Create a frame from a fixed-size application payload.
    ///
    /// Payloads over [`MAX_APP_PAYLOAD`] are rejected at compile time.
    #[must_use]
    pub fn from_array<const N: usize>(app: [u8; N]) -> Self {
        const { assert!(N <= MAX_APP_PAYLOAD) };
        let mut payload = Self::new();
        payload.buf.extend(app);
        payload
    }

    /// Create a frame carrying `app` as its application payload.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLarge`] if `app` exceeds [`MAX_APP_PAYLOAD`].
    pub fn from_app(app: &[u8]) -> Result<Self, FrameError> {
        let mut payload = Self::new();
        payload.extend_from_slice(app)?;
        Ok(payload)
    }

    /// Append one application byte.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLarge`] if the frame is full.
    pub fn push(&mut self, byte: u8) -> Result<(), FrameError> {
        self.buf.push(byte).map_err(|_| FrameError::PayloadTooLarge)
    }

    /// Append application bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLarge`] if they do not fit; the frame
    /// is left unchanged in that case.
    pub fn extend_from_slice(&mut self, app: &[u8]) -> Result<(), FrameError> {
        self.buf
            .extend_from_slice(app)
            .map_err(|_| FrameError::PayloadTooLarge)
    }

    /// Number of application bytes (excluding the prefix).
    #[inline]
    #[must_use]
    pub fn app_len(&self) -> usize {
        self.buf.len() - CHECKSUM_LEN
    }

    /// The application payload.
    #[inline]
    #[must_use]
    pub fn app_payload(&self) -> &[u8] {
        &self.buf[CHECKSUM_LEN..]
    }

    /// The checksum currently stored in the prefix.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]])
    }

    /// The whole frame, prefix included.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Compute and store the checksum; returns it.
    pub fn seal(&mut self) -> u32 {
        let (prefix, app) = self.buf.split_at_mut(CHECKSUM_LEN);
        let checksum = calculate_crc32(app);
        prefix.copy_from_slice(&checksum.to_be_bytes());
        checksum
    }

    /// Seal and render the frame into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::BufferTooSmall`] if `out` cannot hold the line.
    pub fn encode(&mut self, out: &mut [u8]) -> Result<usize, FrameError> {
        self.seal();
        encode(&self.buf, out)
    }

    /// Seal and write the frame to an `embedded_io::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::WriteError`] if the write fails.
    #[cfg(feature = "embedded-io")]
    pub fn write_to<W: embedded_io::Write>(&mut self, writer: &mut W) -> Result<(), FrameError> {
        write_frame(writer, &mut self.buf)
    }
}

impl Default for FramePayload {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_seal_writes_big_endian_prefix() {
        let mut buf = *b"\0\0\0\0123456789";
        let checksum = seal(&mut buf).unwrap();
        assert_eq!(checksum, 0xCBF4_3926);
        assert_eq!(&buf[..4], &[0xCB, 0xF4, 0x39, 0x26]);
        assert_eq!(&buf[4..], b"123456789");
    }

    #[test]
    fn test_seal_ignores_stale_prefix() {
        let mut a = *b"\0\0\0\0123456789";
        let mut b = *b"\xDE\xAD\xBE\xEF123456789";
        assert_eq!(seal(&mut a).unwrap(), seal(&mut b).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_seal_rejects_missing_prefix() {
        let mut buf = [0u8; 3];
        assert_eq!(seal(&mut buf), Err(FrameError::PrefixMissing));
    }

    #[test]
    fn test_frame_known_line() {
        let mut buf = *b"\0\0\0\0123456789";
        let mut out = [0u8; 64];
        let len = frame(&mut buf, &mut out).unwrap();
        assert_eq!(&out[..len], b"{{{CBF43926313233343536373839}}}\r\n");
        assert_eq!(len, encoded_len(buf.len()));
    }

    #[test]
    fn test_frame_empty_payload() {
        let mut buf = [0xAAu8; 4];
        let mut out = [0u8; 32];
        let len = frame(&mut buf, &mut out).unwrap();
        assert_eq!(&out[..len], b"{{{00000000}}}\r\n");
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let buf = [0u8; 8];
        let mut out = [0u8; 10];
        assert_eq!(encode(&buf, &mut out), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_frame_payload_layout() {
        let mut payload = FramePayload::from_app(&[0x99, 0x04, 0x05]).unwrap();
        assert_eq!(payload.app_len(), 3);
        assert_eq!(payload.as_bytes(), &[0, 0, 0, 0, 0x99, 0x04, 0x05]);

        let checksum = payload.seal();
        assert_eq!(payload.checksum(), checksum);
        assert_eq!(checksum, calculate_crc32(&[0x99, 0x04, 0x05]));
        assert_eq!(payload.app_payload(), &[0x99, 0x04, 0x05]);
    }

    #[test]
    fn test_frame_payload_capacity() {
        let full = [0x42u8; MAX_APP_PAYLOAD];
        let mut payload = FramePayload::from_app(&full).unwrap();
        assert_eq!(payload.push(0), Err(FrameError::PayloadTooLarge));

        let too_big = [0u8; MAX_APP_PAYLOAD + 1];
        assert_eq!(
            FramePayload::from_app(&too_big),
            Err(FrameError::PayloadTooLarge)
        );

        let mut line = [0u8; MAX_ENCODED_LEN];
        let len = payload.encode(&mut line).unwrap();
        assert_eq!(len, MAX_ENCODED_LEN);
    }

    #[test]
    fn test_from_array() {
        let payload = FramePayload::from_array([0x99, 0x04, 0x05]);
        assert_eq!(payload, FramePayload::from_app(&[0x99, 0x04, 0x05]).unwrap());

        let full = FramePayload::from_array([0x42u8; MAX_APP_PAYLOAD]);
        assert_eq!(full.app_len(), MAX_APP_PAYLOAD);
        assert_eq!(FramePayload::from_array([]), FramePayload::new());
    }

    #[cfg(feature = "embedded-io")]
    mod io {
        extern crate std;

        use super::super::*;
        use embedded_io::ErrorKind;
        use std::vec::Vec;

        #[derive(Default)]
        struct Port {
            written: Vec<u8>,
            writes: usize,
            broken: bool,
        }

        impl embedded_io::ErrorType for Port {
            type Error = ErrorKind;
        }

        impl embedded_io::Write for Port {
            fn write(&mut self, buf: &[u8]) -> Result<usize, ErrorKind> {
                self.writes += 1;
                if self.broken {
                    return Err(ErrorKind::BrokenPipe);
                }
                self.written.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> Result<(), ErrorKind> {
                Ok(())
            }
        }

        #[test]
        fn test_write_frame_single_line() {
            let mut port = Port::default();
            let mut frame = *b"\0\0\0\0GPIO\x15";
            write_frame(&mut port, &mut frame).unwrap();
            assert_eq!(port.writes, 1);
            assert_eq!(port.written, b"{{{828B7D884750494F15}}}\r\n");
        }

        #[test]
        fn test_write_frame_largest() {
            let mut port = Port::default();
            let mut frame = [0x5Au8; MAX_FRAME_LEN];
            write_frame(&mut port, &mut frame).unwrap();
            assert_eq!(port.written.len(), MAX_ENCODED_LEN);
        }

        #[test]
        fn test_write_frame_oversize() {
            let mut port = Port::default();
            let mut frame = [0u8; MAX_FRAME_LEN + 1];
            assert_eq!(
                write_frame(&mut port, &mut frame),
                Err(FrameError::PayloadTooLarge)
            );
            assert_eq!(port.writes, 0);
        }

        #[test]
        fn test_write_frame_writer_error() {
            let mut port = Port {
                broken: true,
                ..Default::default()
            };
            let mut payload = FramePayload::from_array(*b"GPIO\x01");
            assert_eq!(payload.write_to(&mut port), Err(FrameError::WriteError));
            assert!(port.written.is_empty());
        }
    }
}
