//! Hex digit conversion for the framed wire format.
//!
//! These functions work on byte buffers directly, without heap allocation
//! or `core::fmt`.

/// Hex digits lookup table for fast conversion.
const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Write a u8 as 2 uppercase hex digits, zero-padded.
///
/// Returns the number of bytes written (always 2).
///
/// # Panics
///
/// Panics if `buf.len() < 2`.
#[inline]
pub fn write_hex_u8(buf: &mut [u8], value: u8) -> usize {
    debug_assert!(buf.len() >= 2, "buffer too small for hex u8");
    buf[0] = HEX_DIGITS[(value >> 4) as usize];
    buf[1] = HEX_DIGITS[(value & 0xF) as usize];
    2
}

/// Write every byte of `data` as hex digit pairs.
///
/// Returns the number of bytes written (`2 * data.len()`).
///
/// # Panics
///
/// Panics if `buf.len() < 2 * data.len()`.
#[inline]
pub fn write_hex(buf: &mut [u8], data: &[u8]) -> usize {
    let mut pos = 0;
    for &b in data {
        pos += write_hex_u8(&mut buf[pos..], b);
    }
    pos
}

/// Value of a single hex digit, upper or lower case.
#[inline]
#[must_use]
pub const fn hex_nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}
