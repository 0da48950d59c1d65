//! Digital input sampling.

use embedded_hal::digital::InputPin;

use crate::config::INPUT_LINE_COUNT;

const _: () = assert!(INPUT_LINE_COUNT <= u8::BITS as usize);

/// A fixed set of digital input lines, indexed from zero.
///
/// Implemented for arrays of [`InputPin`]s; a pin that fails to read is
/// reported as low.
pub trait InputLines {
    /// Number of lines in the set.
    fn line_count(&self) -> usize;

    /// Whether `line` currently reads high. Out-of-range lines read low.
    fn is_high(&mut self, line: usize) -> bool;
}

impl<P: InputPin, const N: usize> InputLines for [P; N] {
    fn line_count(&self) -> usize {
        N
    }

    fn is_high(&mut self, line: usize) -> bool {
        match self.get_mut(line) {
            Some(pin) => pin.is_high().unwrap_or(false),
            None => false,
        }
    }
}

impl<L: InputLines + ?Sized> InputLines for &mut L {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn is_high(&mut self, line: usize) -> bool {
        (**self).is_high(line)
    }
}

/// Read the first eight lines into a bitmask; bit `i` is set iff line `i` is high.
///
/// Lines are read in order, lowest first. Sets with fewer than eight lines
/// leave the upper bits clear.
///
/// # Example
///
/// ```
/// use relay_core::{sample, InputLines};
///
/// struct Lines([bool; 8]);
///
/// impl InputLines for Lines {
///     fn line_count(&self) -> usize { 8 }
///     fn is_high(&mut self, line: usize) -> bool { self.0[line] }
/// }
///
/// let mut lines = Lines([true, false, true, false, true, false, false, false]);
/// assert_eq!(sample(&mut lines), 0x15);
/// ```
pub fn sample<L: InputLines + ?Sized>(lines: &mut L) -> u8 {
    let count = lines.line_count().min(INPUT_LINE_COUNT);
    let mut mask = 0u8;
    for line in 0..count {
        if lines.is_high(line) {
            mask |= 1 << line;
        }
    }
    mask
}
