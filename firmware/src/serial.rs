//! UARTE transmitter as the relay's serial stream.

use core::convert::Infallible;

use defmt::warn;
use embassy_nrf::uarte::{Instance, UarteTx};

/// Blocking, fire-and-forget serial sink.
///
/// Each write is pushed out with EasyDMA before returning. Transmit errors
/// are logged and the bytes are reported as written; the host resynchronises
/// on the next frame.
pub struct SerialSink<'d, T: Instance> {
    tx: UarteTx<'d, T>,
}

impl<'d, T: Instance> SerialSink<'d, T> {
    pub fn new(tx: UarteTx<'d, T>) -> Self {
        Self { tx }
    }
}

impl<T: Instance> embedded_io::ErrorType for SerialSink<'_, T> {
    type Error = Infallible;
}

impl<T: Instance> embedded_io::Write for SerialSink<'_, T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        if let Err(e) = self.tx.blocking_write(buf) {
            warn!("UART write failed: {:?}", e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}
