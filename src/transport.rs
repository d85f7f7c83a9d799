use embedded_hal::i2c::{Error, ErrorKind, ErrorType, I2c, NoAcknowledgeSource};

/// Byte oriented access to the I2C bus the supply hangs off.
///
/// Any [`embedded_hal::i2c::I2c`] bus is a transport. Implement this directly for buses that can
/// report short reads.
pub trait Transport {
    type Error: Error;

    /// Writes `bytes` (possibly none) to `address`, then without releasing the bus reads up to
    /// `buffer.len()` bytes into the front of `buffer`.
    ///
    /// Returns the number of bytes received. Bytes of `buffer` past that count are left as they
    /// were.
    fn write_then_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error>;
}

/// An empty `bytes` relies on the HAL sending an address-only write followed by a repeated
/// start. Some HALs skip or reject zero-length writes.
impl<T: I2c> Transport for T {
    type Error = <T as ErrorType>::Error;

    fn write_then_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error> {
        I2c::write_read(self, address, bytes, buffer)?;
        Ok(buffer.len())
    }
}

/// Maps a bus error onto the numeric status codes of the Arduino `Wire` library, which is what
/// the diagnostic scan line has always reported.
pub fn wire_status<E: Error>(error: &E) -> u8 {
    match error.kind() {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => 2,
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => 3,
        _ => 4,
    }
}
