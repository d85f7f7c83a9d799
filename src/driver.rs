use crate::debug::{self, NullSink};
use crate::eeprom::{Description, EepromImage, CHUNK_LEN, EEPROM_SIZE};
use crate::register::{StatusFlags, EEPROM_ADDRESS, STATUS_ADDRESS};
use crate::transport::{wire_status, Transport};
use core::fmt::Write;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, StatefulOutputPin};
use log::{debug, trace, warn};

const CHUNK_DELAY_MS: u32 = 50;

#[derive(Copy, Clone, Debug)]
pub enum Ds550Error<BUS, PIN> {
    Bus(BUS),
    Pin(PIN),
    ShortRead { requested: usize, received: usize },
}

pub struct Ds550Config {
    /// Address of the status microcontroller
    pub status_address: u8,
    /// Address of the FRU EEPROM
    pub eeprom_address: u8,
    /// Settle time before each 16 byte EEPROM read
    pub chunk_delay_ms: u32,
}

impl Default for Ds550Config {
    fn default() -> Self {
        Self {
            status_address: STATUS_ADDRESS,
            eeprom_address: EEPROM_ADDRESS,
            chunk_delay_ms: CHUNK_DELAY_MS,
        }
    }
}

/// What init managed to read. Init itself never fails on bus errors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Chunks the EEPROM refused; those bytes stay zero
    pub failed_chunks: usize,
    /// Chunks that came back with fewer than 16 bytes
    pub short_chunks: usize,
    /// Decoded rating, `None` if the data area lies outside the image
    pub power_rating: Option<u16>,
}

pub struct Ds550Driver<I2C, PSON, Delay, W = NullSink> {
    i2c: I2C,
    pson: PSON,
    delay: Delay,
    sink: Option<W>,
    config: Ds550Config,
    eeprom: EepromImage,
    status_register: u8,
    flags: StatusFlags,
}

impl<I2C, PSON, Delay> Ds550Driver<I2C, PSON, Delay, NullSink>
where
    I2C: Transport,
    PSON: OutputPin,
    Delay: DelayNs,
{
    ///
    ///
    /// # Arguments
    ///
    /// * `i2c`: The bus both PSU devices sit on.
    /// * `pson`: The output driving the PSON line. Low switches the main rails on.
    /// * `delay`: Used to pace EEPROM reads during init.
    ///
    /// No bus traffic happens until [`Ds550Driver::init`].
    pub fn new(i2c: I2C, pson: PSON, delay: Delay) -> Self {
        Self::with_config(i2c, pson, delay, Ds550Config::default())
    }

    pub fn with_config(i2c: I2C, pson: PSON, delay: Delay, config: Ds550Config) -> Self {
        Self {
            i2c,
            pson,
            delay,
            sink: None,
            config,
            eeprom: EepromImage::new(),
            status_register: 0,
            flags: StatusFlags::default(),
        }
    }
}

impl<I2C, PSON, Delay, W> Ds550Driver<I2C, PSON, Delay, W>
where
    I2C: Transport,
    PSON: OutputPin,
    Delay: DelayNs,
    W: Write,
{
    /// Sends diagnostic text to `sink`. Pass `&mut sink` to keep ownership.
    pub fn with_debug<S: Write>(self, sink: S) -> Ds550Driver<I2C, PSON, Delay, S> {
        Ds550Driver {
            i2c: self.i2c,
            pson: self.pson,
            delay: self.delay,
            sink: Some(sink),
            config: self.config,
            eeprom: self.eeprom,
            status_register: self.status_register,
            flags: self.flags,
        }
    }

    /// Reads the whole EEPROM, decodes identification and rating, then puts the supply in
    /// standby.
    ///
    /// EEPROM failures are only counted in the report. The only error is a failure to drive
    /// the PSON pin.
    pub fn init(&mut self) -> Result<InitReport, Ds550Error<I2C::Error, PSON::Error>> {
        let mut report = InitReport::default();

        self.eeprom.clear();

        for chunk in 0..EEPROM_SIZE / CHUNK_LEN {
            self.delay.delay_ms(self.config.chunk_delay_ms);

            let offset = (chunk * CHUNK_LEN) as u8;
            let Self {
                i2c,
                sink,
                config,
                eeprom,
                ..
            } = self;

            match read_eeprom_into(
                i2c,
                config.eeprom_address,
                sink.as_mut(),
                offset,
                eeprom.chunk_mut(chunk),
            ) {
                Ok(received) if received < CHUNK_LEN => {
                    warn!("EEPROM chunk {offset:#04x}: short read, {received} of {CHUNK_LEN} bytes");
                    report.short_chunks += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("EEPROM chunk {offset:#04x}: read failed: {e:?}");
                    report.failed_chunks += 1;
                }
            }
        }

        report.power_rating = self.eeprom.power_rating();
        if report.power_rating.is_none() {
            warn!(
                "EEPROM data area at offset {} lies outside the image",
                self.eeprom.data_region().offset
            );
        }
        let description = self.eeprom.description();
        if !description.is_printable() {
            warn!(
                "EEPROM description has non-printable bytes: {:02x?}",
                description.as_bytes()
            );
        }
        debug!(
            "PSU \"{}\", rated {:?} W, product area at {}",
            self.eeprom.description(),
            report.power_rating,
            self.eeprom.product_region().offset
        );

        if let Some(sink) = self.sink.as_mut() {
            let _ = debug::text_line(sink, self.eeprom.description());
            let _ = debug::power_line(sink, report.power_rating);
        }

        self.standby()?;

        if let Some(sink) = self.sink.as_mut() {
            let _ = debug::text_line(sink, "ds550::init() complete");
        }

        Ok(report)
    }

    /// Polls the status register.
    ///
    /// Always returns the current flags. If the bus fails they are simply the ones from the
    /// last good read; see [`Ds550Driver::try_scan`] to find out.
    pub fn scan(&mut self) -> StatusFlags {
        let _ = self.try_scan();
        self.flags
    }

    /// Polls the status register, reporting why the flags could not be refreshed.
    ///
    /// Flags are left untouched on error.
    pub fn try_scan(&mut self) -> Result<StatusFlags, Ds550Error<I2C::Error, PSON::Error>> {
        let mut reg = [0u8; 1];
        // The status micro wants an empty write ending in a repeated start before the read.
        let result = self
            .i2c
            .write_then_read(self.config.status_address, &[], &mut reg);

        let (status, received) = match &result {
            Ok(received) => (0, *received),
            Err(e) => (wire_status(e), 0),
        };
        trace!("status scan: status {status}, {received} bytes, reg {:#04x}", reg[0]);

        if received > 0 {
            let flags = StatusFlags::from_register(reg[0]);
            if flags != self.flags {
                debug!("status {:#04x} -> {:#04x}: {flags:?}", self.status_register, reg[0]);
            }
            self.status_register = reg[0];
            self.flags = flags;
        }

        if let Some(sink) = self.sink.as_mut() {
            let _ = debug::scan_line(sink, status, received, self.status_register);
        }

        match result {
            Err(e) => Err(Ds550Error::Bus(e)),
            Ok(0) => Err(Ds550Error::ShortRead {
                requested: 1,
                received: 0,
            }),
            Ok(_) => Ok(self.flags),
        }
    }

    /// De-asserts PSON. Only the 3.3V auxiliary rail stays up.
    pub fn standby(&mut self) -> Result<(), Ds550Error<I2C::Error, PSON::Error>> {
        debug!("PSON high: standby");
        self.pson.set_high().map_err(Ds550Error::Pin)
    }

    /// Asserts PSON, enabling the main output rails.
    pub fn on(&mut self) -> Result<(), Ds550Error<I2C::Error, PSON::Error>> {
        debug!("PSON low: on");
        self.pson.set_low().map_err(Ds550Error::Pin)
    }

    /// Reads `buffer.len()` bytes of EEPROM starting at `offset`.
    ///
    /// Returns the first four bytes received packed big endian, for diagnostics. On a short
    /// read only the front of `buffer` is overwritten.
    pub fn read_eeprom(&mut self, offset: u8, buffer: &mut [u8]) -> u32 {
        match self.try_read_eeprom(offset, buffer) {
            Ok(received) => pack_head(&buffer[..received]),
            Err(_) => 0,
        }
    }

    /// Like [`Ds550Driver::read_eeprom`] but returns how many bytes arrived.
    pub fn try_read_eeprom(
        &mut self,
        offset: u8,
        buffer: &mut [u8],
    ) -> Result<usize, Ds550Error<I2C::Error, PSON::Error>> {
        read_eeprom_into(
            &mut self.i2c,
            self.config.eeprom_address,
            self.sink.as_mut(),
            offset,
            buffer,
        )
        .map_err(Ds550Error::Bus)
    }

    /// Flags from the last successful scan.
    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Raw status register from the last successful scan.
    pub fn status_register(&self) -> u8 {
        self.status_register
    }

    /// EEPROM snapshot taken by init.
    pub fn eeprom(&self) -> &EepromImage {
        &self.eeprom
    }

    pub fn power_rating(&self) -> Option<u16> {
        self.eeprom.power_rating()
    }

    pub fn description(&self) -> Description<'_> {
        self.eeprom.description()
    }

    /// Hands the bus, pin and delay back.
    pub fn release(self) -> (I2C, PSON, Delay) {
        (self.i2c, self.pson, self.delay)
    }
}

impl<I2C, PSON, Delay, W> Ds550Driver<I2C, PSON, Delay, W>
where
    I2C: Transport,
    PSON: StatefulOutputPin,
{
    /// Reads PSON back. There is no other record of the power state.
    pub fn is_on(&mut self) -> Result<bool, Ds550Error<I2C::Error, PSON::Error>> {
        self.pson.is_set_low().map_err(Ds550Error::Pin)
    }

    pub fn is_standby(&mut self) -> Result<bool, Ds550Error<I2C::Error, PSON::Error>> {
        self.pson.is_set_high().map_err(Ds550Error::Pin)
    }
}

fn read_eeprom_into<T: Transport, W: Write>(
    i2c: &mut T,
    address: u8,
    sink: Option<&mut W>,
    offset: u8,
    buffer: &mut [u8],
) -> Result<usize, T::Error> {
    let result = i2c.write_then_read(address, &[offset], buffer);
    let received = match &result {
        Ok(received) => (*received).min(buffer.len()),
        Err(_) => 0,
    };
    trace!("EEPROM read {offset:#04x}: {received} of {} bytes", buffer.len());

    if let Some(sink) = sink {
        let _ = debug::hex_dump(sink, offset, &buffer[..received]);
    }

    result.map(|_| received)
}

/// Packs up to the first four bytes big endian.
fn pack_head(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0, |acc, &b| (acc << 8) | b as u32)
}

#[cfg(feature = "std")]
impl<BUS, PIN> std::fmt::Display for Ds550Error<BUS, PIN>
where
    BUS: std::fmt::Debug,
    PIN: std::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ds550Error::Bus(bus) => write!(f, "I2C Error: {bus:?}"),
            Ds550Error::Pin(pin) => write!(f, "PSON Pin Error: {pin:?}"),
            Ds550Error::ShortRead {
                requested,
                received,
            } => write!(f, "Short read: {received} of {requested} bytes"),
        }
    }
}

#[cfg(feature = "std")]
impl<BUS, PIN> std::error::Error for Ds550Error<BUS, PIN>
where
    BUS: std::fmt::Debug,
    PIN: std::fmt::Debug,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
