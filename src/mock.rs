//! Test doubles for the bus, the PSON pin and the delay.
//!
//! Each fake is a cheap handle onto shared state, so a test can keep a clone to program faults
//! and inspect traffic while the driver owns the other.

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin, StatefulOutputPin};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

use crate::eeprom::EEPROM_SIZE;
use crate::register::{EEPROM_ADDRESS, STATUS_ADDRESS};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub address: u8,
    pub written: Vec<u8>,
    pub requested: usize,
}

pub struct BusState {
    pub eeprom: [u8; EEPROM_SIZE],
    pub status: u8,
    /// Status device fails with this error.
    pub status_error: Option<ErrorKind>,
    /// Status device acknowledges but returns nothing.
    pub status_silent: bool,
    /// EEPROM reads starting at these offsets fail.
    pub failing_offsets: Vec<u8>,
    /// Cap on the bytes returned per EEPROM read.
    pub short_read: Option<usize>,
    pub requests: Vec<Request>,
}

#[derive(Clone)]
pub struct FakeBus(Rc<RefCell<BusState>>);

impl FakeBus {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(BusState {
            eeprom: [0; EEPROM_SIZE],
            status: 0,
            status_error: None,
            status_silent: false,
            failing_offsets: Vec::new(),
            short_read: None,
            requests: Vec::new(),
        })))
    }

    pub fn with_eeprom(eeprom: [u8; EEPROM_SIZE]) -> Self {
        let bus = Self::new();
        bus.state().eeprom = eeprom;
        bus
    }

    pub fn state(&self) -> RefMut<'_, BusState> {
        self.0.borrow_mut()
    }
}

impl Transport for FakeBus {
    type Error = ErrorKind;

    fn write_then_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<usize, Self::Error> {
        let mut state = self.state();
        state.requests.push(Request {
            address,
            written: bytes.to_vec(),
            requested: buffer.len(),
        });

        match address {
            STATUS_ADDRESS => {
                if let Some(error) = state.status_error {
                    return Err(error);
                }
                if state.status_silent || buffer.is_empty() {
                    return Ok(0);
                }
                buffer[0] = state.status;
                Ok(1)
            }
            EEPROM_ADDRESS => {
                let offset = bytes[0];
                if state.failing_offsets.contains(&offset) {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                }
                let count = state.short_read.map_or(buffer.len(), |cap| cap.min(buffer.len()));
                for (i, byte) in buffer[..count].iter_mut().enumerate() {
                    // The EEPROM address counter wraps at the end of the array.
                    *byte = state.eeprom[(offset as usize + i) % EEPROM_SIZE];
                }
                Ok(count)
            }
            _ => Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
        }
    }
}

#[derive(Default)]
pub struct PinState {
    pub high: bool,
    pub fail: bool,
    pub writes: Vec<bool>,
}

#[derive(Clone, Default)]
pub struct FakePin(Rc<RefCell<PinState>>);

impl FakePin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RefMut<'_, PinState> {
        self.0.borrow_mut()
    }

    fn set(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
        let mut state = self.state();
        if state.fail {
            return Err(digital::ErrorKind::Other);
        }
        state.high = high;
        state.writes.push(high);
        Ok(())
    }
}

impl ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

impl StatefulOutputPin for FakePin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state().high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state().high)
    }
}

/// Records requested delays instead of sleeping.
#[derive(Clone, Default)]
pub struct FakeDelay(Rc<RefCell<Vec<u32>>>);

impl FakeDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay so far, in nanoseconds.
    pub fn calls(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms * 1_000_000);
    }
}
