//!
//! A platform-agnostic driver for the Astec DS550-3 server power supply. Built using embedded-hal.
//!
//! The supply exposes two I2C devices: a small status microcontroller (one 8-bit fault/health
//! register) and a FRU EEPROM holding identification and power rating data. A single digital
//! line, PSON, switches the supply between standby (3.3V auxiliary only) and full output.
//!
//! The Dell AA23300 behaves much the same on the bus; its EEPROM also answers at `0x56`.
//!
//! ```no_run
//! # use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
//! # fn example<I: I2c, P: OutputPin, D: DelayNs>(i2c: I, pson: P, delay: D) {
//! use ds550::Ds550Driver;
//!
//! let mut psu = Ds550Driver::new(i2c, pson, delay);
//! let _ = psu.init();
//! let _ = psu.on();
//!
//! let flags = psu.scan();
//! if flags.has_fault() {
//!     let _ = psu.standby();
//! }
//! # }
//! ```
//!

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod debug;
pub mod driver;
pub mod eeprom;
pub mod register;
pub mod transport;

#[cfg(test)]
mod mock;

pub use debug::NullSink;
pub use driver::*;
pub use eeprom::{Description, EepromImage, Region};
pub use register::StatusFlags;
pub use transport::Transport;
