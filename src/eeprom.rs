//! Layout of the FRU EEPROM.
//!
//! The image is an IPMI-style FRU record: an 8-byte common header at offset 0, the chassis info
//! area at offset 8 and a multirecord area with the power supply ratings. Area offsets and
//! lengths are stored in units of 8 bytes. Only the one layout seen on DS550-3 supplies is
//! decoded. Anything pointing outside the image is reported as missing, not guessed at.

use core::fmt::{self, Display, Write};
use core::ops::Range;

use crate::debug::printable;

/// Size of the EEPROM address space.
pub const EEPROM_SIZE: usize = 256;
/// Bytes fetched per read transaction during init.
pub const CHUNK_LEN: usize = 16;
/// Area offsets and lengths are multiples of this.
pub const BLOCK_LEN: usize = 8;

const HEADER_LEN: usize = 8;
const CHASSIS_OFFSET: usize = 8;

const HEADER_DATA_BLOCK: usize = 5;
const CHASSIS_BLOCKS: usize = 1;
const CHASSIS_DESCRIPTION: usize = 11;
const DESCRIPTION_LEN: usize = 30;
const DATA_POWER_RATING: usize = 5;

/// An offset and length window into the image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// A region starting at `offset` and running to the end of the image.
    const fn to_end(offset: usize) -> Self {
        Self::new(offset, EEPROM_SIZE.saturating_sub(offset))
    }

    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset.saturating_add(self.len)
    }

    /// True if the region starts past the end of the image.
    pub const fn is_outside(&self) -> bool {
        self.offset >= EEPROM_SIZE
    }
}

/// Owned copy of the whole EEPROM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EepromImage {
    bytes: [u8; EEPROM_SIZE],
}

impl Default for EepromImage {
    fn default() -> Self {
        Self::new()
    }
}

impl EepromImage {
    /// An all-zero image, which is what the driver holds before init.
    pub const fn new() -> Self {
        Self {
            bytes: [0; EEPROM_SIZE],
        }
    }

    pub const fn from_bytes(bytes: [u8; EEPROM_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; EEPROM_SIZE] {
        &self.bytes
    }

    pub(crate) fn clear(&mut self) {
        self.bytes = [0; EEPROM_SIZE];
    }

    /// The chunk covering `[CHUNK_LEN * index, CHUNK_LEN * (index + 1))`.
    pub(crate) fn chunk_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * CHUNK_LEN;
        &mut self.bytes[start..start + CHUNK_LEN]
    }

    pub fn header_region(&self) -> Region {
        Region::new(0, HEADER_LEN)
    }

    pub fn chassis_region(&self) -> Region {
        let len = BLOCK_LEN * self.bytes[CHASSIS_OFFSET + CHASSIS_BLOCKS] as usize;
        Region::new(CHASSIS_OFFSET, len.min(EEPROM_SIZE - CHASSIS_OFFSET))
    }

    /// Multirecord area holding the PSU, 12V and 3.3V ratings.
    pub fn data_region(&self) -> Region {
        Region::to_end(BLOCK_LEN * self.bytes[HEADER_DATA_BLOCK] as usize)
    }

    /// Follows straight after the chassis area.
    pub fn product_region(&self) -> Region {
        let blocks = self.bytes[CHASSIS_OFFSET + CHASSIS_BLOCKS] as usize;
        Region::to_end(CHASSIS_OFFSET + BLOCK_LEN * blocks)
    }

    /// Bytes of `region`, empty if it lies outside the image.
    pub fn region(&self, region: Region) -> &[u8] {
        self.bytes.get(region.range()).unwrap_or(&[])
    }

    pub fn header(&self) -> &[u8] {
        self.region(self.header_region())
    }

    pub fn chassis(&self) -> &[u8] {
        self.region(self.chassis_region())
    }

    pub fn data(&self) -> &[u8] {
        self.region(self.data_region())
    }

    pub fn product(&self) -> &[u8] {
        self.region(self.product_region())
    }

    /// Rated output power in watts, little endian at bytes 5 and 6 of the data area.
    ///
    /// `None` if the header points the data area outside the image.
    pub fn power_rating(&self) -> Option<u16> {
        let raw = self.data().get(DATA_POWER_RATING..DATA_POWER_RATING + 2)?;
        Some(u16::from_le_bytes([raw[0], raw[1]]))
    }

    /// The 30 character description in the chassis area, cut at the first NUL.
    pub fn description(&self) -> Description<'_> {
        let start = CHASSIS_OFFSET + CHASSIS_DESCRIPTION;
        let raw = &self.bytes[start..start + DESCRIPTION_LEN];
        match raw.iter().position(|&b| b == 0) {
            Some(end) => Description(&raw[..end]),
            None => Description(raw),
        }
    }
}

/// Raw description bytes. Displays with anything outside printable ASCII shown as `.`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Description<'a>(&'a [u8]);

impl<'a> Description<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// False if any byte had to be replaced when displayed.
    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|&b| (32..127).contains(&b))
    }
}

impl Display for Description<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            f.write_char(printable(byte))?;
        }
        Ok(())
    }
}
