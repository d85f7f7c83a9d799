//! Diagnostic text written to the optional debug sink.
//!
//! Every line ends in CRLF so the stream can be fed straight to a serial console.

use core::fmt::{self, Display, Write};

/// Placeholder sink for a driver without diagnostics. Discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl Write for NullSink {
    fn write_str(&mut self, _s: &str) -> fmt::Result {
        Ok(())
    }
}

/// One EEPROM read rendered as `<offset>: <hex bytes> <ascii>`.
pub struct HexDump<'a> {
    pub offset: u8,
    pub bytes: &'a [u8],
}

impl Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}: ", self.offset)?;
        for byte in self.bytes {
            write!(f, "{byte:02x} ")?;
        }
        for &byte in self.bytes {
            f.write_char(printable(byte))?;
        }
        Ok(())
    }
}

/// Printable ASCII as is, anything else as `.`.
pub(crate) fn printable(byte: u8) -> char {
    if (32..127).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

pub(crate) fn hex_dump<W: Write>(sink: &mut W, offset: u8, bytes: &[u8]) -> fmt::Result {
    write!(sink, "{}\r\n", HexDump { offset, bytes })
}

pub(crate) fn scan_line<W: Write>(sink: &mut W, status: u8, bytes: usize, reg: u8) -> fmt::Result {
    write!(sink, "{status:2},{bytes:2},{reg:02x}\r\n")
}

pub(crate) fn power_line<W: Write>(sink: &mut W, watts: Option<u16>) -> fmt::Result {
    match watts {
        Some(watts) => write!(sink, "{watts}W\r\n"),
        None => sink.write_str("?W\r\n"),
    }
}

pub(crate) fn text_line<W: Write, T: Display>(sink: &mut W, text: T) -> fmt::Result {
    write!(sink, "{text}\r\n")
}
