//! Memory dump formatting
//!
//! Output is grouped in rows of [`BYTES_PER_ROW`] bytes, each prefixed by the
//! address of its first byte:
//!
//! ```text
//! 0x08008000: ff ff ff ff 00 01 02 03 ff ff ff ff ff ff ff ff
//! 0x08008010: 12 34
//! ```
//!
//! ASCII mode writes the bytes themselves, control characters included.

use crate::console::Terminal;

/// Bytes rendered per output row
pub const BYTES_PER_ROW: usize = 16;

/// How bytes are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    /// Two digit hexadecimal, space separated
    Hex,
    /// Raw characters
    Ascii,
}

/// A range of memory to dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRequest {
    /// First address
    pub start: u32,
    /// Number of bytes
    pub count: u32,
    /// Rendering
    pub mode: DumpMode,
}

/// Render one row with `label` as its address
pub fn write_row(out: &mut dyn Terminal, label: u32, bytes: &[u8], mode: DumpMode) {
    write!(out, "0x{:08X}:", label);
    match mode {
        DumpMode::Hex => {
            for byte in bytes {
                write!(out, " {:02x}", byte);
            }
        }
        DumpMode::Ascii => {
            out.write_bytes(b" ");
            out.write_bytes(bytes);
        }
    }
    out.write_bytes(b"\n");
}

/// Render `request`, fetching each row through `read`
///
/// Stops at the first failing read and returns its error; rows rendered
/// before the failure stay on the console. Returns the number of rows
/// written.
pub fn render<E>(
    out: &mut dyn Terminal,
    request: &DumpRequest,
    mut read: impl FnMut(u32, &mut [u8]) -> Result<(), E>,
) -> Result<usize, E> {
    let mut buf = [0u8; BYTES_PER_ROW];
    let mut remaining = request.count;
    let mut address = request.start;
    let mut rows = 0;

    while remaining > 0 {
        let len = remaining.min(BYTES_PER_ROW as u32) as usize;
        read(address, &mut buf[..len])?;
        write_row(out, address, &buf[..len], request.mode);

        rows += 1;
        remaining -= len as u32;
        address = address.wrapping_add(len as u32);
    }

    Ok(rows)
}
