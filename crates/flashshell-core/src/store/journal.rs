//! Append-only record log
//!
//! The store region is a sequence of entries written back to back from its
//! first byte:
//!
//! ```text
//! +--------+--------+----------------------+
//! |   id   |  len   | data, padded to even |
//! +--------+--------+----------------------+
//!   header half-word (little endian)
//! ```
//!
//! An erased header (`0xFFFF`) ends the log. The latest entry for an id
//! wins; an entry with `len == 0` deletes the record. Space is only
//! reclaimed by formatting.

use super::{RecordId, RecordStore, StoreStatus, MAX_RECORD_LEN};
use crate::error::StoreError;
use crate::flash::{FlashDriver, Geometry};

const ERASED: u16 = 0xFFFF;
const HEADER_LEN: u32 = 2;

#[derive(Debug, Clone, Copy)]
struct Entry {
    offset: u32,
    id: RecordId,
    len: usize,
}

const fn entry_size(len: usize) -> u32 {
    HEADER_LEN + ((len as u32 + 1) & !1)
}

/// Append-only record store over a range of flash pages
#[derive(Debug, Clone)]
pub struct LogStore {
    start: u32,
    page_size: u32,
    page_count: u32,
    id_count: u8,
    max_record_len: usize,
}

impl LogStore {
    /// Create a store on pages `first_page..first_page + page_count`
    ///
    /// # Panics
    /// If the pages lie outside `geometry`, if `id_count` would allow the
    /// reserved id `0xFF`, or if `max_record_len` exceeds [`MAX_RECORD_LEN`].
    pub const fn new(
        geometry: &Geometry,
        first_page: u32,
        page_count: u32,
        id_count: u8,
        max_record_len: usize,
    ) -> Self {
        assert!(page_count > 0, "record store needs at least one page");
        assert!(
            first_page + page_count <= geometry.page_count,
            "record store outside flash"
        );
        assert!(id_count < 0xFF, "record id 0xFF is reserved");
        assert!(
            max_record_len > 0 && max_record_len <= MAX_RECORD_LEN,
            "invalid maximum record length"
        );
        Self {
            start: geometry.page_to_address(first_page),
            page_size: geometry.page_size,
            page_count,
            id_count,
            max_record_len,
        }
    }

    /// First address of the store region
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Size of the store region in bytes
    pub fn size(&self) -> u32 {
        self.page_size * self.page_count
    }

    /// Walk the log, calling `visit` for every entry; returns the end offset
    fn scan(
        &self,
        flash: &mut dyn FlashDriver,
        mut visit: impl FnMut(Entry),
    ) -> Result<u32, StoreError> {
        let size = self.size();
        let mut offset = 0;

        while offset + HEADER_LEN <= size {
            let header = flash.read_half_word(self.start + offset)?;
            if header == ERASED {
                break;
            }

            let [id, len] = header.to_le_bytes();
            let len = len as usize;
            let next = offset + entry_size(len);
            if id >= self.id_count || len > self.max_record_len || next > size {
                log::warn!("record store: bad entry {:#06x} at offset {:#x}", header, offset);
                return Err(StoreError::Corrupt { offset });
            }

            visit(Entry { offset, id, len });
            offset = next;
        }

        Ok(offset)
    }

    fn latest(&self, flash: &mut dyn FlashDriver, id: RecordId) -> Result<Option<Entry>, StoreError> {
        let mut latest = None;
        self.scan(flash, |entry| {
            if entry.id == id {
                latest = Some(entry);
            }
        })?;
        Ok(latest.filter(|entry| entry.len > 0))
    }

    fn check_id(&self, id: RecordId) -> Result<(), StoreError> {
        if id >= self.id_count {
            return Err(StoreError::InvalidId(id));
        }
        Ok(())
    }

    fn append(
        &self,
        flash: &mut dyn FlashDriver,
        id: RecordId,
        data: &[u8],
    ) -> Result<(), StoreError> {
        // The pages are shared with the raw flash commands, so the end of
        // the log is found again on every append.
        let end = self.scan(flash, |_| {})?;
        let size = entry_size(data.len());
        if end + size > self.size() {
            return Err(StoreError::NoSpace);
        }

        let address = self.start + end;
        let header = u16::from_le_bytes([id, data.len() as u8]);
        flash.program_half_word(address, header)?;
        for (i, pair) in data.chunks(2).enumerate() {
            let value = u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0xFF)]);
            flash.program_half_word(address + HEADER_LEN + 2 * i as u32, value)?;
        }

        log::debug!(
            "record store: id {} ({} bytes) at offset {:#x}",
            id,
            data.len(),
            end
        );
        Ok(())
    }
}

impl RecordStore for LogStore {
    fn id_count(&self) -> u8 {
        self.id_count
    }

    fn max_record_len(&self) -> usize {
        self.max_record_len
    }

    fn format(&mut self, flash: &mut dyn FlashDriver) -> Result<(), StoreError> {
        for page in 0..self.page_count {
            flash.erase_page(self.start + page * self.page_size)?;
        }
        log::debug!("record store: formatted {} pages", self.page_count);
        Ok(())
    }

    fn write(
        &mut self,
        flash: &mut dyn FlashDriver,
        id: RecordId,
        data: &[u8],
    ) -> Result<(), StoreError> {
        self.check_id(id)?;
        if data.is_empty() || data.len() > self.max_record_len {
            return Err(StoreError::InvalidLength(data.len()));
        }
        self.append(flash, id, data)
    }

    fn read(
        &mut self,
        flash: &mut dyn FlashDriver,
        id: RecordId,
        buf: &mut [u8],
    ) -> Result<Option<usize>, StoreError> {
        self.check_id(id)?;
        let Some(entry) = self.latest(flash, id)? else {
            return Ok(None);
        };
        if buf.len() < entry.len {
            return Err(StoreError::InvalidLength(entry.len));
        }
        flash.read(self.start + entry.offset + HEADER_LEN, &mut buf[..entry.len])?;
        Ok(Some(entry.len))
    }

    fn delete(&mut self, flash: &mut dyn FlashDriver, id: RecordId) -> Result<(), StoreError> {
        self.check_id(id)?;
        if self.latest(flash, id)?.is_none() {
            return Err(StoreError::NotFound(id));
        }
        self.append(flash, id, &[])
    }

    fn status(&mut self, flash: &mut dyn FlashDriver) -> Result<StoreStatus, StoreError> {
        let mut lengths = [0usize; 256];
        let mut entries = 0;
        let used = self.scan(flash, |entry| {
            lengths[entry.id as usize] = entry.len;
            entries += 1;
        })?;

        Ok(StoreStatus {
            records: lengths.iter().filter(|&&len| len > 0).count() as u32,
            entries,
            used,
            capacity: self.size(),
        })
    }
}
