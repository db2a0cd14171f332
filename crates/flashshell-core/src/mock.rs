//! Test doubles for the flash driver, the record store and the console

use std::collections::BTreeMap;
use std::string::String;
use std::vec;
use std::vec::Vec;

use crate::console::Terminal;
use crate::error::{DriverError, StoreError};
use crate::flash::{FlashDriver, Geometry};
use crate::store::{RecordId, RecordStore, StoreStatus};

pub const ERR_LOCKED: u32 = 0x80;
pub const ERR_PROGRAM: u32 = 0x04;
pub const ERR_RANGE: u32 = 0x100;
pub const ERR_INJECTED: u32 = 0x10;

/// Console capturing everything written to it
#[derive(Default)]
pub struct Capture {
    pub bytes: Vec<u8>,
}

impl Capture {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl Terminal for Capture {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

/// Driver call as recorded by [`MockFlash`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Erase(u32),
    Program(u32, u16),
    Read(u32, usize),
    Lock,
    Unlock,
}

/// Flash driver double recording every call
pub struct MockFlash {
    geometry: Geometry,
    memory: Vec<u8>,
    locked: bool,
    pub ops: Vec<Op>,
    /// Erase of this address fails
    pub fail_erase_at: Option<u32>,
    /// Programming reports success without changing memory
    pub drop_programs: bool,
    /// Unlock is rejected
    pub fail_unlock: bool,
}

impl MockFlash {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            memory: vec![0xFF; geometry.total_size() as usize],
            locked: true,
            ops: Vec::new(),
            fail_erase_at: None,
            drop_programs: false,
            fail_unlock: false,
        }
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn erases(&self) -> Vec<u32> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Erase(address) => Some(*address),
                _ => None,
            })
            .collect()
    }

    pub fn programs(&self) -> Vec<(u32, u16)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Program(address, value) => Some((*address, *value)),
                _ => None,
            })
            .collect()
    }

    fn offset(&self, address: u32, len: usize) -> Result<usize, DriverError> {
        if !self.geometry.contains(address) {
            return Err(DriverError::new(ERR_RANGE));
        }
        let offset = (address - self.geometry.base) as usize;
        if offset + len > self.memory.len() {
            return Err(DriverError::new(ERR_RANGE));
        }
        Ok(offset)
    }
}

impl FlashDriver for MockFlash {
    fn erase_page(&mut self, address: u32) -> Result<(), DriverError> {
        self.ops.push(Op::Erase(address));
        if self.locked {
            return Err(DriverError::new(ERR_LOCKED));
        }
        if self.fail_erase_at == Some(address) {
            return Err(DriverError::new(ERR_INJECTED));
        }
        let page_size = self.geometry.page_size as usize;
        let offset = self.offset(address, page_size)?;
        self.memory[offset..offset + page_size].fill(0xFF);
        Ok(())
    }

    fn program_half_word(&mut self, address: u32, value: u16) -> Result<(), DriverError> {
        self.ops.push(Op::Program(address, value));
        if self.locked {
            return Err(DriverError::new(ERR_LOCKED));
        }
        let offset = self.offset(address, 2)?;
        let current = u16::from_le_bytes([self.memory[offset], self.memory[offset + 1]]);
        if current != 0xFFFF && value != 0 {
            return Err(DriverError::new(ERR_PROGRAM));
        }
        if !self.drop_programs {
            self.memory[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), DriverError> {
        self.ops.push(Op::Read(address, buf.len()));
        let offset = self.offset(address, buf.len())?;
        buf.copy_from_slice(&self.memory[offset..offset + buf.len()]);
        Ok(())
    }

    fn lock(&mut self) {
        self.ops.push(Op::Lock);
        self.locked = true;
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        self.ops.push(Op::Unlock);
        if self.fail_unlock {
            return Err(DriverError::new(ERR_INJECTED));
        }
        self.locked = false;
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.locked
    }
}

/// Record store double keeping records in a map
pub struct MemStore {
    pub records: BTreeMap<RecordId, Vec<u8>>,
    pub id_count: u8,
    pub max_record_len: usize,
    pub formats: usize,
}

impl Default for MemStore {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
            id_count: 4,
            max_record_len: 16,
            formats: 0,
        }
    }
}

impl RecordStore for MemStore {
    fn id_count(&self) -> u8 {
        self.id_count
    }

    fn max_record_len(&self) -> usize {
        self.max_record_len
    }

    fn format(&mut self, _flash: &mut dyn FlashDriver) -> Result<(), StoreError> {
        self.formats += 1;
        self.records.clear();
        Ok(())
    }

    fn write(
        &mut self,
        _flash: &mut dyn FlashDriver,
        id: RecordId,
        data: &[u8],
    ) -> Result<(), StoreError> {
        if id >= self.id_count {
            return Err(StoreError::InvalidId(id));
        }
        self.records.insert(id, data.to_vec());
        Ok(())
    }

    fn read(
        &mut self,
        _flash: &mut dyn FlashDriver,
        id: RecordId,
        buf: &mut [u8],
    ) -> Result<Option<usize>, StoreError> {
        Ok(self.records.get(&id).map(|data| {
            buf[..data.len()].copy_from_slice(data);
            data.len()
        }))
    }

    fn delete(&mut self, _flash: &mut dyn FlashDriver, id: RecordId) -> Result<(), StoreError> {
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn status(&mut self, _flash: &mut dyn FlashDriver) -> Result<StoreStatus, StoreError> {
        let used = self.records.values().map(|r| r.len() as u32).sum();
        Ok(StoreStatus {
            records: self.records.len() as u32,
            entries: self.records.len() as u32,
            used,
            capacity: 256,
        })
    }
}
