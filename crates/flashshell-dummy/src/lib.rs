//! flashshell-dummy - In-memory STM32F1 internal flash emulator
//!
//! This crate provides a flash driver that behaves like the internal flash
//! controller of an STM32F1: it starts locked, erases whole pages to `0xFF`
//! and programs half-words only into erased cells (or clears them to zero).
//! Failures are reported with the status register bits the real controller
//! sets, so the shell prints the same codes against the emulator as on
//! hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;
use core::ops::Range;

use flashshell_core::error::DriverError;
use flashshell_core::flash::{FlashDriver, Geometry};

/// FLASH_SR.PGERR: programming a cell that is not erased
pub const PGERR: u32 = 1 << 2;
/// FLASH_SR.WRPRTERR: erase or program of a write protected page
pub const WRPRTERR: u32 = 1 << 4;
/// FLASH_CR.LOCK: operation attempted while the controller is locked
pub const LOCK: u32 = 1 << 7;
/// Access outside the emulated flash (a bus fault on hardware)
pub const BUS_FAULT: u32 = 1 << 31;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Flash layout
    pub geometry: Geometry,
    /// Pages protected by the option bytes
    pub write_protected: Range<u32>,
    /// Controller refuses every unlock, as after a wrong key sequence
    pub lock_jammed: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            // STM32F103RB
            geometry: Geometry::new(0x0800_0000, 1024, 128),
            write_protected: 0..0,
            lock_jammed: false,
        }
    }
}

/// Operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Successful page erases
    pub erases: u32,
    /// Successful half-word programs
    pub programs: u32,
    /// Operations rejected by the controller
    pub errors: u32,
}

/// Emulated internal flash
///
/// Emulates the flash array and the lock state of the controller.
#[cfg(feature = "alloc")]
#[derive(Debug)]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    locked: bool,
    stats: Stats,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create an erased, locked flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.geometry.total_size() as usize];
        Self {
            config,
            data,
            locked: true,
            stats: Stats::default(),
        }
    }

    /// Create a dummy flash with pre-filled data
    ///
    /// Data beyond the flash size is ignored; a shorter image leaves the rest
    /// erased.
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Operation counters since creation
    pub fn stats(&self) -> Stats {
        self.stats
    }

    fn fail(&mut self, code: u32) -> DriverError {
        self.stats.errors += 1;
        DriverError::new(code)
    }

    /// Byte offset of `address` if `len` bytes from there lie in the flash
    fn offset(&self, address: u32, len: usize) -> Option<usize> {
        let g = &self.config.geometry;
        let offset = address.checked_sub(g.base)? as usize;
        (offset.checked_add(len)? <= self.data.len()).then_some(offset)
    }

    fn is_write_protected(&self, offset: usize) -> bool {
        let page = offset as u32 / self.config.geometry.page_size;
        self.config.write_protected.contains(&page)
    }
}

#[cfg(feature = "alloc")]
impl FlashDriver for DummyFlash {
    fn erase_page(&mut self, address: u32) -> Result<(), DriverError> {
        if self.locked {
            return Err(self.fail(LOCK));
        }
        let Some(offset) = self.offset(address, 1) else {
            return Err(self.fail(BUS_FAULT));
        };
        if self.is_write_protected(offset) {
            return Err(self.fail(WRPRTERR));
        }

        // FLASH_AR may point anywhere inside the page
        let page_size = self.config.geometry.page_size as usize;
        let start = offset - offset % page_size;
        log::trace!("dummy: erase 0x{:08X}", address);
        self.data[start..start + page_size].fill(0xFF);
        self.stats.erases += 1;
        Ok(())
    }

    fn program_half_word(&mut self, address: u32, value: u16) -> Result<(), DriverError> {
        if self.locked {
            return Err(self.fail(LOCK));
        }
        let Some(offset) = self.offset(address, 2) else {
            return Err(self.fail(BUS_FAULT));
        };
        if offset % 2 != 0 {
            return Err(self.fail(BUS_FAULT));
        }
        if self.is_write_protected(offset) {
            return Err(self.fail(WRPRTERR));
        }

        let current = u16::from_le_bytes([self.data[offset], self.data[offset + 1]]);
        if current != 0xFFFF && value != 0 {
            log::debug!(
                "dummy: program 0x{:08X} over 0x{:04X} refused",
                address,
                current
            );
            return Err(self.fail(PGERR));
        }

        log::trace!("dummy: program 0x{:08X} = 0x{:04X}", address, value);
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self.stats.programs += 1;
        Ok(())
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), DriverError> {
        let Some(offset) = self.offset(address, buf.len()) else {
            return Err(self.fail(BUS_FAULT));
        };
        buf.copy_from_slice(&self.data[offset..offset + buf.len()]);
        Ok(())
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        if self.config.lock_jammed {
            log::debug!("dummy: unlock refused");
            return Err(self.fail(LOCK));
        }
        self.locked = false;
        Ok(())
    }

    fn is_locked(&self) -> bool {
        self.locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocked() -> DummyFlash {
        let mut flash = DummyFlash::new(DummyConfig::default());
        flash.unlock().unwrap();
        flash
    }

    #[test]
    fn test_starts_erased_and_locked() {
        let mut flash = DummyFlash::new(DummyConfig::default());
        assert_eq!(flash.data().len(), 128 * 1024);
        assert!(flash.data().iter().all(|&b| b == 0xFF));
        assert!(flash.is_locked());
        assert_eq!(
            flash.program_half_word(0x0800_8000, 0x1234),
            Err(DriverError::new(LOCK))
        );
        assert_eq!(flash.erase_page(0x0800_8000), Err(DriverError::new(LOCK)));
        assert_eq!(flash.stats().errors, 2);
    }

    #[test]
    fn test_program_and_read() {
        let mut flash = unlocked();
        flash.program_half_word(0x0800_8000, 0x1234).unwrap();
        assert_eq!(flash.read_half_word(0x0800_8000), Ok(0x1234));
        assert_eq!(&flash.data()[0x8000..0x8002], &[0x34, 0x12]);

        let mut buf = [0u8; 4];
        flash.read(0x0800_8000, &mut buf).unwrap();
        assert_eq!(buf, [0x34, 0x12, 0xFF, 0xFF]);
    }

    #[test]
    fn test_program_requires_erased_cell() {
        let mut flash = unlocked();
        flash.program_half_word(0x0800_8000, 0x1234).unwrap();
        assert_eq!(
            flash.program_half_word(0x0800_8000, 0x1230),
            Err(DriverError::new(PGERR))
        );
        assert_eq!(flash.read_half_word(0x0800_8000), Ok(0x1234));

        // Zero can always be written
        flash.program_half_word(0x0800_8000, 0).unwrap();
        assert_eq!(flash.read_half_word(0x0800_8000), Ok(0));
    }

    #[test]
    fn test_erase() {
        let mut flash = unlocked();
        flash.program_half_word(0x0800_8000, 0).unwrap();
        flash.program_half_word(0x0800_83FE, 0).unwrap();
        flash.program_half_word(0x0800_8400, 0).unwrap();

        // Any address inside the page selects it
        flash.erase_page(0x0800_8123).unwrap();
        assert!(flash.data()[0x8000..0x8400].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.read_half_word(0x0800_8400), Ok(0));
        assert_eq!(flash.stats().erases, 1);
        assert_eq!(flash.stats().programs, 3);
    }

    #[test]
    fn test_out_of_range() {
        let mut flash = unlocked();
        let mut buf = [0u8; 4];
        assert_eq!(flash.read(0x2000_0000, &mut buf), Err(DriverError::new(BUS_FAULT)));
        assert_eq!(flash.read(0x0801_FFFE, &mut buf), Err(DriverError::new(BUS_FAULT)));
        assert_eq!(flash.erase_page(0x0802_0000), Err(DriverError::new(BUS_FAULT)));
        assert_eq!(
            flash.program_half_word(0x0800_8001, 0),
            Err(DriverError::new(BUS_FAULT))
        );
    }

    #[test]
    fn test_write_protection() {
        let config = DummyConfig {
            write_protected: 0..4,
            ..DummyConfig::default()
        };
        let mut flash = DummyFlash::new(config);
        flash.unlock().unwrap();
        assert_eq!(flash.erase_page(0x0800_0C00), Err(DriverError::new(WRPRTERR)));
        assert_eq!(
            flash.program_half_word(0x0800_0000, 0),
            Err(DriverError::new(WRPRTERR))
        );
        flash.erase_page(0x0800_1000).unwrap();
    }

    #[test]
    fn test_jammed_lock() {
        let config = DummyConfig {
            lock_jammed: true,
            ..DummyConfig::default()
        };
        let mut flash = DummyFlash::new(config);
        assert_eq!(flash.unlock(), Err(DriverError::new(LOCK)));
        assert!(flash.is_locked());
        assert_eq!(flash.erase_page(0x0800_8000), Err(DriverError::new(LOCK)));
        assert_eq!(flash.stats().errors, 2);
    }

    #[test]
    fn test_with_data() {
        let config = DummyConfig {
            geometry: Geometry::new(0x0800_0000, 1024, 2),
            ..DummyConfig::default()
        };
        let flash = DummyFlash::with_data(config.clone(), &[0x00, 0x11]);
        assert_eq!(&flash.data()[..3], &[0x00, 0x11, 0xFF]);

        let big = vec![0u8; 4096];
        let flash = DummyFlash::with_data(config, &big);
        assert_eq!(flash.data().len(), 2048);
    }
}
