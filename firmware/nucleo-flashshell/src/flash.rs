//! Register level driver for the STM32F1 internal flash
//!
//! Erase and program go through FLASH_CR/FLASH_AR and poll FLASH_SR.BSY.
//! The controller stalls instruction fetches from flash while busy, so
//! nothing else has to be held off. Errors are reported with the FLASH_SR
//! bits that were set.

use embassy_stm32::pac;
use flashshell_core::error::DriverError;
use flashshell_core::flash::{FlashDriver, Geometry};

const KEY1: u32 = 0x4567_0123;
const KEY2: u32 = 0xCDEF_89AB;

/// FLASH_SR.PGERR
pub const PGERR: u32 = 1 << 2;
/// FLASH_SR.WRPRTERR
pub const WRPRTERR: u32 = 1 << 4;
/// FLASH_CR.LOCK, reported when the controller refuses to unlock or is locked
pub const LOCK: u32 = 1 << 7;
/// Address outside the flash or not half-word aligned
pub const BAD_ADDRESS: u32 = 1 << 31;

/// The internal flash controller
pub struct Stm32Flash {
    geometry: Geometry,
}

impl Stm32Flash {
    /// Take over the flash controller, leaving it locked
    pub fn new(geometry: Geometry) -> Self {
        pac::FLASH.cr().modify(|w| w.set_lock(true));
        Self { geometry }
    }

    /// Wait for the current operation and collect its error bits
    fn wait_ready(&self) -> Result<(), DriverError> {
        while pac::FLASH.sr().read().bsy() {}

        let errors = pac::FLASH.sr().read().0 & (PGERR | WRPRTERR);
        // Status flags are cleared by writing 1
        pac::FLASH.sr().write(|w| {
            w.set_pgerr(true);
            w.set_wrprterr(true);
            w.set_eop(true);
        });

        cortex_m::asm::dsb();
        cortex_m::asm::isb();

        if errors != 0 {
            defmt::warn!("flash: SR error bits {=u32:#x}", errors);
            return Err(DriverError::new(errors));
        }
        Ok(())
    }

    fn check_unlocked(&self) -> Result<(), DriverError> {
        if self.is_locked() {
            return Err(DriverError::new(LOCK));
        }
        Ok(())
    }
}

impl FlashDriver for Stm32Flash {
    fn erase_page(&mut self, address: u32) -> Result<(), DriverError> {
        self.check_unlocked()?;
        if !self.geometry.contains(address) {
            return Err(DriverError::new(BAD_ADDRESS));
        }

        defmt::debug!("flash: erase {=u32:#x}", address);
        pac::FLASH.cr().modify(|w| w.set_per(true));
        pac::FLASH.ar().write_value(address);
        pac::FLASH.cr().modify(|w| w.set_strt(true));
        let result = self.wait_ready();
        pac::FLASH.cr().modify(|w| w.set_per(false));
        result
    }

    fn program_half_word(&mut self, address: u32, value: u16) -> Result<(), DriverError> {
        self.check_unlocked()?;
        if !self.geometry.contains(address) || address % 2 != 0 {
            return Err(DriverError::new(BAD_ADDRESS));
        }

        defmt::debug!("flash: program {=u32:#x} = {=u16:#x}", address, value);
        pac::FLASH.cr().modify(|w| w.set_pg(true));
        // Address checked against the flash geometry and aligned above
        unsafe {
            (address as *mut u16).write_volatile(value);
        }
        let result = self.wait_ready();
        pac::FLASH.cr().modify(|w| w.set_pg(false));
        result
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), DriverError> {
        for (i, byte) in buf.iter_mut().enumerate() {
            // The operator may dump any address; an unmapped one faults
            *byte = unsafe { (address.wrapping_add(i as u32) as *const u8).read_volatile() };
        }
        Ok(())
    }

    fn lock(&mut self) {
        pac::FLASH.cr().modify(|w| w.set_lock(true));
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        if !self.is_locked() {
            return Ok(());
        }
        pac::FLASH.keyr().write_value(KEY1);
        pac::FLASH.keyr().write_value(KEY2);

        // A wrong sequence keeps the controller locked until reset
        if self.is_locked() {
            defmt::warn!("flash: unlock sequence rejected");
            return Err(DriverError::new(LOCK));
        }
        Ok(())
    }

    fn is_locked(&self) -> bool {
        pac::FLASH.cr().read().lock()
    }
}
