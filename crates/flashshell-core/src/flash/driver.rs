//! Flash driver contract
//!
//! Implemented by the register level driver on the target and by the
//! in-memory emulator on the host. Nothing here checks the protection
//! policy; callers go through [`FlashGuard`](super::FlashGuard) first.

use crate::error::DriverError;

/// Primitive operations of a page erasable, half-word programmable flash
pub trait FlashDriver {
    /// Erase the page starting at `address`
    ///
    /// # Errors
    /// Returns the driver's error code if the erase did not complete.
    fn erase_page(&mut self, address: u32) -> Result<(), DriverError>;

    /// Program one half-word at the (even) `address`
    ///
    /// # Errors
    /// Returns the driver's error code if programming was refused or failed.
    fn program_half_word(&mut self, address: u32, value: u16) -> Result<(), DriverError>;

    /// Read memory starting at `address` into `buf`
    ///
    /// Reads are not limited to flash; any mapped address may be read.
    ///
    /// # Errors
    /// Returns the driver's error code if the range cannot be read.
    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), DriverError>;

    /// Lock the flash controller against erase and program
    fn lock(&mut self);

    /// Unlock the flash controller
    ///
    /// # Errors
    /// Returns the driver's error code if the unlock sequence was rejected.
    fn unlock(&mut self) -> Result<(), DriverError>;

    /// Whether the controller is currently locked
    fn is_locked(&self) -> bool;

    /// Read a little-endian half-word
    fn read_half_word(&mut self, address: u32) -> Result<u16, DriverError> {
        let mut buf = [0u8; 2];
        self.read(address, &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
}

impl<T: FlashDriver + ?Sized> FlashDriver for &mut T {
    fn erase_page(&mut self, address: u32) -> Result<(), DriverError> {
        (**self).erase_page(address)
    }

    fn program_half_word(&mut self, address: u32, value: u16) -> Result<(), DriverError> {
        (**self).program_half_word(address, value)
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), DriverError> {
        (**self).read(address, buf)
    }

    fn lock(&mut self) {
        (**self).lock()
    }

    fn unlock(&mut self) -> Result<(), DriverError> {
        (**self).unlock()
    }

    fn is_locked(&self) -> bool {
        (**self).is_locked()
    }
}
