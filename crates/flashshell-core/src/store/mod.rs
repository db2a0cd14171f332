//! Record store ("FDS")
//!
//! A small key-value store on top of the internal flash, addressed by record
//! identifiers `0..id_count()`. The shell only relies on the
//! [`RecordStore`] contract; [`LogStore`] is the append-only implementation
//! used by the firmware and the simulator.
//!
//! The flash driver is passed into every operation rather than owned by the
//! store, so the store and the flash commands share one driver.

mod journal;

pub use journal::LogStore;

use crate::error::StoreError;
use crate::flash::FlashDriver;

/// Largest record length any store can report (lengths are one byte)
pub const MAX_RECORD_LEN: usize = 255;

/// Record identifier
pub type RecordId = u8;

/// Usage summary of a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatus {
    /// Identifiers that currently hold a record
    pub records: u32,
    /// Entries in the log, including superseded ones and deletions
    pub entries: u32,
    /// Bytes used
    pub used: u32,
    /// Total bytes available to the store
    pub capacity: u32,
}

impl StoreStatus {
    /// Bytes still free
    pub fn free(&self) -> u32 {
        self.capacity.saturating_sub(self.used)
    }
}

/// Contract of the record store
pub trait RecordStore {
    /// Size of the identifier space; valid ids are `0..id_count()`
    fn id_count(&self) -> u8;

    /// Largest record accepted by [`write`](Self::write)
    fn max_record_len(&self) -> usize;

    /// Erase the store, dropping every record
    fn format(&mut self, flash: &mut dyn FlashDriver) -> Result<(), StoreError>;

    /// Store `data` under `id`, replacing any previous record
    fn write(
        &mut self,
        flash: &mut dyn FlashDriver,
        id: RecordId,
        data: &[u8],
    ) -> Result<(), StoreError>;

    /// Copy the record `id` into `buf`
    ///
    /// Returns the record length, or `None` if there is no record with that id.
    fn read(
        &mut self,
        flash: &mut dyn FlashDriver,
        id: RecordId,
        buf: &mut [u8],
    ) -> Result<Option<usize>, StoreError>;

    /// Remove the record `id`
    fn delete(&mut self, flash: &mut dyn FlashDriver, id: RecordId) -> Result<(), StoreError>;

    /// Usage summary
    fn status(&mut self, flash: &mut dyn FlashDriver) -> Result<StoreStatus, StoreError>;
}
