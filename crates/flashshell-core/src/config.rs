//! Device configuration
//!
//! Board constants are fixed at build time; the firmware picks one, the
//! simulator starts from one and may override it from a config file.

use crate::flash::{FlashGuard, Geometry};
use crate::store::LogStore;

/// Placement of the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// First page of the store
    pub first_page: u32,
    /// Number of pages
    pub page_count: u32,
    /// Size of the record identifier space
    pub id_count: u8,
    /// Largest record in bytes
    pub max_record_len: usize,
}

/// Everything that describes one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Internal flash layout
    pub geometry: Geometry,
    /// Pages below this index hold the firmware
    pub protected_boundary: u32,
    /// Record store placement
    pub store: StoreConfig,
}

/// Nucleo-F103RB: 128 KiB of 1 KiB pages, firmware in the first 32 KiB,
/// record store in the last 8 pages
pub const NUCLEO_F103RB: DeviceConfig = DeviceConfig {
    geometry: Geometry::new(0x0800_0000, 1024, 128),
    protected_boundary: 32,
    store: StoreConfig {
        first_page: 120,
        page_count: 8,
        id_count: 16,
        max_record_len: 64,
    },
};

/// Why a configuration is unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Page size is zero or the flash does not fit the address space
    Geometry,
    /// Protected boundary beyond the last page
    Boundary,
    /// Record store overlaps protected pages or leaves the flash
    StorePlacement,
    /// Identifier space or record length not supported by the store
    StoreLimits,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Geometry => write!(f, "invalid flash geometry"),
            Self::Boundary => write!(f, "protected boundary beyond last page"),
            Self::StorePlacement => write!(f, "record store must lie in writable pages"),
            Self::StoreLimits => write!(f, "record store limits out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl DeviceConfig {
    /// Check the invariants the constructors would otherwise panic on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        let size = g.page_size as u64 * g.page_count as u64;
        if g.page_size == 0
            || size > u32::MAX as u64
            || g.base as u64 + size > u32::MAX as u64 + 1
        {
            return Err(ConfigError::Geometry);
        }
        if self.protected_boundary > g.page_count {
            return Err(ConfigError::Boundary);
        }
        let s = &self.store;
        let store_end = s.first_page as u64 + s.page_count as u64;
        if s.page_count == 0 || s.first_page < self.protected_boundary || store_end > g.page_count as u64
        {
            return Err(ConfigError::StorePlacement);
        }
        if s.id_count == 0xFF
            || s.max_record_len == 0
            || s.max_record_len > crate::store::MAX_RECORD_LEN
        {
            return Err(ConfigError::StoreLimits);
        }
        Ok(())
    }

    /// Guard enforcing this board's protected boundary
    pub const fn guard(&self) -> FlashGuard {
        FlashGuard::new(self.geometry, self.protected_boundary)
    }

    /// Record store at this board's store placement
    pub const fn store(&self) -> LogStore {
        LogStore::new(
            &self.geometry,
            self.store.first_page,
            self.store.page_count,
            self.store.id_count,
            self.store.max_record_len,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleo_is_valid() {
        assert_eq!(NUCLEO_F103RB.validate(), Ok(()));
        let guard = NUCLEO_F103RB.guard();
        assert_eq!(guard.writable_range(), 0x0800_8000..0x0802_0000);
        assert_eq!(NUCLEO_F103RB.store().start(), 0x0801_E000);
    }

    #[test]
    fn test_store_in_protected_pages_rejected() {
        let mut config = NUCLEO_F103RB;
        config.store.first_page = 16;
        assert_eq!(config.validate(), Err(ConfigError::StorePlacement));

        let mut config = NUCLEO_F103RB;
        config.store.page_count = 9;
        assert_eq!(config.validate(), Err(ConfigError::StorePlacement));
    }

    #[test]
    fn test_limits_rejected() {
        let mut config = NUCLEO_F103RB;
        config.protected_boundary = 129;
        assert_eq!(config.validate(), Err(ConfigError::Boundary));

        let mut config = NUCLEO_F103RB;
        config.store.id_count = 0xFF;
        assert_eq!(config.validate(), Err(ConfigError::StoreLimits));

        let mut config = NUCLEO_F103RB;
        config.store.max_record_len = 300;
        assert_eq!(config.validate(), Err(ConfigError::StoreLimits));
    }

    #[test]
    fn test_flash_size_must_fit_u32() {
        let mut config = NUCLEO_F103RB;
        config.geometry = Geometry {
            base: 0,
            page_size: 0x1_0000,
            page_count: 0x1_0000,
        };
        config.protected_boundary = 0;
        config.store.first_page = 0;
        assert_eq!(config.validate(), Err(ConfigError::Geometry));

        // Ending exactly at the top of the address space is fine
        config.geometry = Geometry {
            base: 0x1_0000,
            page_size: 0x1_0000,
            page_count: 0xFFFF,
        };
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.geometry.total_size(), 0xFFFF_0000);
        assert_eq!(config.geometry.end(), 0);
    }
}
