//! Flash region guard
//!
//! Pages below the protected boundary hold the running firmware and are
//! never erased or written by the shell, whatever the operator asks for.

use core::ops::Range;

/// Fixed layout of the internal flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Address of page 0
    pub base: u32,
    /// Size of one erase page in bytes
    pub page_size: u32,
    /// Number of pages
    pub page_count: u32,
}

impl Geometry {
    /// Describe a flash of `page_count` pages of `page_size` bytes at `base`
    ///
    /// # Panics
    /// If the page size is zero, the size does not fit a `u32`, or the flash
    /// would extend past the 32-bit address space.
    pub const fn new(base: u32, page_size: u32, page_count: u32) -> Self {
        assert!(page_size > 0, "page size must not be zero");
        let size = (page_size as u64) * (page_count as u64);
        assert!(
            size <= u32::MAX as u64 && (base as u64) + size <= u32::MAX as u64 + 1,
            "flash must fit into the 32-bit address space"
        );
        Self {
            base,
            page_size,
            page_count,
        }
    }

    /// Total flash size in bytes
    pub const fn total_size(&self) -> u32 {
        self.page_size * self.page_count
    }

    /// First address after the flash (exclusive end)
    ///
    /// Wraps to 0 for a flash ending exactly at the top of the address space.
    pub const fn end(&self) -> u32 {
        self.base.wrapping_add(self.total_size())
    }

    /// Address of the first byte of `page`
    ///
    /// `page == page_count` yields [`end`](Self::end); larger values are a
    /// caller error.
    pub const fn page_to_address(&self, page: u32) -> u32 {
        debug_assert!(page <= self.page_count);
        self.base.wrapping_add(page * self.page_size)
    }

    /// Address range covered by `page`
    pub const fn page_range(&self, page: u32) -> Range<u32> {
        self.page_to_address(page)..self.page_to_address(page + 1)
    }

    /// Whether `address` lies inside the flash
    pub const fn contains(&self, address: u32) -> bool {
        address >= self.base && ((address - self.base) as u64) < self.total_size() as u64
    }
}

/// Protection policy for erase and write operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGuard {
    geometry: Geometry,
    protected_boundary: u32,
}

impl FlashGuard {
    /// Create a guard protecting every page below `protected_boundary`
    ///
    /// # Panics
    /// If the boundary lies beyond the last page.
    pub const fn new(geometry: Geometry, protected_boundary: u32) -> Self {
        assert!(
            protected_boundary <= geometry.page_count,
            "protected boundary beyond last page"
        );
        Self {
            geometry,
            protected_boundary,
        }
    }

    /// The guarded flash layout
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Lowest page that may be erased or written
    pub const fn protected_boundary(&self) -> u32 {
        self.protected_boundary
    }

    /// Address of the first byte of `page`
    pub const fn page_to_address(&self, page: u32) -> u32 {
        self.geometry.page_to_address(page)
    }

    /// Whether `page` may be erased
    pub const fn is_erasable(&self, page: u32) -> bool {
        page >= self.protected_boundary && page < self.geometry.page_count
    }

    /// Whether `address` may be programmed
    pub const fn is_writable(&self, address: u32) -> bool {
        let start = self.page_to_address(self.protected_boundary);
        let offset = address.wrapping_sub(start);
        address >= start && (offset as u64) < self.writable_len() as u64
    }

    /// Address range of all writable pages
    pub const fn writable_range(&self) -> Range<u32> {
        self.page_to_address(self.protected_boundary)..self.geometry.end()
    }

    /// Pages `first..first + count` if every one of them may be erased
    ///
    /// Returns `None` for an empty range, an overflowing range, or a range
    /// touching any protected or nonexistent page.
    pub fn erasable_pages(&self, first: u32, count: u32) -> Option<Range<u32>> {
        let end = first.checked_add(count)?;
        if count == 0 || !self.is_erasable(first) || end > self.geometry.page_count {
            log::warn!("refusing to erase pages {}..{}", first, end);
            return None;
        }
        Some(first..end)
    }

    const fn writable_len(&self) -> u32 {
        (self.geometry.page_count - self.protected_boundary) * self.geometry.page_size
    }
}
