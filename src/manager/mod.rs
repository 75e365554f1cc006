/*!
 * Memory Engine
 *
 * Two-level user-space memory manager: a chain of backing pages, each
 * partitioned by a segment chain into HOLE/ALLOCATED ranges.
 *
 * ## Operations
 *
 * - **Allocation**: first-fit over the page chain in acquisition order,
 *   split-on-allocate, multi-page acquisition fallback for requests larger
 *   than one page
 * - **Free**: exact-start lookup through the allocation index, with
 *   two-sided hole coalescing inside the owning page
 * - **Compaction**: per-page slide-and-pack; backing bytes move with their
 *   segments and all reclaimed space merges into one trailing hole
 * - **Translation**: virtual addresses are opaque, resolved to backing
 *   locations on demand; they are never host pointers
 *
 * The engine is single-threaded: one owner, no interior locking, every
 * operation runs to completion.
 */

mod allocator;
mod chain;
mod compactor;
mod stats;
mod storage;

use crate::backing::{BackingStore, HeapBacking};
use crate::core::limits::VIRT_BASE;
use crate::core::types::{PageIdx, Size, VirtAddr};
use crate::traits::{Allocator, Compactor, MemoryInfo, Translator};
use crate::types::{BackingLocation, MemsConfig, MemsResult, MemsStats};
use ahash::AHashMap;
use chain::Page;
use log::info;

/// A live allocation tracked by the engine.
///
/// Page-spanning allocations own one segment per covered page, contiguous in
/// virtual address space; `first_page` and `page_span` locate them all.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Allocation {
    pub size: Size,
    pub first_page: PageIdx,
    pub page_span: usize,
}

/// Memory engine handle.
///
/// Created by [`MemsManager::new`] or [`MemsManager::with_config`]; all
/// state lives in this object, there are no process-wide singletons.
/// [`MemsManager::teardown`] consumes the handle, making further use a
/// compile error.
#[derive(Debug)]
pub struct MemsManager<B: BackingStore = HeapBacking> {
    pages: Vec<Page>,
    alloc_index: AHashMap<VirtAddr, Allocation>,
    allocated_bytes: Size,
    config: MemsConfig,
    backing: B,
}

impl MemsManager<HeapBacking> {
    /// Engine with default config and heap backing
    pub fn new() -> Self {
        let config = MemsConfig::default();
        let backing = HeapBacking::new(config.backing_capacity);
        Self::build(config, backing)
    }

    /// Engine with a validated config and heap backing
    pub fn with_config(config: MemsConfig) -> MemsResult<Self> {
        config.validate()?;
        let backing = HeapBacking::new(config.backing_capacity);
        Ok(Self::build(config, backing))
    }
}

impl Default for MemsManager<HeapBacking> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BackingStore> MemsManager<B> {
    /// Engine over a caller-supplied backing store
    pub fn with_backing(config: MemsConfig, backing: B) -> MemsResult<Self> {
        config.validate()?;
        Ok(Self::build(config, backing))
    }

    fn build(config: MemsConfig, backing: B) -> Self {
        info!(
            "Memory engine initialized: page_size={}, granularity={}, compact_threshold={}",
            config.page_size, config.granularity, config.compact_threshold
        );
        Self {
            pages: Vec::new(),
            alloc_index: AHashMap::new(),
            allocated_bytes: 0,
            config,
            backing,
        }
    }

    pub fn config(&self) -> &MemsConfig {
        &self.config
    }

    /// Release every page back to the backing store and consume the handle.
    /// Returns the number of pages released.
    pub fn teardown(mut self) -> usize {
        let released = self.pages.len();
        for page in self.pages.drain(..) {
            self.backing.release(page.frame);
        }
        self.alloc_index.clear();
        self.allocated_bytes = 0;
        info!("Engine teardown complete: {} pages released", released);
        released
    }

    /// Total bytes of backing space currently mapped
    pub(crate) fn total_bytes(&self) -> Size {
        self.pages.len() * self.config.page_size
    }

    /// Page covering `addr`, by address arithmetic.
    /// Valid because pages are virtually contiguous from `VIRT_BASE` in
    /// acquisition order.
    pub(crate) fn page_index_of(&self, addr: VirtAddr) -> Option<PageIdx> {
        if addr < VIRT_BASE {
            return None;
        }
        let idx = (addr - VIRT_BASE) / self.config.page_size;
        (idx < self.pages.len()).then_some(idx)
    }

    #[cfg(debug_assertions)]
    pub(crate) fn debug_validate(&self) {
        for page in &self.pages {
            debug_assert!(
                page.chain.is_consistent(page.base, page.size),
                "segment chain for page at 0x{:x} violates the partition invariant",
                page.base
            );
        }
        let holes: Size = self.pages.iter().map(|p| p.chain.hole_bytes()).sum();
        debug_assert_eq!(
            holes,
            self.total_bytes() - self.allocated_bytes,
            "hole accounting out of sync with segment chains"
        );
    }

    #[cfg(not(debug_assertions))]
    pub(crate) fn debug_validate(&self) {}
}

// Implement trait interfaces
impl<B: BackingStore> Allocator for MemsManager<B> {
    fn allocate(&mut self, size: Size) -> MemsResult<VirtAddr> {
        MemsManager::allocate(self, size)
    }

    fn free(&mut self, addr: VirtAddr) -> MemsResult<()> {
        MemsManager::free(self, addr)
    }

    fn is_valid(&self, addr: VirtAddr) -> bool {
        MemsManager::is_valid(self, addr)
    }

    fn allocation_size(&self, addr: VirtAddr) -> Option<Size> {
        MemsManager::allocation_size(self, addr)
    }
}

impl<B: BackingStore> Compactor for MemsManager<B> {
    fn compact(&mut self) -> Size {
        MemsManager::compact(self).relocated.len()
    }

    fn should_compact(&self) -> bool {
        MemsManager::should_compact(self)
    }

    fn set_threshold(&mut self, ratio: f64) {
        MemsManager::set_threshold(self, ratio)
    }
}

impl<B: BackingStore> Translator for MemsManager<B> {
    fn resolve(&self, addr: VirtAddr) -> MemsResult<BackingLocation> {
        MemsManager::resolve(self, addr)
    }

    fn read_bytes(&self, addr: VirtAddr, len: Size) -> MemsResult<Vec<u8>> {
        MemsManager::read_bytes(self, addr, len)
    }

    fn write_bytes(&mut self, addr: VirtAddr, data: &[u8]) -> MemsResult<()> {
        MemsManager::write_bytes(self, addr, data)
    }
}

impl<B: BackingStore> MemoryInfo for MemsManager<B> {
    fn stats(&self) -> MemsStats {
        MemsManager::stats(self)
    }

    fn info(&self) -> (Size, Size, Size) {
        MemsManager::info(self)
    }

    fn fragmentation(&self) -> f64 {
        MemsManager::fragmentation(self)
    }
}
