/*!
 * Engine Traits
 * Memory engine abstractions
 */

use super::types::*;
use crate::core::types::{Size, VirtAddr};

/// Allocation interface.
///
/// The engine is single-threaded by design: mutating operations take
/// `&mut self` and run to completion. Concurrent use requires an external
/// mutual-exclusion boundary around the whole engine.
pub trait Allocator {
    /// Allocate `size` bytes, rounded up to the engine granularity
    fn allocate(&mut self, size: Size) -> MemsResult<VirtAddr>;

    /// Free the allocation starting exactly at `addr`
    fn free(&mut self, addr: VirtAddr) -> MemsResult<()>;

    /// Check whether `addr` is the start of a live allocation
    fn is_valid(&self, addr: VirtAddr) -> bool;

    /// Get the (rounded) size of the live allocation starting at `addr`
    fn allocation_size(&self, addr: VirtAddr) -> Option<Size>;
}

/// Compaction interface
pub trait Compactor {
    /// Defragment every page; returns the number of relocated allocations
    fn compact(&mut self) -> Size;

    /// Check whether the HOLE fraction has reached the compaction threshold
    fn should_compact(&self) -> bool;

    /// Set the compaction threshold (HOLE fraction in `[0, 1]`)
    fn set_threshold(&mut self, ratio: f64);
}

/// Virtual-to-backing address translation and byte access
pub trait Translator {
    /// Resolve a virtual address to its backing location.
    /// Accepts any address inside an ALLOCATED segment, start or interior.
    fn resolve(&self, addr: VirtAddr) -> MemsResult<BackingLocation>;

    /// Read `len` bytes starting at `addr`, crossing page boundaries
    fn read_bytes(&self, addr: VirtAddr, len: Size) -> MemsResult<Vec<u8>>;

    /// Write `data` starting at `addr`, crossing page boundaries
    fn write_bytes(&mut self, addr: VirtAddr, data: &[u8]) -> MemsResult<()>;
}

/// Statistics provider
pub trait MemoryInfo {
    /// Get a full read-only snapshot
    fn stats(&self) -> MemsStats;

    /// Get memory info as (total, allocated, hole) bytes
    fn info(&self) -> (Size, Size, Size);

    /// HOLE fraction of total backing space
    fn fragmentation(&self) -> f64;

    /// Get the fragmentation level
    fn fragmentation_level(&self) -> FragmentationLevel {
        self.stats().fragmentation_level()
    }
}
