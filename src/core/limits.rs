/*!
 * Engine Limits and Constants
 *
 * Centralized location for engine-wide defaults and thresholds.
 * Values here seed [`crate::types::MemsConfig`]; nothing reads them ambiently.
 */

use super::types::{Size, VirtAddr};

/// Default page size (4KB)
/// The unit the backing store hands out
pub const DEFAULT_PAGE_SIZE: Size = 4096;

/// Default allocation granularity (8 bytes)
/// Requested sizes are rounded up to a multiple of this; 1 means byte-granular
pub const DEFAULT_GRANULARITY: Size = 8;

/// Default backing capacity for the heap provider (64MB)
/// Acquiring pages past this fails with `OutOfBackingMemory`
pub const DEFAULT_BACKING_CAPACITY: Size = 64 * 1024 * 1024;

/// Default compaction threshold
/// `should_compact` fires once this fraction of backing space is HOLE
pub const DEFAULT_COMPACT_THRESHOLD: f64 = 0.5;

/// Base of the simulated virtual address space.
/// Nonzero so that 0 is never a live address and returned addresses are
/// visibly synthetic.
pub const VIRT_BASE: VirtAddr = 0x1000;

/// Round `size` up to the next multiple of `granularity`.
#[inline]
pub const fn align_up(size: Size, granularity: Size) -> Size {
    match size % granularity {
        0 => size,
        rem => size + (granularity - rem),
    }
}
