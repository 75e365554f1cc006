/*!
 * MeMS - Memory Management Simulator
 * A user-space virtual memory manager exposed as a library
 *
 * Callers request variable-sized buffers and receive opaque virtual
 * addresses backed by coarse OS-provided pages. The engine tracks
 * fragmentation, coalesces freed space, defragments on demand, and
 * translates virtual addresses to backing locations for byte access.
 */

pub mod backing;
pub mod core;
pub mod manager;
pub mod traits;
pub mod types;

// Re-exports
pub use backing::{BackingStore, HeapBacking, PageFrame};
#[cfg(unix)]
pub use backing::MmapBacking;
pub use self::core::types::{PageIdx, SegIdx, Size, VirtAddr};
pub use manager::MemsManager;
pub use traits::{Allocator, Compactor, MemoryInfo, Translator};
pub use types::{
    BackingLocation, CompactReport, FragmentationLevel, MemsConfig, MemsError, MemsResult,
    MemsStats, PageReport, SegmentReport, SegmentState,
};
