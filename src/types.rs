/*!
 * Engine Types
 * Common types for the memory engine
 */

use crate::core::limits::{
    DEFAULT_BACKING_CAPACITY, DEFAULT_COMPACT_THRESHOLD, DEFAULT_GRANULARITY, DEFAULT_PAGE_SIZE,
};
use crate::core::types::{PageIdx, Size, VirtAddr};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Engine operation result
pub type MemsResult<T> = Result<T, MemsError>;

/// Engine errors
///
/// All variants are recoverable: none leaves the engine in an inconsistent
/// state, and none terminates the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemsError {
    #[error("out of backing memory: requested {requested} bytes, {mapped} mapped / {capacity} capacity")]
    OutOfBackingMemory {
        requested: usize,
        mapped: usize,
        capacity: usize,
    },

    #[error("invalid free address 0x{0:x}: inside a live allocation but not its start")]
    InvalidFreeAddress(VirtAddr),

    #[error("no allocation found for address 0x{0:x}")]
    SegmentNotFound(VirtAddr),

    #[error("invalid address: 0x{0:x}")]
    InvalidAddress(VirtAddr),

    #[error("zero-size allocation rejected")]
    ZeroSizeAllocation,

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

/// Segment state within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentState {
    Hole,
    Allocated,
}

impl std::fmt::Display for SegmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SegmentState::Hole => write!(f, "HOLE"),
            SegmentState::Allocated => write!(f, "ALLOCATED"),
        }
    }
}

/// Engine configuration
///
/// Validated at construction; defaults come from [`crate::core::limits`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemsConfig {
    /// Size of every backing page, in bytes
    pub page_size: Size,
    /// Allocation granularity; requested sizes round up to a multiple of this
    pub granularity: Size,
    /// HOLE fraction of total backing space at which `should_compact` fires
    pub compact_threshold: f64,
    /// Total bytes the default heap backing may map
    pub backing_capacity: Size,
}

impl Default for MemsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            granularity: DEFAULT_GRANULARITY,
            compact_threshold: DEFAULT_COMPACT_THRESHOLD,
            backing_capacity: DEFAULT_BACKING_CAPACITY,
        }
    }
}

impl MemsConfig {
    pub fn validate(&self) -> MemsResult<()> {
        if self.page_size == 0 {
            return Err(MemsError::InvalidConfig("page_size must be nonzero".into()));
        }
        if self.granularity == 0 {
            return Err(MemsError::InvalidConfig(
                "granularity must be nonzero".into(),
            ));
        }
        if self.page_size % self.granularity != 0 {
            return Err(MemsError::InvalidConfig(format!(
                "page_size {} is not a multiple of granularity {}",
                self.page_size, self.granularity
            )));
        }
        if !(0.0..=1.0).contains(&self.compact_threshold) {
            return Err(MemsError::InvalidConfig(format!(
                "compact_threshold {} outside [0, 1]",
                self.compact_threshold
            )));
        }
        if self.backing_capacity < self.page_size {
            return Err(MemsError::InvalidConfig(format!(
                "backing_capacity {} smaller than one page ({})",
                self.backing_capacity, self.page_size
            )));
        }
        Ok(())
    }
}

/// One segment in a stats snapshot, in address order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub start: VirtAddr,
    pub size: Size,
    pub state: SegmentState,
}

/// One page in a stats snapshot, in page-chain order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    pub base: VirtAddr,
    pub segments: Vec<SegmentReport>,
}

/// Engine statistics snapshot
///
/// Read-only view; taking one never mutates engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemsStats {
    pub total_pages: usize,
    pub page_size: Size,
    pub total_bytes: Size,
    pub allocated_bytes: Size,
    pub hole_bytes: Size,
    pub live_allocations: usize,
    /// HOLE fraction of total backing space; 0.0 when no pages are mapped
    pub fragmentation: f64,
    pub pages: Vec<PageReport>,
}

impl MemsStats {
    pub fn fragmentation_level(&self) -> FragmentationLevel {
        if self.fragmentation >= 0.75 {
            FragmentationLevel::Severe
        } else if self.fragmentation >= 0.5 {
            FragmentationLevel::High
        } else if self.fragmentation >= 0.25 {
            FragmentationLevel::Moderate
        } else {
            FragmentationLevel::Low
        }
    }
}

/// Fragmentation levels derived from the HOLE fraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentationLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl std::fmt::Display for FragmentationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FragmentationLevel::Low => write!(f, "LOW"),
            FragmentationLevel::Moderate => write!(f, "MODERATE"),
            FragmentationLevel::High => write!(f, "HIGH"),
            FragmentationLevel::Severe => write!(f, "SEVERE"),
        }
    }
}

/// Resolved location of a virtual address in the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackingLocation {
    /// Page whose frame holds the byte
    pub page: PageIdx,
    /// Byte offset within that frame
    pub offset: Size,
    /// Contiguous bytes from `offset` to the end of the owning segment.
    /// Spans past `run` continue in the next page's frame; re-resolve there.
    pub run: Size,
}

/// Outcome of a compaction pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactReport {
    /// (old start, new start) for every relocated allocation.
    /// Addresses held across compaction are invalid unless re-mapped here.
    pub relocated: Vec<(VirtAddr, VirtAddr)>,
    /// Backing bytes copied while sliding segments
    pub bytes_moved: Size,
}

impl CompactReport {
    pub fn is_noop(&self) -> bool {
        self.relocated.is_empty()
    }
}
