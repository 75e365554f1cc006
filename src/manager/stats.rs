/*!
 * Engine Statistics
 * Read-only diagnostics snapshots
 */

use super::MemsManager;
use crate::backing::BackingStore;
use crate::core::types::Size;
use crate::types::{MemsStats, PageReport, SegmentReport};

impl<B: BackingStore> MemsManager<B> {
    /// Full snapshot: totals plus per-page ordered segment lists, in
    /// page-chain / segment-chain order. Never mutates engine state.
    pub fn stats(&self) -> MemsStats {
        let pages = self
            .pages
            .iter()
            .map(|page| PageReport {
                base: page.base,
                segments: page
                    .chain
                    .iter()
                    .map(|seg| SegmentReport {
                        start: seg.start,
                        size: seg.size,
                        state: seg.state,
                    })
                    .collect(),
            })
            .collect();

        let total = self.total_bytes();
        MemsStats {
            total_pages: self.pages.len(),
            page_size: self.config.page_size,
            total_bytes: total,
            allocated_bytes: self.allocated_bytes,
            hole_bytes: total - self.allocated_bytes,
            live_allocations: self.alloc_index.len(),
            fragmentation: self.fragmentation(),
            pages,
        }
    }

    /// Memory info as (total, allocated, hole) bytes
    pub fn info(&self) -> (Size, Size, Size) {
        let total = self.total_bytes();
        (total, self.allocated_bytes, total - self.allocated_bytes)
    }

    /// HOLE fraction of total backing space; 0.0 with no pages mapped
    pub fn fragmentation(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            0.0
        } else {
            (total - self.allocated_bytes) as f64 / total as f64
        }
    }
}
