/*!
 * Compactor
 * Per-page slide-and-pack defragmentation
 */

use super::chain::Page;
use super::MemsManager;
use crate::backing::BackingStore;
use crate::types::CompactReport;
use log::info;

impl<B: BackingStore> MemsManager<B> {
    /// Defragment every page: slide ALLOCATED segments toward the page
    /// start in address order and merge all reclaimed space into a single
    /// trailing HOLE per page.
    ///
    /// Backing bytes move with their segments, so relocated allocations
    /// keep their contents. Their old addresses are invalidated; the
    /// returned report maps old starts to new ones for callers that need to
    /// re-resolve. Compacting an already-packed engine relocates nothing.
    pub fn compact(&mut self) -> CompactReport {
        let mut relocated = Vec::new();
        let mut bytes_moved = 0;

        for page in &mut self.pages {
            let base = page.base;
            let span = page.size;
            let Page { frame, chain, .. } = page;
            let moves = chain.pack(base, span, |src, dst, len| {
                frame.as_mut_slice().copy_within(src..src + len, dst);
            });
            for reloc in moves {
                bytes_moved += reloc.size;
                // Only single-page allocations ever move: page-spanning
                // segments sit at their page base with nothing before them.
                match self.alloc_index.remove(&reloc.old_start) {
                    Some(alloc) => {
                        debug_assert_eq!(alloc.page_span, 1);
                        self.alloc_index.insert(reloc.new_start, alloc);
                    }
                    None => debug_assert!(
                        false,
                        "relocated segment 0x{:x} missing from allocation index",
                        reloc.old_start
                    ),
                }
                relocated.push((reloc.old_start, reloc.new_start));
            }
        }

        self.debug_validate();
        if !relocated.is_empty() {
            info!(
                "Compaction complete: {} allocation(s) relocated, {} bytes moved",
                relocated.len(),
                bytes_moved
            );
        }
        CompactReport {
            relocated,
            bytes_moved,
        }
    }

    /// Check whether the HOLE fraction has reached the compaction threshold
    pub fn should_compact(&self) -> bool {
        self.total_bytes() > 0 && self.fragmentation() >= self.config.compact_threshold
    }

    /// Set the compaction threshold (HOLE fraction, clamped to `[0, 1]`)
    pub fn set_threshold(&mut self, ratio: f64) {
        self.config.compact_threshold = ratio.clamp(0.0, 1.0);
        info!(
            "Compaction threshold set to {}",
            self.config.compact_threshold
        );
    }
}
