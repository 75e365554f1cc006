/*!
 * Allocation and Free Engines
 * First-fit allocation, split-on-allocate, exact-start free with coalescing
 */

use super::chain::Page;
use super::{Allocation, MemsManager};
use crate::backing::BackingStore;
use crate::core::limits::{align_up, VIRT_BASE};
use crate::core::types::{Size, VirtAddr};
use crate::types::{MemsError, MemsResult, SegmentState};
use log::{info, warn};

impl<B: BackingStore> MemsManager<B> {
    /// Allocate `size` bytes, rounded up to the engine granularity.
    ///
    /// Scans the page chain in acquisition order for the first HOLE that
    /// fits; a strictly larger hole is split. When no hole fits, fresh pages
    /// are acquired and the allocation carved from their start, one segment
    /// per page, contiguous in virtual address space.
    pub fn allocate(&mut self, size: Size) -> MemsResult<VirtAddr> {
        if size == 0 {
            return Err(MemsError::ZeroSizeAllocation);
        }
        let rounded = align_up(size, self.config.granularity);
        let page_size = self.config.page_size;

        // Holes never span pages, so only single-page requests can be served
        // from existing holes.
        if rounded <= page_size {
            for (page_idx, page) in self.pages.iter_mut().enumerate() {
                if let Some(idx) = page.chain.first_fit(rounded) {
                    let addr = page.chain.allocate_at(idx, rounded);
                    self.alloc_index.insert(
                        addr,
                        Allocation {
                            size: rounded,
                            first_page: page_idx,
                            page_span: 1,
                        },
                    );
                    self.allocated_bytes += rounded;
                    info!(
                        "Allocated {} bytes at 0x{:x} (hole in page {})",
                        rounded, addr, page_idx
                    );
                    self.debug_validate();
                    return Ok(addr);
                }
            }
        }

        // No hole fits: acquire fresh pages. A mid-way failure releases the
        // pages acquired so far, leaving the chain untouched.
        let pages_needed = rounded.div_ceil(page_size);
        let mut frames = Vec::with_capacity(pages_needed);
        for _ in 0..pages_needed {
            match self.backing.acquire(page_size) {
                Ok(frame) => frames.push(frame),
                Err(err) => {
                    let acquired = frames.len();
                    for frame in frames {
                        self.backing.release(frame);
                    }
                    warn!(
                        "Page acquisition failed after {} of {} pages: {}",
                        acquired, pages_needed, err
                    );
                    return Err(err);
                }
            }
        }

        let first_page = self.pages.len();
        let addr = VIRT_BASE + first_page * page_size;
        let mut remaining = rounded;
        for frame in frames {
            let base = VIRT_BASE + self.pages.len() * page_size;
            let mut page = Page::new(base, frame);
            let take = remaining.min(page_size);
            // Fresh page: the head segment is a HOLE covering the whole page
            page.chain.allocate_at(page.chain.head(), take);
            remaining -= take;
            self.pages.push(page);
        }
        debug_assert_eq!(remaining, 0);

        self.alloc_index.insert(
            addr,
            Allocation {
                size: rounded,
                first_page,
                page_span: pages_needed,
            },
        );
        self.allocated_bytes += rounded;
        info!(
            "Allocated {} bytes at 0x{:x} ({} fresh page(s))",
            rounded, addr, pages_needed
        );
        self.debug_validate();
        Ok(addr)
    }

    /// Free the allocation starting exactly at `addr`.
    ///
    /// Flips every covered segment to HOLE and coalesces with adjacent holes
    /// inside each owning page; coalescing never crosses a page boundary.
    pub fn free(&mut self, addr: VirtAddr) -> MemsResult<()> {
        let Some(&alloc) = self.alloc_index.get(&addr) else {
            let err = self.classify_bad_free(addr);
            warn!("Rejected free of 0x{:x}: {}", addr, err);
            return Err(err);
        };
        self.alloc_index.remove(&addr);

        let page_size = self.config.page_size;
        for i in 0..alloc.page_span {
            let page_idx = alloc.first_page + i;
            // The first segment starts at the allocation address; every
            // continuation segment starts at its page base.
            let start = if i == 0 {
                addr
            } else {
                VIRT_BASE + page_idx * page_size
            };
            let page = &mut self.pages[page_idx];
            match page.chain.find_start(start) {
                Some(seg) => {
                    debug_assert_eq!(page.chain.state_of(seg), SegmentState::Allocated);
                    page.chain.release(seg);
                }
                None => debug_assert!(
                    false,
                    "allocation index out of sync: no segment at 0x{:x}",
                    start
                ),
            }
        }

        self.allocated_bytes -= alloc.size;
        info!("Freed {} bytes at 0x{:x}", alloc.size, addr);
        self.debug_validate();
        Ok(())
    }

    /// Distinguish an interior address of a live allocation from an address
    /// matching nothing at all.
    fn classify_bad_free(&self, addr: VirtAddr) -> MemsError {
        if let Some(page_idx) = self.page_index_of(addr) {
            let page = &self.pages[page_idx];
            if let Some(seg) = page.chain.find_containing(addr) {
                if page.chain.state_of(seg) == SegmentState::Allocated {
                    return MemsError::InvalidFreeAddress(addr);
                }
            }
        }
        MemsError::SegmentNotFound(addr)
    }

    /// Check whether `addr` is the start of a live allocation
    pub fn is_valid(&self, addr: VirtAddr) -> bool {
        self.alloc_index.contains_key(&addr)
    }

    /// Get the rounded size of the live allocation starting at `addr`
    pub fn allocation_size(&self, addr: VirtAddr) -> Option<Size> {
        self.alloc_index.get(&addr).map(|alloc| alloc.size)
    }
}
