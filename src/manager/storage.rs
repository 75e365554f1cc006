/*!
 * Address Translation and Byte Access
 * Maps opaque virtual addresses to backing-store locations
 *
 * Bounds are enforced at segment granularity: any address inside an
 * ALLOCATED segment resolves, everything else is rejected. Byte-level
 * ownership between adjacent live allocations is not policed (the engine
 * provides no protection or permissions).
 */

use super::MemsManager;
use crate::backing::BackingStore;
use crate::core::types::{Size, VirtAddr};
use crate::types::{BackingLocation, MemsError, MemsResult, SegmentState};
use log::debug;

impl<B: BackingStore> MemsManager<B> {
    /// Resolve a virtual address to its location in the backing store.
    ///
    /// Accepts any address inside an ALLOCATED segment, start or interior.
    /// `run` is the contiguous byte count available in the owning frame;
    /// allocations spanning pages continue in the next page's frame.
    pub fn resolve(&self, addr: VirtAddr) -> MemsResult<BackingLocation> {
        let page_idx = self
            .page_index_of(addr)
            .ok_or(MemsError::InvalidAddress(addr))?;
        let page = &self.pages[page_idx];
        let seg = page
            .chain
            .find_containing(addr)
            .ok_or(MemsError::InvalidAddress(addr))?;
        let (start, size, state) = page.chain.segment(seg);
        if state != SegmentState::Allocated {
            return Err(MemsError::InvalidAddress(addr));
        }
        Ok(BackingLocation {
            page: page_idx,
            offset: addr - page.base,
            run: start + size - addr,
        })
    }

    /// Read `len` bytes starting at `addr`, re-resolving at each segment
    /// boundary so page-spanning allocations read end-to-end.
    pub fn read_bytes(&self, addr: VirtAddr, len: Size) -> MemsResult<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        let mut cursor = addr;
        let mut remaining = len;
        while remaining > 0 {
            let loc = self.resolve(cursor)?;
            let take = remaining.min(loc.run);
            let frame = self.pages[loc.page].frame.as_slice();
            out.extend_from_slice(&frame[loc.offset..loc.offset + take]);
            cursor += take;
            remaining -= take;
        }
        debug!("Read {} bytes from 0x{:x}", len, addr);
        Ok(out)
    }

    /// Check that every byte of `[addr, addr + len)` is ALLOCATED
    fn check_span(&self, addr: VirtAddr, len: Size) -> MemsResult<()> {
        let mut cursor = addr;
        let mut remaining = len;
        while remaining > 0 {
            let loc = self.resolve(cursor)?;
            let take = remaining.min(loc.run);
            cursor += take;
            remaining -= take;
        }
        Ok(())
    }

    /// Write `data` starting at `addr`, re-resolving at each segment
    /// boundary so page-spanning allocations write end-to-end.
    /// The whole span is validated before any byte moves, so a rejected
    /// write leaves the backing untouched.
    pub fn write_bytes(&mut self, addr: VirtAddr, data: &[u8]) -> MemsResult<()> {
        self.check_span(addr, data.len())?;
        let mut cursor = addr;
        let mut written = 0;
        while written < data.len() {
            let loc = self.resolve(cursor)?;
            let take = (data.len() - written).min(loc.run);
            let frame = self.pages[loc.page].frame.as_mut_slice();
            frame[loc.offset..loc.offset + take].copy_from_slice(&data[written..written + take]);
            cursor += take;
            written += take;
        }
        debug!("Wrote {} bytes to 0x{:x}", data.len(), addr);
        Ok(())
    }
}
