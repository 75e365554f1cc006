/*!
 * Invariant Property Tests
 * Random operation sequences must preserve the engine's structural
 * invariants: every page exactly partitioned, no adjacent holes, and the
 * byte accounting in sync with the segment chains.
 */

use mems::{MemsConfig, MemsManager, MemsStats, SegmentState, VirtAddr};
use proptest::prelude::*;

const PAGE: usize = 1024;

fn engine() -> MemsManager {
    MemsManager::with_config(MemsConfig {
        page_size: PAGE,
        granularity: 8,
        backing_capacity: 1024 * PAGE,
        ..MemsConfig::default()
    })
    .expect("valid config")
}

fn check_invariants(stats: &MemsStats) {
    let mut allocated = 0;
    let mut holes = 0;
    for page in &stats.pages {
        let mut cursor = page.base;
        let mut prev_state = None;
        for seg in &page.segments {
            // Contiguous, non-overlapping, no gaps
            assert_eq!(seg.start, cursor, "gap or overlap at 0x{:x}", seg.start);
            assert!(seg.size > 0);
            // Maximal-merge: no two adjacent HOLEs survive an operation
            assert!(
                !(prev_state == Some(SegmentState::Hole) && seg.state == SegmentState::Hole),
                "adjacent holes at 0x{:x}",
                seg.start
            );
            match seg.state {
                SegmentState::Allocated => allocated += seg.size,
                SegmentState::Hole => holes += seg.size,
            }
            cursor = seg.start + seg.size;
            prev_state = Some(seg.state);
        }
        // Segment sizes sum exactly to the page size
        assert_eq!(cursor, page.base + stats.page_size);
    }
    assert_eq!(allocated, stats.allocated_bytes);
    assert_eq!(holes, stats.hole_bytes);
    assert_eq!(stats.total_bytes, stats.total_pages * stats.page_size);
}

proptest! {
    #[test]
    fn random_operations_preserve_invariants(
        ops in prop::collection::vec((0u8..4, 1usize..3000), 1..80)
    ) {
        let mut engine = engine();
        let mut live: Vec<VirtAddr> = Vec::new();

        for (kind, size) in ops {
            match kind {
                // Allocating (twice as likely as the other operations)
                0 | 1 => {
                    let addr = engine.allocate(size).unwrap();
                    live.push(addr);
                }
                // Freeing a pseudo-randomly chosen live allocation
                2 => {
                    if !live.is_empty() {
                        let addr = live.remove(size % live.len());
                        engine.free(addr).unwrap();
                    }
                }
                // Compacting; live addresses follow the relocation report
                _ => {
                    let report = engine.compact();
                    for (old, new) in report.relocated {
                        for addr in live.iter_mut() {
                            if *addr == old {
                                *addr = new;
                            }
                        }
                    }
                }
            }

            let stats = engine.stats();
            check_invariants(&stats);
            prop_assert_eq!(stats.live_allocations, live.len());

            // Every live address stays a valid, resolvable allocation
            for &addr in &live {
                prop_assert!(engine.is_valid(addr));
                prop_assert!(engine.resolve(addr).is_ok());
            }
        }
    }

    #[test]
    fn freed_engine_returns_to_single_holes(
        sizes in prop::collection::vec(1usize..900, 1..30)
    ) {
        let mut engine = engine();
        let addrs: Vec<_> = sizes
            .iter()
            .map(|&size| engine.allocate(size).unwrap())
            .collect();

        for addr in addrs {
            engine.free(addr).unwrap();
        }

        // With everything freed and coalesced, each page is one HOLE
        let stats = engine.stats();
        prop_assert_eq!(stats.allocated_bytes, 0);
        for page in &stats.pages {
            prop_assert_eq!(page.segments.len(), 1);
            prop_assert_eq!(page.segments[0].state, SegmentState::Hole);
            prop_assert_eq!(page.segments[0].size, stats.page_size);
        }
    }

    #[test]
    fn payloads_survive_compaction(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..600), 2..12),
        holes in prop::collection::vec(any::<prop::sample::Index>(), 1..6)
    ) {
        let mut engine = engine();
        let mut live: Vec<(VirtAddr, Vec<u8>)> = Vec::new();
        for payload in payloads {
            let addr = engine.allocate(payload.len()).unwrap();
            engine.write_bytes(addr, &payload).unwrap();
            live.push((addr, payload));
        }

        for hole in holes {
            if live.is_empty() {
                break;
            }
            let (addr, _) = live.remove(hole.index(live.len()));
            engine.free(addr).unwrap();
        }

        let report = engine.compact();
        for (old, new) in report.relocated {
            for entry in live.iter_mut() {
                if entry.0 == old {
                    entry.0 = new;
                }
            }
        }

        for (addr, payload) in &live {
            prop_assert_eq!(&engine.read_bytes(*addr, payload.len()).unwrap(), payload);
        }
    }
}
