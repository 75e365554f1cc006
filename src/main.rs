/*!
 * MeMS Demo Driver
 *
 * Thin exercise harness: runs a scripted allocate/free/compact sequence
 * against the engine and prints the resulting stats snapshot. Pass --json
 * for a machine-readable dump. No engine logic lives here.
 */

use std::error::Error;

use log::info;
use mems::{MemsManager, MemsStats};

fn print_stats(stats: &MemsStats) {
    println!("--------- MeMS system stats ---------");
    println!(
        "pages: {}  allocated: {} bytes  holes: {} bytes  fragmentation: {:.1}% ({})",
        stats.total_pages,
        stats.allocated_bytes,
        stats.hole_bytes,
        stats.fragmentation * 100.0,
        stats.fragmentation_level()
    );
    for page in &stats.pages {
        print!("PAGE[0x{:x}]", page.base);
        for seg in &page.segments {
            print!(" <-> {}[0x{:x}:{}]", seg.state, seg.start, seg.size);
        }
        println!();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let json = std::env::args().any(|arg| arg == "--json");

    info!("MeMS demo starting");
    let mut engine = MemsManager::new();

    // Fill a page with three blocks, punch holes, then defragment
    let a = engine.allocate(100)?;
    let b = engine.allocate(200)?;
    let c = engine.allocate(300)?;
    engine.write_bytes(c, b"mems")?;

    engine.free(a)?;
    engine.free(b)?;

    let report = engine.compact();
    info!(
        "Compacted: {} relocation(s), {} bytes moved",
        report.relocated.len(),
        report.bytes_moved
    );
    let c = report
        .relocated
        .iter()
        .find(|(old, _)| *old == c)
        .map(|&(_, new)| new)
        .unwrap_or(c);
    info!("Payload after compaction: {:?}", engine.read_bytes(c, 4)?);

    // A request larger than one page spans fresh pages
    let big = engine.allocate(6000)?;
    info!("Spanning allocation at 0x{:x}", big);

    let stats = engine.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }

    let released = engine.teardown();
    info!("Released {} page(s)", released);
    Ok(())
}
