use anyhow::{bail, Context, Result};
use srtm_lookup::{LookupConfig, SourceKind};

use super::format_size;

pub fn run(config: &LookupConfig) -> Result<()> {
    let cache = config.cache();
    let Some(dir) = cache.dir() else {
        bail!("No cache directory. Use --cache-dir or set SRTM_CACHE_DIR");
    };

    let tiles = cache.list().context("Failed to read cache directory")?;
    if tiles.is_empty() {
        println!("No cached tiles in: {}", dir.display());
        return Ok(());
    }

    println!("{:<28} {:>8} {:>12}", "FILE", "DATASET", "SIZE");
    println!("{}", "-".repeat(50));

    let mut high_res = 0;
    let mut low_res = 0;
    let mut total_size = 0;
    for tile in &tiles {
        match tile.kind {
            SourceKind::HighRes => high_res += 1,
            SourceKind::LowRes => low_res += 1,
        }
        total_size += tile.size_bytes;
        println!(
            "{:<28} {:>8} {:>12}",
            tile.name,
            tile.kind.label(),
            format_size(tile.size_bytes)
        );
    }

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    if high_res > 0 {
        println!("  SRTM1 (30m): {}", high_res);
    }
    if low_res > 0 {
        println!("  SRTM3 (90m): {}", low_res);
    }
    println!("  Total size: {}", format_size(total_size));
    println!("  Directory: {}", dir.display());

    Ok(())
}
