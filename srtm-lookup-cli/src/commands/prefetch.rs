use anyhow::{bail, Context, Result};
use srtm_lookup::{BoundingBox, LookupConfig};

use super::{ctrl_c_token, TileProgress};

pub fn run(
    config: &LookupConfig,
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
) -> Result<()> {
    if min_lat > max_lat || min_lon > max_lon {
        bail!("Minimum latitude and longitude must not exceed the maximum");
    }

    let bounds = BoundingBox::new(min_lat, min_lon, max_lat, max_lon);
    let mut orchestrator = config
        .orchestrator()
        .context("Failed to set up the sources")?;
    let cancel = ctrl_c_token()?;
    let mut progress = TileProgress::new()?;

    let stats = orchestrator
        .prefetch(&bounds, &mut progress, &cancel)
        .context("Prefetch failed")?;
    progress.finish();

    println!("Tiles in area: {}", stats.tiles_matched);
    println!("  Downloaded: {}", stats.tiles_downloaded);
    println!("  Already cached: {}", stats.tiles_already_cached);
    println!("  Unavailable: {}", stats.tiles_failed);
    if stats.cancelled {
        println!("Cancelled before all tiles were processed");
    }
    println!("Elapsed: {:.1}s", stats.elapsed_ms as f64 / 1000.0);

    Ok(())
}
