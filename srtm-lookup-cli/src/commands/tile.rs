use anyhow::{Context, Result};
use serde::Serialize;
use srtm_lookup::grid::GridStats;
use srtm_lookup::{Grid, LookupConfig, Tile, TileLocation};

#[derive(Serialize)]
struct TileReport {
    tile: String,
    sources: Vec<SourceReport>,
}

#[derive(Serialize)]
struct SourceReport {
    dataset: String,
    url: Option<String>,
    cache_path: Option<String>,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_altitude: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_altitude: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    void_samples: Option<usize>,
}

pub fn run(
    config: &LookupConfig,
    name: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    json: bool,
) -> Result<()> {
    let tile = match (name, lat, lon) {
        (_, Some(lat), Some(lon)) => Tile::for_point(lat, lon),
        (Some(name), _, _) => name
            .parse::<Tile>()
            .with_context(|| format!("Invalid tile name: {}", name))?,
        _ => anyhow::bail!("Give a tile name or both --lat and --lon"),
    };

    let orchestrator = config
        .orchestrator()
        .context("Failed to set up the sources")?;
    let cache = orchestrator.cache();

    let mut sources = Vec::new();
    for location in orchestrator.locate(tile) {
        let stats = if location.cached {
            cached_stats(&location, cache, tile)
        } else {
            None
        };
        sources.push(SourceReport {
            dataset: location.kind.to_string(),
            url: location.url,
            cache_path: location.cache_path.map(|p| p.display().to_string()),
            cached: location.cached,
            samples: stats.map(|(side, _)| side),
            min_altitude: stats.and_then(|(_, s)| s.min),
            max_altitude: stats.and_then(|(_, s)| s.max),
            void_samples: stats.map(|(_, s)| s.void_count),
        });
    }

    let report = TileReport {
        tile: tile.name(),
        sources,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Tile: {}", report.tile);
    println!(
        "Coverage: {} to {} latitude, {} to {} longitude",
        tile.lat(),
        tile.lat() + 1,
        tile.lon(),
        tile.lon() + 1
    );
    for source in &report.sources {
        println!();
        println!("{}", source.dataset);
        println!(
            "  URL: {}",
            source.url.as_deref().unwrap_or("(not in this dataset)")
        );
        match &source.cache_path {
            Some(path) if source.cached => println!("  Cached: {}", path),
            Some(path) => println!("  Not cached: {}", path),
            None => println!("  No cache directory configured"),
        }
        if let Some(samples) = source.samples {
            println!("  Resolution: {}x{} samples", samples, samples);
        }
        if let (Some(min), Some(max)) = (source.min_altitude, source.max_altitude) {
            println!("  Min altitude: {}m", min);
            println!("  Max altitude: {}m", max);
        }
        if let (Some(voids), Some(samples)) = (source.void_samples, source.samples) {
            if voids > 0 {
                let pct = voids as f64 / (samples * samples) as f64 * 100.0;
                println!("  Void samples: {} ({:.1}%)", voids, pct);
            }
        }
    }

    Ok(())
}

/// Grid side and statistics of a cached tile, if it decodes.
fn cached_stats(
    location: &TileLocation,
    cache: &srtm_lookup::DiskCache,
    tile: Tile,
) -> Option<(usize, GridStats)> {
    let path = location.cache_path.as_ref()?;
    let side = location.kind.grid_side();
    let data = cache.read(path).ok()?;
    let grid = Grid::from_zip_bytes(&data, side, &tile.name()).ok()?;
    Some((side, grid.stats()))
}
