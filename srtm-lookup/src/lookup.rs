//! Batch altitude lookup.
//!
//! [`LookupOrchestrator::run`] fills in missing altitudes for a whole point
//! collection:
//!
//! 1. Every point needing an altitude is mapped to its tile, giving the set of
//!    distinct tiles to fetch.
//! 2. Tiles are fetched one at a time, trying each source in order until one
//!    yields a grid.
//! 3. Each grid is applied to every point of the collection that lies in the
//!    tile and still needs an altitude, not just the points that caused the
//!    fetch.
//!
//! Cancellation is checked before each tile. Altitudes already written are
//! kept.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cache::DiskCache;
use crate::error::{LookupError, Result};
use crate::fetch::{FetchResult, TileFetcher};
use crate::grid::Grid;
use crate::interpolate::altitude_at;
use crate::point::PointProvider;
use crate::source::{DataSource, SourceKind};
use crate::tile::{tiles_in_range, Tile};

/// Per-run choices made by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Treat altitudes of exactly zero as missing.
    pub overwrite_zeros: bool,
    /// Leave points in cells with any void sample without altitude instead of
    /// filling from neighbours.
    pub terrain: bool,
}

/// Phase of a lookup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Scanning,
    /// Fetching the tile with this index.
    FetchingTile(usize),
    /// Writing altitudes from the tile with this index.
    Applying(usize),
    Done,
    Cancelled,
}

/// Receives progress from a run, once per tile.
pub trait ProgressSink {
    /// `done` of `total` tiles have been processed.
    fn progress(&mut self, done: usize, total: usize);

    /// The run moved to a new phase.
    fn state_changed(&mut self, _state: LookupState) {}
}

/// A sink that ignores progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _done: usize, _total: usize) {}
}

impl<F: FnMut(usize, usize)> ProgressSink for F {
    fn progress(&mut self, done: usize, total: usize) {
        self(done, total)
    }
}

/// Shared flag asking a run to stop before its next tile.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts from a lookup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupSummary {
    /// Distinct tiles needed.
    pub tiles_total: usize,
    /// Tiles downloaded and stored in the cache.
    pub tiles_downloaded: usize,
    /// Tiles read from the cache.
    pub tiles_cached: usize,
    /// Tiles downloaded but not stored.
    pub tiles_uncached: usize,
    /// Tiles no source could provide.
    pub tiles_failed: usize,
    /// Points that received an altitude.
    pub altitudes_found: usize,
    /// A source refused its credential.
    pub auth_failed: bool,
    /// First error reported by a source.
    pub first_error: Option<String>,
    /// The run stopped early.
    pub cancelled: bool,
}

/// How a lookup run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// No point needed an altitude.
    NothingRequired,
    /// At least one altitude was found.
    Completed(LookupSummary),
    /// Tiles were processed but no altitude was found.
    NoneFound(LookupSummary),
    /// No altitude was found and a source reported an error.
    Failed {
        message: String,
        summary: LookupSummary,
    },
    /// Stopped by the caller; altitudes found so far were kept.
    Cancelled(LookupSummary),
}

impl LookupOutcome {
    fn from_summary(summary: LookupSummary) -> Self {
        if summary.cancelled {
            return LookupOutcome::Cancelled(summary);
        }
        if summary.altitudes_found > 0 {
            return LookupOutcome::Completed(summary);
        }
        match summary.first_error.clone() {
            Some(message) => LookupOutcome::Failed { message, summary },
            None => LookupOutcome::NoneFound(summary),
        }
    }

    /// Counts of the run, if any tile was needed.
    pub fn summary(&self) -> Option<&LookupSummary> {
        match self {
            LookupOutcome::NothingRequired => None,
            LookupOutcome::Completed(s)
            | LookupOutcome::NoneFound(s)
            | LookupOutcome::Cancelled(s)
            | LookupOutcome::Failed { summary: s, .. } => Some(s),
        }
    }

    /// Number of points that received an altitude.
    pub fn altitudes_found(&self) -> usize {
        self.summary().map_or(0, |s| s.altitudes_found)
    }
}

/// A geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Smallest box containing every point, or `None` for an empty collection.
    pub fn around<P: PointProvider + ?Sized>(points: &P) -> Option<Self> {
        (0..points.len()).map(|i| points.point(i)).fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p.lat, p.lon, p.lat, p.lon),
                Some(b) => Self::new(
                    b.min_lat.min(p.lat),
                    b.min_lon.min(p.lon),
                    b.max_lat.max(p.lat),
                    b.max_lon.max(p.lon),
                ),
            })
        })
    }

    /// Tiles whose southwest corner lies within the box.
    pub fn tiles(&self) -> Vec<Tile> {
        tiles_in_range(self.min_lat, self.min_lon, self.max_lat, self.max_lon)
    }
}

/// Statistics from a prefetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchStats {
    /// Number of tiles covered by the bounding box.
    pub tiles_matched: usize,
    /// Number of tiles downloaded into the cache.
    pub tiles_downloaded: usize,
    /// Number of tiles that were already cached.
    pub tiles_already_cached: usize,
    /// Number of tiles no source could provide.
    pub tiles_failed: usize,
    /// Stopped before all tiles were processed.
    pub cancelled: bool,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Where one source keeps a tile, remotely and in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLocation {
    pub kind: SourceKind,
    /// Remote URL, or `None` if the dataset has no such tile.
    pub url: Option<String>,
    /// Cache file, if a cache is configured.
    pub cache_path: Option<PathBuf>,
    /// The cache file exists and is large enough to use.
    pub cached: bool,
}

/// Drives lookups over an ordered chain of sources.
pub struct LookupOrchestrator {
    fetcher: TileFetcher,
    sources: Vec<Box<dyn DataSource>>,
    state: LookupState,
}

impl LookupOrchestrator {
    /// Sources are tried in the given order for every tile.
    pub fn new(cache: DiskCache, sources: Vec<Box<dyn DataSource>>) -> Self {
        Self {
            fetcher: TileFetcher::new(cache),
            sources,
            state: LookupState::Idle,
        }
    }

    pub fn cache(&self) -> &DiskCache {
        self.fetcher.cache()
    }

    /// Datasets in the order they are tried.
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.sources.iter().map(|s| s.kind()).collect()
    }

    /// Phase of the current or last run.
    pub fn state(&self) -> LookupState {
        self.state
    }

    /// Where each source would get `tile` from, in chain order.
    pub fn locate(&self, tile: Tile) -> Vec<TileLocation> {
        let cache = self.fetcher.cache();
        self.sources
            .iter()
            .map(|source| {
                let filename = source.cache_filename(tile);
                TileLocation {
                    kind: source.kind(),
                    url: source.url_for(tile),
                    cache_path: cache.path_for(&filename),
                    cached: cache.valid_path(&filename).is_some(),
                }
            })
            .collect()
    }

    /// Look up altitudes for every point of `points` that needs one.
    ///
    /// Points with coordinates outside ±90°/±180° are left untouched.
    pub fn run<P: PointProvider + ?Sized>(
        &mut self,
        points: &mut P,
        options: LookupOptions,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> LookupOutcome {
        self.sources.iter_mut().for_each(|s| s.reset());
        self.set_state(LookupState::Scanning, progress);

        let tiles: BTreeSet<Tile> = (0..points.len())
            .map(|i| points.point(i))
            .filter(|p| p.needs_lookup(options.overwrite_zeros))
            .filter(|p| {
                let valid = p.has_valid_coordinates();
                if !valid {
                    tracing::debug!(lat = p.lat, lon = p.lon, "skipping point with invalid coordinates");
                }
                valid
            })
            .map(|p| Tile::for_point(p.lat, p.lon))
            .collect();

        if tiles.is_empty() {
            tracing::info!("no points need an altitude");
            self.set_state(LookupState::Done, progress);
            return LookupOutcome::NothingRequired;
        }

        let total = tiles.len();
        let mut summary = LookupSummary {
            tiles_total: total,
            ..Default::default()
        };
        tracing::info!(points = points.len(), tiles = total, "starting altitude lookup");
        progress.progress(0, total);

        for (i, &tile) in tiles.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            self.set_state(LookupState::FetchingTile(i), progress);
            match self.fetch_grid(tile, &mut summary) {
                Some(grid) => {
                    self.set_state(LookupState::Applying(i), progress);
                    let found = apply_grid(points, tile, &grid, options);
                    tracing::debug!(tile = %tile, found, "applied tile");
                    summary.altitudes_found += found;
                }
                None => summary.tiles_failed += 1,
            }

            progress.progress(i + 1, total);
        }

        let final_state = if summary.cancelled {
            LookupState::Cancelled
        } else {
            LookupState::Done
        };
        self.set_state(final_state, progress);

        tracing::info!(
            found = summary.altitudes_found,
            downloaded = summary.tiles_downloaded,
            cached = summary.tiles_cached,
            failed = summary.tiles_failed,
            cancelled = summary.cancelled,
            "altitude lookup finished"
        );
        LookupOutcome::from_summary(summary)
    }

    /// Download every tile in `bounds` into the cache.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::CacheUnavailable`] if no cache directory is
    /// configured. Per-tile failures are counted, not returned.
    pub fn prefetch(
        &mut self,
        bounds: &BoundingBox,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<PrefetchStats> {
        if !self.fetcher.cache().is_enabled() {
            return Err(LookupError::CacheUnavailable {
                reason: "prefetching needs a cache directory".to_string(),
            });
        }

        let start = Instant::now();
        self.sources.iter_mut().for_each(|s| s.reset());

        let tiles = bounds.tiles();
        let mut stats = PrefetchStats {
            tiles_matched: tiles.len(),
            ..Default::default()
        };
        progress.progress(0, tiles.len());

        for (i, &tile) in tiles.iter().enumerate() {
            if cancel.is_cancelled() {
                stats.cancelled = true;
                break;
            }

            let mut stored = false;
            for source in self.sources.iter_mut() {
                let fetched = self.fetcher.fetch(tile, source.as_mut());
                match fetched.result {
                    FetchResult::Downloaded => {
                        stats.tiles_downloaded += 1;
                        stored = true;
                    }
                    FetchResult::AlreadyCached => {
                        stats.tiles_already_cached += 1;
                        stored = true;
                    }
                    _ => {}
                }
                if fetched.grid.is_some() {
                    break;
                }
            }
            if !stored {
                stats.tiles_failed += 1;
            }

            progress.progress(i + 1, tiles.len());
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            matched = stats.tiles_matched,
            downloaded = stats.tiles_downloaded,
            cached = stats.tiles_already_cached,
            failed = stats.tiles_failed,
            "prefetch finished"
        );
        Ok(stats)
    }

    /// Try each source in order until one gives a grid.
    fn fetch_grid(&mut self, tile: Tile, summary: &mut LookupSummary) -> Option<Grid> {
        for source in self.sources.iter_mut() {
            let fetched = self.fetcher.fetch(tile, source.as_mut());
            match &fetched.result {
                FetchResult::Downloaded => summary.tiles_downloaded += 1,
                FetchResult::AlreadyCached => summary.tiles_cached += 1,
                FetchResult::CacheUnavailable => summary.tiles_uncached += 1,
                FetchResult::AuthFailed(_) => summary.auth_failed = true,
                _ => {}
            }
            if let Some(message) = fetched.result.error_message() {
                summary.first_error.get_or_insert(message);
            }
            if fetched.grid.is_some() {
                return fetched.grid;
            }
        }
        None
    }

    fn set_state(&mut self, state: LookupState, progress: &mut dyn ProgressSink) {
        self.state = state;
        progress.state_changed(state);
    }
}

/// Write altitudes from `grid` to the points in `tile` that need one.
/// Returns the number of points changed.
fn apply_grid<P: PointProvider + ?Sized>(
    points: &mut P,
    tile: Tile,
    grid: &Grid,
    options: LookupOptions,
) -> usize {
    let mut found = 0;
    for i in 0..points.len() {
        let p = points.point(i);
        if !p.needs_lookup(options.overwrite_zeros)
            || !p.has_valid_coordinates()
            || !tile.contains(p.lat, p.lon)
        {
            continue;
        }
        if let Some(altitude) = altitude_at(grid, p.lat, p.lon, options.terrain) {
            points.set_altitude(i, round_altitude(altitude));
            found += 1;
        }
    }
    found
}

/// Round to millimetres.
fn round_altitude(altitude: f64) -> f64 {
    (altitude * 1000.0).round() / 1000.0
}
