//! Getting the grid of one tile from one source.

use std::fmt;

use crate::cache::DiskCache;
use crate::grid::Grid;
use crate::source::{DataSource, Download};
use crate::tile::Tile;

/// What happened when a tile was requested from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Downloaded and stored in the cache.
    Downloaded,
    /// Read from the cache without network access.
    AlreadyCached,
    /// The source has no such tile.
    NothingToDo,
    /// The download failed.
    DownloadFailed(String),
    /// Downloaded, but it could not be stored; the data was used once.
    CacheUnavailable,
    /// The source refused the credential with this HTTP status.
    AuthFailed(u16),
    /// The source is switched off (no credential, or an earlier login failure).
    SourceDisabled,
    /// The archive did not contain a valid grid.
    Corrupt(String),
}

impl FetchResult {
    /// Message worth reporting to a user, if this is a failure.
    pub fn error_message(&self) -> Option<String> {
        match self {
            FetchResult::DownloadFailed(msg) => Some(msg.clone()),
            FetchResult::AuthFailed(status) => {
                Some(format!("Earthdata authentication failed (HTTP {})", status))
            }
            FetchResult::Corrupt(msg) => Some(msg.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchResult::Downloaded => write!(f, "downloaded"),
            FetchResult::AlreadyCached => write!(f, "cached"),
            FetchResult::NothingToDo => write!(f, "no tile"),
            FetchResult::DownloadFailed(msg) => write!(f, "download failed: {}", msg),
            FetchResult::CacheUnavailable => write!(f, "downloaded (not cached)"),
            FetchResult::AuthFailed(status) => write!(f, "authentication failed (HTTP {})", status),
            FetchResult::SourceDisabled => write!(f, "source disabled"),
            FetchResult::Corrupt(msg) => write!(f, "corrupt tile: {}", msg),
        }
    }
}

/// A fetch outcome with the grid, when one was obtained.
#[derive(Debug)]
pub struct Fetched {
    pub grid: Option<Grid>,
    pub result: FetchResult,
}

impl Fetched {
    fn without_grid(result: FetchResult) -> Self {
        Self { grid: None, result }
    }
}

/// Gets tile grids, from the disk cache when possible.
#[derive(Debug, Clone, Default)]
pub struct TileFetcher {
    cache: DiskCache,
}

impl TileFetcher {
    pub fn new(cache: DiskCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Get the grid of `tile` from `source`.
    ///
    /// A valid cached file is used without contacting the source; one that
    /// does not decode is replaced. Otherwise the tile is downloaded, checked,
    /// and stored. If it cannot be stored the
    /// downloaded data is still decoded and returned, reported as
    /// [`FetchResult::CacheUnavailable`].
    pub fn fetch(&self, tile: Tile, source: &mut dyn DataSource) -> Fetched {
        let filename = source.cache_filename(tile);
        let side = source.grid_side();
        let name = tile.name();

        if let Some(path) = self.cache.valid_path(&filename) {
            tracing::debug!(tile = %name, path = %path.display(), "cache hit");
            let decoded = self
                .cache
                .read(&path)
                .and_then(|data| Grid::from_zip_bytes(&data, side, &name));
            match decoded {
                Ok(grid) => {
                    return Fetched {
                        grid: Some(grid),
                        result: FetchResult::AlreadyCached,
                    }
                }
                Err(e) => {
                    tracing::warn!(tile = %name, path = %path.display(), error = %e, "unreadable cached tile, fetching again");
                }
            }
        }

        let bytes = match source.download(tile) {
            Download::Bytes(bytes) => bytes,
            Download::Skipped(result) => return Fetched::without_grid(result),
        };

        let grid = match Grid::from_zip_bytes(&bytes, side, &name) {
            Ok(grid) => grid,
            Err(e) => {
                tracing::warn!(tile = %name, source = %source.kind(), error = %e, "downloaded tile is not usable");
                return Fetched::without_grid(FetchResult::Corrupt(e.to_string()));
            }
        };

        let result = match self.cache.write(&filename, &bytes) {
            Ok(path) => {
                tracing::info!(tile = %name, source = %source.kind(), path = %path.display(), "downloaded tile");
                FetchResult::Downloaded
            }
            Err(e) if self.cache.is_enabled() => {
                tracing::warn!(tile = %name, error = %e, "cannot cache tile, using it once");
                FetchResult::CacheUnavailable
            }
            Err(_) => {
                tracing::debug!(tile = %name, "no cache configured, using tile once");
                FetchResult::CacheUnavailable
            }
        };

        Fetched {
            grid: Some(grid),
            result,
        }
    }
}
