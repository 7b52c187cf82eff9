//! Remote SRTM data sources.
//!
//! Two datasets are supported:
//!
//! - **Low resolution** (3 arc-second, 1201×1201): public, organised in one
//!   directory per continent, e.g.
//!   `https://srtm.kurviger.de/SRTM3/Eurasia/N46E007.hgt.zip`.
//! - **High resolution** (1 arc-second, 3601×3601): NASA Earthdata, flat
//!   directory, requires an Earthdata login, e.g.
//!   `https://e4ftl01.cr.usgs.gov/MEASURES/SRTMGL1.003/2000.02.11/N46E007.SRTMGL1.hgt.zip`.
//!
//! A source only knows how to name and download tiles. Caching and decoding
//! happen in [`TileFetcher`](crate::fetch::TileFetcher).

use std::fmt;
use std::sync::Arc;

use crate::continent::ContinentTable;
use crate::error::LookupError;
use crate::fetch::FetchResult;
use crate::grid::{SRTM1_SAMPLES, SRTM3_SAMPLES};
use crate::http::{follow_redirects, Transport};
use crate::tile::Tile;

/// Default URL prefix of the low-resolution dataset.
pub const DEFAULT_LOW_RES_URL: &str = "https://srtm.kurviger.de/SRTM3/";

/// Default URL prefix of the high-resolution dataset.
pub const DEFAULT_HIGH_RES_URL: &str =
    "https://e4ftl01.cr.usgs.gov/MEASURES/SRTMGL1.003/2000.02.11/";

/// The two SRTM datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// 3 arc-second (~90m) public data.
    LowRes,
    /// 1 arc-second (~30m) Earthdata data.
    HighRes,
}

impl SourceKind {
    /// Samples per side of this dataset's grids.
    pub fn grid_side(&self) -> usize {
        match self {
            SourceKind::LowRes => SRTM3_SAMPLES,
            SourceKind::HighRes => SRTM1_SAMPLES,
        }
    }

    /// Suffix appended to the tile name for remote and cached files.
    pub fn cache_suffix(&self) -> &'static str {
        match self {
            SourceKind::LowRes => ".hgt.zip",
            SourceKind::HighRes => ".SRTMGL1.hgt.zip",
        }
    }

    /// Whether downloads need an Earthdata credential.
    pub fn requires_auth(&self) -> bool {
        matches!(self, SourceKind::HighRes)
    }

    /// Short human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::LowRes => "SRTM3",
            SourceKind::HighRes => "SRTM1",
        }
    }

    /// Dataset a cached file belongs to, judged by its suffix.
    ///
    /// # Examples
    ///
    /// ```
    /// use srtm_lookup::source::SourceKind;
    ///
    /// assert_eq!(SourceKind::from_filename("N46E007.hgt.zip"), Some(SourceKind::LowRes));
    /// assert_eq!(SourceKind::from_filename("N46E007.SRTMGL1.hgt.zip"), Some(SourceKind::HighRes));
    /// assert_eq!(SourceKind::from_filename("N46E007.hgt"), None);
    /// ```
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.ends_with(SourceKind::HighRes.cache_suffix()) {
            Some(SourceKind::HighRes)
        } else if filename.ends_with(SourceKind::LowRes.cache_suffix()) {
            Some(SourceKind::LowRes)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of asking a source for a tile.
#[derive(Debug)]
pub enum Download {
    /// The zipped tile as served.
    Bytes(Vec<u8>),
    /// Nothing was downloaded, for the given reason.
    Skipped(FetchResult),
}

/// A remote dataset that can name and download tiles.
pub trait DataSource: Send {
    /// Which dataset this is.
    fn kind(&self) -> SourceKind;

    /// Remote URL of the tile, or `None` if the dataset has no such tile.
    fn url_for(&self, tile: Tile) -> Option<String>;

    /// Name of the tile's file in the disk cache.
    fn cache_filename(&self, tile: Tile) -> String {
        format!("{}{}", tile.name(), self.kind().cache_suffix())
    }

    /// Samples per side of this source's grids.
    fn grid_side(&self) -> usize {
        self.kind().grid_side()
    }

    /// Download the zipped tile.
    fn download(&mut self, tile: Tile) -> Download;

    /// Clear per-run state before a new batch.
    fn reset(&mut self) {}
}

fn join_url(prefix: &str, path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), path)
}

/// The public 3 arc-second dataset.
pub struct LowResSource {
    prefix: String,
    table: ContinentTable,
    transport: Arc<dyn Transport>,
}

impl LowResSource {
    pub fn new(prefix: impl Into<String>, table: ContinentTable, transport: Arc<dyn Transport>) -> Self {
        Self {
            prefix: prefix.into(),
            table,
            transport,
        }
    }
}

impl DataSource for LowResSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LowRes
    }

    fn url_for(&self, tile: Tile) -> Option<String> {
        let continent = self.table.continent_for(tile)?;
        Some(join_url(
            &self.prefix,
            &format!("{}/{}", continent, self.cache_filename(tile)),
        ))
    }

    fn download(&mut self, tile: Tile) -> Download {
        let Some(url) = self.url_for(tile) else {
            tracing::debug!(tile = %tile, "no low-res tile at this location");
            return Download::Skipped(FetchResult::NothingToDo);
        };

        match follow_redirects(self.transport.as_ref(), &url, None) {
            Ok(bytes) => Download::Bytes(bytes),
            Err(e) => {
                tracing::warn!(tile = %tile, url = %url, error = %e, "low-res download failed");
                Download::Skipped(FetchResult::DownloadFailed(e.to_string()))
            }
        }
    }
}

/// The authenticated 1 arc-second Earthdata dataset.
///
/// A refused login disables the source until [`reset`](DataSource::reset),
/// so a batch does not repeat a login that cannot succeed.
pub struct HighResSource {
    prefix: String,
    credential: Option<String>,
    disabled: bool,
    transport: Arc<dyn Transport>,
}

impl HighResSource {
    /// `credential` is the base64 encoding of `user:password`.
    pub fn new(
        prefix: impl Into<String>,
        credential: Option<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            credential: credential.filter(|c| !c.is_empty()),
            disabled: false,
            transport,
        }
    }

    /// Whether a login failure has disabled this source.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Whether a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

impl DataSource for HighResSource {
    fn kind(&self) -> SourceKind {
        SourceKind::HighRes
    }

    fn url_for(&self, tile: Tile) -> Option<String> {
        Some(join_url(&self.prefix, &self.cache_filename(tile)))
    }

    fn download(&mut self, tile: Tile) -> Download {
        let credential = match &self.credential {
            Some(c) if !self.disabled => c.as_str(),
            _ => return Download::Skipped(FetchResult::SourceDisabled),
        };
        let Some(url) = self.url_for(tile) else {
            return Download::Skipped(FetchResult::NothingToDo);
        };

        match follow_redirects(self.transport.as_ref(), &url, Some(credential)) {
            Ok(bytes) => Download::Bytes(bytes),
            Err(LookupError::AuthFailed { status }) => {
                tracing::warn!(tile = %tile, status, "Earthdata login refused, disabling high-res source");
                self.disabled = true;
                Download::Skipped(FetchResult::AuthFailed(status))
            }
            Err(e) => {
                tracing::warn!(tile = %tile, url = %url, error = %e, "high-res download failed");
                Download::Skipped(FetchResult::DownloadFailed(e.to_string()))
            }
        }
    }

    fn reset(&mut self) {
        self.disabled = false;
    }
}
