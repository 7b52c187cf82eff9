//! On-disk tile cache.
//!
//! Zipped tiles are stored unchanged under `<root>/srtm/`, named after the
//! tile and the dataset suffix (`N46E007.hgt.zip`, `N46E007.SRTMGL1.hgt.zip`).
//! Files of [`MIN_VALID_SIZE`] bytes or less are leftovers of failed
//! downloads (error pages, truncated transfers) and count as absent.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use memmap2::Mmap;

use crate::error::{LookupError, Result};
use crate::source::SourceKind;
use crate::tile::Tile;

/// Cached files must be larger than this many bytes to be used.
pub const MIN_VALID_SIZE: u64 = 400;

/// Name of the subdirectory holding the tiles.
pub const CACHE_SUBDIR: &str = "srtm";

// Distinguishes temporary files of concurrent writers.
static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A tile file found in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTile {
    /// File name, e.g. `N46E007.hgt.zip`.
    pub name: String,
    pub tile: Tile,
    pub kind: SourceKind,
    pub size_bytes: u64,
}

/// Tile cache rooted at an optional directory.
///
/// Without a root every lookup misses and every write fails with
/// [`LookupError::CacheUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct DiskCache {
    root: Option<PathBuf>,
}

impl DiskCache {
    /// Cache under `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// A cache that holds nothing.
    pub fn disabled() -> Self {
        Self { root: None }
    }

    /// Cache under `root` if one is given.
    pub fn from_option(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Whether a root directory is configured.
    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    /// Configured root directory.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Directory holding the tile files.
    pub fn dir(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|r| r.join(CACHE_SUBDIR))
    }

    /// Path a file of this name would have in the cache.
    pub fn path_for(&self, filename: &str) -> Option<PathBuf> {
        self.dir().map(|d| d.join(filename))
    }

    /// Path of the named file if it is present and usable.
    pub fn valid_path(&self, filename: &str) -> Option<PathBuf> {
        self.path_for(filename).filter(|p| has_valid(p))
    }

    /// Memory-map a cached file.
    pub fn read(&self, path: &Path) -> Result<Mmap> {
        let file = File::open(path)?;

        // SAFETY: the mapping is read-only and dropped once the tile is
        // decoded. Cache files are replaced by rename, never rewritten in place.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(mmap)
    }

    /// Store a downloaded file, creating the cache directory if needed.
    ///
    /// The data is written to a temporary file first and renamed into place,
    /// so a concurrent reader never sees a partial tile.
    pub fn write(&self, filename: &str, data: &[u8]) -> Result<PathBuf> {
        let dir = self.ensure_dir()?;
        let path = dir.join(filename);
        let partial = dir.join(format!(
            "{}.{}-{}.part",
            filename,
            std::process::id(),
            PART_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = fs::write(&partial, data).and_then(|_| fs::rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = data.len(), "cached tile");
        Ok(path)
    }

    /// Every tile file in the cache, sorted by file name.
    pub fn list(&self) -> Result<Vec<CachedTile>> {
        let Some(dir) = self.dir() else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut tiles = Vec::new();
        for entry in fs::read_dir(&dir)?.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(kind) = SourceKind::from_filename(&name) else {
                continue;
            };
            let Ok(tile) = name.parse::<Tile>() else {
                continue;
            };
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            tiles.push(CachedTile {
                name,
                tile,
                kind,
                size_bytes: metadata.len(),
            });
        }

        tiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tiles)
    }

    fn ensure_dir(&self) -> Result<PathBuf> {
        let dir = self.dir().ok_or_else(|| LookupError::CacheUnavailable {
            reason: "no cache directory configured".to_string(),
        })?;

        if dir.exists() && !dir.is_dir() {
            return Err(LookupError::CacheUnavailable {
                reason: format!("{} is not a directory", dir.display()),
            });
        }
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| LookupError::CacheUnavailable {
                reason: format!("cannot create {}: {}", dir.display(), e),
            })?;
        }
        Ok(dir)
    }
}

/// Whether `path` is a readable regular file larger than [`MIN_VALID_SIZE`].
pub fn has_valid(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(m) if m.is_file() && m.len() > MIN_VALID_SIZE => File::open(path).is_ok(),
        _ => false,
    }
}
