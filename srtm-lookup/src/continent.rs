//! Continent directories of the low-resolution dataset.
//!
//! The 3 arc-second archive is split into one directory per continent. A tile's
//! directory is found in a byte table with one entry per tile between latitudes
//! -59 and 59, indexed by `(lat + 59) * 360 + (lon + 180)`. Entry 0 means no
//! tile exists for that cell.

use std::fs;
use std::path::Path;

use crate::error::{LookupError, Result};
use crate::tile::Tile;

/// Directory names, indexed by table value. Index 0 is unused.
pub const CONTINENTS: [&str; 7] = [
    "",
    "Eurasia",
    "North_America",
    "Australia",
    "Islands",
    "South_America",
    "Africa",
];

/// Southernmost tile latitude covered by the table.
pub const MIN_LAT: i32 = -59;

/// Northernmost tile latitude covered by the table.
pub const MAX_LAT: i32 = 59;

/// Number of entries in a complete table.
pub const TABLE_SIZE: usize = 119 * 360;

/// Lookup table from tile to continent directory.
#[derive(Debug, Clone)]
pub struct ContinentTable {
    entries: Vec<u8>,
}

impl ContinentTable {
    /// Use a table read from elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidContinentTable`] if the table does not hold
    /// exactly [`TABLE_SIZE`] entries.
    pub fn from_bytes(entries: Vec<u8>) -> Result<Self> {
        if entries.len() != TABLE_SIZE {
            return Err(LookupError::InvalidContinentTable {
                size: entries.len(),
            });
        }
        Ok(Self { entries })
    }

    /// Load a table file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(fs::read(path)?)
    }

    /// Built-in table derived from continent bounding boxes.
    ///
    /// Cells over open ocean may still be marked as land, which only costs a
    /// failed download for those tiles.
    pub fn approximate() -> Self {
        let mut entries = vec![0u8; TABLE_SIZE];
        for lat in MIN_LAT..=MAX_LAT {
            for lon in -180..180 {
                if let Some(idx) = table_index(lat, lon) {
                    entries[idx] = approximate_continent(lat, lon);
                }
            }
        }
        Self { entries }
    }

    /// Continent directory for the tile, or `None` if no tile exists there.
    ///
    /// # Examples
    ///
    /// ```
    /// use srtm_lookup::continent::ContinentTable;
    /// use srtm_lookup::tile::Tile;
    ///
    /// let table = ContinentTable::approximate();
    /// assert_eq!(table.continent_for(Tile::new(46, 7)), Some("Eurasia"));
    /// assert_eq!(table.continent_for(Tile::new(75, 7)), None);
    /// ```
    pub fn continent_for(&self, tile: Tile) -> Option<&'static str> {
        let idx = table_index(tile.lat(), tile.lon())?;
        match self.entries.get(idx).copied() {
            Some(code @ 1..=6) => Some(CONTINENTS[usize::from(code)]),
            _ => None,
        }
    }
}

impl Default for ContinentTable {
    fn default() -> Self {
        Self::approximate()
    }
}

fn table_index(lat: i32, lon: i32) -> Option<usize> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) || !(-180..180).contains(&lon) {
        return None;
    }
    Some(((lat + 59) * 360 + (lon + 180)) as usize)
}

/// Table code for a tile by region rectangles.
fn approximate_continent(lat: i32, lon: i32) -> u8 {
    // Hawaii
    if (18..=22).contains(&lat) && (-161..=-155).contains(&lon) {
        return 4;
    }
    // New Zealand
    if (-48..=-35).contains(&lat) && (165..=178).contains(&lon) {
        return 4;
    }
    // North America: 15°N to 60°N, -170° to -50°
    if (15..=59).contains(&lat) && (-170..=-51).contains(&lon) {
        return 2;
    }
    // South America: -56° to 15°N, -92° to -30°
    if (-56..=14).contains(&lat) && (-92..=-31).contains(&lon) {
        return 5;
    }
    // Australia: -45° to -10°, 112° to 155°
    if (-45..=-11).contains(&lat) && (112..=154).contains(&lon) {
        return 3;
    }
    // Africa: -35° to 37°N, -20° to 55°
    if (-35..=36).contains(&lat) && (-20..=54).contains(&lon) {
        return 6;
    }
    // Eurasia: -11° to 60°N, -15° to 180°
    if (-11..=59).contains(&lat) && (-15..=179).contains(&lon) {
        return 1;
    }
    0
}
