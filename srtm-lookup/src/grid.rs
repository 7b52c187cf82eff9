//! Elevation grids and HGT archive decoding.
//!
//! Tiles arrive as zip archives holding a single `.hgt` entry. The entry is a
//! square grid of 16-bit big-endian signed samples, stored row by row from the
//! northern edge to the southern edge, each row running west to east.

use std::io::{Cursor, Read, Seek};

use zip::ZipArchive;

use crate::error::{LookupError, Result};

/// Samples per side for 1 arc-second (~30m) tiles.
pub const SRTM1_SAMPLES: usize = 3601;

/// Samples per side for 3 arc-second (~90m) tiles.
pub const SRTM3_SAMPLES: usize = 1201;

/// Value indicating no data (void) in SRTM files.
pub const VOID_VALUE: i16 = -32768;

/// Square grid of elevation samples for one tile.
///
/// Row 0 is the northernmost row, column 0 the westernmost column.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    side: usize,
    samples: Vec<i16>,
}

impl Grid {
    /// Wrap already-decoded samples.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::CorruptTile`] if `samples.len() != side * side`
    /// or the side is too small to hold a 2×2 interpolation cell.
    pub fn from_samples(side: usize, samples: Vec<i16>) -> Result<Self> {
        if side < 2 || samples.len() != side * side {
            return Err(LookupError::CorruptTile {
                name: String::new(),
                reason: format!(
                    "{} samples do not form a {}x{} grid",
                    samples.len(),
                    side,
                    side
                ),
            });
        }
        Ok(Self { side, samples })
    }

    /// Decode raw HGT bytes (no archive) for a grid of the given side.
    pub fn from_hgt_bytes(side: usize, data: &[u8]) -> Result<Self> {
        let expected = hgt_size(side);
        if data.len() != expected {
            return Err(LookupError::CorruptTile {
                name: String::new(),
                reason: format!("{} bytes, expected {}", data.len(), expected),
            });
        }

        let samples = data
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self { side, samples })
    }

    /// Decode the single entry of a zipped HGT archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read, does not hold exactly one
    /// entry, or the entry's size is not `2 * side * side` bytes. No partial
    /// grid is ever returned.
    pub fn from_zip<R: Read + Seek>(reader: R, side: usize, name: &str) -> Result<Self> {
        let corrupt = |reason: String| LookupError::CorruptTile {
            name: name.to_string(),
            reason,
        };

        let mut archive = ZipArchive::new(reader)?;
        if archive.len() != 1 {
            return Err(corrupt(format!(
                "archive has {} entries, expected exactly one",
                archive.len()
            )));
        }

        let mut entry = archive.by_index(0)?;
        let expected = hgt_size(side);
        if entry.size() != expected as u64 {
            return Err(corrupt(format!(
                "entry {} has {} bytes, expected {}",
                entry.name(),
                entry.size(),
                expected
            )));
        }

        let mut data = vec![0u8; expected];
        entry.read_exact(&mut data)?;

        Self::from_hgt_bytes(side, &data).map_err(|_| corrupt("short entry".to_string()))
    }

    /// Decode a zipped HGT archive held in memory.
    pub fn from_zip_bytes(data: &[u8], side: usize, name: &str) -> Result<Self> {
        Self::from_zip(Cursor::new(data), side, name)
    }

    /// Number of samples per row/column.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Sample at the given row (0 = north) and column (0 = west).
    ///
    /// # Panics
    ///
    /// Panics if the row or column is outside the grid.
    pub fn get(&self, row: usize, col: usize) -> i16 {
        self.samples[row * self.side + col]
    }

    /// All samples in row-major order.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Minimum and maximum non-void sample with the number of voids.
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            min: None,
            max: None,
            void_count: 0,
        };
        for &v in &self.samples {
            if v == VOID_VALUE {
                stats.void_count += 1;
                continue;
            }
            stats.min = Some(stats.min.map_or(v, |m: i16| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m: i16| m.max(v)));
        }
        stats
    }
}

/// Summary of the values in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridStats {
    /// Lowest non-void sample.
    pub min: Option<i16>,
    /// Highest non-void sample.
    pub max: Option<i16>,
    /// Number of void samples.
    pub void_count: usize,
}

/// Byte size of an uncompressed HGT file for a grid of the given side.
pub fn hgt_size(side: usize) -> usize {
    side * side * 2
}
