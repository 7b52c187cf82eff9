//! Tile addressing.
//!
//! This module maps coordinates to the 1° × 1° SRTM tile containing them and
//! converts between tiles and their canonical names.
//!
//! # Name Format
//!
//! SRTM tiles follow the naming convention: `{N|S}{lat}{E|W}{lon}`
//!
//! - Latitude: 2 digits with N/S prefix (e.g., N35, S12)
//! - Longitude: 3 digits with E/W prefix (e.g., E138, W077)
//!
//! The name represents the **southwest corner** of the tile.

use std::fmt;
use std::str::FromStr;

use crate::error::{LookupError, Result};

/// A 1° × 1° cell identified by the integer degrees of its southwest corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    lat: i32,
    lon: i32,
}

impl Tile {
    /// Create a tile from the integer coordinates of its southwest corner.
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Tile containing the given point: `(floor(lat), floor(lon))`.
    ///
    /// # Examples
    ///
    /// ```
    /// use srtm_lookup::tile::Tile;
    ///
    /// assert_eq!(Tile::for_point(46.5, 7.9), Tile::new(46, 7));
    /// assert_eq!(Tile::for_point(-12.3, -77.1), Tile::new(-13, -78));
    /// ```
    pub fn for_point(lat: f64, lon: f64) -> Self {
        Self {
            lat: lat.floor() as i32,
            lon: lon.floor() as i32,
        }
    }

    /// Latitude of the southwest corner.
    pub fn lat(&self) -> i32 {
        self.lat
    }

    /// Longitude of the southwest corner.
    pub fn lon(&self) -> i32 {
        self.lon
    }

    /// Canonical tile name, e.g. `N46E007`.
    ///
    /// # Examples
    ///
    /// ```
    /// use srtm_lookup::tile::Tile;
    ///
    /// assert_eq!(Tile::new(35, 138).name(), "N35E138");
    /// assert_eq!(Tile::new(-13, -78).name(), "S13W078");
    /// assert_eq!(Tile::new(0, -1).name(), "N00W001");
    /// ```
    pub fn name(&self) -> String {
        let lat_prefix = if self.lat >= 0 { 'N' } else { 'S' };
        let lon_prefix = if self.lon >= 0 { 'E' } else { 'W' };

        format!(
            "{}{:02}{}{:03}",
            lat_prefix,
            self.lat.unsigned_abs(),
            lon_prefix,
            self.lon.unsigned_abs()
        )
    }

    /// Whether the point lies inside this tile.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        Self::for_point(lat, lon) == *self
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Tile {
    type Err = LookupError;

    /// Parse a tile name, ignoring any path and any extension after the
    /// seven-character name (`N35E138.hgt.zip`, `/cache/srtm/S12W077.SRTMGL1.hgt.zip`).
    fn from_str(s: &str) -> Result<Self> {
        parse_tile_name(s).ok_or_else(|| LookupError::InvalidTileName(s.to_string()))
    }
}

fn parse_tile_name(filename: &str) -> Option<Tile> {
    // Extract just the filename if a path is given
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    // Everything after the first dot is an extension
    let name = name.split('.').next().unwrap_or(name);

    if name.len() != 7 || !name.is_ascii() {
        return None;
    }

    let bytes = name.as_bytes();

    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1,
        b'S' | b's' => -1,
        _ => return None,
    };
    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1,
        b'W' | b'w' => -1,
        _ => return None,
    };

    let lat_digits = &name[1..3];
    let lon_digits = &name[4..7];
    if !lat_digits.bytes().all(|b| b.is_ascii_digit())
        || !lon_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let lat: i32 = lat_digits.parse().ok()?;
    let lon: i32 = lon_digits.parse().ok()?;

    Some(Tile::new(lat * lat_sign, lon * lon_sign))
}

/// Every tile whose southwest corner lies within the given degree range,
/// ordered south to north, then west to east.
pub fn tiles_in_range(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Vec<Tile> {
    let (lat_lo, lat_hi) = (min_lat.floor() as i32, max_lat.floor() as i32);
    let (lon_lo, lon_hi) = (min_lon.floor() as i32, max_lon.floor() as i32);

    let mut tiles = Vec::new();
    for lat in lat_lo..=lat_hi {
        for lon in lon_lo..=lon_hi {
            tiles.push(Tile::new(lat, lon));
        }
    }
    tiles
}
