//! # SRTM Lookup - Altitudes for GPS tracks
//!
//! Assigns altitudes to geographic points from SRTM (Shuttle Radar Topography
//! Mission) elevation tiles, downloading and caching the tiles it needs.
//!
//! ## Features
//!
//! - **Two resolutions**: 1 arc-second tiles from NASA Earthdata (login
//!   required) with 3 arc-second tiles as a fallback
//! - **Disk cache**: Tiles are downloaded once and memory-mapped afterwards
//! - **Void handling**: Missing samples are filled from their neighbours, or
//!   reported as unknown in terrain mode
//! - **Cancellable**: Long lookups report progress and stop between tiles
//!
//! ## Quick Start
//!
//! ```ignore
//! use srtm_lookup::{CancelToken, GeoPoint, LookupConfigBuilder, LookupOptions, NoProgress};
//!
//! let config = LookupConfigBuilder::from_env()?
//!     .cache_dir("/var/cache/tracks")
//!     .build();
//! let mut orchestrator = config.orchestrator()?;
//!
//! let mut points = vec![GeoPoint::new(46.55, 7.98), GeoPoint::new(46.56, 7.99)];
//! let outcome = orchestrator.run(
//!     &mut points,
//!     LookupOptions::default(),
//!     &mut NoProgress,
//!     &CancelToken::new(),
//! );
//! println!("{} altitudes found", outcome.altitudes_found());
//! ```
//!
//! ## SRTM Data Format
//!
//! Tiles cover one degree of latitude and longitude and are named after their
//! south-west corner (`N46E007`). Each tile is a zip archive holding one
//! `.hgt` file:
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Each sample is a 16-bit big-endian signed integer representing elevation in
//! meters, rows running north to south. The value -32768 marks a void.
//!
//! ## Data Sources
//!
//! - SRTM3: <https://srtm.kurviger.de/SRTM3/>, grouped by continent
//! - SRTM1: <https://e4ftl01.cr.usgs.gov/MEASURES/SRTMGL1.003/>, needs an
//!   account at <https://urs.earthdata.nasa.gov/>

pub mod cache;
pub mod config;
pub mod continent;
pub mod error;
pub mod fetch;
#[cfg(feature = "geojson")]
pub mod geojson;
pub mod grid;
pub mod http;
pub mod interpolate;
pub mod lookup;
pub mod point;
pub mod source;
pub mod tile;

// Re-export main types at crate root for convenience
pub use cache::{CachedTile, DiskCache};
pub use config::{encode_credential, LookupConfig, LookupConfigBuilder};
pub use continent::ContinentTable;
pub use error::{LookupError, Result};
pub use fetch::{FetchResult, TileFetcher};
pub use grid::{Grid, VOID_VALUE};
pub use http::{ReqwestTransport, Transport};
pub use lookup::{
    BoundingBox, CancelToken, LookupOptions, LookupOrchestrator, LookupOutcome, LookupState,
    LookupSummary, NoProgress, PrefetchStats, ProgressSink, TileLocation,
};
pub use point::{AltitudeSurvey, GeoPoint, PointProvider};
pub use source::{DataSource, HighResSource, LowResSource, SourceKind};
pub use tile::Tile;
