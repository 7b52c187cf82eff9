//! Error types for the srtm-lookup library.

use thiserror::Error;

/// Errors that can occur while fetching, caching or decoding SRTM tiles.
///
/// Expected per-tile failures during a batch run (missing tile, refused
/// credentials, unreachable server) are reported through
/// [`FetchResult`](crate::fetch::FetchResult) rather than as errors; this type
/// covers the underlying causes and the operations that can genuinely fail.
#[derive(Error, Debug)]
pub enum LookupError {
    /// IO error when reading or writing cache files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level HTTP failure (connection refused, TLS, timeout...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The downloaded or cached archive could not be read as a zip file.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Archive entry missing or of the wrong size for the source's grid.
    #[error("Corrupt tile {name}: {reason}")]
    CorruptTile { name: String, reason: String },

    /// A string that does not follow the `N35E138` naming convention.
    #[error("Invalid tile name: {0}")]
    InvalidTileName(String),

    /// The server kept redirecting past the hop limit.
    #[error("Redirection limit exceeded while fetching {url}")]
    RedirectLimit { url: String },

    /// A redirect response without a usable `Location` header.
    #[error("Redirect from {url} has no valid Location header")]
    MissingRedirectLocation { url: String },

    /// The authenticated source answered with something other than 200 or 302.
    #[error("Authentication failed (HTTP {status})")]
    AuthFailed { status: u16 },

    /// An unauthenticated request answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// No usable cache directory.
    #[error("Disk cache unavailable: {reason}")]
    CacheUnavailable { reason: String },

    /// Continent lookup table of the wrong length.
    #[error("Invalid continent table: {size} bytes (expected {expected})", expected = crate::continent::TABLE_SIZE)]
    InvalidContinentTable { size: usize },

    /// A coordinate that cannot be read as longitude and latitude.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using [`LookupError`].
pub type Result<T> = std::result::Result<T, LookupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LookupError::CorruptTile {
            name: "N46E007".to_string(),
            reason: "entry has 1000 bytes".to_string(),
        };
        assert!(err.to_string().contains("N46E007"));
        assert!(err.to_string().contains("1000"));

        let err = LookupError::AuthFailed { status: 401 };
        assert!(err.to_string().contains("401"));

        let err = LookupError::InvalidContinentTable { size: 12 };
        assert!(err.to_string().contains("12 bytes"));
        assert!(err.to_string().contains("42840"));
    }
}
