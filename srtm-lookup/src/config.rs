//! Lookup configuration.
//!
//! [`LookupConfigBuilder`] collects the cache location, the Earthdata
//! credential and the source URLs, either in code or from environment
//! variables, and [`LookupConfig::orchestrator`] turns them into a ready
//! [`LookupOrchestrator`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cache::DiskCache;
use crate::continent::ContinentTable;
use crate::error::{LookupError, Result};
use crate::http::{ReqwestTransport, Transport, DEFAULT_TIMEOUT_SECS};
use crate::lookup::LookupOrchestrator;
use crate::source::{DataSource, HighResSource, LowResSource, DEFAULT_HIGH_RES_URL, DEFAULT_LOW_RES_URL};

/// Encode an Earthdata login as the stored credential string
/// (base64 of `user:password`).
///
/// # Examples
///
/// ```
/// use srtm_lookup::config::encode_credential;
///
/// assert_eq!(encode_credential("user", "pass"), "dXNlcjpwYXNz");
/// ```
pub fn encode_credential(user: &str, password: &str) -> String {
    STANDARD.encode(format!("{}:{}", user, password))
}

/// Settings for building a [`LookupOrchestrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    /// Cache root; tiles are stored in its `srtm` subdirectory.
    pub cache_dir: Option<PathBuf>,
    /// Earthdata credential, base64 of `user:password`.
    pub credential: Option<String>,
    pub low_res_url: String,
    pub high_res_url: String,
    /// Continent table file; the built-in approximation is used if unset.
    pub continent_table: Option<PathBuf>,
    pub timeout_secs: u64,
    /// Try the high-resolution source before the low-resolution one.
    pub high_res: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            credential: None,
            low_res_url: DEFAULT_LOW_RES_URL.to_string(),
            high_res_url: DEFAULT_HIGH_RES_URL.to_string(),
            continent_table: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            high_res: true,
        }
    }
}

impl LookupConfig {
    /// Build an orchestrator talking HTTP through reqwest.
    pub fn orchestrator(&self) -> Result<LookupOrchestrator> {
        let transport = Arc::new(ReqwestTransport::new(self.timeout_secs)?);
        self.orchestrator_with_transport(transport)
    }

    /// Build an orchestrator using the given transport.
    ///
    /// Sources are tried high resolution first, unless disabled.
    pub fn orchestrator_with_transport(
        &self,
        transport: Arc<dyn Transport>,
    ) -> Result<LookupOrchestrator> {
        let mut sources: Vec<Box<dyn DataSource>> = Vec::new();
        if self.high_res {
            let high_res = HighResSource::new(
                self.high_res_url.clone(),
                self.credential.clone(),
                transport.clone(),
            );
            if !high_res.has_credential() {
                tracing::info!("no Earthdata credential, using 3 arc-second tiles only");
            }
            sources.push(Box::new(high_res));
        }
        sources.push(Box::new(LowResSource::new(
            self.low_res_url.clone(),
            self.table()?,
            transport,
        )));

        Ok(LookupOrchestrator::new(self.cache(), sources))
    }

    /// The disk cache this configuration points at.
    pub fn cache(&self) -> DiskCache {
        DiskCache::from_option(self.cache_dir.clone())
    }

    fn table(&self) -> Result<ContinentTable> {
        match &self.continent_table {
            Some(path) => ContinentTable::load(path),
            None => Ok(ContinentTable::approximate()),
        }
    }
}

/// Builder for [`LookupConfig`].
///
/// # Example
///
/// ```
/// use srtm_lookup::config::LookupConfigBuilder;
///
/// let config = LookupConfigBuilder::new()
///     .cache_dir("/var/cache/srtm-lookup")
///     .earthdata_login("user", "pass")
///     .build();
/// assert_eq!(config.credential.as_deref(), Some("dXNlcjpwYXNz"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LookupConfigBuilder {
    config: LookupConfig,
}

impl LookupConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SRTM_CACHE_DIR` | Cache root directory | None (no caching) |
    /// | `SRTM_EARTHDATA_AUTH` | Credential, base64 of `user:password` | None |
    /// | `SRTM_EARTHDATA_USER` | Earthdata user, with `SRTM_EARTHDATA_PASSWORD` | None |
    /// | `SRTM_LOW_RES_URL` | Low-resolution URL prefix | `https://srtm.kurviger.de/SRTM3/` |
    /// | `SRTM_HIGH_RES_URL` | High-resolution URL prefix | Earthdata SRTMGL1 |
    /// | `SRTM_CONTINENT_TABLE` | Continent table file | Built-in |
    /// | `SRTM_TIMEOUT_SECS` | HTTP timeout | 300 |
    /// | `SRTM_HIGH_RES` | `false` or `0` disables the high-resolution source | true |
    ///
    /// # Errors
    ///
    /// Returns an error if `SRTM_EARTHDATA_USER` is set without
    /// `SRTM_EARTHDATA_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(get: F) -> Result<Self> {
        let var = |key: &str| get(key).filter(|v| !v.is_empty());
        let mut builder = Self::new();

        if let Some(dir) = var("SRTM_CACHE_DIR") {
            builder = builder.cache_dir(dir);
        }

        if let Some(auth) = var("SRTM_EARTHDATA_AUTH") {
            builder = builder.credential(auth);
        } else if let Some(user) = var("SRTM_EARTHDATA_USER") {
            let password = var("SRTM_EARTHDATA_PASSWORD").ok_or_else(|| {
                LookupError::Config(
                    "SRTM_EARTHDATA_USER is set but SRTM_EARTHDATA_PASSWORD is not".to_string(),
                )
            })?;
            builder = builder.earthdata_login(&user, &password);
        }

        if let Some(url) = var("SRTM_LOW_RES_URL") {
            builder = builder.low_res_url(url);
        }
        if let Some(url) = var("SRTM_HIGH_RES_URL") {
            builder = builder.high_res_url(url);
        }
        if let Some(path) = var("SRTM_CONTINENT_TABLE") {
            builder = builder.continent_table(path);
        }

        let timeout = var("SRTM_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        builder = builder.timeout_secs(timeout);

        if let Some(flag) = var("SRTM_HIGH_RES") {
            let disabled = flag.eq_ignore_ascii_case("false") || flag == "0";
            builder = builder.high_res(!disabled);
        }

        Ok(builder)
    }

    /// Set the cache root.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the stored Earthdata credential string.
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.config.credential = Some(credential.into());
        self
    }

    /// Set the Earthdata credential from a user name and password.
    pub fn earthdata_login(self, user: &str, password: &str) -> Self {
        self.credential(encode_credential(user, password))
    }

    pub fn low_res_url(mut self, url: impl Into<String>) -> Self {
        self.config.low_res_url = url.into();
        self
    }

    pub fn high_res_url(mut self, url: impl Into<String>) -> Self {
        self.config.high_res_url = url.into();
        self
    }

    /// Load the continent table from this file.
    pub fn continent_table<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.continent_table = Some(path.as_ref().to_path_buf());
        self
    }

    /// HTTP timeout in seconds. Default is 300.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Include the high-resolution source. Default is true.
    pub fn high_res(mut self, enabled: bool) -> Self {
        self.config.high_res = enabled;
        self
    }

    pub fn build(self) -> LookupConfig {
        self.config
    }
}
