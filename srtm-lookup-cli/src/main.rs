use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use srtm_lookup::{LookupConfig, LookupConfigBuilder};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Add SRTM altitudes to tracks
#[derive(Parser)]
#[command(name = "srtm-lookup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Cache root; tiles are kept in its srtm/ subdirectory
    #[arg(short, long, env = "SRTM_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Earthdata credential, base64 of user:password (see encode-auth)
    #[arg(long, env = "SRTM_EARTHDATA_AUTH", global = true, hide_env_values = true)]
    auth: Option<String>,

    /// Only use the 3 arc-second dataset
    #[arg(long, global = true)]
    low_res_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill in missing altitudes of a CSV or GeoJSON track
    Lookup {
        /// Input file (CSV or GeoJSON)
        input: PathBuf,

        /// Output file (input name with an _altitude suffix if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,

        /// Column name for altitude, added if missing (CSV only)
        #[arg(long, default_value = "altitude")]
        alt_col: String,

        /// Replace altitudes of exactly zero
        #[arg(long, conflicts_with = "keep_zeros")]
        overwrite_zeros: bool,

        /// Keep altitudes of exactly zero
        #[arg(long)]
        keep_zeros: bool,

        /// Leave points next to void samples without altitude
        #[arg(short, long)]
        terrain: bool,
    },

    /// Show where a tile comes from and what the cached copy holds
    Tile {
        /// Tile name (e.g., N46E007)
        #[arg(required_unless_present_all = ["lat", "lon"])]
        name: Option<String>,

        /// Specify tile by latitude instead of name
        #[arg(long, conflicts_with = "name", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Specify tile by longitude instead of name
        #[arg(long, conflicts_with = "name", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List cached tiles
    List,

    /// Download every tile of a bounding box into the cache
    Prefetch {
        #[arg(long, allow_hyphen_values = true)]
        min_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        min_lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        max_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        max_lon: f64,
    },

    /// Print the credential string for an Earthdata login
    EncodeAuth {
        #[arg(long)]
        user: String,

        #[arg(long, env = "SRTM_EARTHDATA_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "srtm_lookup=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lookup {
            input,
            output,
            lat_col,
            lon_col,
            alt_col,
            overwrite_zeros,
            keep_zeros,
            terrain,
        } => {
            let config = config(cli.cache_dir, cli.auth, cli.low_res_only)?;
            let zeros = match (overwrite_zeros, keep_zeros) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::lookup::run(
                &config,
                commands::lookup::Columns {
                    lat: lat_col,
                    lon: lon_col,
                    alt: alt_col,
                },
                input,
                output,
                zeros,
                terrain,
            )
        }
        Commands::Tile {
            name,
            lat,
            lon,
            json,
        } => {
            let config = config(cli.cache_dir, cli.auth, cli.low_res_only)?;
            commands::tile::run(&config, name, lat, lon, json)
        }
        Commands::List => {
            let config = config(cli.cache_dir, cli.auth, cli.low_res_only)?;
            commands::list::run(&config)
        }
        Commands::Prefetch {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        } => {
            let config = config(cli.cache_dir, cli.auth, cli.low_res_only)?;
            commands::prefetch::run(&config, min_lat, min_lon, max_lat, max_lon)
        }
        Commands::EncodeAuth { user, password } => commands::auth::run(&user, &password),
    }
}

/// Environment settings overridden by the global flags.
fn config(cache_dir: Option<PathBuf>, auth: Option<String>, low_res_only: bool) -> Result<LookupConfig> {
    let mut builder =
        LookupConfigBuilder::from_env().context("Invalid SRTM_* environment variables")?;

    if let Some(dir) = cache_dir {
        builder = builder.cache_dir(dir);
    }
    if let Some(auth) = auth.filter(|a| !a.is_empty()) {
        builder = builder.credential(auth);
    }
    if low_res_only {
        builder = builder.high_res(false);
    }

    Ok(builder.build())
}
