use anyhow::{bail, Context, Result};
use srtm_lookup::geojson::GeoJsonTrack;
use srtm_lookup::{
    AltitudeSurvey, GeoPoint, LookupConfig, LookupOptions, LookupOutcome, PointProvider,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{ctrl_c_token, TileProgress};

/// CSV column names.
pub struct Columns {
    pub lat: String,
    pub lon: String,
    pub alt: String,
}

pub fn run(
    config: &LookupConfig,
    columns: Columns,
    input: PathBuf,
    output: Option<PathBuf>,
    overwrite_zeros: Option<bool>,
    terrain: bool,
) -> Result<()> {
    // Detect file format
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => process_csv(config, &input, output, &columns, overwrite_zeros, terrain),
        "geojson" | "json" => process_geojson(config, &input, output, overwrite_zeros, terrain),
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

/// Run the lookup over `points`. Returns false when nothing should be written.
fn lookup<P: PointProvider + ?Sized>(
    config: &LookupConfig,
    points: &mut P,
    overwrite_zeros: Option<bool>,
    terrain: bool,
) -> Result<bool> {
    check_coordinates(points)?;

    let survey = AltitudeSurvey::of(points);
    let overwrite_zeros = match overwrite_zeros {
        Some(choice) => choice,
        None if survey.needs_confirmation() => bail!(
            "The track has both zero and non-zero altitudes. \
             Pass --overwrite-zeros or --keep-zeros to say what the zeros mean"
        ),
        None => survey.suggested_overwrite_zeros(),
    };

    let mut orchestrator = config
        .orchestrator()
        .context("Failed to set up the altitude lookup")?;
    let cancel = ctrl_c_token()?;
    let mut progress = TileProgress::new()?;

    let outcome = orchestrator.run(
        points,
        LookupOptions {
            overwrite_zeros,
            terrain,
        },
        &mut progress,
        &cancel,
    );
    progress.finish();

    report(&outcome)
}

/// Reject the track if any point lies outside ±90° latitude or ±180° longitude.
fn check_coordinates<P: PointProvider + ?Sized>(points: &P) -> Result<()> {
    for i in 0..points.len() {
        let p = points.point(i);
        if !p.has_valid_coordinates() {
            bail!(
                "Invalid coordinate in point {}: lat {}, lon {}",
                i + 1,
                p.lat,
                p.lon
            );
        }
    }
    Ok(())
}

fn report(outcome: &LookupOutcome) -> Result<bool> {
    tracing::info!(
        found = outcome.altitudes_found(),
        failed = outcome.summary().map_or(0, |s| s.tiles_failed),
        "lookup finished"
    );

    if let Some(summary) = outcome.summary() {
        println!(
            "Tiles: {} needed, {} downloaded, {} cached, {} unavailable",
            summary.tiles_total,
            summary.tiles_downloaded + summary.tiles_uncached,
            summary.tiles_cached,
            summary.tiles_failed
        );
        if summary.auth_failed {
            println!("Earthdata login failed; used 3 arc-second data where available");
        }
    }

    match outcome {
        LookupOutcome::NothingRequired => {
            println!("Every point already has an altitude");
            Ok(false)
        }
        LookupOutcome::Completed(summary) => {
            println!("Altitudes found: {}", summary.altitudes_found);
            Ok(true)
        }
        LookupOutcome::NoneFound(_) => {
            println!("No altitudes found (no SRTM coverage for these points)");
            Ok(false)
        }
        LookupOutcome::Cancelled(summary) => {
            println!(
                "Cancelled; keeping {} altitudes found so far",
                summary.altitudes_found
            );
            Ok(summary.altitudes_found > 0)
        }
        LookupOutcome::Failed { message, .. } => bail!("Altitude lookup failed: {}", message),
    }
}

fn output_path(input: &Path, output: Option<PathBuf>, extension: &str) -> PathBuf {
    output.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "track".to_string());
        input.with_file_name(format!("{}_altitude.{}", stem, extension))
    })
}

fn process_csv(
    config: &LookupConfig,
    input: &Path,
    output: Option<PathBuf>,
    columns: &Columns,
    overwrite_zeros: Option<bool>,
    terrain: bool,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == columns.lat)
        .with_context(|| format!("Column '{}' not found in CSV", columns.lat))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == columns.lon)
        .with_context(|| format!("Column '{}' not found in CSV", columns.lon))?;
    let alt_idx = headers.iter().position(|h| h == columns.alt);

    let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let mut points = Vec::with_capacity(records.len());
    for (line, record) in records.iter().enumerate() {
        let lat: f64 = record
            .get(lat_idx)
            .context("Missing latitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude in record {}", line + 1))?;
        let lon: f64 = record
            .get(lon_idx)
            .context("Missing longitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude in record {}", line + 1))?;
        let altitude = alt_idx
            .and_then(|i| record.get(i))
            .and_then(|s| s.trim().parse::<f64>().ok());

        points.push(GeoPoint { lat, lon, altitude });
    }

    if !lookup(config, &mut points, overwrite_zeros, terrain)? {
        return Ok(());
    }

    let output_path = output_path(input, output, "csv");
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    if alt_idx.is_none() {
        new_headers.push(&columns.alt);
    }
    writer.write_record(&new_headers)?;

    for (record, point) in records.iter().zip(&points) {
        let altitude = point.altitude.map(|a| a.to_string()).unwrap_or_default();
        let mut new_record: Vec<&str> = record.iter().collect();
        match alt_idx {
            Some(i) if i < new_record.len() => new_record[i] = altitude.as_str(),
            _ => new_record.push(&altitude),
        }
        writer.write_record(&new_record)?;
    }
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn process_geojson(
    config: &LookupConfig,
    input: &Path,
    output: Option<PathBuf>,
    overwrite_zeros: Option<bool>,
    terrain: bool,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let reader = BufReader::new(file);

    let geojson: geojson::GeoJson =
        serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;
    let mut track = GeoJsonTrack::new(geojson).context("Unsupported GeoJSON coordinates")?;

    if !lookup(config, &mut track, overwrite_zeros, terrain)? {
        return Ok(());
    }

    let output_path = output_path(input, output, "geojson");
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &track.into_geojson())?;
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_coordinates() {
        let valid = vec![GeoPoint::new(46.5, 7.5), GeoPoint::new(-90.0, 180.0)];
        assert!(check_coordinates(&valid).is_ok());

        let out_of_range = vec![GeoPoint::new(46.5, 7.5), GeoPoint::new(-1e12, 7.5)];
        let err = check_coordinates(&out_of_range).unwrap_err();
        assert!(err.to_string().contains("point 2"));

        let not_finite = vec![GeoPoint::new(f64::NAN, 7.5)];
        assert!(check_coordinates(&not_finite).is_err());
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("/data/ride.csv"), None, "csv");
        assert_eq!(path, PathBuf::from("/data/ride_altitude.csv"));

        let explicit = PathBuf::from("/tmp/out.geojson");
        assert_eq!(
            output_path(Path::new("/data/ride.geojson"), Some(explicit.clone()), "geojson"),
            explicit
        );
    }
}
