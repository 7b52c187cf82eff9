use std::io::{Cursor, Write};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use srtm_lookup::interpolate::altitude_at;
use srtm_lookup::source::{DataSource, Download, SourceKind};
use srtm_lookup::{
    CancelToken, DiskCache, FetchResult, GeoPoint, Grid, LookupOptions, LookupOrchestrator,
    NoProgress, Tile, VOID_VALUE,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SRTM3_SAMPLES: usize = 1201;

/// Synthetic SRTM3 tile with a gradient and a sprinkling of voids.
fn create_archive() -> Vec<u8> {
    let mut data = Vec::with_capacity(SRTM3_SAMPLES * SRTM3_SAMPLES * 2);
    for row in 0..SRTM3_SAMPLES {
        for col in 0..SRTM3_SAMPLES {
            let elev = if (row * 7 + col) % 997 == 0 {
                VOID_VALUE
            } else {
                ((row + col) % 4000) as i16
            };
            data.extend_from_slice(&elev.to_be_bytes());
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("N35E138.hgt", options).unwrap();
    writer.write_all(&data).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Source that never has anything; every tile must come from the cache.
struct OfflineSource;

impl DataSource for OfflineSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LowRes
    }

    fn url_for(&self, _tile: Tile) -> Option<String> {
        None
    }

    fn download(&mut self, _tile: Tile) -> Download {
        Download::Skipped(FetchResult::NothingToDo)
    }
}

fn bench_parse_archive(c: &mut Criterion) {
    let archive = create_archive();

    c.bench_function("parse_srtm3_archive", |b| {
        b.iter(|| {
            black_box(Grid::from_zip_bytes(black_box(&archive), SRTM3_SAMPLES, "N35E138").unwrap());
        });
    });
}

fn bench_altitude_at(c: &mut Criterion) {
    let grid = Grid::from_zip_bytes(&create_archive(), SRTM3_SAMPLES, "N35E138").unwrap();

    c.bench_function("altitude_at_filled", |b| {
        b.iter(|| {
            black_box(altitude_at(
                &grid,
                black_box(35.3606),
                black_box(138.7274),
                false,
            ));
        });
    });
}

fn bench_track_lookup(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let cache = DiskCache::new(tmp.path());
    cache.write("N35E138.hgt.zip", &create_archive()).unwrap();
    let mut orchestrator = LookupOrchestrator::new(cache, vec![Box::new(OfflineSource)]);

    // 1000 points along a diagonal of one tile
    let track: Vec<GeoPoint> = (0..1000)
        .map(|i| {
            let frac = i as f64 / 1000.0;
            GeoPoint::new(35.0 + frac * 0.99, 138.0 + frac * 0.99)
        })
        .collect();

    c.bench_function("lookup_1000_points_cached", |b| {
        b.iter(|| {
            let mut points = track.clone();
            black_box(orchestrator.run(
                &mut points,
                LookupOptions::default(),
                &mut NoProgress,
                &CancelToken::new(),
            ));
        });
    });
}

criterion_group!(
    benches,
    bench_parse_archive,
    bench_altitude_at,
    bench_track_lookup,
);
criterion_main!(benches);
