//! End-to-end lookups through the real sources with a recorded transport.

use std::collections::VecDeque;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use srtm_lookup::http::HttpResponse;
use srtm_lookup::{
    CancelToken, ContinentTable, DiskCache, GeoPoint, HighResSource, LookupOptions,
    LookupOrchestrator, LookupOutcome, LowResSource, NoProgress, Result, Transport,
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SRTM3_SAMPLES: usize = 1201;

/// Serves scripted responses in order and records every request.
#[derive(Default)]
struct RecordedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    repeat: Option<HttpResponse>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordedTransport {
    fn scripted(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        })
    }

    fn repeating(response: HttpResponse) -> Arc<Self> {
        Arc::new(Self {
            repeat: Some(response),
            ..Default::default()
        })
    }

    fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for RecordedTransport {
    fn get(&self, url: &str, credential: Option<&str>) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), credential.map(str::to_string)));

        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.or_else(|| self.repeat.clone()).unwrap_or(HttpResponse {
            status: 404,
            ..Default::default()
        }))
    }
}

fn flat_srtm3_archive(value: i16) -> Vec<u8> {
    let data: Vec<u8> = std::iter::repeat(value.to_be_bytes())
        .take(SRTM3_SAMPLES * SRTM3_SAMPLES)
        .flatten()
        .collect();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("N46E007.hgt", options).unwrap();
    writer.write_all(&data).unwrap();
    writer.finish().unwrap().into_inner()
}

fn ok(body: Vec<u8>) -> HttpResponse {
    HttpResponse {
        status: 200,
        location: None,
        body,
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse {
        status: 302,
        location: Some(location.to_string()),
        body: Vec::new(),
    }
}

fn low_res_only(cache: DiskCache, transport: Arc<RecordedTransport>) -> LookupOrchestrator {
    let source = LowResSource::new(
        "https://srtm.test/SRTM3/",
        ContinentTable::approximate(),
        transport,
    );
    LookupOrchestrator::new(cache, vec![Box::new(source)])
}

fn track() -> Vec<GeoPoint> {
    vec![
        GeoPoint::new(46.5, 7.5),
        GeoPoint::new(46.6, 7.6),
        GeoPoint::new(46.7, 7.7),
    ]
}

#[test]
fn test_track_on_flat_tile() {
    let temp_dir = TempDir::new().unwrap();
    let transport = RecordedTransport::scripted(vec![ok(flat_srtm3_archive(50))]);
    let mut orchestrator = low_res_only(DiskCache::new(temp_dir.path()), transport.clone());

    let mut points = track();
    let outcome = orchestrator.run(
        &mut points,
        LookupOptions::default(),
        &mut NoProgress,
        &CancelToken::new(),
    );

    match outcome {
        LookupOutcome::Completed(summary) => {
            assert_eq!(summary.tiles_total, 1);
            assert_eq!(summary.tiles_downloaded, 1);
            assert_eq!(summary.altitudes_found, 3);
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
    for p in &points {
        assert_eq!(p.altitude, Some(50.0));
    }

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].0,
        "https://srtm.test/SRTM3/Eurasia/N46E007.hgt.zip"
    );
    assert_eq!(requests[0].1, None);
    assert!(temp_dir.path().join("srtm/N46E007.hgt.zip").exists());
}

#[test]
fn test_cached_tile_needs_no_network() {
    let temp_dir = TempDir::new().unwrap();
    let cache = DiskCache::new(temp_dir.path());
    cache
        .write("N46E007.hgt.zip", &flat_srtm3_archive(812))
        .unwrap();

    let transport = RecordedTransport::scripted(Vec::new());
    let mut orchestrator = low_res_only(cache, transport.clone());

    let mut points = track();
    let outcome = orchestrator.run(
        &mut points,
        LookupOptions::default(),
        &mut NoProgress,
        &CancelToken::new(),
    );

    assert_eq!(outcome.summary().unwrap().tiles_cached, 1);
    assert_eq!(points[1].altitude, Some(812.0));
    assert!(transport.requests().is_empty());
}

#[test]
fn test_truncated_cache_file_is_fetched_again() {
    let temp_dir = TempDir::new().unwrap();
    let cache = DiskCache::new(temp_dir.path());
    cache.write("N46E007.hgt.zip", &[0u8; 120]).unwrap();

    let transport = RecordedTransport::scripted(vec![ok(flat_srtm3_archive(5))]);
    let mut orchestrator = low_res_only(cache, transport.clone());

    let mut points = track();
    let outcome = orchestrator.run(
        &mut points,
        LookupOptions::default(),
        &mut NoProgress,
        &CancelToken::new(),
    );

    assert_eq!(outcome.altitudes_found(), 3);
    assert_eq!(transport.requests().len(), 1);
    let size = std::fs::metadata(temp_dir.path().join("srtm/N46E007.hgt.zip"))
        .unwrap()
        .len();
    assert!(size > 400);
}

#[test]
fn test_high_res_without_credential_makes_no_request() {
    let temp_dir = TempDir::new().unwrap();
    let transport = RecordedTransport::scripted(Vec::new());
    let source = HighResSource::new("https://e4ftl01.test/SRTMGL1/", None, transport.clone());
    let mut orchestrator =
        LookupOrchestrator::new(DiskCache::new(temp_dir.path()), vec![Box::new(source)]);

    let mut points = track();
    let outcome = orchestrator.run(
        &mut points,
        LookupOptions::default(),
        &mut NoProgress,
        &CancelToken::new(),
    );

    match outcome {
        LookupOutcome::NoneFound(summary) => assert_eq!(summary.tiles_failed, 1),
        other => panic!("Expected NoneFound, got {:?}", other),
    }
    assert!(transport.requests().is_empty());
    assert!(points.iter().all(|p| p.altitude.is_none()));
}

#[test]
fn test_endless_redirects_fail_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let transport = RecordedTransport::repeating(redirect("https://e4ftl01.test/loop"));
    let source = HighResSource::new(
        "https://e4ftl01.test/SRTMGL1/",
        Some("dXNlcjpwYXNz".to_string()),
        transport.clone(),
    );
    let mut orchestrator =
        LookupOrchestrator::new(DiskCache::new(temp_dir.path()), vec![Box::new(source)]);

    let mut points = track();
    let outcome = orchestrator.run(
        &mut points,
        LookupOptions::default(),
        &mut NoProgress,
        &CancelToken::new(),
    );

    match outcome {
        LookupOutcome::Failed { message, .. } => {
            assert!(message.contains("Redirection limit"), "{}", message)
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(transport.requests().len(), 10);
}

#[test]
fn test_earthdata_login_then_fallback_to_low_res() {
    let temp_dir = TempDir::new().unwrap();
    let high_res = RecordedTransport::scripted(vec![
        redirect("https://urs.earthdata.nasa.gov/oauth/authorize?client_id=x"),
        HttpResponse {
            status: 401,
            ..Default::default()
        },
    ]);
    let low_res = RecordedTransport::scripted(vec![ok(flat_srtm3_archive(77))]);

    let sources: Vec<Box<dyn srtm_lookup::DataSource>> = vec![
        Box::new(HighResSource::new(
            "https://e4ftl01.test/SRTMGL1/",
            Some("dXNlcjpwYXNz".to_string()),
            high_res.clone(),
        )),
        Box::new(LowResSource::new(
            "https://srtm.test/SRTM3/",
            ContinentTable::approximate(),
            low_res.clone(),
        )),
    ];
    let mut orchestrator = LookupOrchestrator::new(DiskCache::new(temp_dir.path()), sources);

    let mut points = track();
    let outcome = orchestrator.run(
        &mut points,
        LookupOptions::default(),
        &mut NoProgress,
        &CancelToken::new(),
    );

    match outcome {
        LookupOutcome::Completed(summary) => {
            assert!(summary.auth_failed);
            assert_eq!(summary.altitudes_found, 3);
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
    assert_eq!(points[0].altitude, Some(77.0));

    // Credential goes to the login host only
    let requests = high_res.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].1, None);
    assert_eq!(requests[1].1.as_deref(), Some("dXNlcjpwYXNz"));
}
