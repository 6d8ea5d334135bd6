//! Integration tests for the harvest pipeline.
//!
//! These tests drive `TileHarvester` against a scripted HTTP client and a
//! temporary output directory, covering:
//! - Tile URL construction for a fixed coordinate
//! - Cache idempotence and zero-request re-runs
//! - Failure isolation (HTTP errors, timeouts, undecodable bodies)
//! - Absence of partial artifacts
//! - Cancellation and persistence-failure stops
//! - Per-identifier deduplication under concurrency

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;
use tileharvest::config::HarvestConfig;
use tileharvest::coord::{to_tile_coords, Coordinate};
use tileharvest::harvest::{
    ErrorKind, HarvestRequest, Identifier, ItemOutcome, TileHarvester, TileOutcome,
};
use tileharvest::provider::{
    with_config_headers, ArcGisProvider, AsyncHttpClient, ProviderError,
};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Test Helpers
// =============================================================================

const BASE_URL: &str = "http://imagery.test/MapServer/tile";
const ZOOM: u8 = 19;

const NYC: (f64, f64) = (40.7128, -74.0060);
const LONDON: (f64, f64) = (51.5074, -0.1278);
const SYDNEY: (f64, f64) = (-33.8688, 151.2093);

/// What the scripted server does for one URL.
#[derive(Clone)]
enum Reply {
    Image,
    Status(u16),
    Body(Vec<u8>),
}

#[derive(Clone)]
struct Route {
    reply: Reply,
    delay: Duration,
}

/// HTTP client answering from a per-URL script and counting requests.
///
/// Unscripted URLs answer 200 with a small PNG.
#[derive(Clone, Default)]
struct ScriptedClient {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
    total_calls: Arc<AtomicUsize>,
    last_headers: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedClient {
    fn new() -> Self {
        Self::default()
    }

    fn route(&self, url: String, reply: Reply, delay: Duration) {
        self.routes
            .lock()
            .unwrap()
            .insert(url, Route { reply, delay });
    }

    fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn last_headers(&self) -> Vec<(String, String)> {
        self.last_headers.lock().unwrap().clone()
    }
}

impl AsyncHttpClient for ScriptedClient {
    async fn get_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, ProviderError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        *self.last_headers.lock().unwrap() = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let route = self.routes.lock().unwrap().get(url).cloned();
        let route = route.unwrap_or(Route {
            reply: Reply::Image,
            delay: Duration::ZERO,
        });

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match route.reply {
            Reply::Image => Ok(png_tile()),
            Reply::Body(body) => Ok(body),
            Reply::Status(status) => Err(ProviderError::HttpStatus {
                status,
                url: url.to_string(),
            }),
        }
    }
}

fn png_tile() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 8, Rgb([30, 120, 60]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn url_for((lat, lon): (f64, f64)) -> String {
    let tile = to_tile_coords(lat, lon, ZOOM).unwrap();
    format!("{}/{}/{}/{}", BASE_URL, ZOOM, tile.y, tile.x)
}

fn request((lat, lon): (f64, f64), id: &str) -> HarvestRequest {
    HarvestRequest::new(
        Coordinate::new(lat, lon).unwrap(),
        Identifier::new(id).unwrap(),
    )
}

fn three_items() -> Vec<HarvestRequest> {
    vec![
        request(NYC, "0"),
        request(LONDON, "1"),
        request(SYDNEY, "2"),
    ]
}

fn config(dir: &Path) -> HarvestConfig {
    HarvestConfig::new()
        .with_output_dir(dir)
        .with_zoom(ZOOM)
        .with_base_url(BASE_URL)
        .with_timeout(Duration::from_millis(300))
}

fn harvester(
    config: HarvestConfig,
    client: &ScriptedClient,
) -> TileHarvester<ArcGisProvider<ScriptedClient>> {
    let provider = with_config_headers(
        ArcGisProvider::with_base_url(client.clone(), config.base_url()),
        &config,
    );
    TileHarvester::new(config, provider).unwrap()
}

/// Sorted names of everything in `dir`, hidden files included.
fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Addressing and protocol
// =============================================================================

#[tokio::test]
async fn test_nyc_fixture_url_and_headers() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);

    let outcome = harvester.harvest_one(&request(NYC, "nyc")).await.unwrap();

    assert!(matches!(outcome, TileOutcome::Fetched { .. }));
    let expected = format!("{}/19/197122/154364", BASE_URL);
    assert_eq!(client.calls_to(&expected), 1);
    assert_eq!(
        client.last_headers(),
        vec![(
            "User-Agent".to_string(),
            "GeospatialResearchBot/1.1".to_string()
        )]
    );
}

#[tokio::test]
async fn test_artifact_is_rgb_jpeg_at_deterministic_path() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);

    harvester.harvest_one(&request(LONDON, "42")).await.unwrap();

    let path = temp.path().join("tile_id_42.jpg");
    let decoded = image::open(&path).unwrap();
    assert_eq!(decoded.color(), image::ColorType::Rgb8);
    assert_eq!(dir_entries(temp.path()), vec!["tile_id_42.jpg"]);
}

// =============================================================================
// Cache idempotence
// =============================================================================

#[tokio::test]
async fn test_second_call_is_cached_without_request() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);
    let item = request(NYC, "7");

    let first = harvester.harvest_one(&item).await.unwrap();
    let second = harvester.harvest_one(&item).await.unwrap();

    assert!(matches!(first, TileOutcome::Fetched { .. }));
    assert_eq!(second, TileOutcome::Cached);
    assert_eq!(client.total_calls(), 1);
}

#[tokio::test]
async fn test_existing_file_is_trusted_without_validation() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("tile_id_0.jpg"), b"not even a jpeg").unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);

    let outcome = harvester.harvest_one(&request(NYC, "0")).await.unwrap();

    assert_eq!(outcome, TileOutcome::Cached);
    assert_eq!(client.total_calls(), 0);
}

#[tokio::test]
async fn test_rerun_makes_no_requests() {
    let temp = TempDir::new().unwrap();

    let first_client = ScriptedClient::new();
    let first = harvester(config(temp.path()), &first_client)
        .harvest_batch(three_items(), &CancellationToken::new())
        .await;
    assert_eq!((first.total, first.succeeded), (3, 3));
    assert_eq!(first.fetched, 3);
    assert_eq!(first_client.total_calls(), 3);

    let second_client = ScriptedClient::new();
    let second = harvester(config(temp.path()), &second_client)
        .harvest_batch(three_items(), &CancellationToken::new())
        .await;

    assert_eq!((second.total, second.succeeded), (3, 3));
    assert_eq!(second.cached, 3);
    assert_eq!(second_client.total_calls(), 0);
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn test_server_error_fails_only_that_item() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    client.route(url_for(LONDON), Reply::Status(500), Duration::ZERO);
    let harvester = harvester(config(temp.path()), &client);

    let report = harvester
        .harvest_batch(three_items(), &CancellationToken::new())
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert!(report.succeeded < report.total);
    assert_eq!(report.failures_of(ErrorKind::RemoteStatus), 1);

    let failed = &report.items[1];
    assert_eq!(failed.identifier.as_str(), "1");
    assert!(failed.tile.is_some());
    assert!(matches!(
        failed.outcome.error().map(|e| e.kind()),
        Some(ErrorKind::RemoteStatus)
    ));
    assert_eq!(
        dir_entries(temp.path()),
        vec!["tile_id_0.jpg", "tile_id_2.jpg"]
    );
}

#[tokio::test]
async fn test_timeout_scenario_three_items_two_succeed() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    client.route(url_for(LONDON), Reply::Image, Duration::from_secs(30));
    let harvester = harvester(config(temp.path()), &client);

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        harvester.harvest_batch(three_items(), &CancellationToken::new()),
    )
    .await
    .expect("a hung fetch must not stall the batch");

    assert_eq!((report.total, report.succeeded), (3, 2));
    assert_eq!(report.failures_of(ErrorKind::Transport), 1);
    assert_eq!(
        dir_entries(temp.path()),
        vec!["tile_id_0.jpg", "tile_id_2.jpg"]
    );
}

#[tokio::test]
async fn test_undecodable_body_leaves_no_file() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    client.route(
        url_for(NYC),
        Reply::Body(b"<html>rate limited</html>".to_vec()),
        Duration::ZERO,
    );
    let harvester = harvester(config(temp.path()), &client);

    let error = harvester
        .harvest_one(&request(NYC, "0"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Decode);
    assert!(dir_entries(temp.path()).is_empty());
}

#[tokio::test]
async fn test_pole_fails_addressing_and_batch_continues() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);

    let items = vec![
        request(NYC, "0"),
        request((90.0, 0.0), "1"),
        request(SYDNEY, "2"),
    ];
    let report = harvester
        .harvest_batch(items, &CancellationToken::new())
        .await;

    assert_eq!((report.total, report.succeeded), (3, 2));
    assert_eq!(report.failures_of(ErrorKind::Addressing), 1);
    assert!(report.items[1].tile.is_none());
    assert_eq!(client.total_calls(), 2);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_duplicate_identifiers_fetch_once() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    client.route(url_for(NYC), Reply::Image, Duration::from_millis(100));
    let harvester = harvester(config(temp.path()).with_workers(4), &client);

    let items: Vec<_> = (0..4).map(|_| request(NYC, "dup")).collect();
    let report = harvester
        .harvest_batch(items, &CancellationToken::new())
        .await;

    assert_eq!(client.total_calls(), 1);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.cached, 3);
    assert_eq!(dir_entries(temp.path()), vec!["tile_id_dup.jpg"]);
}

#[tokio::test]
async fn test_parallel_batch_counts_every_item() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()).with_workers(8), &client);

    let items: Vec<_> = (0..40)
        .map(|i| {
            let lat = -60.0 + i as f64 * 3.0;
            let lon = -170.0 + i as f64 * 8.0;
            request((lat, lon), &i.to_string())
        })
        .collect();
    let report = harvester
        .harvest_batch(items, &CancellationToken::new())
        .await;

    assert_eq!(report.total, 40);
    assert_eq!(report.succeeded, 40);
    assert_eq!(report.processed, 40);
    assert_eq!(dir_entries(temp.path()).len(), 40);
    let ids: Vec<_> = report
        .items
        .iter()
        .map(|item| item.identifier.to_string())
        .collect();
    let expected: Vec<_> = (0..40).map(|i: usize| i.to_string()).collect();
    assert_eq!(ids, expected);
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancelled_before_start_skips_everything() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = harvester.harvest_batch(three_items(), &cancel).await;

    assert_eq!(report.total, 3);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.processed, 0);
    assert!(report.cancelled);
    assert!(report
        .items
        .iter()
        .all(|item| matches!(item.outcome, ItemOutcome::Skipped)));
    assert_eq!(client.total_calls(), 0);
}

#[tokio::test]
async fn test_cancel_mid_batch_lets_in_flight_item_finish() {
    let temp = TempDir::new().unwrap();
    let client = ScriptedClient::new();
    client.route(url_for(NYC), Reply::Image, Duration::from_millis(150));
    let harvester = harvester(
        config(temp.path()).with_timeout(Duration::from_secs(5)),
        &client,
    );
    let cancel = CancellationToken::new();

    let (report, _) = tokio::join!(harvester.harvest_batch(three_items(), &cancel), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    assert!(report.cancelled);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.processed + report.skipped, report.total);
    assert!(matches!(report.items[0].outcome, ItemOutcome::Fetched { .. }));
    assert_eq!(client.total_calls(), 1);
    assert_eq!(dir_entries(temp.path()), vec!["tile_id_0.jpg"]);
}

// =============================================================================
// Persistence failures
// =============================================================================

/// Puts a non-empty directory where item `id`'s artifact would go, so the
/// final rename fails.
fn block_artifact(dir: &Path, id: &str) {
    let blocker = dir.join(format!("tile_id_{}.jpg", id));
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("inner"), b"x").unwrap();
}

fn four_items() -> Vec<HarvestRequest> {
    vec![
        request(NYC, "0"),
        request(LONDON, "1"),
        request(SYDNEY, "2"),
        request((48.8566, 2.3522), "3"),
    ]
}

#[tokio::test]
async fn test_persistence_failure_stops_batch() {
    let temp = TempDir::new().unwrap();
    block_artifact(temp.path(), "1");
    let client = ScriptedClient::new();
    let harvester = harvester(config(temp.path()), &client);
    let cancel = CancellationToken::new();

    let report = harvester.harvest_batch(four_items(), &cancel).await;

    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.persistence_failures, 1);
    assert_eq!(report.failures_of(ErrorKind::Persistence), 1);
    assert_eq!(report.skipped, 2);
    assert!(report.cancelled);
    assert!(!cancel.is_cancelled(), "caller's token is left alone");
    assert_eq!(client.total_calls(), 2);
    assert_eq!(
        dir_entries(temp.path()),
        vec!["tile_id_0.jpg", "tile_id_1.jpg"]
    );
}

#[tokio::test]
async fn test_persistence_failure_can_be_tolerated() {
    let temp = TempDir::new().unwrap();
    block_artifact(temp.path(), "1");
    let client = ScriptedClient::new();
    let harvester = harvester(
        config(temp.path()).with_stop_on_persistence_error(false),
        &client,
    );

    let report = harvester
        .harvest_batch(four_items(), &CancellationToken::new())
        .await;

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.persistence_failures, 1);
    assert_eq!(report.skipped, 0);
    assert!(!report.cancelled);
}
