//! Unit tests for the batch archiver
//!
//! These run the full orchestration against in-memory fetchers. HTTP-backed
//! scenarios live in the top-level tests directory.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use super::*;
use crate::app::models::Item;
use crate::errors::{AppError, ConfigError, FetchError, FetchResult};

/// Fetcher serving fixed bodies, failing for ids listed in `failing`
struct ScriptedFetcher {
    bodies: HashMap<String, Vec<u8>>,
    failing: Vec<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(items: &[Item]) -> Self {
        let bodies = items
            .iter()
            .map(|item| (item.id.clone(), format!("body of {}", item.id).into_bytes()))
            .collect();
        Self {
            bodies,
            failing: Vec::new(),
            delay: Duration::from_millis(5),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for ScriptedFetcher {
    async fn fetch(&self, item: &Item) -> FetchResult<Vec<u8>> {
        self.calls.lock().unwrap().push(item.id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&item.id) {
            return Err(FetchError::Status {
                id: item.id.clone(),
                url: item.source_url.clone(),
                status: 503,
            });
        }
        Ok(self.bodies.get(&item.id).cloned().unwrap_or_default())
    }
}

fn make_items(count: usize) -> Vec<Item> {
    (0..count)
        .map(|i| Item::new(format!("item-{}", i), format!("http://localhost/{}", i)))
        .collect()
}

fn read_archive(path: &Path) -> HashMap<String, Vec<u8>> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = HashMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        entries.insert(entry.name().to_string(), data);
    }
    entries
}

#[tokio::test]
async fn test_all_items_archived() {
    let temp_dir = TempDir::new().unwrap();
    let items = make_items(5);
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "all")
        .with_concurrency_limit(3)
        .with_output_dir(temp_dir.path());
    let summary = archiver.run(request).await.unwrap();

    assert_eq!(summary.entries, 5);
    assert_eq!(summary.archive_path, temp_dir.path().join("all.zip"));

    let entries = read_archive(&summary.archive_path);
    assert_eq!(entries.len(), 5);
    for i in 0..5 {
        let name = format!("item-{}.mp4", i);
        assert_eq!(entries[&name], format!("body of item-{}", i).into_bytes());
    }
    let expected_bytes: u64 = entries.values().map(|v| v.len() as u64).sum();
    assert_eq!(summary.total_bytes, expected_bytes);
}

#[tokio::test]
async fn test_in_flight_never_exceeds_limit() {
    let temp_dir = TempDir::new().unwrap();
    let items = make_items(12);
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "bounded")
        .with_concurrency_limit(3)
        .with_output_dir(temp_dir.path());
    archiver.run(request).await.unwrap();

    let max = fetcher.max_in_flight.load(Ordering::SeqCst);
    assert!(max <= 3, "saw {} fetches in flight", max);
    assert!(max >= 1);
    assert_eq!(fetcher.calls().len(), 12);
}

#[tokio::test]
async fn test_limit_one_admits_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let items = make_items(4);
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "ordered")
        .with_concurrency_limit(1)
        .with_output_dir(temp_dir.path());
    archiver.run(request).await.unwrap();

    assert_eq!(fetcher.calls(), ["item-0", "item-1", "item-2", "item-3"]);
    assert_eq!(fetcher.max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failure_stops_admission() {
    let temp_dir = TempDir::new().unwrap();
    let items = make_items(6);
    let fetcher = Arc::new(ScriptedFetcher::new(&items).failing_on("item-2"));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "stopped")
        .with_concurrency_limit(1)
        .with_output_dir(temp_dir.path());
    let error = archiver.run(request).await.unwrap_err();

    assert_eq!(error.category(), "network");
    assert!(matches!(error, AppError::Fetch(FetchError::Status { .. })));
    assert_eq!(fetcher.calls(), ["item-0", "item-1", "item-2"]);

    // Give any stray worker a chance to run before checking the output
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fetcher.calls().len(), 3);
    assert!(!temp_dir.path().join("stopped.zip").exists());
    assert!(!temp_dir.path().join("stopped.zip.part").exists());
}

#[tokio::test]
async fn test_failure_with_parallel_workers_leaves_no_archive() {
    let temp_dir = TempDir::new().unwrap();
    let items = make_items(10);
    let fetcher = Arc::new(ScriptedFetcher::new(&items).failing_on("item-4"));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "partial")
        .with_concurrency_limit(4)
        .with_output_dir(temp_dir.path());
    let result = archiver.run(request).await;

    assert!(result.is_err());
    assert!(!temp_dir.path().join("partial.zip").exists());
    assert!(!temp_dir.path().join("partial.zip.part").exists());
    // Items beyond the failure plus the workers already busy are never admitted
    assert!(fetcher.calls().len() < 10);
}

#[tokio::test]
async fn test_empty_batch_produces_empty_archive() {
    let temp_dir = TempDir::new().unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new(&[]));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(Vec::new(), "empty").with_output_dir(temp_dir.path());
    let summary = archiver.run(request).await.unwrap();

    assert_eq!(summary.entries, 0);
    assert_eq!(summary.total_bytes, 0);
    assert!(read_archive(&summary.archive_path).is_empty());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_requests_rejected_before_fetching() {
    let temp_dir = TempDir::new().unwrap();
    let items = make_items(3);
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let zero_limit = BatchRequest::new(items.clone(), "zero")
        .with_concurrency_limit(0)
        .with_output_dir(temp_dir.path());
    let error = archiver.run(zero_limit).await.unwrap_err();
    assert_eq!(error.category(), "config");

    let mut duplicated = items.clone();
    duplicated.push(items[0].clone());
    let duplicate_ids = BatchRequest::new(duplicated, "dup").with_output_dir(temp_dir.path());
    let error = archiver.run(duplicate_ids).await.unwrap_err();
    assert!(matches!(
        error,
        AppError::Config(ConfigError::DuplicateItem { .. })
    ));

    let mut traversing = items.clone();
    traversing.push(Item::new("../escape", "http://localhost/escape"));
    let traversing_ids = BatchRequest::new(traversing, "trav").with_output_dir(temp_dir.path());
    let error = archiver.run(traversing_ids).await.unwrap_err();
    assert!(matches!(
        error,
        AppError::Config(ConfigError::InvalidItemId { .. })
    ));

    let empty_name = BatchRequest::new(items, "").with_output_dir(temp_dir.path());
    assert!(archiver.run(empty_name).await.is_err());

    assert!(fetcher.calls().is_empty());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_custom_entry_extension() {
    let temp_dir = TempDir::new().unwrap();
    let items = vec![Item::new("clip", "http://localhost/clip")];
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher).with_entry_extension("webm");

    let request = BatchRequest::new(items, "ext").with_output_dir(temp_dir.path());
    let summary = archiver.run(request).await.unwrap();

    let entries = read_archive(&summary.archive_path);
    assert!(entries.contains_key("clip.webm"));
}

#[tokio::test]
async fn test_existing_partial_archive_is_not_clobbered() {
    let temp_dir = TempDir::new().unwrap();
    let partial = temp_dir.path().join("busy.zip.part");
    std::fs::write(&partial, b"another run").unwrap();

    let items = make_items(1);
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "busy").with_output_dir(temp_dir.path());
    let error = archiver.run(request).await.unwrap_err();

    assert_eq!(error.category(), "archive");
    assert!(error.is_recoverable());
    assert_eq!(std::fs::read(&partial).unwrap(), b"another run");
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_forced_run_replaces_leftover_partial() {
    let temp_dir = TempDir::new().unwrap();
    let partial = temp_dir.path().join("resumed.zip.part");
    std::fs::write(&partial, b"killed mid-write").unwrap();

    let items = make_items(2);
    let fetcher = Arc::new(ScriptedFetcher::new(&items));
    let archiver = BatchArchiver::with_fetcher(fetcher.clone());

    let request = BatchRequest::new(items, "resumed")
        .with_output_dir(temp_dir.path())
        .with_replace_partial(true);
    let summary = archiver.run(request).await.unwrap();

    assert_eq!(summary.entries, 2);
    assert_eq!(read_archive(&summary.archive_path).len(), 2);
    assert!(!partial.exists());
}

#[tokio::test]
async fn test_failed_rerun_removes_previous_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("weekly.zip");

    let items = make_items(3);
    let archiver = BatchArchiver::with_fetcher(Arc::new(ScriptedFetcher::new(&items)));
    let request = BatchRequest::new(items.clone(), "weekly").with_output_dir(temp_dir.path());
    archiver.run(request).await.unwrap();
    assert!(archive.exists());

    let failing = Arc::new(ScriptedFetcher::new(&items).failing_on("item-1"));
    let archiver = BatchArchiver::with_fetcher(failing);
    let request = BatchRequest::new(items, "weekly")
        .with_concurrency_limit(1)
        .with_output_dir(temp_dir.path());
    assert!(archiver.run(request).await.is_err());

    assert!(!archive.exists());
    assert!(!temp_dir.path().join("weekly.zip.part").exists());
}
