//! SnapshotStore lifecycle tests: acquire (fake + HTTP sources), restore.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use flybot_core::config::SnapshotConfig;
use flybot_core::{ErrorKind, FlybotError, FlybotResult};
use flybot_snapshot::{AcquireOutcome, ISnapshotSource, SnapshotStore};
use tempfile::TempDir;

// ---- Fixtures ----

/// Build a tiny SQLite snapshot and return its bytes.
fn snapshot_bytes(dir: &TempDir, name: &str) -> Vec<u8> {
    let path = dir.path().join(name);
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE flights (flight_id INTEGER PRIMARY KEY, actual_departure TEXT);
         INSERT INTO flights VALUES (1, '2023-01-05 00:00:00+00:00');",
    )
    .unwrap();
    drop(conn);
    std::fs::read(&path).unwrap()
}

struct FakeSource {
    payload: Option<Vec<u8>>,
    calls: Arc<AtomicUsize>,
}

impl FakeSource {
    fn serving(payload: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Self {
            payload: Some(payload),
            calls: calls.clone(),
        };
        (source, calls)
    }

    fn failing() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Self {
            payload: None,
            calls: calls.clone(),
        };
        (source, calls)
    }
}

impl ISnapshotSource for FakeSource {
    fn location(&self) -> &str {
        "fake://snapshot"
    }

    fn fetch_into(&self, sink: &mut dyn Write) -> FlybotResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.payload {
            Some(bytes) => {
                sink.write_all(bytes).unwrap();
                Ok(bytes.len() as u64)
            }
            None => {
                // Body cut off mid-stream.
                sink.write_all(b"partial").unwrap();
                Err(FlybotError::Fetch {
                    url: "fake://snapshot".into(),
                    message: "connection reset".into(),
                })
            }
        }
    }
}

fn http_config(url: String, timeout_secs: u64) -> SnapshotConfig {
    SnapshotConfig {
        source_url: url,
        fetch_timeout_secs: timeout_secs,
        ..SnapshotConfig::default()
    }
}

/// Serve exactly one request with the given status and body.
fn serve_once(status: u16, body: Vec<u8>) -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = tiny_http::Response::from_data(body).with_status_code(status);
            let _ = request.respond(response);
        }
    });
    format!("http://127.0.0.1:{port}/travel2.sqlite")
}

fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap()
}

// ---- Acquire ----

#[test]
fn acquire_skips_existing_target_without_fetch() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    std::fs::write(&target, b"existing contents").unwrap();

    let (source, calls) = FakeSource::serving(snapshot_bytes(&dir, "src.sqlite"));
    let store = SnapshotStore::with_source(Box::new(source), true);

    let outcome = store.acquire(&target, &backup, false).unwrap();
    assert_eq!(outcome, AcquireOutcome::Skipped);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no network access expected");
    assert_eq!(read(&target), b"existing contents");
    assert!(!backup.exists());
}

#[test]
fn acquire_downloads_and_writes_backup() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    let payload = snapshot_bytes(&dir, "src.sqlite");

    let (source, calls) = FakeSource::serving(payload.clone());
    let store = SnapshotStore::with_source(Box::new(source), true);

    let outcome = store.acquire(&target, &backup, false).unwrap();
    assert_eq!(
        outcome,
        AcquireOutcome::Downloaded {
            bytes: payload.len() as u64
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(read(&target), payload);
    assert_eq!(read(&backup), payload);
}

#[test]
fn acquire_overwrite_replaces_existing_target() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    std::fs::write(&target, b"stale").unwrap();
    let payload = snapshot_bytes(&dir, "src.sqlite");

    let (source, _) = FakeSource::serving(payload.clone());
    let store = SnapshotStore::with_source(Box::new(source), true);
    store.acquire(&target, &backup, true).unwrap();
    assert_eq!(read(&target), payload);
    assert_eq!(read(&backup), payload);
}

#[test]
fn failed_fetch_leaves_previous_target_and_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    std::fs::write(&target, b"previous").unwrap();

    let (source, calls) = FakeSource::failing();
    let store = SnapshotStore::with_source(Box::new(source), true);
    let err = store.acquire(&target, &backup, true).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(read(&target), b"previous");
    assert!(!backup.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn non_sqlite_payload_rejected_when_verifying() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");

    let (source, _) = FakeSource::serving(b"<html>quota exceeded</html>".repeat(10));
    let store = SnapshotStore::with_source(Box::new(source), true);
    let err = store.acquire(&target, &backup, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(err.to_string().contains("SQLite"), "{err}");
    assert!(!target.exists());
}

#[test]
fn verification_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");

    let (source, _) = FakeSource::serving(b"opaque".to_vec());
    let store = SnapshotStore::with_source(Box::new(source), false);
    store.acquire(&target, &backup, false).unwrap();
    assert_eq!(read(&backup), b"opaque");
}

#[test]
fn http_acquire_downloads_body() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    let payload = snapshot_bytes(&dir, "src.sqlite");

    let url = serve_once(200, payload.clone());
    let store = SnapshotStore::new(&http_config(url, 10)).unwrap();
    store.acquire(&target, &backup, false).unwrap();
    assert_eq!(read(&target), payload);
    assert_eq!(read(&backup), payload);
}

#[test]
fn http_non_success_status_is_fetch_error() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");

    let url = serve_once(404, b"missing".to_vec());
    let store = SnapshotStore::new(&http_config(url, 10)).unwrap();
    let err = store.acquire(&target, &backup, false).unwrap_err();

    match err {
        FlybotError::FetchStatus { status, .. } => assert_eq!(status, 404),
        other => panic!("expected FetchStatus, got {other:?}"),
    }
    assert!(!target.exists());
}

#[test]
fn http_timeout_is_fetch_error_without_partial_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");

    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            thread::sleep(Duration::from_secs(3));
            drop(request);
        }
    });

    let url = format!("http://127.0.0.1:{port}/travel2.sqlite");
    let store = SnapshotStore::new(&http_config(url, 1)).unwrap();
    let err = store.acquire(&target, &backup, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fetch);
    assert!(!target.exists());
    assert!(!backup.exists());
}

// ---- Restore ----

#[test]
fn restore_missing_backup_is_io_error() {
    let dir = TempDir::new().unwrap();
    let working = dir.path().join("travel2.sqlite");
    let err = SnapshotStore::restore(&working, &dir.path().join("nope.sqlite")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("nope.sqlite"));
    assert!(!working.exists());
}

#[test]
fn restore_overwrites_working_and_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let working = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    let payload = snapshot_bytes(&dir, "src.sqlite");
    std::fs::write(&backup, &payload).unwrap();
    std::fs::write(&working, b"rebased garbage").unwrap();

    SnapshotStore::restore(&working, &backup).unwrap();
    let first = read(&working);
    SnapshotStore::restore(&working, &backup).unwrap();
    let second = read(&working);

    assert_eq!(first, payload);
    assert_eq!(first, second);
    assert_eq!(read(&backup), payload, "backup must not change");
}

#[test]
fn restore_discards_stale_journal() {
    let dir = TempDir::new().unwrap();
    let working = dir.path().join("travel2.sqlite");
    let backup = dir.path().join("travel2.backup.sqlite");
    std::fs::write(&backup, snapshot_bytes(&dir, "src.sqlite")).unwrap();
    let journal = dir.path().join("travel2.sqlite-journal");
    std::fs::write(&journal, b"hot journal").unwrap();

    SnapshotStore::restore(&working, &backup).unwrap();
    assert!(!journal.exists());

    let conn = rusqlite::Connection::open(&working).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM flights", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}
