#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use media_ingest::config::IngestConfigBuilder;
use media_ingest::repository::models::DBLogEntry;
use media_ingest::repository::{FileRepository, MemoryRepository};
use media_ingest::{
    InFlightCache, IngestConfig, IngestError, IngestManager, IngestPersistence, LogStatus,
    MediaInfo, MediaProber,
};
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

pub fn media_bytes() -> Vec<u8> {
    (0..100u8).collect()
}

// ---------------- File server ----------------

#[derive(Clone, Default)]
struct Served {
    bodies: Arc<Mutex<HashMap<String, Vec<Vec<u8>>>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    delay: Arc<Mutex<Duration>>,
}

/// Local HTTP server. Each path answers with its configured bodies in
/// order, repeating the last one; unknown paths answer 404.
pub struct FileServer {
    base: String,
    served: Served,
}

impl FileServer {
    pub async fn start() -> Self {
        let served = Served::default();
        let app = Router::new()
            .route("/{*path}", get(serve_file))
            .with_state(served.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            served,
        }
    }

    pub fn serve(&self, path: &str, bodies: Vec<Vec<u8>>) {
        self.served
            .bodies
            .lock()
            .unwrap()
            .insert(path.trim_start_matches('/').to_string(), bodies);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.served.delay.lock().unwrap() = delay;
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub fn hits(&self, path: &str) -> usize {
        self.served
            .hits
            .lock()
            .unwrap()
            .get(path.trim_start_matches('/'))
            .copied()
            .unwrap_or(0)
    }
}

async fn serve_file(State(served): State<Served>, UrlPath(path): UrlPath<String>) -> impl IntoResponse {
    let hit = {
        let mut hits = served.hits.lock().unwrap();
        let counter = hits.entry(path.clone()).or_insert(0);
        *counter += 1;
        *counter
    };

    let delay = *served.delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let body = served
        .bodies
        .lock()
        .unwrap()
        .get(&path)
        .and_then(|bodies| bodies.get(hit - 1).or_else(|| bodies.last()).cloned());

    match body {
        Some(bytes) => (StatusCode::OK, bytes),
        None => (StatusCode::NOT_FOUND, Vec::new()),
    }
}

// ---------------- Prober ----------------

/// Records calls and returns a fixed answer.
pub struct FakeProber {
    calls: AtomicUsize,
    result: Result<MediaInfo, IngestError>,
}

impl FakeProber {
    pub fn ok(bit_rate: &str, resolution: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            result: Ok(MediaInfo {
                bit_rate: bit_rate.to_string(),
                resolution: resolution.to_string(),
            }),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            result: Err(IngestError::Probe(message.to_string())),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, IngestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(path.exists(), "probed file {:?} must exist", path);
        self.result.clone()
    }
}

// ---------------- Pipeline ----------------

pub struct Harness {
    pub manager: Arc<IngestManager>,
    pub persistence: IngestPersistence,
    pub repository: Arc<dyn FileRepository>,
    pub prober: Arc<FakeProber>,
    pub output: TempDir,
}

pub fn config(output: &Path, attempts: u32, workers: usize, channel_size: usize) -> Arc<IngestConfig> {
    Arc::new(
        IngestConfigBuilder::new()
            .db_filepath(":memory:")
            .output_dir(output.join("downloads"))
            .attempts(attempts)
            .workers(workers)
            .channel_size(channel_size)
            .connect_timeout(2)
            .cache_size(100)
            .cache_expiration(60)
            .build()
            .unwrap(),
    )
}

pub fn harness_with(
    repository: Arc<dyn FileRepository>,
    prober: Arc<FakeProber>,
    attempts: u32,
    workers: usize,
    channel_size: usize,
) -> Harness {
    let output = TempDir::new().unwrap();
    let config = config(output.path(), attempts, workers, channel_size);
    let persistence = IngestPersistence::with_repository(Arc::clone(&repository));
    let cache = Arc::new(InFlightCache::from_config(&config.cache_manager));
    let manager = IngestManager::new(config, persistence.clone(), cache, prober.clone()).unwrap();
    Harness {
        manager,
        persistence,
        repository,
        prober,
        output,
    }
}

pub fn harness(prober: Arc<FakeProber>, attempts: u32, workers: usize) -> Harness {
    harness_with(Arc::new(MemoryRepository::new()), prober, attempts, workers, 16)
}

pub fn statuses(logs: &[DBLogEntry]) -> Vec<LogStatus> {
    logs.iter().map(|l| l.status).collect()
}

/// At most one COMPLETED/FAILED entry, and nothing after it.
pub fn assert_terminal_is_last(logs: &[DBLogEntry]) {
    let terminals: Vec<usize> = logs
        .iter()
        .enumerate()
        .filter(|(_, l)| l.status.is_terminal())
        .map(|(i, _)| i)
        .collect();
    assert!(terminals.len() <= 1, "more than one terminal entry: {:?}", logs);
    if let Some(&i) = terminals.first() {
        assert_eq!(i, logs.len() - 1, "entries appended after terminal: {:?}", logs);
    }
}
