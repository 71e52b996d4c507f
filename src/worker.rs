use crate::cache::InFlightCache;
use crate::checksum::verify_md5;
use crate::config::ServiceConfig;
use crate::error::IngestError;
use crate::persistence::IngestPersistence;
use crate::prober::MediaProber;
use crate::stats::{format_bytes, format_duration};
use crate::status::LogStatus;
use crate::task::IngestTask;
use futures_util::StreamExt;
use log::{debug, error, info};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, mpsc};

pub struct IngestWorker {
    pub id: usize,
    config: Arc<ServiceConfig>,
    client: Client,
    persistence: IngestPersistence,
    cache: Arc<InFlightCache>,
    prober: Arc<dyn MediaProber>,
    receiver: Arc<Mutex<mpsc::Receiver<IngestTask>>>,
}

impl IngestWorker {
    pub fn new(
        id: usize,
        config: Arc<ServiceConfig>,
        client: Client,
        persistence: IngestPersistence,
        cache: Arc<InFlightCache>,
        prober: Arc<dyn MediaProber>,
        receiver: Arc<Mutex<mpsc::Receiver<IngestTask>>>,
    ) -> Self {
        debug!("[Worker {}] Created", id);
        Self {
            id,
            config,
            client,
            persistence,
            cache,
            prober,
            receiver,
        }
    }

    /// Drains the task channel until every sender is gone.
    pub async fn run(self) {
        info!("[Worker {}] Started", self.id);
        loop {
            // Claim while holding the receiver so no other worker can pick
            // up the same fingerprint between dequeue and claim.
            let (task, guard) = {
                let mut receiver = self.receiver.lock().await;
                let Some(task) = receiver.recv().await else {
                    break;
                };
                match self.cache.claim(&task.fingerprint()) {
                    Some(guard) => (task, guard),
                    None => {
                        debug!("[Worker {}] Skip duplicate task {}", self.id, task);
                        continue;
                    }
                }
            };

            debug!("[Worker {}] Picked up {}", self.id, guard.key());
            if let Err(e) = self.process(&task).await {
                error!("[Worker {}] Task {} ended with error: {}", self.id, task, e);
            }
            drop(guard);
        }
        info!("[Worker {}] Channel closed, exiting", self.id);
    }

    /// Runs one task through download, verification, probing and
    /// finalization, retrying download and checksum failures.
    pub async fn process(&self, task: &IngestTask) -> Result<(), IngestError> {
        let id = self.persistence.resolve_file(&task.url, &task.hash).await?;
        let repository = self.persistence.repository();
        let path = task.output_path(&self.config.output_dir);

        let mut attempt = 1u32;
        loop {
            if attempt > self.config.attempts {
                let err = IngestError::AttemptsExhausted(self.config.attempts);
                self.persistence
                    .append_log(id, LogStatus::Failed, &err.to_string())
                    .await;
                return Err(err);
            }

            if repository.has_terminal(id).await? {
                debug!("[Worker {}] File {} already finished", self.id, id);
                return Ok(());
            }

            debug!("[Worker {}] Attempt {} for {}", self.id, attempt, task);
            self.persistence
                .append_log(id, LogStatus::Pending, "Start processing task")
                .await;

            if let Err(e) = self.download(id, task, &path).await {
                self.persistence
                    .append_log(id, LogStatus::Error, &format!("Failed to download file: {}", e))
                    .await;
                attempt += 1;
                continue;
            }

            if let Err(e) = self.verify(task, &path).await {
                self.persistence
                    .append_log(id, LogStatus::Error, &format!("Failed to verify checksum: {}", e))
                    .await;
                attempt += 1;
                continue;
            }

            let info = match self.prober.probe(&path).await {
                Ok(info) => info,
                Err(e) => {
                    self.persistence
                        .append_log(id, LogStatus::Failed, &format!("Failed to probe file: {}", e))
                        .await;
                    return Err(e);
                }
            };

            repository
                .update_file(id, &info.bit_rate, &info.resolution)
                .await?;
            self.persistence
                .append_log(id, LogStatus::Completed, "Task completed")
                .await;
            return Ok(());
        }
    }

    async fn download(
        &self,
        id: i64,
        task: &IngestTask,
        path: &Path,
    ) -> Result<(), IngestError> {
        if tokio::fs::try_exists(path).await? {
            debug!("[Worker {}] Removing stale file {:?}", self.id, path);
            tokio::fs::remove_file(path).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;

        self.persistence
            .append_log(
                id,
                LogStatus::Pending,
                &format!("Start downloading file {} to {}", task.url, path.display()),
            )
            .await;

        let started = Instant::now();
        let response = self.client.get(&task.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus(
                task.url.clone(),
                status.as_u16(),
                status.canonical_reason().unwrap_or_default().to_string(),
            ));
        }

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        self.persistence
            .append_log(
                id,
                LogStatus::Pending,
                &format!(
                    "Finish downloading file {} ({} in {})",
                    task.url,
                    format_bytes(written),
                    format_duration(started.elapsed())
                ),
            )
            .await;
        Ok(())
    }

    async fn verify(&self, task: &IngestTask, path: &Path) -> Result<(), IngestError> {
        let path = path.to_path_buf();
        let expected = task.hash.clone();
        tokio::task::spawn_blocking(move || verify_md5(&path, &expected)).await?
    }
}
