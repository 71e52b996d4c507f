use crate::cache::InFlightCache;
use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::persistence::IngestPersistence;
use crate::prober::MediaProber;
use crate::task::IngestTask;
use crate::worker::IngestWorker;
use futures::future::join_all;
use log::{debug, error, info, warn};
use reqwest::Client;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Owns the bounded task channel and the worker pool.
///
/// Lifecycle: [`new`](Self::new) → [`start`](Self::start) →
/// [`resume_interrupted`](Self::resume_interrupted) → any number of
/// [`submit`](Self::submit) calls → [`stop`](Self::stop).
pub struct IngestManager {
    pub config: Arc<IngestConfig>,
    persistence: IngestPersistence,
    cache: Arc<InFlightCache>,
    prober: Arc<dyn MediaProber>,
    client: Client,

    sender: Mutex<Option<mpsc::Sender<IngestTask>>>,
    receiver: Arc<Mutex<mpsc::Receiver<IngestTask>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl IngestManager {
    pub fn new(
        config: Arc<IngestConfig>,
        persistence: IngestPersistence,
        cache: Arc<InFlightCache>,
        prober: Arc<dyn MediaProber>,
    ) -> Result<Arc<Self>, IngestError> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(config.service.connect_timeout())
            .build()?;
        let (sender, receiver) = mpsc::channel(config.service.channel_size);

        Ok(Arc::new(Self {
            config,
            persistence,
            cache,
            prober,
            client,
            sender: Mutex::new(Some(sender)),
            receiver: Arc::new(Mutex::new(receiver)),
            handles: Mutex::new(Vec::new()),
        }))
    }

    pub fn persistence(&self) -> &IngestPersistence {
        &self.persistence
    }

    /// Creates the output directory and spawns the worker pool.
    pub async fn start(&self) -> Result<(), IngestError> {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            warn!("[Manager] Workers already running");
            return Ok(());
        }

        let output_dir = &self.config.service.output_dir;
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                IngestError::Io(format!("Failed to create output directory {:?}: {}", output_dir, e))
            })?;
        }

        let service = Arc::new(self.config.service.clone());
        for id in 1..=service.workers {
            let worker = IngestWorker::new(
                id,
                Arc::clone(&service),
                self.client.clone(),
                self.persistence.clone(),
                Arc::clone(&self.cache),
                Arc::clone(&self.prober),
                Arc::clone(&self.receiver),
            );
            handles.push(tokio::spawn(worker.run()));
        }

        info!(
            "[Manager] Started {} workers, channel size {}, attempts {}",
            service.workers, service.channel_size, service.attempts
        );
        Ok(())
    }

    /// Enqueues a task, waiting while the channel is full.
    pub async fn submit(&self, task: IngestTask) -> Result<(), IngestError> {
        let sender = self
            .sender
            .lock()
            .await
            .clone()
            .ok_or(IngestError::ServiceStopped)?;

        debug!("[Manager] Submit {}", task);
        sender
            .send(task)
            .await
            .map_err(|_| IngestError::ServiceStopped)
    }

    /// Re-enqueues every file without a terminal log entry. Returns how many were queued.
    pub async fn resume_interrupted(&self) -> Result<usize, IngestError> {
        let interrupted = self.persistence.repository().list_interrupted().await?;
        if interrupted.is_empty() {
            info!("[Manager] No interrupted files to resume");
            return Ok(0);
        }

        info!("[Manager] Resuming {} interrupted files", interrupted.len());
        let count = interrupted.len();
        for file in interrupted {
            debug!("[Manager] Resume file {} ({})", file.id, file.url);
            self.submit(IngestTask::new(file.url, file.hash)).await?;
        }
        Ok(count)
    }

    /// Closes the channel and waits for every worker to finish its current task.
    pub async fn stop(&self) {
        if self.sender.lock().await.take().is_none() {
            warn!("[Manager] Already stopped");
        }

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        info!("[Manager] Waiting for {} workers to exit", handles.len());
        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("[Manager] Worker terminated abnormally: {}", e);
            }
        }
        info!("[Manager] Stopped");
    }
}
