use crate::error::IngestError;
use crate::repository::{FileRepository, MemoryRepository, SqliteRepository};
use crate::status::LogStatus;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistenceType {
    Memory,
    Sqlite(PathBuf),
}

/// Front of the durable store used by the pipeline.
#[derive(Clone)]
pub struct IngestPersistence {
    repository: Arc<dyn FileRepository>,
}

impl IngestPersistence {
    pub async fn new(persistence_type: &PersistenceType) -> Result<Self, IngestError> {
        let repository: Arc<dyn FileRepository> = match persistence_type {
            PersistenceType::Memory => Arc::new(MemoryRepository::new()),
            PersistenceType::Sqlite(path) => Arc::new(SqliteRepository::new(path).await?),
        };
        Ok(Self { repository })
    }

    pub fn with_repository(repository: Arc<dyn FileRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> Arc<dyn FileRepository> {
        Arc::clone(&self.repository)
    }

    /// Id of the `(url, hash)` file, inserting it on first sighting.
    pub async fn resolve_file(&self, url: &str, hash: &str) -> Result<i64, IngestError> {
        match self.repository.select_file(url, hash).await? {
            Some(id) => Ok(id),
            None => self.repository.insert_file(url, hash).await,
        }
    }

    /// Journals one entry and mirrors it to the log sink. A storage
    /// failure is logged and swallowed.
    pub async fn append_log(&self, file_id: i64, status: LogStatus, message: &str) {
        match status {
            LogStatus::Pending | LogStatus::Completed => {
                info!("[File {}] {}: {}", file_id, status, message)
            }
            LogStatus::Error | LogStatus::Failed => {
                error!("[File {}] {}: {}", file_id, status, message)
            }
        }

        if let Err(e) = self.repository.append_log(file_id, status, message).await {
            error!(
                "[Persistence] Failed to append {} entry for file {}: {}",
                status, file_id, e
            );
        }
    }

    pub async fn close(&self) {
        self.repository.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_file_reuses_existing_id() {
        let persistence = IngestPersistence::new(&PersistenceType::Memory).await.unwrap();
        let first = persistence.resolve_file("http://h/a.mp4", "abc").await.unwrap();
        let second = persistence.resolve_file("http://h/a.mp4", "abc").await.unwrap();
        let other = persistence.resolve_file("http://h/a.mp4", "def").await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn append_log_swallows_storage_errors() {
        let persistence = IngestPersistence::new(&PersistenceType::Memory).await.unwrap();
        // no such file: the repository rejects it, the call still returns
        persistence.append_log(42, LogStatus::Pending, "orphan").await;
        assert!(persistence.repository().load_logs(42).await.unwrap().is_empty());
    }
}
