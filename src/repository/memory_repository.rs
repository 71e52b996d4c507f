use super::repository::FileRepository;
use crate::IngestError;
use crate::repository::models::{DBFile, DBLogEntry, InterruptedFile};
use crate::stats::{Statistic, StatisticRow};
use crate::status::LogStatus;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    files: BTreeMap<i64, DBFile>,
    logs: Vec<DBLogEntry>,
    next_file_id: i64,
    next_log_id: i64,
}

/// Process-local store. Ids start at 1 and grow like SQLite rowids.
#[derive(Default, Clone)]
pub struct MemoryRepository {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows<'a>(
        tables: &'a Tables,
        filter: impl Fn(&DBFile) -> bool + 'a,
    ) -> impl Iterator<Item = StatisticRow> + 'a {
        tables.files.values().filter(move |f| filter(f)).flat_map(move |file| {
            let logs: Vec<&DBLogEntry> =
                tables.logs.iter().filter(|l| l.file_id == file.id).collect();
            let base = StatisticRow {
                url: file.url.clone(),
                hash: file.hash.clone(),
                bit_rate: file.bit_rate.clone(),
                resolution: file.resolution.clone(),
                status: None,
                message: None,
            };
            if logs.is_empty() {
                vec![base]
            } else {
                logs.into_iter()
                    .map(|l| StatisticRow {
                        status: Some(l.status),
                        message: Some(l.message.clone()),
                        ..base.clone()
                    })
                    .collect()
            }
        })
    }
}

#[async_trait]
impl FileRepository for MemoryRepository {
    // ---------------- File ----------------
    async fn insert_file(&self, url: &str, hash: &str) -> Result<i64, IngestError> {
        let mut tables = self.tables.write().await;
        if let Some(file) = tables.files.values().find(|f| f.url == url && f.hash == hash) {
            return Ok(file.id);
        }
        tables.next_file_id += 1;
        let id = tables.next_file_id;
        tables.files.insert(
            id,
            DBFile {
                id,
                url: url.to_string(),
                hash: hash.to_string(),
                resolution: String::new(),
                bit_rate: String::new(),
            },
        );
        Ok(id)
    }

    async fn update_file(
        &self,
        id: i64,
        bit_rate: &str,
        resolution: &str,
    ) -> Result<(), IngestError> {
        let mut tables = self.tables.write().await;
        let file = tables
            .files
            .get_mut(&id)
            .ok_or_else(|| IngestError::Storage(format!("file {} not found", id)))?;
        file.bit_rate = bit_rate.to_string();
        file.resolution = resolution.to_string();
        Ok(())
    }

    async fn select_file(&self, url: &str, hash: &str) -> Result<Option<i64>, IngestError> {
        Ok(self
            .tables
            .read()
            .await
            .files
            .values()
            .find(|f| f.url == url && f.hash == hash)
            .map(|f| f.id))
    }

    async fn load_file(&self, id: i64) -> Result<Option<DBFile>, IngestError> {
        Ok(self.tables.read().await.files.get(&id).cloned())
    }

    // ---------------- Log ----------------
    async fn append_log(
        &self,
        file_id: i64,
        status: LogStatus,
        message: &str,
    ) -> Result<(), IngestError> {
        let mut tables = self.tables.write().await;
        if !tables.files.contains_key(&file_id) {
            return Err(IngestError::Storage(format!("file {} not found", file_id)));
        }
        tables.next_log_id += 1;
        let id = tables.next_log_id;
        tables.logs.push(DBLogEntry {
            id,
            file_id,
            status,
            message: message.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn load_logs(&self, file_id: i64) -> Result<Vec<DBLogEntry>, IngestError> {
        Ok(self
            .tables
            .read()
            .await
            .logs
            .iter()
            .filter(|l| l.file_id == file_id)
            .cloned()
            .collect())
    }

    async fn is_completed(&self, file_id: i64) -> Result<bool, IngestError> {
        Ok(self
            .tables
            .read()
            .await
            .logs
            .iter()
            .any(|l| l.file_id == file_id && l.status == LogStatus::Completed))
    }

    async fn has_terminal(&self, file_id: i64) -> Result<bool, IngestError> {
        Ok(self
            .tables
            .read()
            .await
            .logs
            .iter()
            .any(|l| l.file_id == file_id && l.status.is_terminal()))
    }

    async fn list_interrupted(&self) -> Result<Vec<InterruptedFile>, IngestError> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .filter(|f| {
                !tables
                    .logs
                    .iter()
                    .any(|l| l.file_id == f.id && l.status.is_terminal())
            })
            .map(|f| InterruptedFile {
                id: f.id,
                url: f.url.clone(),
                hash: f.hash.clone(),
            })
            .collect())
    }

    // ---------------- Statistic ----------------
    async fn get_statistic(&self) -> Result<Statistic, IngestError> {
        let tables = self.tables.read().await;
        Ok(Statistic::from_rows(Self::rows(&tables, |_| true)))
    }

    async fn get_statistic_by(
        &self,
        url: &str,
        hash: Option<&str>,
    ) -> Result<Statistic, IngestError> {
        let tables = self.tables.read().await;
        Ok(Statistic::from_rows(Self::rows(&tables, |f| {
            f.url == url && hash.is_none_or(|h| f.hash == h)
        })))
    }
}
