use crate::error::IngestError;
use crate::repository::models::{DBFile, DBLogEntry, InterruptedFile};
use crate::stats::Statistic;
use crate::status::LogStatus;
use async_trait::async_trait;

/// Durable store for files and their append-only status journal.
///
/// Implementations must tolerate concurrent calls from every worker and the
/// HTTP front end at once.
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Creates a file with empty probe fields. An existing `(url, hash)` keeps its id.
    async fn insert_file(&self, url: &str, hash: &str) -> Result<i64, IngestError>;
    async fn update_file(
        &self,
        id: i64,
        bit_rate: &str,
        resolution: &str,
    ) -> Result<(), IngestError>;
    async fn select_file(&self, url: &str, hash: &str) -> Result<Option<i64>, IngestError>;
    async fn load_file(&self, id: i64) -> Result<Option<DBFile>, IngestError>;

    //
    async fn append_log(
        &self,
        file_id: i64,
        status: LogStatus,
        message: &str,
    ) -> Result<(), IngestError>;
    /// Entries of one file in append order.
    async fn load_logs(&self, file_id: i64) -> Result<Vec<DBLogEntry>, IngestError>;
    async fn is_completed(&self, file_id: i64) -> Result<bool, IngestError>;
    /// True once a COMPLETED or FAILED entry exists.
    async fn has_terminal(&self, file_id: i64) -> Result<bool, IngestError>;
    async fn list_interrupted(&self) -> Result<Vec<InterruptedFile>, IngestError>;

    //
    async fn get_statistic(&self) -> Result<Statistic, IngestError>;
    async fn get_statistic_by(
        &self,
        url: &str,
        hash: Option<&str>,
    ) -> Result<Statistic, IngestError>;

    async fn close(&self) {}
}
