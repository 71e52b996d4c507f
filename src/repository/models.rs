use crate::status::LogStatus;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DBFile {
    pub id: i64,
    pub url: String,
    pub hash: String,
    pub resolution: String, // "<W>x<H>", empty until probed
    pub bit_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DBLogEntry {
    pub id: i64,
    pub file_id: i64,
    pub status: LogStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A file with no COMPLETED or FAILED entry, re-enqueued on startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptedFile {
    pub id: i64,
    pub url: String,
    pub hash: String,
}
