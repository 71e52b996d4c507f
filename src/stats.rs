//! Statistics document served by `/st` and human-readable formatting helpers.

use crate::status::LogStatus;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Written as the `log.status` table code in a string, e.g. `"4"`.
    #[serde(serialize_with = "serialize_code", deserialize_with = "deserialize_code")]
    pub status: LogStatus,
    pub message: String,
}

fn serialize_code<S: Serializer>(status: &LogStatus, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&status.code().to_string())
}

fn deserialize_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LogStatus, D::Error> {
    let code = String::deserialize(deserializer)?;
    let code: i64 = code.parse().map_err(D::Error::custom)?;
    LogStatus::from_code(code).map_err(D::Error::custom)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatistic {
    pub hash: String,
    pub bitrate: String,
    pub resolution: String,
    pub log: Vec<LogRecord>,
}

/// File url -> its probe fields and status history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistic(BTreeMap<String, FileStatistic>);

/// One row of the files LEFT JOIN log scan. `status` and `message` are
/// absent for a file that has no log entries yet.
#[derive(Debug, Clone)]
pub struct StatisticRow {
    pub url: String,
    pub hash: String,
    pub bit_rate: String,
    pub resolution: String,
    pub status: Option<LogStatus>,
    pub message: Option<String>,
}

impl Statistic {
    /// Folds scan rows into the document. The first row seen for a url
    /// supplies its file fields; log entries accumulate in row order.
    pub fn from_rows(rows: impl IntoIterator<Item = StatisticRow>) -> Self {
        let mut files: BTreeMap<String, FileStatistic> = BTreeMap::new();
        for row in rows {
            let entry = files.entry(row.url).or_insert_with(|| FileStatistic {
                hash: row.hash,
                bitrate: row.bit_rate,
                resolution: row.resolution,
                log: Vec::new(),
            });
            if let Some(status) = row.status {
                entry.log.push(LogRecord {
                    status,
                    message: row.message.unwrap_or_default(),
                });
            }
        }
        Self(files)
    }

    pub fn get(&self, url: &str) -> Option<&FileStatistic> {
        self.0.get(url)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileStatistic)> {
        self.0.iter()
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// `1.25s` below a minute, `2m 5.0s` above.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let m = (secs / 60.0).floor();
        let s = secs % 60.0;
        format!("{:.0}m {:.1}s", m, s)
    }
}
