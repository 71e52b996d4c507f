use crate::IngestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a journaled log entry. The integer codes are what the `log` table stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    Pending,
    Error,
    Failed,
    Completed,
}

impl LogStatus {
    pub fn code(self) -> i64 {
        match self {
            LogStatus::Pending => 1,
            LogStatus::Error => 2,
            LogStatus::Failed => 3,
            LogStatus::Completed => 4,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, IngestError> {
        match code {
            1 => Ok(LogStatus::Pending),
            2 => Ok(LogStatus::Error),
            3 => Ok(LogStatus::Failed),
            4 => Ok(LogStatus::Completed),
            other => Err(IngestError::Storage(format!("unknown log status code {other}"))),
        }
    }

    /// COMPLETED and FAILED end a file's history.
    pub fn is_terminal(self) -> bool {
        matches!(self, LogStatus::Completed | LogStatus::Failed)
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogStatus::Pending => "PENDING",
            LogStatus::Error => "ERROR",
            LogStatus::Failed => "FAILED",
            LogStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for LogStatus {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(LogStatus::Pending),
            "ERROR" => Ok(LogStatus::Error),
            "FAILED" => Ok(LogStatus::Failed),
            "COMPLETED" => Ok(LogStatus::Completed),
            other => Err(IngestError::Other(format!("unknown log status '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_the_log_table() {
        for status in [
            LogStatus::Pending,
            LogStatus::Error,
            LogStatus::Failed,
            LogStatus::Completed,
        ] {
            assert_eq!(LogStatus::from_code(status.code()).unwrap(), status);
            assert_eq!(status.to_string().parse::<LogStatus>().unwrap(), status);
        }
        assert!(LogStatus::from_code(0).is_err());
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(LogStatus::Completed.is_terminal());
        assert!(LogStatus::Failed.is_terminal());
        assert!(!LogStatus::Pending.is_terminal());
        assert!(!LogStatus::Error.is_terminal());
    }
}
