use crate::error::IngestError;
use async_trait::async_trait;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tokio::process::Command;

static PROBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"width=(\d+)\s*height=(\d+)\s*bit_rate=(\d+)").expect("probe pattern is valid")
});

/// Media properties extracted from a downloaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub bit_rate: String,
    /// `<W>x<H>`
    pub resolution: String,
}

#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, IngestError>;
}

/// Runs `ffprobe` (or a compatible program) found on `PATH`.
pub struct FfprobeProber {
    program: String,
}

impl FfprobeProber {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, IngestError> {
        debug!(
            "[Prober] Get media info from file: {:?} by shell command: {}",
            path, self.program
        );

        let output = Command::new(&self.program)
            .args([
                "-v",
                "error",
                "-show_entries",
                "stream=width,height,bit_rate",
                "-of",
                "default=noprint_wrappers=1",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| IngestError::Probe(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IngestError::Probe(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extracts the first `width=.. height=.. bit_rate=..` triple from prober output.
pub fn parse_probe_output(output: &str) -> Result<MediaInfo, IngestError> {
    let captures = PROBE_PATTERN.captures(output).ok_or_else(|| {
        IngestError::Probe(format!(
            "unexpected probe output: {:?}",
            output.trim().chars().take(200).collect::<String>()
        ))
    })?;

    Ok(MediaInfo {
        resolution: format!("{}x{}", &captures[1], &captures[2]),
        bit_rate: captures[3].to_string(),
    })
}
