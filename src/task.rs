use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Length of a hex-encoded MD5 digest.
pub const MD5_HEX_LEN: usize = 32;

/// A download request: fetch `url` once and check it against the MD5 `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IngestTask {
    pub url: String,
    pub hash: String,
}

impl IngestTask {
    pub fn new(url: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hash: hash.into(),
        }
    }

    /// Validates both fields the way the HTTP boundary requires.
    pub fn parse(url: &str, hash: &str) -> Result<Self, IngestError> {
        validate_url(url)?;
        validate_hash(hash)?;
        Ok(Self::new(url, hash))
    }

    /// In-flight cache key: `<url>-<hash>`.
    pub fn fingerprint(&self) -> String {
        format!("{}-{}", self.url, self.hash)
    }

    /// Destination of the download: `<output_dir>/<basename(url)>-<hash>`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}-{}", basename(&self.url), self.hash))
    }
}

impl fmt::Display for IngestTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.url, self.hash)
    }
}

pub fn validate_url(url: &str) -> Result<Url, IngestError> {
    if url.trim().is_empty() {
        return Err(IngestError::InvalidUrl("url is empty".into()));
    }
    let parsed = Url::parse(url).map_err(|e| IngestError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(IngestError::InvalidUrl(format!(
            "{url}: unsupported scheme '{scheme}'"
        ))),
    }
}

pub fn validate_hash(hash: &str) -> Result<(), IngestError> {
    if hash.len() != MD5_HEX_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IngestError::InvalidHash(format!(
            "hash length invalid. Must be {MD5_HEX_LEN} hex characters, got '{hash}'"
        )));
    }
    Ok(())
}

/// Last non-empty path segment of the url, or `download` when the path has none.
fn basename(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        })
        .unwrap_or_else(|| "download".to_string())
}
