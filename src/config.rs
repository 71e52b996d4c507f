use crate::persistence::PersistenceType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Path used by the binary when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "cfg/config.yml";

/// `db_filepath` value that selects the in-memory store.
pub const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Seconds granted to in-flight requests once shutdown starts.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            shutdown_timeout: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub channel_size: usize,
    pub workers: usize,
    pub attempts: u32,
    pub output_dir: PathBuf,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_probe_program")]
    pub probe_program: String,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_probe_program() -> String {
    "ffprobe".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            channel_size: 100,
            workers: 4,
            attempts: 3,
            output_dir: PathBuf::from("downloads"),
            connect_timeout: default_connect_timeout(),
            probe_program: default_probe_program(),
        }
    }
}

impl ServiceConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub size: u64,
    /// Seconds an in-flight fingerprint survives without being removed.
    pub expiration: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            expiration: 600,
        }
    }
}

impl CacheConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub db_filepath: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub cache_manager: CacheConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            db_filepath: "media.db".to_string(),
            server: ServerConfig::default(),
            service: ServiceConfig::default(),
            cache_manager: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid number of workers: {0}")]
    InvalidWorkers(usize),
    #[error("Invalid channel size: {0}")]
    InvalidChannelSize(usize),
    #[error("Invalid number of attempts: {0}")]
    InvalidAttempts(u32),
    #[error("Invalid cache size: {0}")]
    InvalidCacheSize(u64),
    #[error("Invalid cache expiration: {0}")]
    InvalidCacheExpiration(u64),
    #[error("Invalid output directory: {0}")]
    InvalidOutputDir(String),
    #[error("Invalid database path: {0}")]
    InvalidDbPath(String),
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_filepath.trim().is_empty() {
            return Err(ConfigError::InvalidDbPath(self.db_filepath.clone()));
        }

        if self.service.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidOutputDir(
                self.service.output_dir.to_string_lossy().to_string(),
            ));
        }

        if self.service.workers == 0 || self.service.workers > 100 {
            return Err(ConfigError::InvalidWorkers(self.service.workers));
        }

        // tokio's bounded channel refuses a zero capacity
        if self.service.channel_size == 0 {
            return Err(ConfigError::InvalidChannelSize(self.service.channel_size));
        }

        if self.service.attempts == 0 {
            return Err(ConfigError::InvalidAttempts(self.service.attempts));
        }

        if self.cache_manager.size == 0 {
            return Err(ConfigError::InvalidCacheSize(self.cache_manager.size));
        }

        // a zero time-to-live expires fingerprints at once
        if self.cache_manager.expiration == 0 {
            return Err(ConfigError::InvalidCacheExpiration(
                self.cache_manager.expiration,
            ));
        }

        Ok(())
    }

    /// Loads and validates a YAML document from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        content.parse()
    }

    pub fn persistence_type(&self) -> PersistenceType {
        if self.db_filepath == MEMORY_DB {
            PersistenceType::Memory
        } else {
            PersistenceType::Sqlite(PathBuf::from(&self.db_filepath))
        }
    }
}

impl FromStr for IngestConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestConfigBuilder {
    inner: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn new() -> Self {
        Self {
            inner: IngestConfig::default(),
        }
    }

    pub fn db_filepath(mut self, path: impl Into<String>) -> Self {
        self.inner.db_filepath = path.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.inner.server.port = port;
        self
    }

    pub fn shutdown_timeout(mut self, secs: u64) -> Self {
        self.inner.server.shutdown_timeout = secs;
        self
    }

    pub fn channel_size(mut self, n: usize) -> Self {
        self.inner.service.channel_size = n;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.inner.service.workers = n;
        self
    }

    pub fn attempts(mut self, n: u32) -> Self {
        self.inner.service.attempts = n;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.service.output_dir = dir.into();
        self
    }

    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.inner.service.connect_timeout = secs;
        self
    }

    pub fn probe_program(mut self, program: impl Into<String>) -> Self {
        self.inner.service.probe_program = program.into();
        self
    }

    pub fn cache_size(mut self, size: u64) -> Self {
        self.inner.cache_manager.size = size;
        self
    }

    pub fn cache_expiration(mut self, secs: u64) -> Self {
        self.inner.cache_manager.expiration = secs;
        self
    }

    pub fn build(self) -> Result<IngestConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
