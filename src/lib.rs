pub mod cache;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod manager;
pub mod persistence;
pub mod prober;
pub mod repository;
pub mod request;
pub mod server;
pub mod stats;
pub mod status;
pub mod task;
pub mod worker;

pub use cache::InFlightCache;
pub use config::IngestConfig;
pub use error::IngestError;
pub use manager::IngestManager;
pub use persistence::{IngestPersistence, PersistenceType};
pub use prober::{FfprobeProber, MediaInfo, MediaProber};
pub use stats::Statistic;
pub use status::LogStatus;
pub use task::IngestTask;
