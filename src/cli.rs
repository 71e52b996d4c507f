use crate::config::DEFAULT_CONFIG_PATH;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "media-ingest")]
#[command(about = "Downloads, verifies and probes media files on request", long_about = None)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// `--debug` or `DEBUG_MODE=true` raise verbosity to debug.
    pub fn log_level(&self) -> LevelFilter {
        let env_debug = std::env::var("DEBUG_MODE")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if self.debug || env_debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}

pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .filter_module("sqlx::query", LevelFilter::Info)
        .init();
}
