use clap::Parser;
use log::{error, info, warn};
use media_ingest::cli::{Cli, init_logger};
use media_ingest::server::{self, AppState};
use media_ingest::{
    FfprobeProber, InFlightCache, IngestConfig, IngestError, IngestManager, IngestPersistence,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    let cli = Cli::parse();
    init_logger(cli.log_level());

    let config = Arc::new(IngestConfig::from_file(&cli.config).inspect_err(|e| {
        error!("[Main] Failed to load config {:?}: {}", cli.config, e);
    })?);
    info!("[Main] Loaded config {:?}", cli.config);

    let persistence = IngestPersistence::new(&config.persistence_type()).await?;
    let cache = Arc::new(InFlightCache::from_config(&config.cache_manager));
    let prober = Arc::new(FfprobeProber::new(config.service.probe_program.clone()));

    let manager = IngestManager::new(
        Arc::clone(&config),
        persistence.clone(),
        cache,
        prober,
    )?;
    manager.start().await?;
    manager.resume_interrupted().await?;

    let listener = server::bind(config.server.port).await?;
    let shutdown = Arc::new(Notify::new());
    let signal = Arc::clone(&shutdown);
    let mut server_handle = tokio::spawn(server::serve(
        listener,
        AppState::new(Arc::clone(&manager)),
        async move { signal.notified().await },
    ));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("[Main] Failed to listen for interrupt: {}", e);
            }
            info!("[Main] Interrupt received, shutting down");
        }
        result = &mut server_handle => {
            error!("[Main] Server exited unexpectedly: {:?}", result);
        }
    }

    shutdown.notify_one();
    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    if !server_handle.is_finished() {
        match tokio::time::timeout(timeout, &mut server_handle).await {
            Ok(Ok(Err(e))) => error!("[Main] Server error during shutdown: {}", e),
            Ok(Err(e)) => error!("[Main] Server task failed: {}", e),
            Ok(Ok(Ok(()))) => info!("[Main] Server stopped"),
            Err(_) => {
                warn!("[Main] Server did not drain within {:?}, aborting", timeout);
                server_handle.abort();
            }
        }
    }

    manager.stop().await;
    persistence.close().await;
    info!("[Main] Bye");
    Ok(())
}
