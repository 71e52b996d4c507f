//! HTTP front end: `/dl` enqueues a task, `/st` reads the statistics document.

pub mod error;
pub mod handlers;

use crate::error::IngestError;
use crate::manager::IngestManager;
use crate::persistence::IngestPersistence;
use axum::Router;
use axum::routing::get;
use log::info;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<IngestManager>,
    pub persistence: IngestPersistence,
}

impl AppState {
    pub fn new(manager: Arc<IngestManager>) -> Self {
        let persistence = manager.persistence().clone();
        Self {
            manager,
            persistence,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dl", get(handlers::download))
        .route("/st", get(handlers::statistic))
        .with_state(state)
}

pub async fn bind(port: u16) -> Result<TcpListener, IngestError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("[Server] Listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), IngestError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("[Server] Shutting down...");
        })
        .await?;
    Ok(())
}
