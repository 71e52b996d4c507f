use super::AppState;
use super::error::ApiError;
use crate::request::{DownloadQuery, StatisticFilter, StatisticQuery};
use crate::stats::Statistic;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use log::debug;

/// `GET /dl`: validates and enqueues. Blocks while the task channel is full.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<StatusCode, ApiError> {
    let task = query.into_task()?;
    debug!("[Server] /dl {}", task);
    state.manager.submit(task).await?;
    Ok(StatusCode::OK)
}

/// `GET /st`
pub async fn statistic(
    State(state): State<AppState>,
    Query(query): Query<StatisticQuery>,
) -> Result<Json<Statistic>, ApiError> {
    let repository = state.persistence.repository();
    let statistic = match query.into_filter()? {
        StatisticFilter::All => repository.get_statistic().await?,
        StatisticFilter::Url(url) => repository.get_statistic_by(&url, None).await?,
        StatisticFilter::UrlAndHash(url, hash) => {
            repository.get_statistic_by(&url, Some(&hash)).await?
        }
    };
    Ok(Json(statistic))
}
