//! Axum route handlers for the log records.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::LogEntry;
use crate::records::filters::{summarize, LogFilter, LogSummary};
use crate::records::repository::load_transcriptions;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub total: usize,
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub loaded: usize,
    pub total: usize,
}

/// GET /api/v1/logs
///
/// Filtered records, newest first.
pub async fn handle_list_logs(
    State(state): State<AppState>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<LogsResponse>, AppError> {
    let gap = state.config.episode_gap_minutes;
    let mut logs = filters.apply(&state.store.snapshot().await, gap);
    logs.reverse();
    Ok(Json(LogsResponse {
        total: logs.len(),
        logs,
    }))
}

/// GET /api/v1/logs/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    Query(filters): Query<LogFilter>,
) -> Result<Json<LogSummary>, AppError> {
    let gap = state.config.episode_gap_minutes;
    let logs = filters.apply(&state.store.snapshot().await, gap);
    Ok(Json(summarize(&logs)))
}

/// POST /api/v1/logs/refresh
///
/// Reloads the records table. Records ingested during the session are kept.
pub async fn handle_refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let pool = state.db.as_ref().ok_or_else(|| {
        AppError::UnprocessableEntity("No records database is configured".to_string())
    })?;

    let rows = load_transcriptions(pool, &state.config.transcripts_table).await?;
    let loaded = rows.len();
    state.store.replace_remote(rows).await;
    let total = state.store.len().await;
    info!(loaded, total, "Records table refreshed");

    Ok(Json(RefreshResponse { loaded, total }))
}
