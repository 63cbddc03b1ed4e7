//! Axum route handlers for transcription ingestion.

use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assistant::handlers::{ensure_submit_enabled, gate_on_rate_limit};
use crate::errors::AppError;
use crate::ingest::extractor::{complete_logs, ExtractionMeta};
use crate::ingest::youtube::parse_youtube_video_id;
use crate::models::log_entry::IngestDefaults;
use crate::models::LogEntry;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    pub text: String,
    pub title: Option<String>,
    pub recorded_date: Option<NaiveDate>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeRequest {
    pub youtube_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeResponse {
    pub transcription: String,
    pub summary: String,
    pub video_title: Option<String>,
    pub video_id: String,
    pub logs: Vec<LogEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/transcriptions/extract
///
/// Extracts records from free text, backfills missing fields, and appends them
/// to the session store. Shares the AI submit countdown with the assistant.
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    ensure_submit_enabled(&state)?;
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let meta = ExtractionMeta {
        title: request.title,
        recorded_date: request.recorded_date,
        location: request.location,
    };
    let partials = state
        .extractor
        .extract_logs(&request.text, &meta)
        .await
        .map_err(|e| gate_on_rate_limit(&state, e))?;
    let logs = complete_logs(partials, &meta.defaults(), Utc::now());

    let added = state.store.extend(logs.clone()).await;
    info!(added, "Stored extracted records");

    Ok(Json(ExtractResponse { logs }))
}

/// POST /api/v1/transcriptions/youtube
pub async fn handle_youtube(
    State(state): State<AppState>,
    Json(request): Json<YoutubeRequest>,
) -> Result<Json<YoutubeResponse>, AppError> {
    let video_id = parse_youtube_video_id(&request.youtube_url).ok_or_else(|| {
        AppError::Validation(format!("'{}' is not a YouTube video URL", request.youtube_url))
    })?;

    let extraction = state.youtube.extract(&request.youtube_url).await?;
    let defaults = IngestDefaults {
        video_title: extraction.video_title.clone(),
        ..Default::default()
    };
    let logs = complete_logs(extraction.logs, &defaults, Utc::now());

    let added = state.store.extend(logs.clone()).await;
    info!(added, video_id = %video_id, "Stored records from YouTube video");

    Ok(Json(YoutubeResponse {
        transcription: extraction.transcription,
        summary: extraction.summary,
        video_title: extraction.video_title,
        video_id: extraction.video_id.unwrap_or(video_id),
        logs,
    }))
}
