pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assistant::handlers as assistant;
use crate::ingest::handlers as ingest;
use crate::network::handlers as network;
use crate::records::handlers as records;
use crate::state::AppState;
use crate::views::handlers as views;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Records
        .route("/api/v1/logs", get(records::handle_list_logs))
        .route("/api/v1/logs/summary", get(records::handle_summary))
        .route("/api/v1/logs/refresh", post(records::handle_refresh))
        // Network graph
        .route("/api/v1/network", post(network::handle_network))
        .route("/api/v1/network/path", post(network::handle_path))
        .route(
            "/api/v1/network/neighborhood",
            post(network::handle_neighborhood),
        )
        // Derived views
        .route("/api/v1/timeseries", get(views::handle_timeseries))
        .route("/api/v1/timeline", get(views::handle_timeline))
        .route("/api/v1/map", get(views::handle_map))
        .route("/api/v1/narrative", get(views::handle_narrative))
        .route("/api/v1/groups", get(views::handle_groups))
        // Ingestion
        .route(
            "/api/v1/transcriptions/extract",
            post(ingest::handle_extract),
        )
        .route(
            "/api/v1/transcriptions/youtube",
            post(ingest::handle_youtube),
        )
        // Assistant
        .route("/api/v1/assistant/ask", post(assistant::handle_ask))
        .route(
            "/api/v1/assistant/questions",
            post(assistant::handle_questions),
        )
        .route("/api/v1/assistant/status", get(assistant::handle_status))
        .with_state(state)
}
