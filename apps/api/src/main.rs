mod assistant;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod network;
mod records;
mod routes;
mod state;
mod views;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant::{LlmAnswerer, SessionStore, SubmitGate};
use crate::config::Config;
use crate::db::create_pool;
use crate::ingest::{LlmLogExtractor, YoutubeClient};
use crate::llm_client::LlmClient;
use crate::records::repository::load_transcriptions;
use crate::records::seed::sample_logs;
use crate::records::LogStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sitelog v{}", env!("CARGO_PKG_VERSION"));

    let db = match &config.database_url {
        Some(url) => Some(create_pool(url).await?),
        None => {
            info!("DATABASE_URL not set, records table disabled");
            None
        }
    };

    let mut records = if config.seed_mock_data {
        sample_logs()
    } else {
        Vec::new()
    };
    if let Some(pool) = &db {
        // Table errors leave the seed data in place.
        match load_transcriptions(pool, &config.transcripts_table).await {
            Ok(rows) => records.extend(rows),
            Err(e) => warn!("Could not load records table: {e:#}"),
        }
    }
    info!(records = records.len(), "Session store initialized");
    let store = LogStore::new(records);

    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let youtube = YoutubeClient::new(config.youtube_extract_url.clone());
    if !youtube.is_configured() {
        info!("YOUTUBE_EXTRACT_URL not set, YouTube ingestion disabled");
    }

    let state = AppState {
        db,
        config: config.clone(),
        store,
        extractor: Arc::new(LlmLogExtractor::new(llm.clone())),
        answerer: Arc::new(LlmAnswerer::new(llm)),
        youtube,
        submit_gate: SubmitGate::new(),
        sessions: SessionStore::new(config.max_chat_sessions),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
