use std::sync::Arc;

use sqlx::PgPool;

use crate::assistant::{Answerer, SessionStore, SubmitGate};
use crate::config::Config;
use crate::ingest::{LogExtractor, YoutubeClient};
use crate::records::LogStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Hosted records table. `None` when DATABASE_URL is unset.
    pub db: Option<PgPool>,
    pub config: Config,
    pub store: LogStore,
    /// Pluggable so handlers can run against a stub in tests.
    pub extractor: Arc<dyn LogExtractor>,
    pub answerer: Arc<dyn Answerer>,
    pub youtube: YoutubeClient,
    pub submit_gate: SubmitGate,
    pub sessions: SessionStore,
}
