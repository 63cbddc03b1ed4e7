//! Extraction of log records from transcription text.
//!
//! `AppState` holds an `Arc<dyn LogExtractor>`; the production implementation
//! calls the LLM, tests substitute a fixed stub.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use crate::ingest::prompts::{build_extraction_prompt, EXTRACTION_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::log_entry::{lenient_partials, IngestDefaults, PartialLogEntry};
use crate::models::LogEntry;

/// Optional metadata sent with a transcription.
#[derive(Debug, Clone, Default)]
pub struct ExtractionMeta {
    pub title: Option<String>,
    pub recorded_date: Option<NaiveDate>,
    pub location: Option<String>,
}

impl ExtractionMeta {
    pub fn defaults(&self) -> IngestDefaults {
        IngestDefaults {
            recorded_date: self.recorded_date,
            location: self.location.clone(),
            video_title: self.title.clone(),
        }
    }
}

#[async_trait]
pub trait LogExtractor: Send + Sync {
    async fn extract_logs(
        &self,
        text: &str,
        meta: &ExtractionMeta,
    ) -> Result<Vec<PartialLogEntry>, LlmError>;
}

/// `{ "logs": [...] }` as returned by the model. A missing array means no records;
/// a malformed record is dropped without failing the batch.
#[derive(Debug, Default, Deserialize)]
pub struct ExtractionPayload {
    #[serde(default, deserialize_with = "lenient_partials")]
    pub logs: Vec<PartialLogEntry>,
}

pub struct LlmLogExtractor {
    llm: LlmClient,
}

impl LlmLogExtractor {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl LogExtractor for LlmLogExtractor {
    async fn extract_logs(
        &self,
        text: &str,
        meta: &ExtractionMeta,
    ) -> Result<Vec<PartialLogEntry>, LlmError> {
        let prompt = build_extraction_prompt(text, meta);
        let payload: ExtractionPayload = self.llm.call_json(&prompt, EXTRACTION_SYSTEM).await?;
        info!(records = payload.logs.len(), "Extracted records from transcription");
        Ok(payload.logs)
    }
}

/// Backfills every partial record into a complete LogEntry.
pub fn complete_logs(
    partials: Vec<PartialLogEntry>,
    defaults: &IngestDefaults,
    now: DateTime<Utc>,
) -> Vec<LogEntry> {
    partials
        .into_iter()
        .map(|p| p.into_entry(defaults, now))
        .collect()
}
