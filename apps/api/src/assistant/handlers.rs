//! Axum route handlers for the site log assistant.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::assistant::qa::{build_context, AskInput};
use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::models::chat::{ChatMessage, QuestionLevel, PROMPT_WINDOW};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub question: String,
    pub context: Option<String>,
    pub video_title: Option<String>,
    #[serde(default)]
    pub previous_messages: Vec<ChatMessage>,
    #[serde(default)]
    pub deep_dive: bool,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub answer: String,
    pub session_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionsRequest {
    pub context: Option<String>,
    pub video_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub questions_and_answers: Vec<QuestionLevel>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub enabled: bool,
    pub retry_after: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// Rejects AI submissions while the rate-limit countdown runs.
pub(crate) fn ensure_submit_enabled(state: &AppState) -> Result<(), AppError> {
    match state.submit_gate.remaining() {
        0 => Ok(()),
        retry_after => Err(AppError::RateLimited { retry_after }),
    }
}

/// Starts the countdown when the AI API rate limited the call.
pub(crate) fn gate_on_rate_limit(state: &AppState, err: LlmError) -> AppError {
    if let LlmError::RateLimited { retry_after } = err {
        state.submit_gate.trip(retry_after);
    }
    err.into()
}

async fn resolve_context(state: &AppState, context: Option<String>) -> String {
    match context.filter(|c| !c.trim().is_empty()) {
        Some(context) => context,
        None => build_context(&state.store.snapshot().await),
    }
}

/// POST /api/v1/assistant/ask
///
/// Answers a question about the records. History comes from `previousMessages`
/// when supplied, otherwise from the server-side session.
pub async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    ensure_submit_enabled(&state)?;
    if request.question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
    let previous_messages = if request.previous_messages.is_empty() {
        state.sessions.history(session_id).await
    } else {
        let start = request.previous_messages.len().saturating_sub(PROMPT_WINDOW);
        request.previous_messages[start..].to_vec()
    };

    let input = AskInput {
        question: request.question.trim().to_string(),
        context: resolve_context(&state, request.context).await,
        video_title: request.video_title,
        previous_messages,
        deep_dive: request.deep_dive,
    };

    let answer = state
        .answerer
        .answer(&input)
        .await
        .map_err(|e| gate_on_rate_limit(&state, e))?;

    state
        .sessions
        .record_exchange(session_id, &input.question, &answer)
        .await;
    let messages = state.sessions.message_count(session_id).await;
    debug!(session = %session_id, messages, "Recorded exchange");

    Ok(Json(AskResponse { answer, session_id }))
}

/// POST /api/v1/assistant/questions
pub async fn handle_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<QuestionsResponse>, AppError> {
    ensure_submit_enabled(&state)?;

    let context = resolve_context(&state, request.context).await;
    let questions_and_answers = state
        .answerer
        .generate_questions(&context, request.video_title.as_deref())
        .await
        .map_err(|e| gate_on_rate_limit(&state, e))?;

    Ok(Json(QuestionsResponse {
        questions_and_answers,
    }))
}

/// GET /api/v1/assistant/status
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        enabled: state.submit_gate.is_submit_enabled(),
        retry_after: state.submit_gate.remaining(),
    })
}
