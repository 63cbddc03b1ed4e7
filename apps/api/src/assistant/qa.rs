//! Question answering over the site log.
//!
//! Carried in `AppState` as `Arc<dyn Answerer>` so handlers can be exercised
//! without the AI API.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::assistant::prompts::{
    build_question_prompt, build_questions_prompt, qa_system, questions_system,
};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::chat::{ChatMessage, QuestionLevel};
use crate::models::LogEntry;

/// Records included when the context is built from the store; the most recent win.
pub const MAX_CONTEXT_RECORDS: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct AskInput {
    pub question: String,
    pub context: String,
    pub video_title: Option<String>,
    pub previous_messages: Vec<ChatMessage>,
    pub deep_dive: bool,
}

#[async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, input: &AskInput) -> Result<String, LlmError>;

    async fn generate_questions(
        &self,
        context: &str,
        video_title: Option<&str>,
    ) -> Result<Vec<QuestionLevel>, LlmError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionsPayload {
    #[serde(default)]
    questions_and_answers: Vec<QuestionLevel>,
}

pub struct LlmAnswerer {
    llm: LlmClient,
}

impl LlmAnswerer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Answerer for LlmAnswerer {
    async fn answer(&self, input: &AskInput) -> Result<String, LlmError> {
        let prompt =
            build_question_prompt(&input.question, &input.context, input.video_title.as_deref());
        let response = self
            .llm
            .call_with_history(&input.previous_messages, &prompt, &qa_system(input.deep_dive))
            .await?;
        let answer = response.text().ok_or(LlmError::EmptyContent)?.trim().to_string();
        info!(
            deep_dive = input.deep_dive,
            history = input.previous_messages.len(),
            output_tokens = response.usage.output_tokens,
            "Answered question"
        );
        Ok(answer)
    }

    async fn generate_questions(
        &self,
        context: &str,
        video_title: Option<&str>,
    ) -> Result<Vec<QuestionLevel>, LlmError> {
        let payload: QuestionsPayload = self
            .llm
            .call_json(&build_questions_prompt(context, video_title), &questions_system())
            .await?;
        Ok(payload.questions_and_answers)
    }
}

/// One line per record, oldest first, limited to the most recent records.
pub fn build_context(entries: &[LogEntry]) -> String {
    let start = entries.len().saturating_sub(MAX_CONTEXT_RECORDS);
    entries[start..]
        .iter()
        .map(LogEntry::context_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parse_json_text;
    use crate::records::seed::sample_logs;

    #[test]
    fn test_context_has_one_line_per_record() {
        let logs = sample_logs();
        let context = build_context(&logs);
        assert_eq!(context.lines().count(), logs.len());
        assert!(context.contains("North Foundation"));
    }

    #[test]
    fn test_context_keeps_most_recent_records() {
        let logs = sample_logs();
        let mut many = Vec::new();
        while many.len() < MAX_CONTEXT_RECORDS + 5 {
            many.extend(logs.iter().cloned());
        }
        let context = build_context(&many);
        assert_eq!(context.lines().count(), MAX_CONTEXT_RECORDS);
        assert_eq!(
            context.lines().last(),
            Some(many.last().unwrap().context_line().as_str())
        );
    }

    #[test]
    fn test_questions_payload_shape() {
        let payload: QuestionsPayload = parse_json_text(
            r#"{"questionsAndAnswers": [{"level": "basic", "questions": [{"question": "Where?", "answer": "North Foundation"}]}]}"#,
        )
        .unwrap();
        assert_eq!(payload.questions_and_answers.len(), 1);
        assert_eq!(payload.questions_and_answers[0].questions[0].answer, "North Foundation");
    }
}
