use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Messages kept per session; older ones are dropped.
pub const MAX_HISTORY: usize = 20;
/// Messages forwarded to the AI endpoint as `previousMessages`.
pub const PROMPT_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionLevel {
    pub level: String,
    pub questions: Vec<QaPair>,
}

/// Bounded chat history for one assistant panel.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > MAX_HISTORY {
            let overflow = self.messages.len() - MAX_HISTORY;
            self.messages.drain(..overflow);
        }
    }

    pub fn record_exchange(&mut self, question: &str, answer: &str) {
        self.push(ChatMessage::user(question));
        self.push(ChatMessage::assistant(answer));
    }

    /// The most recent messages, oldest first.
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut session = ChatSession::default();
        for i in 0..15 {
            session.record_exchange(&format!("q{i}"), &format!("a{i}"));
        }
        assert_eq!(session.message_count(), MAX_HISTORY);
        assert_eq!(session.recent(MAX_HISTORY)[0].content, "q5");
    }

    #[test]
    fn test_recent_window_is_oldest_first() {
        let mut session = ChatSession::default();
        session.record_exchange("first", "one");
        session.record_exchange("second", "two");
        let recent = session.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "one");
        assert_eq!(recent[2].role, ChatRole::Assistant);
    }

    #[test]
    fn test_recent_on_short_history() {
        let mut session = ChatSession::default();
        session.push(ChatMessage::user("hi"));
        assert_eq!(session.recent(PROMPT_WINDOW).len(), 1);
    }
}
