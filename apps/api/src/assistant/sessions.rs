use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatSession, PROMPT_WINDOW};

/// Sessions kept when no limit is configured.
pub const DEFAULT_MAX_SESSIONS: usize = 256;

#[derive(Debug, Default)]
struct Slot {
    session: ChatSession,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Sessions {
    slots: HashMap<Uuid, Slot>,
    clock: u64,
}

/// Chat histories keyed by session id. Holds at most `max_sessions`; the least
/// recently used session is evicted first.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Sessions>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Sessions::default())),
            max_sessions: max_sessions.max(1),
        }
    }

    /// The last `PROMPT_WINDOW` messages of a session, oldest first.
    pub async fn history(&self, id: Uuid) -> Vec<ChatMessage> {
        self.inner
            .read()
            .await
            .slots
            .get(&id)
            .map(|slot| slot.session.recent(PROMPT_WINDOW).to_vec())
            .unwrap_or_default()
    }

    pub async fn record_exchange(&self, id: Uuid, question: &str, answer: &str) {
        let mut guard = self.inner.write().await;
        guard.clock += 1;
        let now = guard.clock;

        let slot = guard.slots.entry(id).or_default();
        slot.session.record_exchange(question, answer);
        slot.last_used = now;

        while guard.slots.len() > self.max_sessions {
            let Some(oldest) = guard
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| *id)
            else {
                break;
            };
            guard.slots.remove(&oldest);
            debug!(session = %oldest, "Evicted chat session");
        }
    }

    /// Messages held for one session.
    pub async fn message_count(&self, id: Uuid) -> usize {
        self.inner
            .read()
            .await
            .slots
            .get(&id)
            .map_or(0, |slot| slot.session.message_count())
    }

    pub async fn session_count(&self) -> usize {
        self.inner.read().await.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ChatRole, MAX_HISTORY};

    #[tokio::test]
    async fn test_history_window_and_cap() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        assert!(store.history(id).await.is_empty());

        for i in 0..15 {
            store
                .record_exchange(id, &format!("q{i}"), &format!("a{i}"))
                .await;
        }
        assert_eq!(store.message_count(id).await, MAX_HISTORY);

        let history = store.history(id).await;
        assert_eq!(history.len(), PROMPT_WINDOW);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history.last().unwrap().content, "a14");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store.record_exchange(a, "q", "a").await;
        assert_eq!(store.message_count(a).await, 2);
        assert_eq!(store.message_count(b).await, 0);
    }

    #[tokio::test]
    async fn test_anonymous_sessions_are_bounded() {
        let store = SessionStore::new(16);
        for _ in 0..1000 {
            store.record_exchange(Uuid::new_v4(), "q", "a").await;
        }
        assert_eq!(store.session_count().await, 16);
    }

    #[tokio::test]
    async fn test_least_recently_used_session_is_evicted() {
        let store = SessionStore::new(2);
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        store.record_exchange(a, "q1", "a1").await;
        store.record_exchange(b, "q1", "a1").await;
        store.record_exchange(a, "q2", "a2").await;
        store.record_exchange(c, "q1", "a1").await;

        assert_eq!(store.message_count(a).await, 4);
        assert_eq!(store.message_count(b).await, 0);
        assert_eq!(store.message_count(c).await, 2);
    }
}
