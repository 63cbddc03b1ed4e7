use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::LogEntry;

#[derive(Debug, Default)]
struct Collections {
    /// Rows loaded from the records table (or seed data).
    remote: Vec<LogEntry>,
    /// Records created by ingestion during this session.
    local: Vec<LogEntry>,
}

/// In-memory LogEntry collection for the session. Records are appended, never edited.
#[derive(Clone, Default)]
pub struct LogStore {
    inner: Arc<RwLock<Collections>>,
}

impl LogStore {
    pub fn new(remote: Vec<LogEntry>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collections {
                remote,
                local: Vec::new(),
            })),
        }
    }

    /// All records ordered by timestamp (ties keep insertion order).
    pub async fn snapshot(&self) -> Vec<LogEntry> {
        let guard = self.inner.read().await;
        let mut all: Vec<LogEntry> = guard.remote.iter().chain(guard.local.iter()).cloned().collect();
        all.sort_by_key(|e| e.timestamp);
        all
    }

    pub async fn extend(&self, entries: impl IntoIterator<Item = LogEntry>) -> usize {
        let mut guard = self.inner.write().await;
        let before = guard.local.len();
        guard.local.extend(entries);
        guard.local.len() - before
    }

    /// Replaces previously loaded table rows; ingested records stay.
    pub async fn replace_remote(&self, entries: Vec<LogEntry>) {
        self.inner.write().await.remote = entries;
    }

    pub async fn len(&self) -> usize {
        let guard = self.inner.read().await;
        guard.remote.len() + guard.local.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::seed::sample_logs;

    #[tokio::test]
    async fn test_snapshot_is_time_ordered() {
        let mut logs = sample_logs();
        logs.reverse();
        let store = LogStore::new(logs);
        let snapshot = store.snapshot().await;
        assert!(snapshot.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_replace_remote_keeps_local() {
        let logs = sample_logs();
        let store = LogStore::new(logs.clone());
        let added = store.extend(vec![logs[0].clone()]).await;
        assert_eq!(added, 1);
        store.replace_remote(Vec::new()).await;
        assert_eq!(store.len().await, 1);
    }
}
