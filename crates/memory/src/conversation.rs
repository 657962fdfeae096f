//! In-memory conversation window.
//!
//! Keeps the newest turns of the current session in a [`BoundedCache`]
//! keyed by insertion sequence, so the oldest turn is evicted once the
//! window is full. Turns older than the retention period are pruned.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use nightjar_core::error::MemoryError;
use nightjar_core::history::ConversationHistory;
use nightjar_core::message::ConversationTurn;
use tokio::sync::Mutex;
use tracing::debug;

use crate::bounded::BoundedCache;

struct Window {
    turns: BoundedCache<u64, ConversationTurn>,
    next_seq: u64,
}

/// A [`ConversationHistory`] backed by a bounded in-memory window.
pub struct InMemoryConversationStore {
    window: Mutex<Window>,
    retention: Duration,
}

impl InMemoryConversationStore {
    pub fn new(max_turns: usize, retention_days: u32) -> Self {
        Self {
            window: Mutex::new(Window {
                turns: BoundedCache::new(max_turns),
                next_seq: 0,
            }),
            retention: Duration::days(i64::from(retention_days)),
        }
    }

    /// Append a turn, pruning expired ones first.
    pub async fn push(&self, turn: ConversationTurn) {
        let mut window = self.window.lock().await;
        let cutoff = Utc::now() - self.retention;
        window.turns.retain(|t| t.created_at >= cutoff);

        let seq = window.next_seq;
        window.next_seq += 1;
        if let Some(evicted) = window.turns.set(seq, turn) {
            debug!(seq = evicted, "Conversation window full, dropped oldest turn");
        }
    }

    /// Drop turns created before `now - retention`. Returns how many were removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let removed = self.window.lock().await.turns.retain(|t| t.created_at >= cutoff);
        if removed > 0 {
            debug!(removed, "Pruned expired conversation turns");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.window.lock().await.turns.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.window.lock().await.turns.is_empty()
    }
}

#[async_trait]
impl ConversationHistory for InMemoryConversationStore {
    async fn recent_turns(&self, limit: usize) -> Result<Vec<ConversationTurn>, MemoryError> {
        let window = self.window.lock().await;
        let mut turns: Vec<(u64, ConversationTurn)> = window
            .turns
            .iter_oldest_first()
            .map(|(seq, turn)| (*seq, turn.clone()))
            .collect();
        turns.sort_by_key(|(seq, _)| *seq);

        let skip = turns.len().saturating_sub(limit);
        Ok(turns.into_iter().skip(skip).map(|(_, turn)| turn).collect())
    }

    async fn reset_window(&self) -> Result<(), MemoryError> {
        let mut window = self.window.lock().await;
        let dropped = window.turns.len();
        window.turns.clear();
        debug!(dropped, "Conversation window reset");
        Ok(())
    }
}
