//! Conversation-history collaborator.
//!
//! The orchestrator reads a bounded, chronologically ordered suffix of the
//! conversation to build prompts. Implementations: in-memory window (see
//! `nightjar-memory`), or any persistent store owned by the host app.

use async_trait::async_trait;
use crate::error::MemoryError;
use crate::message::ConversationTurn;

#[async_trait]
pub trait ConversationHistory: Send + Sync {
    /// The newest `limit` turns, oldest first.
    async fn recent_turns(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<ConversationTurn>, MemoryError>;

    /// Drop the cached conversation window.
    ///
    /// Called after the remote service rejects a prompt as too large.
    /// Read-only stores may leave the default no-op.
    async fn reset_window(&self) -> std::result::Result<(), MemoryError> {
        Ok(())
    }
}
