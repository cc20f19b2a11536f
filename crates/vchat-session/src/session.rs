//! Session context carried across interactions.

use chrono::{DateTime, Duration, Utc};

use vchat_models::{ConversationHistory, ConversationTurn, SessionId};

/// One user's chat session: identity plus the ordered Q&A history.
///
/// Lives in memory only; dropping the session drops its history.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_active_at: now,
            history: ConversationHistory::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Append an answered prompt to the history.
    pub fn record_turn(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.history.push(ConversationTurn::new(prompt, response));
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    /// Check if the session has been idle for longer than `ttl`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_active_at > ttl
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
