//! In-memory registry of live chat sessions.
//!
//! Each session sits behind its own async mutex so that interactions on the
//! same session run one at a time while different sessions proceed in
//! parallel. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use vchat_models::SessionId;
use vchat_session::ChatSession;

use crate::error::{ApiError, ApiResult};

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<ChatSession>>;

pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Open a new empty session.
    ///
    /// Fails with [`ApiError::SessionLimit`] once `max_sessions` are live.
    pub async fn create(&self) -> ApiResult<(SessionId, DateTime<Utc>)> {
        let session = ChatSession::new();
        let id = session.id().clone();
        let created_at = session.created_at();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(ApiError::SessionLimit);
        }
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        debug!(session_id = %id, live = sessions.len(), "Session created");

        Ok((id, created_at))
    }

    pub async fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session and its history. Returns false if it did not exist.
    pub async fn remove(&self, id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Remove sessions idle for longer than `ttl`.
    ///
    /// Sessions with an interaction in flight are locked and never expire.
    pub async fn expire_idle(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => !session.is_expired(ttl, now),
            Err(_) => true,
        });
        before - sessions.len()
    }
}
