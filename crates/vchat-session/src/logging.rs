//! Structured interaction logging.
//!
//! Every lifecycle step of one interaction is logged with the same
//! `session_id` / `interaction_id` fields so a single upload can be followed
//! through staging, polling, generation and cleanup.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

use vchat_models::SessionId;

#[derive(Debug, Clone)]
pub struct InteractionLogger {
    session_id: String,
    interaction_id: String,
}

impl InteractionLogger {
    /// Create a logger for a fresh interaction within a session.
    pub fn new(session_id: &SessionId) -> Self {
        Self {
            session_id: session_id.to_string(),
            interaction_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            interaction_id = %self.interaction_id,
            "Interaction started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            interaction_id = %self.interaction_id,
            "Interaction progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            interaction_id = %self.interaction_id,
            "Interaction warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            interaction_id = %self.interaction_id,
            "Interaction error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            interaction_id = %self.interaction_id,
            "Interaction completed: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn interaction_id(&self) -> &str {
        &self.interaction_id
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "interaction",
            session_id = %self.session_id,
            interaction_id = %self.interaction_id
        )
    }
}
