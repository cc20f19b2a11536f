//! Application state.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use vchat_gemini::{GeminiClient, VideoModelService};
use vchat_session::{SessionConfig, VideoChatPipeline};

use crate::config::ApiConfig;
use crate::services::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<VideoChatPipeline>,
    pub sessions: Arc<SessionStore>,
    /// Root token; cancelled on server shutdown
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create application state backed by the Gemini API.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let client = GeminiClient::from_env()?;
        info!(model = client.settings().model, "Gemini client configured");
        Ok(Self::with_service(config, Arc::new(client), SessionConfig::from_env()))
    }

    /// Create application state around any model service.
    pub fn with_service(
        config: ApiConfig,
        service: Arc<dyn VideoModelService>,
        session_config: SessionConfig,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(config.max_sessions));
        Self {
            config,
            pipeline: Arc::new(VideoChatPipeline::new(service, session_config)),
            sessions,
            shutdown: CancellationToken::new(),
        }
    }
}
