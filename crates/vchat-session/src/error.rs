//! Session error types.

use std::time::Duration;

use thiserror::Error;

use vchat_gemini::GeminiError;
use vchat_models::{AssetName, AssetState, UnsupportedFormat};

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unsupported video format: {0}")]
    UnsupportedFormat(String),

    #[error("Uploaded video is empty")]
    EmptyUpload,

    #[error("Video processing failed for {name}: {reason}")]
    AssetProcessingFailed { name: AssetName, reason: String },

    #[error("Asset {name} is {state}, not ACTIVE")]
    AssetNotReady { name: AssetName, state: AssetState },

    #[error("Video not ready after {attempts} status checks ({elapsed:?})")]
    PollTimeout { attempts: u32, elapsed: Duration },

    #[error("Interaction cancelled")]
    Cancelled,

    #[error("Generation request timed out")]
    GenerationTimeout,

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model service error: {0}")]
    Service(GeminiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Check if the failure came from the user's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SessionError::UnsupportedFormat(_) | SessionError::EmptyUpload
        )
    }
}

impl From<UnsupportedFormat> for SessionError {
    fn from(err: UnsupportedFormat) -> Self {
        Self::UnsupportedFormat(err.filename)
    }
}

impl From<GeminiError> for SessionError {
    fn from(err: GeminiError) -> Self {
        Self::Service(err)
    }
}
