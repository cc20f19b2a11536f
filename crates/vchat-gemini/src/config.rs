//! Gemini client configuration.

use std::fmt;
use std::time::Duration;

use crate::error::{GeminiError, GeminiResult};

/// Environment variable holding the service credential.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY_NEW";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Upper bound for a single generation request.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Fixed model parameters. Not user-configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub model: &'static str,
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

pub const GENERATION_SETTINGS: GenerationSettings = GenerationSettings {
    model: "gemini-1.5-flash",
    temperature: 0.7,
    top_p: 0.9,
    max_output_tokens: 1500,
};

/// Configuration for the Gemini client.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Service root (overridable for tests and proxies)
    pub base_url: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Timeout for the upload start, status and delete calls
    pub request_timeout: Duration,
    /// Timeout for sending the video bytes, which covers the whole body transfer
    pub upload_timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            upload_timeout: Duration::from_secs(3600),
        }
    }

    /// Point the client at a different service root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create config from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GeminiError::config_error(format!("{} not set", API_KEY_ENV)))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(secs) = env_secs("GEMINI_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs("GEMINI_UPLOAD_TIMEOUT_SECS") {
            config.upload_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

fn env_secs(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok()).filter(|&s| s > 0)
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("upload_timeout", &self.upload_timeout)
            .finish()
    }
}
