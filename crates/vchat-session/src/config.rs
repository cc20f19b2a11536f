//! Session pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use vchat_gemini::GENERATION_TIMEOUT;

use crate::poll::PollPolicy;

/// Session pipeline configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory for scratch copies of uploaded videos
    pub scratch_dir: PathBuf,
    /// Readiness poll bounds
    pub poll: PollPolicy,
    /// Timeout for each generation request
    pub generation_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir(),
            poll: PollPolicy::default(),
            generation_timeout: GENERATION_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = PollPolicy::default();
        Self {
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            poll: PollPolicy {
                interval: Duration::from_secs(
                    std::env::var("POLL_INTERVAL_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(defaults.interval.as_secs()),
                ),
                max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_attempts),
                deadline: Duration::from_secs(
                    std::env::var("POLL_DEADLINE_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(defaults.deadline.as_secs()),
                ),
            },
            generation_timeout: GENERATION_TIMEOUT,
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}
