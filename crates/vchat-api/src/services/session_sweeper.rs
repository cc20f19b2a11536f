//! Background service that expires idle sessions.
//!
//! Sessions are in-memory only; the sweeper bounds their lifetime and keeps
//! the store from growing without limit when clients never end a session.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::metrics;
use crate::services::SessionStore;

/// Interval between sweeps.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionSweeper {
    sessions: Arc<SessionStore>,
    ttl: Duration,
    enabled: bool,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionStore>, ttl: Duration) -> Self {
        let enabled = std::env::var("ENABLE_SESSION_SWEEP")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            sessions,
            ttl,
            enabled,
        }
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        if !self.enabled {
            info!("Session sweeping is disabled");
            return;
        }

        info!(
            "Starting session sweeper (interval: {:?}, ttl: {:?})",
            SWEEP_INTERVAL, self.ttl
        );

        let mut ticker = interval(SWEEP_INTERVAL);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session sweeper stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.check_once().await {
                        error!("Session sweep error: {}", e);
                    }
                }
            }
        }
    }

    /// Run a single sweep. Returns the number of expired sessions.
    pub async fn check_once(&self) -> anyhow::Result<usize> {
        let ttl = chrono::Duration::from_std(self.ttl)?;
        let expired = self.sessions.expire_idle(ttl, chrono::Utc::now()).await;
        let live = self.sessions.len().await;

        metrics::set_active_sessions(live);
        if expired > 0 {
            info!("Expired {} idle sessions, {} still live", expired, live);
        }

        Ok(expired)
    }
}
