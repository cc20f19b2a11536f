//! Readiness poll for remote video assets.
//!
//! After upload the hosted model processes the video before it can be used.
//! The poll re-fetches the asset on a fixed interval until it reaches a
//! terminal state, bounded by an attempt count and an overall deadline, and
//! stops early when the interaction is cancelled.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use vchat_gemini::VideoModelService;
use vchat_models::{AssetState, RemoteVideoAsset};

use crate::error::{SessionError, SessionResult};
use crate::logging::InteractionLogger;

/// Bounds for the readiness poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait between status checks.
    pub interval: Duration,
    /// Maximum number of status checks after the upload returned.
    pub max_attempts: u32,
    /// Overall time budget for the poll.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 60,
            deadline: Duration::from_secs(900),
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Poll until the asset is `Active`.
///
/// Returns the ready asset together with the number of status checks made.
/// `Failed` aborts with [`SessionError::AssetProcessingFailed`]; running out of
/// attempts or time aborts with [`SessionError::PollTimeout`]. Status-fetch
/// errors are not retried.
pub async fn wait_until_active(
    service: &dyn VideoModelService,
    asset: RemoteVideoAsset,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    logger: &InteractionLogger,
) -> SessionResult<(RemoteVideoAsset, u32)> {
    let started = Instant::now();
    let mut attempts = 0u32;
    let mut current = asset;

    loop {
        match current.state {
            AssetState::Active => {
                logger.log_progress(&format!(
                    "{} is ACTIVE after {} status checks",
                    current.name, attempts
                ));
                return Ok((current, attempts));
            }
            AssetState::Failed => {
                let reason = current
                    .error
                    .clone()
                    .unwrap_or_else(|| AssetState::Failed.to_string());
                logger.log_error(&format!("{} failed processing: {}", current.name, reason));
                return Err(SessionError::AssetProcessingFailed {
                    name: current.name,
                    reason,
                });
            }
            AssetState::Uploading | AssetState::Processing => {}
        }

        let elapsed = started.elapsed();
        if attempts >= policy.max_attempts || elapsed >= policy.deadline {
            logger.log_warning(&format!(
                "{} still {} after {} status checks, giving up",
                current.name, current.state, attempts
            ));
            return Err(SessionError::PollTimeout { attempts, elapsed });
        }

        let wait = policy.interval.min(policy.deadline - elapsed);
        debug!(asset = %current.name, state = %current.state, "Waiting {:?} before next status check", wait);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            _ = tokio::time::sleep(wait) => {}
        }

        attempts += 1;
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = service.get_file(&current.name) => result?,
        };

        if !current.state.can_transition_to(next.state) {
            logger.log_warning(&format!(
                "{} reported unexpected transition {} -> {}",
                current.name, current.state, next.state
            ));
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedService;
    use vchat_models::SessionId;

    fn fast_policy() -> PollPolicy {
        PollPolicy::default()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(5)
    }

    fn logger() -> InteractionLogger {
        InteractionLogger::new(&SessionId::from_string("poll-test"))
    }

    #[tokio::test]
    async fn test_processing_then_active() {
        let service = ScriptedService::new(vec![AssetState::Processing, AssetState::Active]);
        let asset = service.processing_asset();

        let (ready, attempts) =
            wait_until_active(&service, asset, &fast_policy(), &CancellationToken::new(), &logger())
                .await
                .unwrap();

        assert_eq!(ready.state, AssetState::Active);
        assert_eq!(attempts, 2);
        assert_eq!(service.status_calls(), 2);
    }

    #[tokio::test]
    async fn test_already_active_skips_polling() {
        let service = ScriptedService::new(vec![]);
        let mut asset = service.processing_asset();
        asset.state = AssetState::Active;

        let (_, attempts) =
            wait_until_active(&service, asset, &fast_policy(), &CancellationToken::new(), &logger())
                .await
                .unwrap();
        assert_eq!(attempts, 0);
        assert_eq!(service.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_aborts() {
        let service = ScriptedService::new(vec![AssetState::Failed]);
        let asset = service.processing_asset();

        let err = wait_until_active(&service, asset, &fast_policy(), &CancellationToken::new(), &logger())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AssetProcessingFailed { .. }));
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let service = ScriptedService::new(vec![AssetState::Processing; 10]);
        let asset = service.processing_asset();

        let err = wait_until_active(&service, asset, &fast_policy(), &CancellationToken::new(), &logger())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PollTimeout { attempts: 5, .. }));
        assert_eq!(service.status_calls(), 5);
    }

    #[tokio::test]
    async fn test_deadline_is_bounded() {
        let service = ScriptedService::new(vec![AssetState::Processing; 100]);
        let asset = service.processing_asset();
        let policy = PollPolicy::default()
            .with_interval(Duration::from_millis(20))
            .with_max_attempts(100)
            .with_deadline(Duration::from_millis(50));

        let err = wait_until_active(&service, asset, &policy, &CancellationToken::new(), &logger())
            .await
            .unwrap_err();
        match err {
            SessionError::PollTimeout { attempts, .. } => assert!(attempts < 100),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_stops_poll() {
        let service = ScriptedService::new(vec![AssetState::Processing; 10]);
        let asset = service.processing_asset();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = wait_until_active(&service, asset, &fast_policy(), &cancel, &logger())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Cancelled));
        assert_eq!(service.status_calls(), 0);
    }
}
