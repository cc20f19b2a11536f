//! One upload → poll → generate → delete interaction.
//!
//! The remote asset is deleted exactly once for every interaction that got
//! as far as an upload, whether polling and generation succeeded, failed or
//! were cancelled. Delete failures are logged and reported, never retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use vchat_gemini::{GeminiError, VideoModelService};
use vchat_models::{
    parse_key_moments, AssetName, RemoteVideoAsset, UploadedVideo, KEY_MOMENTS_FALLBACK,
    KEY_MOMENTS_PROMPT, SUMMARY_FALLBACK, SUMMARY_PROMPT,
};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::logging::InteractionLogger;
use crate::poll::wait_until_active;
use crate::session::ChatSession;
use crate::staging::StagedVideo;

/// The video half of a request.
#[derive(Debug)]
pub enum VideoInput {
    /// Bytes held in memory, staged when the interaction starts
    Memory(UploadedVideo),
    /// Already streamed into a scratch file
    Staged(StagedVideo),
}

impl VideoInput {
    pub fn filename(&self) -> &str {
        match self {
            VideoInput::Memory(video) => &video.filename,
            VideoInput::Staged(staged) => staged.filename(),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            VideoInput::Memory(video) => video.len() as u64,
            VideoInput::Staged(staged) => staged.size(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the user submitted.
#[derive(Debug)]
pub struct InteractionRequest {
    pub video: VideoInput,
    /// Free-text question; blank prompts are ignored
    pub prompt: Option<String>,
}

impl InteractionRequest {
    pub fn new(video: UploadedVideo) -> Self {
        Self {
            video: VideoInput::Memory(video),
            prompt: None,
        }
    }

    pub fn staged(video: StagedVideo) -> Self {
        Self {
            video: VideoInput::Staged(video),
            prompt: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    fn user_prompt(&self) -> Option<String> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

/// Outcome of a completed interaction.
#[derive(Debug, Clone)]
pub struct InteractionReport {
    pub interaction_id: String,
    pub asset: AssetName,
    pub mime_type: String,
    /// The user's prompt, when one was submitted
    pub prompt: Option<String>,
    /// Response to `prompt`
    pub answer: Option<String>,
    pub summary: String,
    pub key_moments: Vec<String>,
    /// Status checks made before the asset became ready
    pub poll_attempts: u32,
    /// Time from upload until the asset became ready
    pub processing_time: Duration,
    /// Total time spent in generation requests
    pub generation_time: Duration,
    /// Whether the remote asset was deleted afterwards
    pub asset_deleted: bool,
}

/// Generated texts before cleanup.
struct Conversation {
    asset: RemoteVideoAsset,
    answer: Option<String>,
    summary: String,
    key_moments: Vec<String>,
    poll_attempts: u32,
    processing_time: Duration,
    generation_time: Duration,
}

/// Runs interactions against a hosted model service.
#[derive(Clone)]
pub struct VideoChatPipeline {
    service: Arc<dyn VideoModelService>,
    config: SessionConfig,
}

impl VideoChatPipeline {
    pub fn new(service: Arc<dyn VideoModelService>, config: SessionConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one interaction and record the answered prompt in `session`.
    ///
    /// `cancel` stops the readiness poll and any in-flight generation; cleanup
    /// of the remote asset and the scratch file still runs.
    pub async fn run(
        &self,
        session: &mut ChatSession,
        request: InteractionRequest,
        cancel: &CancellationToken,
    ) -> SessionResult<InteractionReport> {
        let logger = InteractionLogger::new(session.id());
        let span = logger.create_span();
        self.run_logged(session, request, cancel, &logger)
            .instrument(span)
            .await
    }

    async fn run_logged(
        &self,
        session: &mut ChatSession,
        request: InteractionRequest,
        cancel: &CancellationToken,
        logger: &InteractionLogger,
    ) -> SessionResult<InteractionReport> {
        logger.log_start(&format!(
            "{} ({} bytes)",
            request.video.filename(),
            request.video.len()
        ));

        let prompt = request.user_prompt();

        let staged = match request.video {
            VideoInput::Memory(video) => StagedVideo::write(&self.config.scratch_dir, video)
                .await
                .inspect_err(|e| {
                    if e.is_client_error() {
                        logger.log_warning(&format!("Rejected upload: {}", e));
                    } else {
                        logger.log_error(&e.to_string());
                    }
                })?,
            VideoInput::Staged(staged) => staged,
        };
        let display_name = staged.filename().to_string();

        let asset = self
            .service
            .upload(staged.path(), staged.mime_type(), &display_name)
            .await
            .map_err(|e| {
                logger.log_error(&format!("Upload failed: {}", e));
                SessionError::from(e)
            })?;
        logger.log_progress(&format!("uploaded as {} ({})", asset.name, asset.state));

        let name = asset.name.clone();
        let mime_type = staged.mime_type().to_string();

        let outcome = self.converse(session, asset, prompt.clone(), cancel, logger).await;
        let asset_deleted = self.cleanup(&name, logger).await;
        drop(staged);

        match outcome {
            Ok(conversation) => {
                logger.log_completion(&format!(
                    "{} answered after {} status checks",
                    conversation.asset.name, conversation.poll_attempts
                ));
                Ok(InteractionReport {
                    interaction_id: logger.interaction_id().to_string(),
                    asset: name,
                    mime_type,
                    prompt,
                    answer: conversation.answer,
                    summary: conversation.summary,
                    key_moments: conversation.key_moments,
                    poll_attempts: conversation.poll_attempts,
                    processing_time: conversation.processing_time,
                    generation_time: conversation.generation_time,
                    asset_deleted,
                })
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Wait for the asset, then ask the user's question, the summary and the
    /// key moments, in that order.
    async fn converse(
        &self,
        session: &mut ChatSession,
        asset: RemoteVideoAsset,
        prompt: Option<String>,
        cancel: &CancellationToken,
        logger: &InteractionLogger,
    ) -> SessionResult<Conversation> {
        let started = Instant::now();
        let (asset, poll_attempts) =
            wait_until_active(self.service.as_ref(), asset, &self.config.poll, cancel, logger).await?;
        let processing_time = started.elapsed();

        let started = Instant::now();
        let answer = match prompt {
            Some(prompt) => {
                let text = self
                    .generate(&asset, &prompt, cancel)
                    .await?
                    .ok_or(SessionError::EmptyResponse)?;
                session.record_turn(prompt, text.clone());
                Some(text)
            }
            None => None,
        };

        let summary = self
            .generate(&asset, SUMMARY_PROMPT, cancel)
            .await?
            .unwrap_or_else(|| SUMMARY_FALLBACK.to_string());

        let key_moments_text = self
            .generate(&asset, KEY_MOMENTS_PROMPT, cancel)
            .await?
            .unwrap_or_else(|| KEY_MOMENTS_FALLBACK.to_string());
        let key_moments = parse_key_moments(&key_moments_text);

        Ok(Conversation {
            asset,
            answer,
            summary,
            key_moments,
            poll_attempts,
            processing_time,
            generation_time: started.elapsed(),
        })
    }

    async fn generate(
        &self,
        asset: &RemoteVideoAsset,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> SessionResult<Option<String>> {
        if !asset.is_ready() {
            return Err(SessionError::AssetNotReady {
                name: asset.name.clone(),
                state: asset.state,
            });
        }

        let started = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = self.service.generate(asset, prompt, self.config.generation_timeout) => result,
        };
        debug!(asset = %asset.name, elapsed_ms = started.elapsed().as_millis() as u64, "Generation finished");

        match result {
            Ok(text) => Ok(text),
            Err(GeminiError::Timeout) => Err(SessionError::GenerationTimeout),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the remote asset once; failures are logged, not propagated.
    async fn cleanup(&self, name: &AssetName, logger: &InteractionLogger) -> bool {
        match self.service.delete(name).await {
            Ok(()) => {
                logger.log_progress(&format!("deleted {}", name));
                true
            }
            Err(e) => {
                logger.log_warning(&format!("Failed to delete {}: {}", name, e));
                false
            }
        }
    }
}
