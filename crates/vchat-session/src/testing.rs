//! Scripted in-memory model service for tests.
//!
//! Status checks replay a fixed sequence of states; generation answers are
//! canned per prompt. Every call is counted so tests can assert on what the
//! pipeline did.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use vchat_gemini::{GeminiError, GeminiResult, VideoModelService};
use vchat_models::{AssetName, AssetState, RemoteVideoAsset, DEFAULT_MIME_TYPE};

const SCRIPTED_ASSET: &str = "files/scripted";

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub path: PathBuf,
    pub mime_type: String,
    pub display_name: String,
    /// Size of the scratch file at upload time
    pub size: u64,
}

/// How a scripted generation call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// HTTP 500 from the service
    Api,
    /// The request ran past its timeout
    Timeout,
}

impl ScriptedFailure {
    fn into_error(self, prompt: &str) -> GeminiError {
        match self {
            ScriptedFailure::Api => GeminiError::Api {
                status: 500,
                message: format!("scripted failure for '{}'", prompt),
            },
            ScriptedFailure::Timeout => GeminiError::Timeout,
        }
    }
}

#[derive(Default)]
pub struct ScriptedService {
    states: Mutex<VecDeque<AssetState>>,
    responses: Mutex<HashMap<String, Option<String>>>,
    failing_prompts: Mutex<HashMap<String, ScriptedFailure>>,
    uploads: Mutex<Vec<UploadRecord>>,
    prompts: Mutex<Vec<String>>,
    status_calls: AtomicU32,
    delete_calls: AtomicU32,
    inactive_generate_calls: AtomicU32,
    fail_upload: bool,
    fail_delete: bool,
    generate_delay: Option<Duration>,
}

impl ScriptedService {
    /// Status checks return `states` in order; the last state repeats.
    pub fn new(states: Vec<AssetState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            ..Default::default()
        }
    }

    /// Canned answer for one prompt (`None` = no text in the response).
    pub fn with_response(self, prompt: &str, response: Option<&str>) -> Self {
        lock(&self.responses).insert(prompt.to_string(), response.map(str::to_string));
        self
    }

    /// Generation for this prompt fails with an API error.
    pub fn with_failing_prompt(self, prompt: &str) -> Self {
        self.with_prompt_failure(prompt, ScriptedFailure::Api)
    }

    /// Generation for this prompt fails the given way.
    pub fn with_prompt_failure(self, prompt: &str, failure: ScriptedFailure) -> Self {
        lock(&self.failing_prompts).insert(prompt.to_string(), failure);
        self
    }

    pub fn with_failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn with_failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Every generation call sleeps this long before answering.
    pub fn with_generate_delay(mut self, delay: Duration) -> Self {
        self.generate_delay = Some(delay);
        self
    }

    /// The asset as returned right after upload.
    pub fn processing_asset(&self) -> RemoteVideoAsset {
        let mime_type = lock(&self.uploads)
            .last()
            .map(|u| u.mime_type.clone())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        RemoteVideoAsset {
            name: AssetName::new(SCRIPTED_ASSET),
            uri: format!("https://scripted.test/v1beta/{}", SCRIPTED_ASSET),
            mime_type,
            state: AssetState::Processing,
            display_name: None,
            size_bytes: None,
            error: None,
        }
    }

    pub fn uploads(&self) -> Vec<UploadRecord> {
        lock(&self.uploads).clone()
    }

    /// Prompts sent to `generate`, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn status_calls(&self) -> u32 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u32 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Generation calls made against an asset that was not `Active`.
    pub fn inactive_generate_calls(&self) -> u32 {
        self.inactive_generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoModelService for ScriptedService {
    async fn upload(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> GeminiResult<RemoteVideoAsset> {
        if self.fail_upload {
            return Err(GeminiError::upload_failed("scripted upload failure"));
        }

        let size = tokio::fs::metadata(path).await?.len();
        lock(&self.uploads).push(UploadRecord {
            path: path.to_path_buf(),
            mime_type: mime_type.to_string(),
            display_name: display_name.to_string(),
            size,
        });

        let mut asset = self.processing_asset();
        asset.display_name = Some(display_name.to_string());
        asset.size_bytes = Some(size);
        Ok(asset)
    }

    async fn get_file(&self, name: &AssetName) -> GeminiResult<RemoteVideoAsset> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let state = {
            let mut states = lock(&self.states);
            if states.len() > 1 {
                states.pop_front()
            } else {
                states.front().copied()
            }
        }
        .unwrap_or(AssetState::Processing);

        let mut asset = self.processing_asset();
        asset.name = name.clone();
        asset.state = state;
        if state == AssetState::Failed {
            asset.error = Some("scripted processing failure".to_string());
        }
        Ok(asset)
    }

    async fn generate(
        &self,
        asset: &RemoteVideoAsset,
        prompt: &str,
        _timeout: Duration,
    ) -> GeminiResult<Option<String>> {
        if !asset.state.permits_generation() {
            self.inactive_generate_calls.fetch_add(1, Ordering::SeqCst);
        }
        lock(&self.prompts).push(prompt.to_string());

        if let Some(delay) = self.generate_delay {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.failing_prompts).get(prompt).copied();
        if let Some(failure) = failure {
            return Err(failure.into_error(prompt));
        }

        let canned = lock(&self.responses).get(prompt).cloned();
        Ok(canned.unwrap_or_else(|| Some(format!("Response to: {}", prompt))))
    }

    async fn delete(&self, name: &AssetName) -> GeminiResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(GeminiError::Api {
                status: 503,
                message: format!("scripted delete failure for {}", name),
            });
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
