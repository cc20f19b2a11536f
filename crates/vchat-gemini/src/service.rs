//! Outbound contract of the hosted video model.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use vchat_models::{AssetName, RemoteVideoAsset};

use crate::error::GeminiResult;

/// Upload / status / generate / delete contract of the hosted model.
///
/// `GeminiClient` is the production implementation; the session pipeline only
/// depends on this trait.
#[async_trait]
pub trait VideoModelService: Send + Sync {
    /// Store a local file remotely and return its handle and initial state.
    async fn upload(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: &str,
    ) -> GeminiResult<RemoteVideoAsset>;

    /// Re-fetch a stored file, including its current processing state.
    async fn get_file(&self, name: &AssetName) -> GeminiResult<RemoteVideoAsset>;

    /// Ask the model one question about a ready asset.
    ///
    /// Returns `None` when the model produced no text.
    async fn generate(
        &self,
        asset: &RemoteVideoAsset,
        prompt: &str,
        timeout: Duration,
    ) -> GeminiResult<Option<String>>;

    /// Delete a stored file by handle.
    async fn delete(&self, name: &AssetName) -> GeminiResult<()>;
}
