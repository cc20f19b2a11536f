//! Gemini REST wire types.

use serde::{Deserialize, Serialize};

use vchat_models::{AssetName, AssetState, RemoteVideoAsset};

/// Body of the resumable upload start request.
#[derive(Debug, Serialize)]
pub(crate) struct CreateFileRequest {
    pub file: FileMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileMetadata {
    pub display_name: String,
}

/// Response of the finalize upload request.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadFileResponse {
    pub file: FileResource,
}

/// A file as returned by the Files API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileResource {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mime_type: String,
    /// int64 values are encoded as JSON strings
    #[serde(default)]
    pub size_bytes: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(default = "processing")]
    pub state: AssetState,
    #[serde(default)]
    pub error: Option<FileStatus>,
}

fn processing() -> AssetState {
    AssetState::Processing
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileStatus {
    #[serde(default)]
    pub message: String,
}

impl FileResource {
    pub fn into_asset(self) -> RemoteVideoAsset {
        RemoteVideoAsset {
            name: AssetName::new(self.name),
            uri: self.uri,
            mime_type: self.mime_type,
            state: self.state,
            display_name: self.display_name,
            size_bytes: self.size_bytes.and_then(|s| s.parse().ok()),
            error: self.error.map(|e| e.message).filter(|m| !m.is_empty()),
        }
    }
}

/// `generateContent` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn file(asset: &RemoteVideoAsset) -> Self {
        Self {
            file_data: Some(FileData {
                mime_type: asset.mime_type.clone(),
                file_uri: asset.uri.clone(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileData {
    pub mime_type: String,
    pub file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

/// `generateContent` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any text exists.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}
