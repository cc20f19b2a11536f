//! Video format and remote asset models.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// MIME type used by the hosted model when nothing more specific is known.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Upload rejected because its extension is not one of the supported containers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported video format: {filename}")]
pub struct UnsupportedFormat {
    pub filename: String,
}

/// Video container formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Mp4,
    Avi,
    Mov,
    Mkv,
    Flv,
    Wmv,
}

impl VideoFormat {
    /// All supported formats, in upload-picker order.
    pub const ALL: [VideoFormat; 6] = [
        VideoFormat::Mp4,
        VideoFormat::Avi,
        VideoFormat::Mov,
        VideoFormat::Mkv,
        VideoFormat::Flv,
        VideoFormat::Wmv,
    ];

    /// Resolve a format from a bare extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(VideoFormat::Mp4),
            "avi" => Some(VideoFormat::Avi),
            "mov" => Some(VideoFormat::Mov),
            "mkv" => Some(VideoFormat::Mkv),
            "flv" => Some(VideoFormat::Flv),
            "wmv" => Some(VideoFormat::Wmv),
            _ => None,
        }
    }

    /// Resolve a format from a declared filename.
    ///
    /// The extension is whatever follows the last `.`; a name without one is
    /// rejected just like an unknown extension.
    pub fn from_filename(filename: &str) -> Result<Self, UnsupportedFormat> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .ok_or_else(|| UnsupportedFormat {
                filename: filename.to_string(),
            })
    }

    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Avi => "avi",
            VideoFormat::Mov => "mov",
            VideoFormat::Mkv => "mkv",
            VideoFormat::Flv => "flv",
            VideoFormat::Wmv => "wmv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => DEFAULT_MIME_TYPE,
            VideoFormat::Avi => "video/x-msvideo",
            VideoFormat::Mov => "video/quicktime",
            VideoFormat::Mkv => "video/x-matroska",
            VideoFormat::Flv => "video/x-flv",
            VideoFormat::Wmv => "video/x-ms-wmv",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A video received from the user, owned by the handler for one interaction.
#[derive(Debug, Clone)]
pub struct UploadedVideo {
    /// Declared filename (only its extension is trusted)
    pub filename: String,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl UploadedVideo {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
        }
    }

    /// Resolve the container format from the declared filename.
    pub fn format(&self) -> Result<VideoFormat, UnsupportedFormat> {
        VideoFormat::from_filename(&self.filename)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Opaque handle of a file stored by the hosted model (`files/<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetName(pub String);

impl AssetName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AssetName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AssetName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of a remote video asset as seen by this client.
///
/// `Uploading -> Processing -> {Active | Failed}`. Only `Active` permits
/// generation requests; `Active` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetState {
    /// Bytes are still being sent; no handle exists yet
    #[default]
    Uploading,
    /// Stored remotely, not yet usable
    #[serde(alias = "STATE_UNSPECIFIED")]
    Processing,
    /// Ready for generation requests
    Active,
    /// Remote processing failed
    Failed,
}

impl AssetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetState::Uploading => "UPLOADING",
            AssetState::Processing => "PROCESSING",
            AssetState::Active => "ACTIVE",
            AssetState::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetState::Active | AssetState::Failed)
    }

    pub fn permits_generation(&self) -> bool {
        matches!(self, AssetState::Active)
    }

    /// Whether the client-side state machine allows moving to `next`.
    ///
    /// Staying in the same non-terminal state is allowed (a poll that saw no
    /// change); leaving a terminal state is not.
    pub fn can_transition_to(&self, next: AssetState) -> bool {
        use AssetState::*;
        matches!(
            (self, next),
            (Uploading, Processing)
                | (Uploading, Active)
                | (Uploading, Failed)
                | (Processing, Processing)
                | (Processing, Active)
                | (Processing, Failed)
        )
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video stored by the hosted model, referenced only by handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteVideoAsset {
    /// Asset handle
    pub name: AssetName,
    /// URI used to reference the file in generation requests
    pub uri: String,
    pub mime_type: String,
    pub state: AssetState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Failure detail reported by the service (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoteVideoAsset {
    pub fn is_ready(&self) -> bool {
        self.state.permits_generation()
    }
}
