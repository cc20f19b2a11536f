//! Shared data models for the video chat backend.
//!
//! This crate provides Serde-serializable types for:
//! - Supported video formats and their MIME types
//! - Remote video assets and their processing lifecycle
//! - Conversation turns and session-scoped history
//! - Fixed prompts and key-moment post-processing

pub mod conversation;
pub mod moments;
pub mod prompts;
pub mod video;

// Re-export common types
pub use conversation::{ConversationHistory, ConversationTurn, SessionId};
pub use moments::parse_key_moments;
pub use prompts::{KEY_MOMENTS_FALLBACK, KEY_MOMENTS_PROMPT, SUMMARY_FALLBACK, SUMMARY_PROMPT};
pub use video::{
    AssetName, AssetState, RemoteVideoAsset, UnsupportedFormat, UploadedVideo, VideoFormat,
    DEFAULT_MIME_TYPE,
};
