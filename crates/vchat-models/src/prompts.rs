//! Fixed prompts sent alongside every uploaded video.

/// Prompt for the automatic summary.
pub const SUMMARY_PROMPT: &str = "Summarize the video content.";

/// Prompt for the automatic key-moments list.
pub const KEY_MOMENTS_PROMPT: &str = "List the key moments from the video.";

/// Shown when the summary response carries no text.
pub const SUMMARY_FALLBACK: &str = "No summary available";

/// Shown when the key-moments response carries no text.
pub const KEY_MOMENTS_FALLBACK: &str = "No key moments available";
