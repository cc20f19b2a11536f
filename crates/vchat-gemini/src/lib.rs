//! Gemini client for video question answering.
//!
//! This crate provides:
//! - Resumable video upload to the Gemini Files API
//! - File status lookup for readiness polling
//! - `generateContent` requests that pair an uploaded file with a prompt
//! - File deletion
//! - The `VideoModelService` trait the session pipeline is written against

pub mod client;
pub mod config;
pub mod error;
pub mod service;
mod types;

pub use client::GeminiClient;
pub use config::{GeminiConfig, GenerationSettings, GENERATION_SETTINGS, GENERATION_TIMEOUT};
pub use error::{GeminiError, GeminiResult};
pub use service::VideoModelService;
