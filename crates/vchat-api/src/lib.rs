//! Axum HTTP API server for chatting with uploaded videos.
//!
//! This crate provides:
//! - An upload page and JSON/markdown session endpoints
//! - In-memory sessions with idle expiry
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{SessionStore, SessionSweeper};
pub use state::AppState;
