//! Video chat session pipeline.
//!
//! One interaction runs the full remote asset lifecycle:
//! scratch-file staging, upload, readiness poll, generation requests and
//! asset cleanup. Conversation history is carried by an explicit
//! [`ChatSession`] passed in by the caller.

pub mod config;
pub mod error;
pub mod interaction;
pub mod logging;
pub mod poll;
pub mod session;
pub mod staging;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use interaction::{InteractionReport, InteractionRequest, VideoChatPipeline, VideoInput};
pub use logging::InteractionLogger;
pub use poll::{wait_until_active, PollPolicy};
pub use session::ChatSession;
pub use staging::{StagedVideo, StagingWriter};
