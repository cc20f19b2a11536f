//! Session bookkeeping services.

pub mod session_store;
pub mod session_sweeper;

pub use session_store::{SessionHandle, SessionStore};
pub use session_sweeper::SessionSweeper;
