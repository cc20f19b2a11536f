//! Request handlers.

pub mod health;
pub mod index;
pub mod interactions;
pub mod sessions;

pub use health::*;
pub use index::*;
pub use interactions::*;
pub use sessions::*;
