//! Types stored in the session.

pub mod session;

pub use session::{CurrentUser, Flash, FlashLevel, keys as session_keys};
