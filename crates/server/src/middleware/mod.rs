//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID
//! 4. Response headers (`nosniff`, frame denial)
//! 5. Session layer (tower-sessions with `MemoryStore`)
//!
//! Authentication is enforced per handler through the extractors in
//! [`auth`].

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalUser, RequireAdmin, RequireCustomer, clear_current_user, set_current_user,
};
pub use flash::{push_flash, take_flashes};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
