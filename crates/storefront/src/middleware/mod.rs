//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAdmin, RequireAuth, RequireSeller, clear_current_user, set_current_user,
};
pub use request_id::{RequestId, request_id_middleware};
pub use session::{
    create_session_layer, load_cart, set_flash, store_cart, take_cart, take_flash,
};
