//! Session middleware configuration.
//!
//! Sessions live in process memory. They carry the signed-in user's backend
//! token, a one-shot flash notice and the signed-out visitor's cart.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use crate::config::StorefrontConfig;
use crate::models::{Flash, SessionCart, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopora_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Queue a notice for the next rendered page.
pub async fn set_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(session_keys::FLASH, flash).await {
        tracing::warn!(error = %e, "failed to store flash notice");
    }
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read flash notice");
            None
        })
}

/// The signed-out visitor's cart, empty when none was stored.
pub async fn load_cart(session: &Session) -> SessionCart {
    session
        .get::<SessionCart>(session_keys::CART)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read session cart");
            None
        })
        .unwrap_or_default()
}

/// Persist the signed-out visitor's cart.
pub async fn store_cart(session: &Session, cart: &SessionCart) {
    if let Err(e) = session.insert(session_keys::CART, cart).await {
        tracing::warn!(error = %e, "failed to store session cart");
    }
}

/// Remove and return the session cart.
pub async fn take_cart(session: &Session) -> SessionCart {
    session
        .remove::<SessionCart>(session_keys::CART)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to read session cart");
            None
        })
        .unwrap_or_default()
}
