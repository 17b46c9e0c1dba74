//! Session-held models for the storefront.

pub mod cart;
pub mod session;

pub use cart::{SessionCart, SessionCartLine};
pub use session::{CurrentUser, Flash, keys as session_keys};
