//! Session-related types.
//!
//! Types stored in the session for authentication state.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use shopora_core::{UserId, UserRole};

use crate::backend::AuthResponse;

/// Session-stored user identity.
///
/// Holds the backend bearer token for the signed-in shopper. Implements
/// `Debug` manually so the token never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend user ID, when the login response carried one.
    pub id: Option<UserId>,
    pub email: String,
    pub roles: Vec<UserRole>,
    token: String,
}

impl CurrentUser {
    /// Build the session identity from a successful login.
    ///
    /// Falls back to the submitted email when the backend omits it.
    #[must_use]
    pub fn from_auth(auth: AuthResponse, submitted_email: &str) -> Self {
        Self {
            id: auth.user_id,
            email: auth.email.unwrap_or_else(|| submitted_email.to_string()),
            roles: auth.user_roles,
            token: auth.token,
        }
    }

    /// Bearer token for backend calls made on this user's behalf.
    #[must_use]
    pub fn token(&self) -> SecretString {
        SecretString::from(self.token.clone())
    }

    /// Whether the user may open the seller dashboards.
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.roles.iter().any(UserRole::is_seller)
    }

    /// Whether the user administers companies.
    #[must_use]
    pub fn is_company_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|r| matches!(r, UserRole::CompanyAdminSeller | UserRole::AppAdmin))
    }

    /// Whether the user runs the storefront itself (catalog administration).
    #[must_use]
    pub fn is_app_admin(&self) -> bool {
        self.roles.contains(&UserRole::AppAdmin)
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// One-shot notice shown on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub success: bool,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the pending flash notice.
    pub const FLASH: &str = "flash";

    /// Key for the signed-out visitor's cart.
    pub const CART: &str = "cart";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn auth(roles: &str) -> AuthResponse {
        serde_json::from_str(&format!(
            r#"{{"token": "jwt-secret", "userId": 4, "userRoles": {roles}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_from_auth_falls_back_to_submitted_email() {
        let user = CurrentUser::from_auth(auth(r#"["ROLE_BUYER"]"#), "me@shop.fr");
        assert_eq!(user.email, "me@shop.fr");
        assert_eq!(user.id, Some(UserId::new(4)));
        assert!(!user.is_seller());
    }

    #[test]
    fn test_roles() {
        let seller = CurrentUser::from_auth(auth(r#"["ROLE_SELLER"]"#), "s@shop.fr");
        assert!(seller.is_seller());
        assert!(!seller.is_company_admin());

        let admin = CurrentUser::from_auth(auth(r#"["ROLE_COMPANY_ADMIN_SELLER"]"#), "a@shop.fr");
        assert!(admin.is_seller());
        assert!(admin.is_company_admin());
        assert!(!admin.is_app_admin());

        let app_admin = CurrentUser::from_auth(auth(r#"["ROLE_APP_ADMIN"]"#), "root@shop.fr");
        assert!(app_admin.is_app_admin());
    }

    #[test]
    fn test_debug_redacts_token() {
        let user = CurrentUser::from_auth(auth("[]"), "me@shop.fr");
        assert!(!format!("{user:?}").contains("jwt-secret"));
    }

    #[test]
    fn test_session_round_trip_keeps_token() {
        let user = CurrentUser::from_auth(auth(r#"["ROLE_SELLER"]"#), "s@shop.fr");
        let json = serde_json::to_string(&user).unwrap();
        let back: CurrentUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}
