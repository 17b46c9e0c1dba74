//! Authentication route handlers.
//!
//! Credentials are checked by the backend; the returned bearer token is kept
//! in the server-side session and never reaches the browser.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use super::views::{FieldErrors, PageContext};
use crate::backend::{ApiError, LoginRequest};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user, take_cart};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Enter your password"))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
    pub errors: FieldErrors,
}

/// Only allow local redirect targets after login.
fn safe_next(next: Option<&str>) -> String {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
        .unwrap_or("/")
        .to_string()
}

/// Display the login page.
pub async fn login_page(
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Redirect::to(&next).into_response();
    }

    LoginTemplate {
        ctx: PageContext::load(&session, None).await,
        email: String::new(),
        next,
        error: None,
        errors: FieldErrors::default(),
    }
    .into_response()
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());
    let render = |error: Option<String>, errors: FieldErrors| LoginTemplate {
        ctx: PageContext::default(),
        email: form.email.clone(),
        next: next.clone(),
        error,
        errors,
    };

    if let Err(errors) = form.validate() {
        return render(None, FieldErrors::from_validation(&errors)).into_response();
    }

    let request = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password.clone(),
    };

    let auth = match state.backend().login(&request).await {
        Ok(auth) => auth,
        Err(ApiError::Unauthorized | ApiError::Validation(_) | ApiError::NotFound(_)) => {
            tracing::info!(email = %request.email, "login rejected");
            return render(Some("Invalid email or password.".to_string()), FieldErrors::default())
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            return render(Some(e.user_message()), FieldErrors::default()).into_response();
        }
    };

    let user = CurrentUser::from_auth(auth, &request.email);
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!(error = %e, "failed to store session");
        return render(
            Some("Could not start your session, please try again.".to_string()),
            FieldErrors::default(),
        )
        .into_response();
    }

    merge_session_cart(&state, &session, &user).await;

    let sentry_id = user.id.map_or_else(|| user.email.clone(), |id| id.to_string());
    set_sentry_user(&sentry_id, Some(&user.email));
    tracing::info!(email = %user.email, seller = user.is_seller(), "user signed in");

    Redirect::to(&next).into_response()
}

/// Move the lines collected before login into the backend cart.
///
/// Lines the backend refuses are dropped with a warning; login proceeds.
async fn merge_session_cart(state: &AppState, session: &Session, user: &CurrentUser) {
    let cart = take_cart(session).await;
    if cart.is_empty() {
        return;
    }

    let buyer = state.backend_for(&user.token());
    for line in &cart.lines {
        if let Err(e) = buyer.add_to_cart(line.product_id, line.quantity).await {
            tracing::warn!(
                error = %e,
                product_id = %line.product_id,
                "failed to move session cart line"
            );
        }
    }
    tracing::info!(lines = cart.lines.len(), "session cart merged into backend cart");
}

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "failed to clear session");
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/account/orders")), "/account/orders");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_form_validation() {
        let form = LoginForm {
            email: "not-an-email".to_string(),
            password: String::new(),
            next: None,
        };
        let errors = FieldErrors::from_validation(&form.validate().unwrap_err());
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
        assert_eq!(errors.get("password"), Some("Enter your password"));
    }
}
