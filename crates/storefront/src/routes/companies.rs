//! Company and role management route handlers, mounted under `/seller`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use shopora_core::{AdminRightsId, CompanyId};
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use super::views::{FieldErrors, PageContext};
use crate::backend::{
    AdminRightsRequest, ApiError, Company, CompanyMember, CompanyRequest, Fetched, LogoUpload,
    MemberAction,
};
use crate::error::{AppError, Result, add_breadcrumb, not_found_as};
use crate::filters;
use crate::middleware::{RequireSeller, set_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Size limit for a company logo.
const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

const COMPANIES_PAGE: &str = "/seller/companies";

// =============================================================================
// View models
// =============================================================================

pub struct MemberView {
    pub name: String,
    pub email: String,
    pub active: bool,
}

impl From<&CompanyMember> for MemberView {
    fn from(member: &CompanyMember) -> Self {
        Self {
            name: member.display_name(),
            email: member.email.clone(),
            active: member.is_active,
        }
    }
}

/// A company the user belongs to.
pub struct CompanyView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub active: bool,
    pub admins: Vec<MemberView>,
    pub sellers: Vec<MemberView>,
}

impl From<&Company> for CompanyView {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id.as_i64(),
            name: company.name.clone(),
            description: company.description.clone(),
            logo_url: company.logo_url.clone(),
            active: company.is_active,
            admins: company.admins.iter().map(MemberView::from).collect(),
            sellers: company.sellers.iter().map(MemberView::from).collect(),
        }
    }
}

/// A pending admin-rights request.
pub struct RequestView {
    pub id: i64,
    pub company: String,
    pub user_id: i64,
    pub requested_at: Option<String>,
}

impl From<&AdminRightsRequest> for RequestView {
    fn from(request: &AdminRightsRequest) -> Self {
        Self {
            id: request.id.as_i64(),
            company: request
                .company_name
                .clone()
                .unwrap_or_else(|| format!("Company #{}", request.company_id)),
            user_id: request.user_id.as_i64(),
            requested_at: request.requested_at.clone(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add, remove, promote or demote a member by email.
#[derive(Debug, Deserialize, Validate)]
pub struct MemberForm {
    pub action: String,
    #[validate(email(message = "Enter the member's email address"))]
    pub email: String,
}

/// Replace a company admin's rights; `rights` is comma-separated.
#[derive(Debug, Deserialize, Validate)]
pub struct RightsForm {
    #[validate(email(message = "Enter the admin's email address"))]
    pub email: String,
    #[serde(default)]
    pub rights: String,
}

impl RightsForm {
    fn rights(&self) -> Vec<String> {
        self.rights
            .split(',')
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

/// Application to become a company admin, read from a multipart body.
#[derive(Debug, Clone, Default, Validate)]
pub struct CompanyForm {
    #[validate(length(min = 2, max = 100, message = "Enter the company name"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Keep the description under 2000 characters"))]
    pub description: String,
    pub address: String,
    pub phone: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "Enter a full website address, starting with https://"))]
    pub website: Option<String>,
}

impl CompanyForm {
    fn set(&mut self, name: &str, value: String) {
        let value = value.trim().to_string();
        let optional = Some(value.clone()).filter(|v| !v.is_empty());
        match name {
            "name" => self.name = value,
            "description" => self.description = value,
            "address" => self.address = value,
            "phone" => self.phone = value,
            "email" => self.email = optional,
            "website" => self.website = optional,
            other => tracing::debug!(field = other, "ignoring company form field"),
        }
    }

    fn to_request(&self) -> CompanyRequest {
        let non_empty = |v: &str| Some(v.to_string()).filter(|v| !v.is_empty());
        CompanyRequest {
            name: self.name.clone(),
            description: non_empty(&self.description),
            address: non_empty(&self.address),
            phone: non_empty(&self.phone),
            email: self.email.clone(),
            website: self.website.clone(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "seller/companies.html")]
pub struct CompaniesTemplate {
    pub ctx: PageContext,
    pub companies: Fetched<Vec<CompanyView>>,
    pub requests: Fetched<Vec<RequestView>>,
    pub is_company_admin: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/company.html")]
pub struct CompanyTemplate {
    pub ctx: PageContext,
    pub company: CompanyView,
    pub is_company_admin: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "seller/company_apply.html")]
pub struct ApplyTemplate {
    pub ctx: PageContext,
    pub form: CompanyForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Flash the outcome of a role action.
async fn flash_outcome(session: &Session, result: std::result::Result<String, ApiError>, what: &str) {
    let flash = match result {
        Ok(message) => Flash::success(message),
        Err(e) => {
            tracing::error!(error = %e, action = what, "company action failed");
            Flash::error(e.user_message())
        }
    };
    set_flash(session, flash).await;
}

/// The user's companies and pending admin requests.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
) -> impl IntoResponse {
    let backend = state.backend_for(&user.token());

    let (companies, requests) = tokio::join!(
        backend.user_companies(),
        backend.pending_admin_requests(),
    );

    CompaniesTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        companies: Fetched::from_list(companies)
            .map(|c| c.iter().map(CompanyView::from).collect::<Vec<_>>()),
        requests: Fetched::from_list(requests)
            .map(|r| r.iter().map(RequestView::from).collect::<Vec<_>>()),
        is_company_admin: user.is_company_admin(),
    }
}

/// One company with its members.
///
/// # Errors
///
/// Returns 404 if the company does not exist.
#[instrument(skip(state, session, user), fields(company_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<CompanyId>,
) -> Result<impl IntoResponse> {
    let company = state
        .backend_for(&user.token())
        .company(id)
        .await
        .map_err(not_found_as(format!("company {id}")))?;

    Ok(CompanyTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        company: CompanyView::from(&company),
        is_company_admin: user.is_company_admin(),
    })
}

/// Approve a pending admin-rights request.
#[instrument(skip(state, session, user), fields(request_id = %id))]
pub async fn approve_request(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<AdminRightsId>,
) -> Response {
    let result = state.backend_for(&user.token()).approve_admin_request(id).await;
    flash_outcome(&session, result, "approve").await;
    Redirect::to(COMPANIES_PAGE).into_response()
}

/// Deny a pending admin-rights request.
#[instrument(skip(state, session, user), fields(request_id = %id))]
pub async fn deny_request(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<AdminRightsId>,
) -> Response {
    let result = state.backend_for(&user.token()).deny_admin_request(id).await;
    flash_outcome(&session, result, "deny").await;
    Redirect::to(COMPANIES_PAGE).into_response()
}

/// Add, remove, promote or demote a member.
#[instrument(skip(state, session, user, form), fields(company_id = %id, action = %form.action))]
pub async fn member_action(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<CompanyId>,
    Form(form): Form<MemberForm>,
) -> Response {
    let Some(action) = MemberAction::parse(&form.action) else {
        set_flash(&session, Flash::error("Unknown member action.")).await;
        return Redirect::to(COMPANIES_PAGE).into_response();
    };

    if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        set_flash(&session, Flash::error(errors.get("email").unwrap_or("Check the form."))).await;
        return Redirect::to(COMPANIES_PAGE).into_response();
    }

    let company_id = id.to_string();
    add_breadcrumb(
        "company",
        action.path(),
        Some(&[("company_id", company_id.as_str())]),
    );

    let result = state
        .backend_for(&user.token())
        .company_member_action(id, action, form.email.trim())
        .await;
    flash_outcome(&session, result, action.path()).await;
    Redirect::to(COMPANIES_PAGE).into_response()
}

/// Replace an admin's rights.
#[instrument(skip(state, session, user, form), fields(company_id = %id))]
pub async fn update_rights(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<CompanyId>,
    Form(form): Form<RightsForm>,
) -> Response {
    if let Err(errors) = form.validate() {
        let errors = FieldErrors::from_validation(&errors);
        set_flash(&session, Flash::error(errors.get("email").unwrap_or("Check the form."))).await;
        return Redirect::to(COMPANIES_PAGE).into_response();
    }

    let result = state
        .backend_for(&user.token())
        .update_admin_rights(id, form.email.trim(), form.rights())
        .await;
    flash_outcome(&session, result, "update-rights").await;
    Redirect::to(COMPANIES_PAGE).into_response()
}

/// Delete a company.
#[instrument(skip(state, session, user), fields(company_id = %id))]
pub async fn delete_company(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<CompanyId>,
) -> Response {
    let result = state.backend_for(&user.token()).delete_company(id).await;
    flash_outcome(&session, result, "delete").await;
    Redirect::to(COMPANIES_PAGE).into_response()
}

/// Revoke a company's seller status.
#[instrument(skip(state, session, user), fields(company_id = %id))]
pub async fn revoke_company(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    Path(id): Path<CompanyId>,
) -> Response {
    let result = state.backend_for(&user.token()).revoke_company(id).await;
    flash_outcome(&session, result, "revoke").await;
    Redirect::to(COMPANIES_PAGE).into_response()
}

/// Company admin application form.
pub async fn apply_page(session: Session, RequireSeller(user): RequireSeller) -> impl IntoResponse {
    ApplyTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        form: CompanyForm::default(),
        errors: FieldErrors::default(),
        error: None,
    }
}

/// Submit a company admin application with an optional logo.
///
/// # Errors
///
/// Returns 400 if the multipart body cannot be read.
#[instrument(skip(state, session, user, multipart))]
pub async fn apply(
    State(state): State<AppState>,
    session: Session,
    RequireSeller(user): RequireSeller,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut form = CompanyForm::default();
    let mut logo: Option<LogoUpload> = None;
    let mut errors = FieldErrors::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "logo" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read logo: {e}")))?;

            if bytes.is_empty() {
                continue;
            }
            if !content_type.starts_with("image/") {
                errors.insert("logo", "The logo must be an image");
            } else if bytes.len() > MAX_LOGO_BYTES {
                errors.insert("logo", "The logo must be smaller than 2 MB");
            } else {
                logo = Some(LogoUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read {name}: {e}")))?;
            form.set(&name, value);
        }
    }

    if let Err(e) = form.validate() {
        let validation = FieldErrors::from_validation(&e);
        for field in ["name", "description", "email", "website"] {
            if let Some(message) = validation.get(field) {
                errors.insert(field, message);
            }
        }
    }

    let mut error = None;
    if errors.is_empty() {
        match state
            .backend_for(&user.token())
            .become_company_admin(&form.to_request(), logo.as_ref())
            .await
        {
            Ok(message) => {
                tracing::info!(company = %form.name, "company admin application sent");
                set_flash(&session, Flash::success(message)).await;
                return Ok(Redirect::to(COMPANIES_PAGE).into_response());
            }
            Err(e) => {
                tracing::error!(error = %e, "company admin application failed");
                error = Some(e.user_message());
            }
        }
    }

    Ok(ApplyTemplate {
        ctx: PageContext::load(&session, Some(&user)).await,
        form,
        errors,
        error,
    }
    .into_response())
}

/// Company routes, relative to `/seller`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/companies", get(index))
        .route(
            "/companies/apply",
            get(apply_page)
                .post(apply)
                .layer(DefaultBodyLimit::max(MAX_LOGO_BYTES + 64 * 1024)),
        )
        .route("/companies/requests/{id}/approve", post(approve_request))
        .route("/companies/requests/{id}/deny", post(deny_request))
        .route("/companies/{id}", get(show))
        .route("/companies/{id}/members", post(member_action))
        .route("/companies/{id}/rights", post(update_rights))
        .route("/companies/{id}/delete", post(delete_company))
        .route("/companies/{id}/revoke", post(revoke_company))
}
