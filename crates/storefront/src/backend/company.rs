//! Company and company-role endpoints.
//!
//! Role actions live under `/seller/user/role` and answer `{ "message": ... }`;
//! the message is returned so pages can flash it.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use shopora_core::{AdminRightsId, CompanyId};
use tracing::instrument;

use super::{
    AdminRightsRequest, AdminRightsUpdate, ApiClient, ApiError, Company, CompanyRequest, NO_QUERY,
};

const ROLE: [&str; 3] = ["seller", "user", "role"];

/// Logo uploaded with a company application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A company member action keyed by the member's email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    AddSeller,
    RemoveSeller,
    PromoteAdmin,
    DemoteAdmin,
}

impl MemberAction {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::AddSeller => "add-seller",
            Self::RemoveSeller => "remove-seller",
            Self::PromoteAdmin => "promote-admin",
            Self::DemoteAdmin => "demote-admin",
        }
    }

    /// Parse the action name used in form posts.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add-seller" => Some(Self::AddSeller),
            "remove-seller" => Some(Self::RemoveSeller),
            "promote-admin" => Some(Self::PromoteAdmin),
            "demote-admin" => Some(Self::DemoteAdmin),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Message from a role action body; empty or non-JSON bodies get a default.
fn action_message(body: &str) -> String {
    serde_json::from_str::<MessageResponse>(body)
        .ok()
        .and_then(|r| r.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Done.".to_string())
}

fn role_path<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    ROLE.iter().copied().chain(rest.iter().copied()).collect()
}

impl ApiClient {
    async fn role_action<Q>(&self, rest: &[&str], query: &Q) -> Result<String, ApiError>
    where
        Q: serde::Serialize + ?Sized,
    {
        let url = self.url(&role_path(rest))?;
        let body = self
            .execute(self.request(Method::POST, url).query(query))
            .await?;
        Ok(action_message(&body))
    }

    // =========================================================================
    // Companies
    // =========================================================================

    /// Get a company with its members.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the company does not exist.
    #[instrument(skip(self), fields(company_id = %id))]
    pub async fn company(&self, id: CompanyId) -> Result<Company, ApiError> {
        self.get_json(&["seller", "company", &id.to_string()], NO_QUERY)
            .await
    }

    /// Companies the current user belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn user_companies(&self) -> Result<Vec<Company>, ApiError> {
        self.get_json(&["seller", "user", "companies"], NO_QUERY)
            .await
    }

    /// Admin-rights requests awaiting a decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn pending_admin_requests(&self) -> Result<Vec<AdminRightsRequest>, ApiError> {
        self.get_json(&role_path(&["pending-requests"]), NO_QUERY)
            .await
    }

    // =========================================================================
    // Role actions
    // =========================================================================

    /// Apply to become a company admin seller, optionally with a logo.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if the backend rejects the application.
    #[instrument(skip(self, request, logo), fields(company = %request.name))]
    pub async fn become_company_admin(
        &self,
        request: &CompanyRequest,
        logo: Option<&LogoUpload>,
    ) -> Result<String, ApiError> {
        let mut form = Form::new().text("companyRequest", serde_json::to_string(request)?);
        if let Some(logo) = logo {
            let part = Part::bytes(logo.bytes.clone())
                .file_name(logo.file_name.clone())
                .mime_str(&logo.content_type)?;
            form = form.part("file", part);
        }

        let url = self.url(&role_path(&["v2", "become-company-admin-seller"]))?;
        let body = self
            .execute(self.request(Method::POST, url).multipart(form))
            .await?;
        Ok(action_message(&body))
    }

    /// Approve an admin-rights request by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(rights_id = %id))]
    pub async fn approve_admin_request(&self, id: AdminRightsId) -> Result<String, ApiError> {
        self.role_action(&["approve-company-admin", &id.to_string()], NO_QUERY)
            .await
    }

    /// Deny an admin-rights request by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(rights_id = %id))]
    pub async fn deny_admin_request(&self, id: AdminRightsId) -> Result<String, ApiError> {
        self.role_action(&["deny-company-admin", &id.to_string()], NO_QUERY)
            .await
    }

    /// Add, remove, promote, or demote a company member.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, email), fields(company_id = %company_id, action = action.path()))]
    pub async fn company_member_action(
        &self,
        company_id: CompanyId,
        action: MemberAction,
        email: &str,
    ) -> Result<String, ApiError> {
        self.role_action(
            &["company", &company_id.to_string(), action.path(), email],
            NO_QUERY,
        )
        .await
    }

    /// Replace the rights held by a company admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, email, rights), fields(company_id = %company_id))]
    pub async fn update_admin_rights(
        &self,
        company_id: CompanyId,
        email: &str,
        rights: Vec<String>,
    ) -> Result<String, ApiError> {
        let url = self.url(&role_path(&[
            "company",
            &company_id.to_string(),
            "update-admin-rights",
            email,
        ]))?;
        let body = self
            .execute(
                self.request(Method::POST, url)
                    .json(&AdminRightsUpdate { rights }),
            )
            .await?;
        Ok(action_message(&body))
    }

    /// Delete a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(company_id = %id))]
    pub async fn delete_company(&self, id: CompanyId) -> Result<String, ApiError> {
        self.role_action(&["company", &id.to_string(), "delete"], NO_QUERY)
            .await
    }

    /// Revoke a company's seller status.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(company_id = %id))]
    pub async fn revoke_company(&self, id: CompanyId) -> Result<String, ApiError> {
        self.role_action(&["company", &id.to_string(), "revoke"], NO_QUERY)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_message() {
        assert_eq!(action_message(r#"{"message": "Seller added"}"#), "Seller added");
        assert_eq!(action_message(""), "Done.");
        assert_eq!(action_message(r#"{"message": " "}"#), "Done.");
    }

    #[test]
    fn test_member_action_round_trip() {
        for action in [
            MemberAction::AddSeller,
            MemberAction::RemoveSeller,
            MemberAction::PromoteAdmin,
            MemberAction::DemoteAdmin,
        ] {
            assert_eq!(MemberAction::parse(action.path()), Some(action));
        }
        assert_eq!(MemberAction::parse("delete"), None);
    }

    #[test]
    fn test_role_path() {
        assert_eq!(
            role_path(&["company", "4", "revoke"]),
            vec!["seller", "user", "role", "company", "4", "revoke"]
        );
    }
}
