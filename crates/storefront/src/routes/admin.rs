//! Catalog administration.
//!
//! Storefront administrators create, edit and delete categories. Writes go
//! through the backend's admin endpoints, which also drop the catalog cache.

use std::collections::HashSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use shopora_core::CategoryId;
use shopora_core::catalog::Category;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use super::views::{FieldErrors, PageContext, blank_as_none};
use crate::backend::Fetched;
use crate::backend::catalog::CategoryRequest;
use crate::filters;
use crate::middleware::{RequireAdmin, set_flash};
use crate::models::Flash;
use crate::state::AppState;

/// Admin routes, nested under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories).post(save_category))
        .route("/categories/{id}/delete", post(delete_category))
}

/// A category row in the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub parent_name: Option<String>,
    pub product_count: Option<i64>,
}

/// Every category once, subcategories included, parents first.
fn flatten(categories: &[Category]) -> Vec<&Category> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack: Vec<&Category> = categories.iter().rev().collect();
    while let Some(category) = stack.pop() {
        if !seen.insert(category.id) {
            continue;
        }
        out.push(category);
        stack.extend(category.subcategories.iter().rev());
    }
    out
}

fn rows(categories: &[&Category]) -> Vec<CategoryRow> {
    categories
        .iter()
        .map(|c| CategoryRow {
            id: c.id.as_i64(),
            name: c.name.clone(),
            parent_name: c
                .parent_id
                .and_then(|p| categories.iter().find(|o| o.id == p))
                .map(|p| p.name.clone()),
            product_count: c.product_count,
        })
        .collect()
}

/// A parent choice in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

/// Create/edit form; `id` is set when editing.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CategoryForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub id: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Enter a name of 2 to 100 characters"))]
    pub name: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 1000, message = "Keep the description under 1000 characters"))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(url(message = "Enter a full image URL"))]
    pub image_url: Option<String>,
}

impl CategoryForm {
    fn from_category(category: &Category) -> Self {
        Self {
            id: Some(category.id.to_string()),
            name: category.name.clone(),
            description: category.description.clone(),
            parent_id: category.parent_id.map(|p| p.to_string()),
            image_url: category.image_url.clone(),
        }
    }

    fn category_id(&self) -> Option<CategoryId> {
        self.id.as_deref().and_then(|id| id.parse().ok())
    }

    fn parent(&self) -> Option<CategoryId> {
        self.parent_id.as_deref().and_then(|id| id.parse().ok())
    }

    /// Field rules plus the ones `validator` cannot express.
    fn check(&self) -> FieldErrors {
        let mut errors = self
            .validate()
            .map_or_else(|e| FieldErrors::from_validation(&e), |()| FieldErrors::default());
        if self.parent_id.is_some() && self.parent().is_none() {
            errors.insert("parent_id", "Choose a parent category");
        }
        if self.parent().is_some() && self.parent() == self.category_id() {
            errors.insert("parent_id", "A category cannot be its own parent");
        }
        errors
    }

    fn to_request(&self) -> CategoryRequest {
        CategoryRequest {
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            parent_id: self.parent(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Query parameters of the admin page.
#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub edit: Option<CategoryId>,
}

/// Category administration template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub ctx: PageContext,
    pub categories: Fetched<Vec<CategoryRow>>,
    pub parents: Vec<ParentOption>,
    pub form: CategoryForm,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CategoriesTemplate {
    fn new(
        ctx: PageContext,
        result: Result<Vec<Category>, crate::backend::ApiError>,
        form: CategoryForm,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        let all = result.as_ref().map(|c| flatten(c)).unwrap_or_default();
        let editing = form.category_id();
        let parent = form.parent();
        let parents = all
            .iter()
            .filter(|c| Some(c.id) != editing)
            .map(|c| ParentOption {
                id: c.id.as_i64(),
                name: c.name.clone(),
                selected: Some(c.id) == parent,
            })
            .collect();
        let categories = match &result {
            Ok(_) if all.is_empty() => Fetched::Empty,
            Ok(_) => Fetched::Loaded(rows(&all)),
            Err(e) => Fetched::Failed(e.user_message()),
        };

        Self {
            ctx,
            categories,
            parents,
            form,
            errors,
            error,
        }
    }
}

/// List categories; `?edit={id}` loads one into the form.
#[instrument(skip(state, session, user))]
pub async fn categories(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Query(query): Query<AdminQuery>,
) -> impl IntoResponse {
    let result = state.backend().categories().await;
    let form = match (&result, query.edit) {
        (Ok(list), Some(edit)) => flatten(list)
            .into_iter()
            .find(|c| c.id == edit)
            .map(CategoryForm::from_category)
            .unwrap_or_default(),
        _ => CategoryForm::default(),
    };

    CategoriesTemplate::new(
        PageContext::load(&session, Some(&user)).await,
        result,
        form,
        FieldErrors::default(),
        None,
    )
}

/// Create or update a category.
#[instrument(skip(state, session, user, form))]
pub async fn save_category(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Form(form): Form<CategoryForm>,
) -> Response {
    let backend = state.backend_for(&user.token());
    let errors = form.check();

    let error = if errors.is_empty() {
        let request = form.to_request();
        let result = match form.category_id() {
            Some(id) => backend.update_category(id, &request).await,
            None => backend.create_category(&request).await,
        };
        match result {
            Ok(saved) => {
                tracing::info!(category_id = %saved.id, "category saved");
                set_flash(&session, Flash::success(format!("Category {} saved.", saved.name))).await;
                return Redirect::to("/admin/categories").into_response();
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save category");
                Some(e.user_message())
            }
        }
    } else {
        None
    };

    CategoriesTemplate::new(
        PageContext::load(&session, Some(&user)).await,
        state.backend().categories().await,
        form,
        errors,
        error,
    )
    .into_response()
}

/// Delete a category.
#[instrument(skip(state, session, user), fields(category_id = %id))]
pub async fn delete_category(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Response {
    let flash = match state.backend_for(&user.token()).delete_category(id).await {
        Ok(()) => {
            tracing::info!("category deleted");
            Flash::success("Category deleted.")
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to delete category");
            Flash::error(e.user_message())
        }
    };

    set_flash(&session, flash).await;
    Redirect::to("/admin/categories").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tree() -> Vec<Category> {
        let mut lighting = Category::new(1, "Lighting");
        let mut lamps = Category::new(2, "Lamps");
        lamps.parent_id = Some(CategoryId::new(1));
        lighting.subcategories = vec![lamps.clone()];
        vec![lighting, lamps, Category::new(3, "Garden")]
    }

    #[test]
    fn test_flatten_visits_each_category_once() {
        let tree = tree();
        let names: Vec<_> = flatten(&tree).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Lighting", "Lamps", "Garden"]);

        let rows = rows(&flatten(&tree));
        assert_eq!(rows[1].parent_name.as_deref(), Some("Lighting"));
        assert_eq!(rows[2].parent_name, None);
    }

    #[test]
    fn test_category_cannot_be_its_own_parent() {
        let form = CategoryForm {
            id: Some("4".to_string()),
            name: "Desks".to_string(),
            parent_id: Some("4".to_string()),
            ..CategoryForm::default()
        };
        assert_eq!(form.check().get("parent_id"), Some("A category cannot be its own parent"));
    }

    #[test]
    fn test_category_form_rules() {
        let form = CategoryForm {
            name: "D".to_string(),
            image_url: Some("not a url".to_string()),
            parent_id: Some("abc".to_string()),
            ..CategoryForm::default()
        };
        let errors = form.check();
        assert!(errors.get("name").is_some());
        assert!(errors.get("image_url").is_some());
        assert_eq!(errors.get("parent_id"), Some("Choose a parent category"));

        let valid = CategoryForm {
            name: "Desks".to_string(),
            parent_id: Some("1".to_string()),
            ..CategoryForm::default()
        };
        assert!(valid.check().is_empty());
        assert_eq!(valid.to_request().parent_id, Some(CategoryId::new(1)));
    }
}
