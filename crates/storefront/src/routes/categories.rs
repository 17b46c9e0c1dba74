//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use shopora_core::CategoryId;
use shopora_core::catalog::{self, SortKey};
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CategoryCard, ListingQuery, PageContext, ProductCard, SortOption, sort_options};
use crate::backend::Fetched;
use crate::error::{Result, not_found_as};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Category pages list the newest products first unless asked otherwise.
pub const CATEGORY_DEFAULT_SORT: SortKey = SortKey::Newest;

/// Category tree page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub ctx: PageContext,
    pub categories: Fetched<Vec<CategoryCard>>,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub ctx: PageContext,
    pub category: CategoryCard,
    pub subcategories: Fetched<Vec<CategoryCard>>,
    pub products: Fetched<Vec<ProductCard>>,
    pub sort_options: Vec<SortOption>,
    pub query: ListingQuery,
}

/// Display every top-level category with its children.
#[instrument(skip(state, session, user))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let categories = state.backend().parent_categories().await;

    CategoriesIndexTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
    }
}

/// Display a category with its subcategories and filtered products.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, session, user, listing), fields(category_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<CategoryId>,
    Query(listing): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let backend = state.backend();

    let (category, subcategories, products) = tokio::join!(
        backend.category(id),
        backend.subcategories(id),
        backend.products_by_category(id),
    );

    let category = category.map_err(not_found_as(format!("category {id}")))?;

    let filter = listing.filter();
    let sort = listing.sort_or(CATEGORY_DEFAULT_SORT);
    let products = Fetched::from_list(products.map(|p| catalog::apply(&p, &filter, sort)))
        .map(|p| ProductCard::list(&p, state.config().currency));

    Ok(CategoryShowTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        category: CategoryCard::new(&category),
        subcategories: Fetched::from_list(subcategories).map(|c| CategoryCard::list(&c)),
        products,
        sort_options: sort_options(sort),
        query: listing,
    })
}
