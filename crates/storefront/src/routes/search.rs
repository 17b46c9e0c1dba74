//! Search route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use shopora_core::catalog::SortKey;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CategoryCard, ListingQuery, PageContext, ProductCard, SortOption, sort_options};
use crate::backend::Fetched;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::search::{self, SearchRequest, SearchScope};
use crate::state::AppState;

/// Suggestions returned by `/search/suggest`.
const SUGGESTION_LIMIT: usize = 8;

/// Search suggestions query parameters.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// JSON body of `/search/suggest`.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub suggestions: Vec<String>,
}

/// Query and scope of the search page; filters come from [`ListingQuery`].
#[derive(Debug, Default, Deserialize)]
pub struct SearchPageQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub scope: String,
}

/// Full search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchPageTemplate {
    pub ctx: PageContext,
    pub query: String,
    pub scope: &'static str,
    pub listing: ListingQuery,
    pub sort_options: Vec<SortOption>,
    pub products: Fetched<Vec<ProductCard>>,
    pub categories: Fetched<Vec<CategoryCard>>,
}

/// Search suggestions endpoint.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> impl IntoResponse {
    let suggestions = search::suggestions(state.backend(), &query.q, SUGGESTION_LIMIT).await;

    Json(SuggestResponse {
        query: query.q.trim().to_string(),
        suggestions,
    })
}

/// Full search page.
#[instrument(skip(state, session, user, listing), fields(q = %query.q))]
pub async fn search_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<SearchPageQuery>,
    Query(listing): Query<ListingQuery>,
) -> impl IntoResponse {
    let scope = SearchScope::parse(&query.scope);
    let sort = listing.sort_or(SortKey::Relevance);
    let request = SearchRequest {
        query: query.q.trim().to_string(),
        filter: listing.filter(),
        sort,
        scope,
        page_size: state.config().page_size,
    };

    let results = search::unified_search(state.backend(), &request).await;
    let currency = state.config().currency;

    SearchPageTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        query: request.query,
        scope: scope.as_str(),
        listing,
        sort_options: sort_options(sort),
        products: results.products.map(|p| ProductCard::list(&p, currency)),
        categories: results.categories.map(|c| CategoryCard::list(&c)),
    }
}

/// Create the search routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_page))
        .route("/suggest", get(suggest))
}
