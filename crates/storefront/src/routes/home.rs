//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::views::{CategoryCard, PageContext, ProductCard};
use crate::backend::{Fetched, PageRequest};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Products per home page section.
const SECTION_LIMIT: u32 = 8;

/// A titled product carousel.
pub struct HomeSection {
    pub title: &'static str,
    pub link: &'static str,
    pub products: Fetched<Vec<ProductCard>>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub sections: Vec<HomeSection>,
    pub categories: Fetched<Vec<CategoryCard>>,
}

/// Display the home page.
///
/// Product sections and top-level categories are fetched concurrently; each
/// section degrades on its own.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> impl IntoResponse {
    let backend = state.backend();
    let currency = state.config().currency;

    let (featured, new_arrivals, best_sellers, on_sale, categories) = tokio::join!(
        backend.featured_products(SECTION_LIMIT),
        backend.new_arrivals(SECTION_LIMIT),
        backend.best_sellers(SECTION_LIMIT),
        backend.on_sale_products(PageRequest::new(0, SECTION_LIMIT)),
        backend.parent_categories(),
    );

    HomeTemplate {
        ctx: PageContext::load(&session, user.as_ref()).await,
        sections: vec![
            HomeSection {
                title: "Featured",
                link: "/products",
                products: ProductCard::fetched(featured, currency),
            },
            HomeSection {
                title: "New arrivals",
                link: "/products?sort=newest",
                products: ProductCard::fetched(new_arrivals, currency),
            },
            HomeSection {
                title: "Best sellers",
                link: "/products",
                products: ProductCard::fetched(best_sellers, currency),
            },
            HomeSection {
                title: "On sale",
                link: "/products?on_sale=1",
                products: ProductCard::fetched(on_sale.map(|page| page.content), currency),
            },
        ],
        categories: Fetched::from_list(categories).map(|c| CategoryCard::list(&c)),
    }
}
