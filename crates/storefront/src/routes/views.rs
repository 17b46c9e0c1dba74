//! View models shared by page templates.
//!
//! Templates receive pre-formatted strings; pricing and image decisions are
//! made here through `shopora_core::catalog`, never in markup.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use shopora_core::catalog::{Category, ListingFilter, Product, SortKey, resolve_image};
use shopora_core::{CategoryId, CurrencyCode, OrderStatus};
use tower_sessions::Session;

use crate::backend::{ApiError, Fetched, Order};
use crate::middleware::take_flash;
use crate::models::{CurrentUser, Flash};

/// Layout data every page needs: who is signed in and any pending notice.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub email: Option<String>,
    pub is_seller: bool,
    pub is_admin: bool,
    pub flash: Option<Flash>,
}

impl PageContext {
    /// Build the context, consuming the pending flash notice.
    pub async fn load(session: &Session, user: Option<&CurrentUser>) -> Self {
        Self {
            email: user.map(|u| u.email.clone()),
            is_seller: user.is_some_and(CurrentUser::is_seller),
            is_admin: user.is_some_and(CurrentUser::is_app_admin),
            flash: take_flash(session).await,
        }
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.email.is_some()
    }
}

/// A product as shown in grids and carousels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub category_name: Option<String>,
    pub image_url: String,
    pub price: String,
    pub original_price: Option<String>,
    pub savings_percent: Option<u32>,
    pub in_stock: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, currency: CurrencyCode) -> Self {
        let display = product.price_display();
        let (price, original_price) = display.formatted(currency);

        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category_name: product.category_name.clone(),
            image_url: resolve_image(product).url,
            price,
            original_price,
            savings_percent: display.savings_percent(),
            in_stock: product.in_stock(),
        }
    }

    #[must_use]
    pub fn list(products: &[Product], currency: CurrencyCode) -> Vec<Self> {
        products.iter().map(|p| Self::new(p, currency)).collect()
    }

    /// Classify a product list fetch and build cards from it.
    pub fn fetched(result: Result<Vec<Product>, ApiError>, currency: CurrencyCode) -> Fetched<Vec<Self>> {
        Fetched::from_list(result).map(|products| Self::list(&products, currency))
    }
}

/// A category tile or sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCard {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: String,
    pub product_count: Option<i64>,
    pub children: Vec<CategoryCard>,
}

impl CategoryCard {
    #[must_use]
    pub fn new(category: &Category) -> Self {
        Self {
            id: category.id.as_i64(),
            name: category.name.clone(),
            description: category.description.clone(),
            image_url: resolve_image(category).url,
            product_count: category.product_count,
            children: category.subcategories.iter().map(Self::new).collect(),
        }
    }

    #[must_use]
    pub fn list(categories: &[Category]) -> Vec<Self> {
        categories.iter().map(Self::new).collect()
    }
}

/// An order as listed in account and seller pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub id: i64,
    pub date: Option<String>,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub total: String,
    pub shipping: String,
    pub item_count: i64,
    pub items: Vec<OrderItemView>,
    pub ship_to: Option<String>,
    pub cancellable: bool,
    pub returnable: bool,
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemView {
    pub id: Option<i64>,
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: String,
    pub total: String,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, currency: CurrencyCode) -> Self {
        let ship_to = order.shipping_address.as_ref().map(|a| {
            let name = format!("{} {}", a.first_name, a.last_name);
            [name.trim(), a.address.as_str(), a.zip_code.as_str(), a.city.as_str(), a.country.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        });

        Self {
            id: order.id.as_i64(),
            date: order.order_date.clone(),
            status: order.status,
            status_label: order.status.label(),
            total: currency.format(order.grand_total()),
            shipping: currency.format(order.shipping_charge()),
            item_count: order.item_count(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    id: item.id.map(|id| id.as_i64()),
                    product_id: item.product_id.as_i64(),
                    name: item
                        .product_name
                        .clone()
                        .unwrap_or_else(|| format!("Product #{}", item.product_id)),
                    quantity: item.quantity,
                    price: currency.format(item.price),
                    total: currency.format(item.line_total()),
                })
                .collect(),
            ship_to: ship_to.filter(|s| !s.is_empty()),
            cancellable: order.status.is_cancellable(),
            returnable: order.status.is_returnable(),
        }
    }

    #[must_use]
    pub fn list(orders: &[Order], currency: CurrencyCode) -> Vec<Self> {
        orders.iter().map(|o| Self::new(o, currency)).collect()
    }
}

/// First validation message per form field, for inline display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errors)| {
                let error = errors.first()?;
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| format!("Invalid {field}"), ToString::to_string);
                Some((field.to_string(), message))
            })
            .collect();
        Self(fields)
    }

    /// Message for `field`, if it failed validation.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Record an error found outside `validator`, keeping an earlier one.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A sort option for `<select>` menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[must_use]
pub fn sort_options(current: SortKey) -> Vec<SortOption> {
    SortKey::ALL
        .iter()
        .map(|key| SortOption {
            value: key.as_str(),
            label: key.label(),
            selected: *key == current,
        })
        .collect()
}

/// Deserialize empty strings as None for optional numeric fields.
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Deserialize blank form fields as None.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// Filter and sort parameters shared by listing pages.
///
/// `categories` is a comma-separated list of category IDs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub on_sale: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl ListingQuery {
    /// Parsed category IDs; unparseable entries are ignored.
    #[must_use]
    pub fn category_ids(&self) -> HashSet<CategoryId> {
        self.categories
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    #[must_use]
    pub fn filter(&self) -> ListingFilter {
        ListingFilter {
            min_price: self.min_price,
            max_price: self.max_price,
            category_ids: self.category_ids(),
            on_sale_only: matches!(self.on_sale.as_deref(), Some("1" | "true" | "on")),
        }
    }

    /// Whether `id` is among the selected categories.
    #[must_use]
    pub fn is_category_selected(&self, id: i64) -> bool {
        self.category_ids().contains(&CategoryId::new(id))
    }

    #[must_use]
    pub fn on_sale_only(&self) -> bool {
        self.filter().on_sale_only
    }

    /// Filter and sort parameters as `&key=value` pairs, for pagination links.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        if let Some(min) = self.min_price {
            serializer.append_pair("min_price", &min.to_string());
        }
        if let Some(max) = self.max_price {
            serializer.append_pair("max_price", &max.to_string());
        }
        if let Some(categories) = self.categories.as_deref().filter(|c| !c.is_empty()) {
            serializer.append_pair("categories", categories);
        }
        if self.on_sale_only() {
            serializer.append_pair("on_sale", "1");
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            serializer.append_pair("sort", sort);
        }

        let pairs = serializer.finish();
        if pairs.is_empty() {
            pairs
        } else {
            format!("&{pairs}")
        }
    }

    /// Requested sort, or `default` when absent or unknown.
    #[must_use]
    pub fn sort_or(&self, default: SortKey) -> SortKey {
        self.sort
            .as_deref()
            .and_then(SortKey::parse)
            .unwrap_or(default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_card_formats_sale_price() {
        let mut product = Product::new(1, "Lamp", Decimal::from(100));
        product.discount = Some(Decimal::from(20));
        product.quantity = 2;

        let card = ProductCard::new(&product, CurrencyCode::EUR);
        assert_eq!(card.price, "€80.00");
        assert_eq!(card.original_price.as_deref(), Some("€100.00"));
        assert_eq!(card.savings_percent, Some(20));
        assert!(card.in_stock);
        assert!(card.image_url.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_listing_query_string() {
        let query = ListingQuery {
            min_price: Some(Decimal::from(20)),
            categories: Some("1,2".to_string()),
            on_sale: Some("on".to_string()),
            ..ListingQuery::default()
        };
        assert_eq!(query.query_string(), "&min_price=20&categories=1%2C2&on_sale=1");
        assert!(query.is_category_selected(2));
        assert!(!query.is_category_selected(3));
        assert_eq!(ListingQuery::default().query_string(), "");
    }

    #[test]
    fn test_order_view() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 7,
            "status": "DELIVERED",
            "items": [{"id": 70, "productId": 3, "quantity": 2, "price": 12.5}],
            "shippingAddress": {"firstName": "Ana", "lastName": "", "address": "1 rue Neuve",
                                "city": "Lyon", "zipCode": "69001", "country": "FR"}
        }))
        .unwrap();

        let view = OrderView::new(&order, CurrencyCode::EUR);
        assert_eq!(view.total, "€25.00");
        assert_eq!(view.items.first().unwrap().name, "Product #3");
        assert_eq!(view.ship_to.as_deref(), Some("Ana, 1 rue Neuve, 69001, Lyon, FR"));
        assert!(view.returnable);
        assert!(!view.cancellable);
    }

    #[test]
    fn test_listing_query_filter() {
        let query: ListingQuery = serde_json::from_value(serde_json::json!({
            "min_price": "20",
            "max_price": "",
            "categories": "1,2,x",
            "on_sale": "on",
            "sort": "price-desc"
        }))
        .unwrap();

        let filter = query.filter();
        assert_eq!(filter.min_price, Some(Decimal::from(20)));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.category_ids.len(), 2);
        assert!(filter.on_sale_only);
        assert_eq!(query.sort_or(SortKey::Relevance), SortKey::PriceDesc);
    }

    #[test]
    fn test_blank_sort_keeps_page_default() {
        let query = ListingQuery {
            sort: Some(String::new()),
            ..ListingQuery::default()
        };
        assert_eq!(query.sort_or(SortKey::Newest), SortKey::Newest);

        let query = ListingQuery {
            sort: Some("bogus".to_string()),
            ..ListingQuery::default()
        };
        assert_eq!(query.sort_or(SortKey::Newest), SortKey::Newest);
        assert_eq!(ListingQuery::default().sort_or(SortKey::NameAsc), SortKey::NameAsc);
    }

    #[test]
    fn test_field_errors_keep_messages() {
        use validator::Validate;

        #[derive(Validate)]
        struct Form {
            #[validate(length(min = 1, message = "Name is required"))]
            name: String,
            #[validate(email)]
            email: String,
        }

        let errors = Form {
            name: String::new(),
            email: "nope".to_string(),
        }
        .validate()
        .unwrap_err();
        let fields = FieldErrors::from_validation(&errors);
        assert_eq!(fields.get("name"), Some("Name is required"));
        assert_eq!(fields.get("email"), Some("Invalid email"));
        assert_eq!(fields.get("city"), None);
    }

    #[test]
    fn test_sort_options_mark_selection() {
        let options = sort_options(SortKey::NameAsc);
        assert_eq!(options.iter().filter(|o| o.selected).count(), 1);
        assert!(options.iter().any(|o| o.selected && o.value == SortKey::NameAsc.as_str()));
    }
}
