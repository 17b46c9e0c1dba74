//! Listing filter and sort pipeline.
//!
//! Product grids (category pages, the product index, search results) all go
//! through [`apply`]: filter by base price range, category and sale
//! status, then sort (price sorts use the displayed price). The input slice is never modified.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::Product;
use crate::types::CategoryId;

/// Filter criteria for a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Inclusive lower bound on the base price.
    pub min_price: Option<Decimal>,
    /// Inclusive upper bound on the base price.
    pub max_price: Option<Decimal>,
    /// Empty means every category.
    pub category_ids: HashSet<CategoryId>,
    pub on_sale_only: bool,
}

impl ListingFilter {
    /// A filter restricted to a price range.
    #[must_use]
    pub fn price_range(min: Decimal, max: Decimal) -> Self {
        Self {
            min_price: Some(min),
            max_price: Some(max),
            ..Self::default()
        }
    }

    /// Add category restrictions.
    #[must_use]
    pub fn with_categories(mut self, ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.category_ids.extend(ids);
        self
    }

    /// Whether `product` passes every criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if !self.category_ids.is_empty()
            && !product
                .category_id
                .is_some_and(|id| self.category_ids.contains(&id))
        {
            return false;
        }
        !self.on_sale_only || product.price_display().is_discounted()
    }

    /// True when no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_price.is_none()
            && self.max_price.is_none()
            && self.category_ids.is_empty()
            && !self.on_sale_only
    }
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Keep the order the backend returned.
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    Newest,
}

impl SortKey {
    pub const ALL: [Self; 6] = [
        Self::Relevance,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::NameDesc,
        Self::Newest,
    ];

    /// Parse a URL value such as `priceAsc`, `price_asc` or `price-ascending`.
    ///
    /// Unknown and empty values yield `None`, leaving the page default in place.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "relevance" | "default" => Some(Self::Relevance),
            "priceasc" | "priceascending" | "pricelowtohigh" | "price" => Some(Self::PriceAsc),
            "pricedesc" | "pricedescending" | "pricehightolow" => Some(Self::PriceDesc),
            "nameasc" | "nameascending" | "name" | "az" => Some(Self::NameAsc),
            "namedesc" | "namedescending" | "za" => Some(Self::NameDesc),
            "newest" | "latest" | "new" | "created" | "createdat" => Some(Self::Newest),
            _ => None,
        }
    }

    /// Canonical URL value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "priceAsc",
            Self::PriceDesc => "priceDesc",
            Self::NameAsc => "nameAsc",
            Self::NameDesc => "nameDesc",
            Self::Newest => "newest",
        }
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Relevance => "Relevance",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::NameAsc => "Name: A to Z",
            Self::NameDesc => "Name: Z to A",
            Self::Newest => "Newest",
        }
    }
}

/// Filter then sort `products` into a new vector.
#[must_use]
pub fn apply(products: &[Product], filter: &ListingFilter, sort: SortKey) -> Vec<Product> {
    let mut listed: Vec<Product> = products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    sort_products(&mut listed, sort);
    listed
}

/// Stable in-place sort.
pub fn sort_products(products: &mut [Product], sort: SortKey) {
    match sort {
        SortKey::Relevance => {}
        SortKey::PriceAsc => products.sort_by_key(|p| p.price_display().price),
        SortKey::PriceDesc => {
            products.sort_by(|a, b| b.price_display().price.cmp(&a.price_display().price));
        }
        SortKey::NameAsc => products.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::NameDesc => products.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortKey::Newest => sort_newest(products),
    }
}

/// Newest first by `createdAt` when every product has a parseable one,
/// otherwise by descending id.
fn sort_newest(products: &mut [Product]) {
    let dates: Option<Vec<NaiveDateTime>> = products
        .iter()
        .map(|p| p.created_at.as_deref().and_then(parse_created_at))
        .collect();

    match dates {
        Some(dates) => {
            let mut keyed: Vec<(NaiveDateTime, Product)> =
                dates.into_iter().zip(products.iter().cloned()).collect();
            keyed.sort_by(|(da, a), (db, b)| db.cmp(da).then_with(|| b.id.cmp(&a.id)));
            for (slot, (_, product)) in products.iter_mut().zip(keyed) {
                *slot = product;
            }
        }
        None => products.sort_by(|a, b| b.id.cmp(&a.id)),
    }
}

fn parse_created_at(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Case- and accent-insensitive name comparison.
///
/// Ties on the folded form fall back to the raw strings so the order is
/// total and deterministic.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let fa = fold(a);
    let fb = fold(b);
    fa.cmp(&fb).then_with(|| a.cmp(b))
}

fn fold(s: &str) -> String {
    s.chars().flat_map(fold_char).collect()
}

fn fold_char(c: char) -> impl Iterator<Item = char> {
    let folded: &'static str = match c {
        'À'..='Å' | 'à'..='å' => "a",
        'Æ' | 'æ' => "ae",
        'Ç' | 'ç' => "c",
        'È'..='Ë' | 'è'..='ë' => "e",
        'Ì'..='Ï' | 'ì'..='ï' => "i",
        'Ð' | 'ð' => "d",
        'Ñ' | 'ñ' => "n",
        'Ò'..='Ö' | 'Ø' | 'ò'..='ö' | 'ø' => "o",
        'Ù'..='Ü' | 'ù'..='ü' => "u",
        'Ý' | 'ý' | 'ÿ' | 'Ÿ' => "y",
        'Œ' | 'œ' => "oe",
        'ß' => "ss",
        _ => "",
    };

    let mut chars: Vec<char> = folded.chars().collect();
    if chars.is_empty() {
        chars.extend(c.to_lowercase());
    }
    chars.into_iter()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i64, price: i64, category: i64, name: &str) -> Product {
        let mut p = Product::new(id, name, Decimal::from(price));
        p.category_id = Some(CategoryId::new(category));
        p
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_price_range_is_inclusive() {
        let products = vec![
            product(1, 10, 1, "a"),
            product(2, 50, 1, "b"),
            product(3, 90, 1, "c"),
            product(4, 20, 1, "d"),
            product(5, 80, 1, "e"),
        ];
        let filter = ListingFilter::price_range(Decimal::from(20), Decimal::from(80));
        assert_eq!(ids(&apply(&products, &filter, SortKey::Relevance)), vec![2, 4, 5]);
    }

    #[test]
    fn test_price_filter_only_keeps_middle() {
        let products = vec![product(1, 10, 1, "a"), product(2, 50, 1, "b"), product(3, 90, 1, "c")];
        let filter = ListingFilter::price_range(Decimal::from(20), Decimal::from(80));
        assert_eq!(ids(&apply(&products, &filter, SortKey::Relevance)), vec![2]);
    }

    #[test]
    fn test_category_filter() {
        let products = vec![product(1, 10, 1, "a"), product(2, 10, 2, "b"), product(3, 10, 3, "c")];
        let filter = ListingFilter::default().with_categories([CategoryId::new(1), CategoryId::new(2)]);
        assert_eq!(ids(&apply(&products, &filter, SortKey::Relevance)), vec![1, 2]);

        let mut uncategorized = Product::new(4, "d", Decimal::from(10));
        uncategorized.category_id = None;
        assert!(!filter.matches(&uncategorized));
        assert!(ListingFilter::default().matches(&uncategorized));
    }

    #[test]
    fn test_filter_uses_base_price() {
        let mut p = product(1, 100, 1, "a");
        p.discount = Some(Decimal::from(50));
        let filter = ListingFilter::price_range(Decimal::ZERO, Decimal::from(60));
        assert!(!filter.matches(&p), "discounted price must not pull the product into range");

        let filter = ListingFilter::price_range(Decimal::from(90), Decimal::from(110));
        assert!(filter.matches(&p));
    }

    #[test]
    fn test_price_sort_still_uses_displayed_price() {
        let mut cheap_after_discount = product(1, 100, 1, "a");
        cheap_after_discount.discount = Some(Decimal::from(50));
        let plain = product(2, 60, 1, "b");
        let sorted = apply(&[plain, cheap_after_discount], &ListingFilter::default(), SortKey::PriceAsc);
        assert_eq!(ids(&sorted), vec![1, 2]);
    }

    #[test]
    fn test_on_sale_only() {
        let mut sale = product(1, 100, 1, "a");
        sale.offer_price = Some(Decimal::from(70));
        let full = product(2, 100, 1, "b");
        let filter = ListingFilter {
            on_sale_only: true,
            ..ListingFilter::default()
        };
        assert_eq!(ids(&apply(&[sale, full], &filter, SortKey::Relevance)), vec![1]);
    }

    #[test]
    fn test_name_sort() {
        let products = vec![product(1, 1, 1, "Banana"), product(2, 1, 1, "Apple")];
        let sorted = apply(&products, &ListingFilter::default(), SortKey::NameAsc);
        assert_eq!(names(&sorted), vec!["Apple", "Banana"]);

        let sorted = apply(&products, &ListingFilter::default(), SortKey::NameDesc);
        assert_eq!(names(&sorted), vec!["Banana", "Apple"]);
    }

    #[test]
    fn test_name_sort_ignores_case_and_accents() {
        let products = vec![
            product(1, 1, 1, "zèbre"),
            product(2, 1, 1, "Éclair"),
            product(3, 1, 1, "banane"),
            product(4, 1, 1, "Abricot"),
        ];
        let sorted = apply(&products, &ListingFilter::default(), SortKey::NameAsc);
        assert_eq!(names(&sorted), vec!["Abricot", "banane", "Éclair", "zèbre"]);
    }

    #[test]
    fn test_price_desc_sort() {
        let products = vec![product(1, 10, 1, "a"), product(2, 30, 1, "b"), product(3, 20, 1, "c")];
        let sorted = apply(&products, &ListingFilter::default(), SortKey::PriceDesc);
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let products = vec![
            product(1, 10, 1, "b"),
            product(2, 10, 1, "a"),
            product(3, 5, 1, "c"),
        ];
        for key in SortKey::ALL {
            let once = apply(&products, &ListingFilter::default(), key);
            let twice = apply(&once, &ListingFilter::default(), key);
            assert_eq!(once, twice, "sort {key:?} is not idempotent");
        }
    }

    #[test]
    fn test_filter_is_idempotent() {
        let products = vec![product(1, 10, 1, "a"), product(2, 50, 2, "b"), product(3, 90, 3, "c")];
        let filter = ListingFilter::price_range(Decimal::from(5), Decimal::from(60))
            .with_categories([CategoryId::new(1), CategoryId::new(2)]);
        let once = apply(&products, &filter, SortKey::PriceDesc);
        let twice = apply(&once, &filter, SortKey::PriceDesc);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_category_page_example() {
        let products = vec![product(1, 15, 5, "Z"), product(2, 60, 5, "A")];
        let filter = ListingFilter::price_range(Decimal::ZERO, Decimal::from(1000))
            .with_categories([CategoryId::new(5)]);
        assert_eq!(ids(&apply(&products, &filter, SortKey::NameAsc)), vec![2, 1]);
    }

    #[test]
    fn test_input_is_untouched() {
        let products = vec![product(1, 30, 1, "b"), product(2, 10, 1, "a")];
        let before = products.clone();
        let _ = apply(&products, &ListingFilter::default(), SortKey::PriceAsc);
        assert_eq!(products, before);
    }

    #[test]
    fn test_newest_uses_created_at_when_complete() {
        let mut a = product(1, 1, 1, "a");
        a.created_at = Some("2024-05-01T10:00:00".to_string());
        let mut b = product(2, 1, 1, "b");
        b.created_at = Some("2023-01-01T10:00:00Z".to_string());
        let mut c = product(3, 1, 1, "c");
        c.created_at = Some("2024-01-01 08:30:00".to_string());

        let sorted = apply(&[a, b, c], &ListingFilter::default(), SortKey::Newest);
        assert_eq!(ids(&sorted), vec![1, 3, 2]);
    }

    #[test]
    fn test_newest_falls_back_to_id() {
        let mut a = product(1, 1, 1, "a");
        a.created_at = Some("2030-01-01T00:00:00".to_string());
        let b = product(3, 1, 1, "b");
        let c = product(2, 1, 1, "c");

        let sorted = apply(&[a, b, c], &ListingFilter::default(), SortKey::Newest);
        assert_eq!(ids(&sorted), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("priceAsc"), Some(SortKey::PriceAsc));
        assert_eq!(SortKey::parse("price_asc"), Some(SortKey::PriceAsc));
        assert_eq!(SortKey::parse("price-ascending"), Some(SortKey::PriceAsc));
        assert_eq!(SortKey::parse("PRICE_DESC"), Some(SortKey::PriceDesc));
        assert_eq!(SortKey::parse("name-desc"), Some(SortKey::NameDesc));
        assert_eq!(SortKey::parse("newest"), Some(SortKey::Newest));
        assert_eq!(SortKey::parse(""), None);
        assert_eq!(SortKey::parse("relevance"), Some(SortKey::Relevance));
        assert_eq!(SortKey::parse("rating"), None);

        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(key.as_str()), Some(key));
        }
    }
}
