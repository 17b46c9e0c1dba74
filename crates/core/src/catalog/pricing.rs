//! Displayed price computation.
//!
//! The backend is authoritative for what a buyer pays; this only decides
//! what a product card shows. An explicit offer price always wins over a
//! percentage discount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::model::Product;
use crate::types::CurrencyCode;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// The price to show and, when it differs, the base price to strike through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceDisplay {
    /// Price the buyer sees.
    pub price: Decimal,
    /// Base price, only set when it differs from `price`.
    pub original: Option<Decimal>,
}

impl PriceDisplay {
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.original.is_some()
    }

    /// Whole-percent saving for the "-N%" badge.
    #[must_use]
    pub fn savings_percent(&self) -> Option<u32> {
        let original = self.original?;
        if original <= Decimal::ZERO || self.price >= original {
            return None;
        }
        let saved = ((original - self.price) / original * HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        saved.to_u32().filter(|p| *p > 0)
    }

    /// Both amounts formatted in `currency`.
    #[must_use]
    pub fn formatted(&self, currency: CurrencyCode) -> (String, Option<String>) {
        (
            currency.format(self.price),
            self.original.map(|o| currency.format(o)),
        )
    }
}

/// Compute the displayed price.
///
/// - `offer` present: the offer price.
/// - otherwise, `discount` > 0 and `price` > 0: `price × (1 − d/100)` with `d`
///   clamped to [0, 100], rounded to cents.
/// - otherwise: `price`.
#[must_use]
pub fn display_price(price: Decimal, offer: Option<Decimal>, discount: Option<Decimal>) -> PriceDisplay {
    let shown = match (offer, discount) {
        (Some(offer), _) => offer,
        (None, Some(d)) if d > Decimal::ZERO && price > Decimal::ZERO => {
            let d = d.clamp(Decimal::ZERO, HUNDRED);
            (price * (HUNDRED - d) / HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        }
        _ => price,
    };

    PriceDisplay {
        price: shown,
        original: (shown != price).then_some(price),
    }
}

impl Product {
    /// Displayed price for this product.
    #[must_use]
    pub fn price_display(&self) -> PriceDisplay {
        display_price(self.price, self.offer_price, self.discount)
    }

    /// Whether a card for this product shows a sale price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.price_display().is_discounted()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    #[test]
    fn test_offer_price_wins() {
        let shown = display_price(dec(100), Some(dec(80)), None);
        assert_eq!(shown.price, dec(80));
        assert_eq!(shown.original, Some(dec(100)));
    }

    #[test]
    fn test_offer_price_beats_discount() {
        let shown = display_price(dec(100), Some(dec(90)), Some(dec(50)));
        assert_eq!(shown.price, dec(90));
    }

    #[test]
    fn test_percentage_discount() {
        let shown = display_price(dec(100), None, Some(dec(20)));
        assert_eq!(shown.price, dec(80));
        assert_eq!(shown.original, Some(dec(100)));
        assert_eq!(shown.savings_percent(), Some(20));
    }

    #[test]
    fn test_no_discount_no_strikethrough() {
        let shown = display_price(dec(100), None, Some(Decimal::ZERO));
        assert_eq!(shown.price, dec(100));
        assert_eq!(shown.original, None);
        assert!(!shown.is_discounted());
        assert_eq!(shown.savings_percent(), None);
    }

    #[test]
    fn test_offer_equal_to_price_is_not_a_sale() {
        let shown = display_price(dec(100), Some(dec(100)), None);
        assert!(!shown.is_discounted());
    }

    #[test]
    fn test_discount_is_clamped_and_rounded() {
        assert_eq!(display_price(dec(100), None, Some(dec(150))).price, Decimal::ZERO);
        assert_eq!(display_price(dec(100), None, Some(dec(-5))).price, dec(100));

        let shown = display_price(Decimal::new(999, 2), None, Some(dec(15)));
        assert_eq!(shown.price, Decimal::new(849, 2));
    }

    #[test]
    fn test_zero_price_ignores_discount() {
        let shown = display_price(Decimal::ZERO, None, Some(dec(10)));
        assert_eq!(shown.price, Decimal::ZERO);
        assert!(!shown.is_discounted());
    }

    #[test]
    fn test_formatted() {
        let shown = display_price(Decimal::new(1250, 2), None, Some(dec(10)));
        let (price, original) = shown.formatted(CurrencyCode::EUR);
        assert_eq!(price, "€11.25");
        assert_eq!(original.as_deref(), Some("€12.50"));
    }

    #[test]
    fn test_product_on_sale() {
        let mut product = Product::new(1, "Kettle", dec(40));
        assert!(!product.is_on_sale());
        product.offer_price = Some(dec(35));
        assert!(product.is_on_sale());
    }
}
