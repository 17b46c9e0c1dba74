//! Cart kept in the session for visitors who have not signed in.
//!
//! Only product ids and quantities are stored; prices are looked up from the
//! catalog on every render. The lines move to the backend cart on login.

use serde::{Deserialize, Serialize};

use shopora_core::ProductId;

/// Largest quantity a single line may hold.
pub const MAX_LINE_QUANTITY: i64 = 99;

/// One product in a session cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Signed-out cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    pub lines: Vec<SessionCartLine>,
}

impl SessionCart {
    /// Add units of a product, merging with an existing line.
    pub fn add(&mut self, product_id: ProductId, quantity: i64) {
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = clamp_quantity(line.quantity.saturating_add(quantity)),
            None => self.lines.push(SessionCartLine {
                product_id,
                quantity: clamp_quantity(quantity),
            }),
        }
    }

    /// Set a line's quantity. Zero or less removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = clamp_quantity(quantity);
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn clamp_quantity(quantity: i64) -> i64 {
    quantity.clamp(1, MAX_LINE_QUANTITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_lines() {
        let mut cart = SessionCart::default();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 1);
        cart.add(ProductId::new(1), 3);

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_quantities_are_clamped() {
        let mut cart = SessionCart::default();
        cart.add(ProductId::new(1), 0);
        assert_eq!(cart.lines[0].quantity, 1);

        cart.add(ProductId::new(1), 500);
        assert_eq!(cart.lines[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let mut cart = SessionCart::default();
        cart.add(ProductId::new(1), 2);
        cart.set_quantity(ProductId::new(1), 4);
        assert_eq!(cart.item_count(), 4);

        cart.set_quantity(ProductId::new(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_ignores_unknown_products() {
        let mut cart = SessionCart::default();
        cart.set_quantity(ProductId::new(9), 3);
        assert!(cart.is_empty());
    }
}
