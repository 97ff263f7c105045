//! Line item types.

use crate::catalog::Product;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Identity of a line item: the product plus the chosen variant.
///
/// Two line items with equal keys never coexist in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl LineKey {
    pub fn new(product_id: impl Into<ProductId>, color: Option<&str>, size: Option<&str>) -> Self {
        Self {
            product_id: product_id.into(),
            color: color.map(str::to_string),
            size: size.map(str::to_string),
        }
    }
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Product name (denormalized for display).
    pub name: String,
    /// Product category (denormalized for display).
    #[serde(default)]
    pub category: String,
    /// Selected color, if the product has a color axis.
    #[serde(default)]
    pub color: Option<String>,
    /// Selected size, if the product has a size axis.
    #[serde(default)]
    pub size: Option<String>,
    /// Unit price in the canonical currency.
    pub unit_price: Money,
    /// Quantity, always at least 1.
    pub quantity: i64,
}

impl LineItem {
    /// Create a line item for `product`.
    pub fn new(product: &Product, quantity: i64, color: Option<&str>, size: Option<&str>) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            color: color.map(str::to_string),
            size: size.map(str::to_string),
            unit_price: product.price,
            quantity,
        }
    }

    /// This item's identity key.
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }

    /// Whether this item has the given identity.
    pub fn matches(&self, product_id: &ProductId, color: Option<&str>, size: Option<&str>) -> bool {
        &self.product_id == product_id
            && self.color.as_deref() == color
            && self.size.as_deref() == size
    }

    /// `unit_price * quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    /// Variant label such as "Black / 10".
    pub fn variant_label(&self) -> Option<String> {
        match (&self.color, &self.size) {
            (Some(c), Some(s)) => Some(format!("{} / {}", c, s)),
            (Some(c), None) => Some(c.clone()),
            (None, Some(s)) => Some(s.clone()),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shoe() -> Product {
        Product::new("P1", "Runner", Money::from_cents(10000), "shoes")
    }

    #[test]
    fn test_matches_includes_variant() {
        let item = LineItem::new(&shoe(), 1, Some("Black"), None);
        let id = ProductId::new("P1");

        assert!(item.matches(&id, Some("Black"), None));
        assert!(!item.matches(&id, Some("White"), None));
        assert!(!item.matches(&id, Some("Black"), Some("10")));
        assert!(!item.matches(&id, None, None));
    }

    #[test]
    fn test_key_equality() {
        let a = LineItem::new(&shoe(), 1, Some("Black"), Some("10"));
        let b = LineItem::new(&shoe(), 4, Some("Black"), Some("10"));
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), LineKey::new("P1", Some("Black"), Some("10")));
    }

    #[test]
    fn test_line_total() {
        let item = LineItem::new(&shoe(), 3, None, None);
        assert_eq!(item.line_total(), Some(Money::from_cents(30000)));
    }

    #[test]
    fn test_variant_label() {
        assert_eq!(
            LineItem::new(&shoe(), 1, Some("Black"), Some("10")).variant_label(),
            Some("Black / 10".to_string())
        );
        assert_eq!(LineItem::new(&shoe(), 1, None, None).variant_label(), None);
    }
}
