//! Product type.

use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A product as seen by the cart: identity, canonical price and the
/// variant axes a shopper may pick from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Price in the canonical currency.
    pub price: Money,
    /// Category label.
    #[serde(default)]
    pub category: String,
    /// Available colors, empty when the product has no color axis.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Available sizes, empty when the product has no size axis.
    #[serde(default)]
    pub sizes: Vec<String>,
}

impl Product {
    /// Create a product without variant axes.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category: category.into(),
            colors: Vec::new(),
            sizes: Vec::new(),
        }
    }

    /// Set the color axis.
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the size axis.
    pub fn with_sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the product offers any variant choice.
    pub fn has_variants(&self) -> bool {
        !self.colors.is_empty() || !self.sizes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_builder() {
        let product = Product::new("P1", "Runner", Money::from_cents(10000), "shoes")
            .with_colors(["Black", "White"])
            .with_sizes(vec!["9".to_string(), "10".to_string()]);

        assert_eq!(product.id.as_str(), "P1");
        assert_eq!(product.colors, vec!["Black", "White"]);
        assert!(product.has_variants());
    }

    #[test]
    fn test_product_deserializes_without_variants() {
        let json = r#"{"id":"P2","name":"Mug","price":1250}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.price, Money::from_cents(1250));
        assert!(!product.has_variants());
    }
}
