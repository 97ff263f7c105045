//! Demo product catalog.

use storefront_commerce::catalog::Product;
use storefront_commerce::Money;

/// The products the CLI can sell.
pub fn demo_catalog() -> Vec<Product> {
    vec![
        Product::new("P1", "Trail Runner", Money::from_cents(10000), "Footwear")
            .with_colors(["Black", "White"])
            .with_sizes(["8", "9", "10", "11"]),
        Product::new("P2", "Ceramic Mug", Money::from_cents(1250), "Kitchen"),
        Product::new("P3", "Canvas Tote", Money::from_cents(2400), "Accessories")
            .with_colors(["Natural", "Navy"]),
        Product::new("P4", "Wool Beanie", Money::from_cents(1999), "Accessories")
            .with_colors(["Charcoal", "Rust", "Forest"]),
        Product::new("P5", "Espresso Machine", Money::from_cents(199950), "Kitchen"),
    ]
}

/// Look up a product by id, ignoring case.
pub fn find(id: &str) -> Option<Product> {
    demo_catalog()
        .into_iter()
        .find(|p| p.id.as_str().eq_ignore_ascii_case(id.trim()))
}
