//! List the demo catalog.

use anyhow::Result;
use serde::Serialize;
use storefront_commerce::Money;

use super::CatalogArgs;
use crate::catalog::demo_catalog;
use crate::context::{Context, Session};

#[derive(Serialize)]
struct CatalogEntry {
    id: String,
    name: String,
    category: String,
    price: String,
    colors: Vec<String>,
    sizes: Vec<String>,
}

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context, session: &Session) -> Result<()> {
    let shop = &session.shop;
    let price = |amount: Money| match args.currency.as_deref() {
        Some(code) => shop.formatter().format(amount, code),
        None => shop.display_price(amount),
    };

    let entries: Vec<CatalogEntry> = demo_catalog()
        .into_iter()
        .map(|p| CatalogEntry {
            id: p.id.to_string(),
            price: price(p.price),
            name: p.name,
            category: p.category,
            colors: p.colors,
            sizes: p.sizes,
        })
        .collect();

    if ctx.output.is_json() {
        ctx.output.json(&entries);
        return Ok(());
    }

    ctx.output.header("Catalog");
    let widths = [4, 18, 12, 14];
    ctx.output.table_row(&["ID", "Name", "Category", "Price"], &widths);
    for entry in &entries {
        ctx.output.table_row(
            &[&entry.id, &entry.name, &entry.category, &entry.price],
            &widths,
        );
        if !entry.colors.is_empty() {
            ctx.output.kv("colors", &entry.colors.join(", "));
        }
        if !entry.sizes.is_empty() {
            ctx.output.kv("sizes", &entry.sizes.join(", "));
        }
    }

    Ok(())
}
