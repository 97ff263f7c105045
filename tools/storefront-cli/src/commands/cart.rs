//! Cart commands.

use anyhow::{anyhow, bail, Result};
use dialoguer::Confirm;
use serde::Serialize;
use storefront_commerce::catalog::Product;

use super::{CartArgs, CartCommand, LineArgs};
use crate::catalog;
use crate::context::{Context, Session};

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context, session: &Session) -> Result<()> {
    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Add { line, quantity } => add(line, quantity, ctx, session).await,
        CartCommand::Remove { line } => remove(line, ctx, session).await,
        CartCommand::Set { line, quantity } => set(line, quantity, ctx, session).await,
        CartCommand::Show => show(ctx, session).await,
        CartCommand::Clear { yes } => clear(yes, ctx, session).await,
    }
}

/// A cart line resolved against the catalog.
struct Line {
    product: Product,
    color: Option<String>,
    size: Option<String>,
}

impl Line {
    fn resolve(args: &LineArgs) -> Result<Self> {
        let product = catalog::find(&args.product)
            .ok_or_else(|| anyhow!("Unknown product: {}", args.product))?;
        let color = pick_variant("color", &product.colors, args.color.as_deref())?;
        let size = pick_variant("size", &product.sizes, args.size.as_deref())?;
        Ok(Self {
            product,
            color,
            size,
        })
    }

    fn describe(&self) -> String {
        match (&self.color, &self.size) {
            (Some(c), Some(s)) => format!("{} ({} / {})", self.product.name, c, s),
            (Some(v), None) | (None, Some(v)) => format!("{} ({})", self.product.name, v),
            (None, None) => self.product.name.clone(),
        }
    }
}

/// Match a requested variant against a product axis.
///
/// An empty axis takes no choice; a non-empty one requires one of its values.
fn pick_variant(axis: &str, values: &[String], choice: Option<&str>) -> Result<Option<String>> {
    match (values.is_empty(), choice) {
        (true, None) => Ok(None),
        (true, Some(c)) => bail!("This product has no {} option (got '{}')", axis, c),
        (false, None) => bail!("Choose a {} with --{}: {}", axis, axis, values.join(", ")),
        (false, Some(c)) => values
            .iter()
            .find(|v| v.eq_ignore_ascii_case(c.trim()))
            .cloned()
            .map(Some)
            .ok_or_else(|| anyhow!("Unknown {} '{}'. Options: {}", axis, c, values.join(", "))),
    }
}

async fn add(args: LineArgs, quantity: i64, ctx: &Context, session: &Session) -> Result<()> {
    let line = Line::resolve(&args)?;
    let cart = session.shop.cart();
    let mut cart = cart.lock().await;
    cart.add(
        &line.product,
        quantity,
        line.color.as_deref(),
        line.size.as_deref(),
    )?;
    ctx.output
        .debug(&format!("{} x {}", quantity, line.describe()));
    Ok(())
}

async fn remove(args: LineArgs, ctx: &Context, session: &Session) -> Result<()> {
    let line = Line::resolve(&args)?;
    let cart = session.shop.cart();
    let mut cart = cart.lock().await;
    if cart.remove(
        &line.product.id,
        line.color.as_deref(),
        line.size.as_deref(),
    ) {
        ctx.output.debug(&format!("Removed {}", line.describe()));
    } else {
        ctx.output.warn(&format!("{} is not in the cart", line.describe()));
    }
    Ok(())
}

async fn set(args: LineArgs, quantity: i64, ctx: &Context, session: &Session) -> Result<()> {
    let line = Line::resolve(&args)?;
    let cart = session.shop.cart();
    let mut cart = cart.lock().await;
    let matched = cart.update_quantity(
        &line.product.id,
        quantity,
        line.color.as_deref(),
        line.size.as_deref(),
    )?;

    if !matched {
        bail!("{} is not in the cart", line.describe());
    }
    ctx.output
        .debug(&format!("{} x {}", quantity.max(0), line.describe()));
    Ok(())
}

#[derive(Serialize)]
struct CartView {
    items: Vec<CartLineView>,
    item_count: i64,
    subtotal: String,
}

#[derive(Serialize)]
struct CartLineView {
    product_id: String,
    name: String,
    variant: Option<String>,
    quantity: i64,
    unit_price: String,
    line_total: String,
}

async fn show(ctx: &Context, session: &Session) -> Result<()> {
    let shop = &session.shop;
    let view = {
        let cart = shop.cart();
        let cart = cart.lock().await;
        CartView {
            items: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    variant: item.variant_label(),
                    quantity: item.quantity,
                    unit_price: shop.display_price(item.unit_price),
                    line_total: item
                        .line_total()
                        .map(|total| shop.display_price(total))
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: shop.display_price(cart.subtotal()),
        }
    };

    if ctx.output.is_json() {
        ctx.output.json(&view);
        return Ok(());
    }

    ctx.output.header("Cart");
    if view.items.is_empty() {
        ctx.output.info("Your cart is empty. Add something with `shop cart add`.");
        return Ok(());
    }

    let widths = [4, 28, 4, 14];
    ctx.output.table_row(&["ID", "Item", "Qty", "Total"], &widths);
    for line in &view.items {
        let name = match &line.variant {
            Some(variant) => format!("{} ({})", line.name, variant),
            None => line.name.clone(),
        };
        let quantity = line.quantity.to_string();
        ctx.output.table_row(
            &[&line.product_id, &name, &quantity, &line.line_total],
            &widths,
        );
    }
    println!();
    ctx.output.kv("items", &view.item_count.to_string());
    ctx.output.kv("subtotal", &view.subtotal);

    Ok(())
}

async fn clear(yes: bool, ctx: &Context, session: &Session) -> Result<()> {
    let cart = session.shop.cart();
    let mut cart = cart.lock().await;
    if cart.is_empty() {
        ctx.output.info("Cart is already empty");
        return Ok(());
    }

    if !yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove all {} items from the cart?", cart.item_count()))
            .default(false)
            .interact()?;
        if !confirmed {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    cart.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_commerce::ProductId;

    fn axis(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_pick_variant_uses_catalog_spelling() {
        let colors = axis(&["Black", "White"]);
        assert_eq!(
            pick_variant("color", &colors, Some("black")).unwrap(),
            Some("Black".to_string())
        );
    }

    #[test]
    fn test_pick_variant_requires_choice_on_axis() {
        let sizes = axis(&["8", "9"]);
        assert!(pick_variant("size", &sizes, None).is_err());
        assert!(pick_variant("size", &sizes, Some("12")).is_err());
    }

    #[test]
    fn test_pick_variant_rejects_choice_without_axis() {
        assert_eq!(pick_variant("color", &[], None).unwrap(), None);
        assert!(pick_variant("color", &[], Some("Red")).is_err());
    }

    #[test]
    fn test_resolve_line() {
        let args = LineArgs {
            product: "p1".to_string(),
            color: Some("white".to_string()),
            size: Some("10".to_string()),
        };
        let line = Line::resolve(&args).unwrap();
        assert_eq!(line.product.id, ProductId::new("P1"));
        assert_eq!(line.describe(), "Trail Runner (White / 10)");
    }
}
