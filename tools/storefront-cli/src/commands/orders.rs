//! Order history commands.

use anyhow::{anyhow, Result};
use dialoguer::Confirm;
use serde::Serialize;
use storefront_commerce::orders::{Order, SpendPolicy};
use storefront_commerce::OrderId;

use super::{OrdersArgs, OrdersCommand};
use crate::context::{Context, Session};
use crate::output::status_badge;

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context, session: &Session) -> Result<()> {
    match args.command.unwrap_or(OrdersCommand::List) {
        OrdersCommand::List => list(ctx, session).await,
        OrdersCommand::Show { id } => show(&id, ctx, session).await,
        OrdersCommand::Void { id, yes } => void(&id, yes, ctx, session).await,
        OrdersCommand::Spent { include_voided } => spent(include_voided, ctx, session).await,
    }
}

async fn list(ctx: &Context, session: &Session) -> Result<()> {
    let shop = &session.shop;
    let orders = shop.orders();
    let orders = orders.lock().await;

    if ctx.output.is_json() {
        ctx.output.json(&orders.list());
        return Ok(());
    }

    ctx.output.header("Orders");
    if orders.is_empty() {
        ctx.output.info("No orders yet");
        return Ok(());
    }

    let widths = [22, 17, 6, 14, 8];
    ctx.output
        .table_row(&["ID", "Placed", "Items", "Total", "Status"], &widths);
    for order in orders.list().iter().rev() {
        let placed = order.created_at.format("%Y-%m-%d %H:%M").to_string();
        let items = order.item_count().to_string();
        let total = shop.display_price(order.total);
        let status = status_badge(order.status);
        ctx.output.table_row(
            &[order.id.as_str(), &placed, &items, &total, &status],
            &widths,
        );
    }

    Ok(())
}

async fn show(id: &str, ctx: &Context, session: &Session) -> Result<()> {
    let shop = &session.shop;
    let orders = shop.orders();
    let orders = orders.lock().await;
    let order = find(orders.list(), id)?;

    if ctx.output.is_json() {
        ctx.output.json(order);
        return Ok(());
    }

    ctx.output.header(&format!("Order {}", order.id));
    ctx.output.kv("status", &status_badge(order.status));
    ctx.output.kv("placed", &order.created_at.to_rfc3339());
    if let Some(voided_at) = order.voided_at {
        ctx.output.kv("voided", &voided_at.to_rfc3339());
    }
    ctx.output.kv("ship to", &order.shipping.full_name);
    ctx.output.kv("address", &order.shipping.one_line());
    ctx.output.kv("payment", &order.payment.describe());

    ctx.output.info("Items:");
    for item in &order.items {
        let name = match item.variant_label() {
            Some(variant) => format!("{} ({})", item.name, variant),
            None => item.name.clone(),
        };
        ctx.output.list_item(&format!(
            "{} x {} @ {}",
            item.quantity,
            name,
            shop.display_price(item.unit_price)
        ));
    }

    ctx.output.kv("subtotal", &shop.display_price(order.subtotal));
    if let Some(code) = &order.promo_code {
        ctx.output.kv(
            "discount",
            &format!("-{} ({})", shop.display_price(order.discount), code),
        );
    }
    ctx.output.kv("total", &shop.display_price(order.total));

    Ok(())
}

async fn void(id: &str, yes: bool, ctx: &Context, session: &Session) -> Result<()> {
    let orders = session.shop.orders();
    let mut orders = orders.lock().await;
    let order_id = find(orders.list(), id)?.id.clone();

    if !yes && !ctx.output.is_json() {
        let confirmed = Confirm::new()
            .with_prompt(format!("Void order {}? This cannot be undone.", order_id))
            .default(false)
            .interact()?;
        if !confirmed {
            ctx.output.info("Cancelled");
            return Ok(());
        }
    }

    if !orders.void(&order_id)? {
        ctx.output.warn(&format!("Order {} was already voided", order_id));
    }
    Ok(())
}

#[derive(Serialize)]
struct SpentView {
    orders: usize,
    counted: usize,
    include_voided: bool,
    total_spent: String,
}

async fn spent(include_voided: bool, ctx: &Context, session: &Session) -> Result<()> {
    let shop = &session.shop;
    let orders = shop.orders();
    let orders = orders.lock().await;

    let policy = if include_voided {
        SpendPolicy::IncludeVoided
    } else {
        orders.policy()
    };
    let counted = orders.list().iter().filter(|o| policy.counts(o)).count();
    let view = SpentView {
        orders: orders.len(),
        counted,
        include_voided: policy == SpendPolicy::IncludeVoided,
        total_spent: shop.display_price(orders.total_spent_with(policy)),
    };

    if ctx.output.is_json() {
        ctx.output.json(&view);
        return Ok(());
    }

    ctx.output.header("Total spent");
    ctx.output.kv("total", &view.total_spent);
    ctx.output.kv(
        "orders counted",
        &format!("{} of {}", view.counted, view.orders),
    );
    if !view.include_voided {
        ctx.output.debug("Voided orders are excluded");
    }
    Ok(())
}

/// Find an order by full id or a unique prefix of it, ignoring case.
fn find<'a>(orders: &'a [Order], id: &str) -> Result<&'a Order> {
    let id = id.trim();
    if let Some(order) = orders.iter().find(|o| o.id == OrderId::new(id)) {
        return Ok(order);
    }

    let needle = id.to_uppercase();
    let mut matches = orders
        .iter()
        .filter(|o| o.id.as_str().to_uppercase().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(order), None) if !needle.is_empty() => Ok(order),
        (Some(_), Some(_)) => Err(anyhow!("Order id '{}' is ambiguous", id)),
        _ => Err(anyhow!("Order not found: {}", id)),
    }
}
