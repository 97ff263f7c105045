//! Checkout command.
//!
//! Walks the whole checkout in one run: shipping details, optional promo
//! code, then payment and confirmation.

use anyhow::Result;
use storefront_commerce::cart::CartPricing;
use storefront_commerce::checkout::{CardInput, PaymentSelection, ShippingDetails};
use storefront_commerce::orders::Order;
use storefront_commerce::Storefront;

use super::CheckoutArgs;
use crate::context::{Context, Session};

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context, session: &Session) -> Result<()> {
    let shop = &session.shop;
    let checkout = shop.checkout();
    let total_steps = if args.promo.is_some() { 4 } else { 3 };
    let mut step = 0;
    let mut next_step = |msg: &str| {
        step += 1;
        ctx.output.step(step, total_steps, msg);
    };

    let saved = checkout.flow().await.shipping().cloned().unwrap_or_default();
    let details = merge_shipping(saved, &args);
    next_step(&format!("Shipping to {}", details.full_name.trim()));
    checkout.submit_shipping(details).await?;

    if let Some(code) = args.promo.as_deref() {
        next_step(&format!("Applying promo code {}", code.trim()));
        let applied = checkout.apply_promotion(code).await?;
        ctx.output.debug(&format!(
            "{} takes {}% off",
            applied.code,
            (applied.fraction * 100.0).round()
        ));
    }

    next_step("Reviewing totals");
    print_pricing(ctx, shop, &checkout.pricing().await);

    let selection = payment_selection(&args)?;
    next_step("Placing order");
    let spinner = ctx.output.spinner("Processing payment...");
    let result = checkout.confirm(selection, args.save_details).await;
    spinner.finish_and_clear();
    let order = result?;

    if ctx.output.is_json() {
        ctx.output.json(&order);
    } else {
        print_order(ctx, shop, &order);
    }
    Ok(())
}

/// Start from the saved details and override whatever was passed.
fn merge_shipping(saved: ShippingDetails, args: &CheckoutArgs) -> ShippingDetails {
    let pick = |arg: &Option<String>, current: String| arg.clone().unwrap_or(current);
    ShippingDetails {
        full_name: pick(&args.name, saved.full_name),
        email: pick(&args.email, saved.email),
        phone: pick(&args.phone, saved.phone),
        address: pick(&args.address, saved.address),
        city: pick(&args.city, saved.city),
        postal_code: pick(&args.postal_code, saved.postal_code),
        country: pick(&args.country, saved.country),
    }
}

/// The payment choice from the command line, if one was made.
fn payment_selection(args: &CheckoutArgs) -> Result<Option<PaymentSelection>> {
    if let Some(upi_id) = &args.upi {
        return Ok(Some(PaymentSelection::upi(upi_id.as_str())));
    }
    let Some(number) = &args.card else {
        return Ok(None);
    };
    let card = CardInput::new(
        number,
        args.expiry.as_deref().unwrap_or_default(),
        args.cvc.as_deref().unwrap_or_default(),
    )?;
    Ok(Some(PaymentSelection::Card(card)))
}

fn print_pricing(ctx: &Context, shop: &Storefront, pricing: &CartPricing) {
    ctx.output.kv("subtotal", &shop.display_price(pricing.subtotal));
    if pricing.has_discount() {
        ctx.output.kv(
            "discount",
            &format!(
                "-{} ({:.0}%)",
                shop.display_price(pricing.discount),
                pricing.discount_percentage()
            ),
        );
    }
    ctx.output.kv("total", &shop.display_price(pricing.total));
}

fn print_order(ctx: &Context, shop: &Storefront, order: &Order) {
    ctx.output.header(&format!("Order {}", order.id));
    ctx.output.kv("items", &order.item_count().to_string());
    ctx.output.kv("ship to", &order.shipping.full_name);
    ctx.output.kv("address", &order.shipping.one_line());
    ctx.output.kv("payment", &order.payment.describe());
    if let Some(code) = &order.promo_code {
        ctx.output.kv("promo", code);
    }
    ctx.output.kv("total", &shop.display_price(order.total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: CheckoutArgs,
    }

    fn parse(argv: &[&str]) -> CheckoutArgs {
        let mut full = vec!["shop"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_merge_prefers_arguments() {
        let saved = ShippingDetails::new("Ada Lovelace", "1 Analytical Way")
            .with_city("London")
            .with_email("ada@example.com");
        let args = parse(&["--address", "12 Difference St", "--city", "Cambridge"]);

        let merged = merge_shipping(saved, &args);
        assert_eq!(merged.full_name, "Ada Lovelace");
        assert_eq!(merged.address, "12 Difference St");
        assert_eq!(merged.city, "Cambridge");
        assert_eq!(merged.email, "ada@example.com");
    }

    #[test]
    fn test_no_payment_arguments() {
        let args = parse(&["--name", "Ada"]);
        assert!(payment_selection(&args).unwrap().is_none());
    }

    #[test]
    fn test_upi_selection() {
        let args = parse(&["--upi", "ada@upi"]);
        match payment_selection(&args).unwrap() {
            Some(PaymentSelection::Upi { upi_id }) => assert_eq!(upi_id, "ada@upi"),
            other => panic!("unexpected selection: {:?}", other),
        }
    }

    #[test]
    fn test_card_selection() {
        let args = parse(&["--card", "4242 4242 4242 4242", "--expiry", "12/30", "--cvc", "123"]);
        match payment_selection(&args).unwrap() {
            Some(PaymentSelection::Card(card)) => assert_eq!(card.last4(), "4242"),
            other => panic!("unexpected selection: {:?}", other),
        }
    }

    #[test]
    fn test_bad_expiry_is_rejected() {
        let args = parse(&["--card", "4242424242424242", "--expiry", "13/30", "--cvc", "123"]);
        assert!(payment_selection(&args).is_err());
    }

    #[test]
    fn test_card_requires_expiry_and_cvc() {
        let mut argv = vec!["shop", "--card", "4242424242424242"];
        assert!(Harness::try_parse_from(argv.clone()).is_err());
        argv.extend(["--expiry", "12/30", "--cvc", "123", "--upi", "ada@upi"]);
        assert!(Harness::try_parse_from(argv).is_err());
    }
}
