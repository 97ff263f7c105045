//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    // Storage section
    ctx.output.info("");
    ctx.output.info("[storage]");
    ctx.output.kv("dir", &ctx.storage_dir().display().to_string());
    ctx.output.kv("namespace", &config.storage.namespace);

    // Checkout section
    ctx.output.info("");
    ctx.output.info("[checkout]");
    ctx.output.kv(
        "processing_delay_ms",
        &config.checkout.processing_delay_ms.to_string(),
    );

    // Orders section
    ctx.output.info("");
    ctx.output.info("[orders]");
    let policy = serde_json::to_value(config.orders.spend_policy)?;
    ctx.output
        .kv("spend_policy", policy.as_str().unwrap_or_default());

    // Promo codes
    ctx.output.info("");
    ctx.output.info("[promotions.codes]");
    for (code, fraction) in &config.promotions.codes {
        ctx.output.list_item(&format!("{} ({:.0}% off)", code, fraction * 100.0));
    }

    // Currency overrides
    if !config.currency.rates.is_empty() {
        ctx.output.info("");
        ctx.output.info("[currency.rates]");
        for (code, rate) in &config.currency.rates {
            ctx.output.kv(code, &rate.to_string());
        }
    }

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}
