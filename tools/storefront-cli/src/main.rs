//! Shop CLI - Command line front end for the storefront core.
//!
//! Commands:
//! - `shop catalog` - List the demo products
//! - `shop cart` - Add, remove and review cart items
//! - `shop checkout` - Place an order for the cart
//! - `shop orders` - Review and void past orders
//! - `shop prefs` - Show or change preferences
//! - `shop config` - Manage configuration

mod catalog;
mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CartArgs, CatalogArgs, CheckoutArgs, ConfigArgs, OrdersArgs, PrefsArgs};

/// Shop CLI - Browse, fill a cart and check out from the terminal
#[derive(Parser)]
#[command(name = "shop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(ConfigArgs),

    #[command(flatten)]
    Shop(ShopCommands),
}

/// Commands that work on the store.
#[derive(Subcommand)]
enum ShopCommands {
    /// List products
    Catalog(CatalogArgs),

    /// Manage the cart
    Cart(CartArgs),

    /// Place an order for the cart
    Checkout(CheckoutArgs),

    /// Review past orders
    Orders(OrdersArgs),

    /// Show or change preferences
    Prefs(PrefsArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info,storefront_commerce=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Execute command
    let result = match cli.command {
        Commands::Config(args) => commands::config::run(args, &ctx).await,
        Commands::Shop(command) => run_shop(command, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

async fn run_shop(command: ShopCommands, ctx: &context::Context) -> Result<()> {
    let mut session = ctx.open_session()?;

    let result = match command {
        ShopCommands::Catalog(args) => commands::catalog::run(args, ctx, &session).await,
        ShopCommands::Cart(args) => commands::cart::run(args, ctx, &session).await,
        ShopCommands::Checkout(args) => commands::checkout::run(args, ctx, &session).await,
        ShopCommands::Orders(args) => commands::orders::run(args, ctx, &session).await,
        ShopCommands::Prefs(args) => commands::prefs::run(args, ctx, &mut session).await,
    };

    session.flush(&ctx.output);
    result
}
