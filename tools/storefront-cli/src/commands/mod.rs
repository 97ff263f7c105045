//! CLI command implementations.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod orders;
pub mod prefs;

use clap::{Args, Subcommand};

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    /// Show prices in this currency instead of the preferred one.
    #[arg(long)]
    pub currency: Option<String>,
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

/// Identity of a cart line.
#[derive(Args)]
pub struct LineArgs {
    /// Product ID (see `shop catalog`).
    pub product: String,

    /// Color variant.
    #[arg(long)]
    pub color: Option<String>,

    /// Size variant.
    #[arg(long)]
    pub size: Option<String>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Add a product to the cart.
    Add {
        #[command(flatten)]
        line: LineArgs,

        /// Quantity to add.
        #[arg(short, long, default_value = "1")]
        quantity: i64,
    },
    /// Remove a line from the cart.
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Replace the quantity of a line. Zero removes it.
    Set {
        #[command(flatten)]
        line: LineArgs,

        /// New quantity.
        quantity: i64,
    },
    /// Show the cart.
    Show,
    /// Empty the cart.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    /// Recipient's full name (defaults to saved details).
    #[arg(long)]
    pub name: Option<String>,

    /// Street address (defaults to saved details).
    #[arg(long)]
    pub address: Option<String>,

    /// City.
    #[arg(long)]
    pub city: Option<String>,

    /// Postal/ZIP code.
    #[arg(long)]
    pub postal_code: Option<String>,

    /// Country.
    #[arg(long)]
    pub country: Option<String>,

    /// Contact email.
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone.
    #[arg(long)]
    pub phone: Option<String>,

    /// Card number.
    #[arg(long, conflicts_with = "upi", requires_all = ["expiry", "cvc"])]
    pub card: Option<String>,

    /// Card expiry as MM/YY.
    #[arg(long)]
    pub expiry: Option<String>,

    /// Card security code.
    #[arg(long)]
    pub cvc: Option<String>,

    /// Pay with this UPI ID instead of a card.
    #[arg(long)]
    pub upi: Option<String>,

    /// Promo code to apply.
    #[arg(long)]
    pub promo: Option<String>,

    /// Remember shipping details for next time.
    #[arg(long)]
    pub save_details: bool,
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: Option<OrdersCommand>,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List all orders.
    List,
    /// Show details for one order.
    Show {
        /// Order ID.
        id: String,
    },
    /// Void an order. This cannot be undone.
    Void {
        /// Order ID.
        id: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the total spent.
    Spent {
        /// Count voided orders too.
        #[arg(long)]
        include_voided: bool,
    },
}

/// Arguments for the prefs command.
#[derive(Args)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: Option<PrefsCommand>,
}

#[derive(Subcommand)]
pub enum PrefsCommand {
    /// Show current preferences.
    Show,
    /// Change preferences.
    Set {
        /// Display currency code (e.g. EUR).
        #[arg(long)]
        currency: Option<String>,

        /// Language code.
        #[arg(long)]
        language: Option<String>,

        /// Dark mode on or off.
        #[arg(long)]
        dark_mode: Option<bool>,

        /// Font size (12-24).
        #[arg(long)]
        font_size: Option<u8>,

        /// Multi-factor authentication on or off.
        #[arg(long)]
        mfa: Option<bool>,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
