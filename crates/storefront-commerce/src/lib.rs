//! Cart, pricing and checkout core for the storefront.
//!
//! - **Cart**: line items keyed by product and variant, subtotal, promo codes
//! - **Currency**: canonical-to-display conversion and formatting
//! - **Checkout**: shipping, payment and a guarded confirmation flow
//! - **Orders**: append-only history with one-way voiding
//! - **Preferences**: the shopper's display settings
//!
//! Every store persists through [`storefront_kv::Store`] and reports
//! user-visible outcomes through a [`notify::NotificationSink`].
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_commerce::prelude::*;
//!
//! let shop = Storefront::open(StorefrontConfig::default(), Arc::new(TracingSink))?;
//! let shoe = Product::new("P1", "Runner", Money::from_cents(10000), "shoes");
//! shop.cart().lock().await.add(&shoe, 3, None, None)?;
//!
//! let checkout = shop.checkout();
//! checkout.submit_shipping(ShippingDetails::new("Ada", "12 Analytical Way")).await?;
//! checkout.apply_promotion("SAVE10").await?;
//! let order = checkout.confirm(Some(PaymentSelection::upi("ada@upi")), false).await?;
//! println!("Total: {}", shop.display_price(order.total));
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod currency;
pub mod notify;
pub mod orders;
mod persist;
pub mod preferences;
pub mod storefront;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money};
pub use persist::Record;
pub use storefront::Storefront;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    // Catalog
    pub use crate::catalog::Product;

    // Cart
    pub use crate::cart::{
        AppliedPromotion, CartLedger, CartPricing, CartSummary, LineItem, LineKey,
        PromotionEngine, PromotionState, MAX_QUANTITY_PER_ITEM,
    };

    // Currency
    pub use crate::currency::{CurrencyFormatter, CurrencyTable};

    // Checkout
    pub use crate::checkout::{
        CardInput, CheckoutFlow, CheckoutService, CheckoutStep, PaymentGateway, PaymentMethod,
        PaymentSelection, SavedDetailsStore, ShippingDetails, SimulatedGateway,
        TokenizationFailure,
    };

    // Orders
    pub use crate::orders::{Order, OrderHistorySummary, OrderStatus, OrderStore, SpendPolicy};

    // Everything else
    pub use crate::config::StorefrontConfig;
    pub use crate::notify::{
        ChannelSink, MemorySink, Notification, NotificationEvent, NotificationKind,
        NotificationSink, TracingSink,
    };
    pub use crate::preferences::{Preferences, PreferencesStore};
    pub use crate::storefront::Storefront;
}
