//! Shopping cart module.
//!
//! Contains the cart ledger, line items, pricing snapshots and promo codes.

mod ledger;
mod line_item;
mod pricing;
mod promotion;

pub use ledger::{CartLedger, MAX_QUANTITY_PER_ITEM};
pub use line_item::{LineItem, LineKey};
pub use pricing::{CartPricing, CartSummary};
pub use promotion::{
    normalize_code, AppliedPromotion, PromotionEngine, PromotionState, DEFAULT_PROMOTIONS,
};
