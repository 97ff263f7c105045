//! Order history.
//!
//! Orders are created by a successful checkout, changed only by voiding, and
//! never deleted.

mod order;
mod store;

pub use order::{Order, OrderStatus};
pub use store::{OrderHistorySummary, OrderStore, SpendPolicy};
