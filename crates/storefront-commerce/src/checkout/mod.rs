//! Checkout module.
//!
//! Shipping details, payment selection and the confirmation flow that turns
//! a cart into an order.

mod address;
mod flow;
mod payment;
mod saved;
mod service;

pub use address::{BillingDetails, ShippingDetails};
pub use flow::{CheckoutFlow, CheckoutStep, ConfirmTicket};
pub use payment::{
    CardBrand, CardInput, PaymentGateway, PaymentMethod, PaymentSelection, PaymentToken,
    SimulatedGateway, TokenizationFailure, DECLINED_TEST_CARD, NETWORK_ERROR_TEST_CARD,
};
pub use saved::SavedDetailsStore;
pub use service::CheckoutService;
