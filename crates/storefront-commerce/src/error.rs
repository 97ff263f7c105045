//! Commerce error types.

use crate::checkout::TokenizationFailure;
use thiserror::Error;

/// Errors that can occur in cart, promotion, checkout and order operations.
///
/// None of these are fatal: callers translate them into a notification and
/// keep running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// Missing or malformed shipping or payment input.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Promo code not present in the promotion table.
    #[error("Invalid promo code: {0}")]
    InvalidPromoCode(String),

    /// The payment collaborator rejected the card.
    #[error("Payment failed: {0}")]
    PaymentTokenization(TokenizationFailure),

    /// A confirmation is already in flight.
    #[error("Order is already being placed")]
    DuplicateSubmission,

    /// The checkout was abandoned while a confirmation was in flight.
    #[error("Checkout was abandoned before the order completed")]
    CheckoutAbandoned,

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition { from: String, to: String },

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CommerceError {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CommerceError::Validation {
            field,
            message: message.into(),
        }
    }

    /// The field a validation failure refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CommerceError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<storefront_kv::CacheError> for CommerceError {
    fn from(e: storefront_kv::CacheError) -> Self {
        CommerceError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CommerceError {
    fn from(e: serde_json::Error) -> Self {
        CommerceError::Serialization(e.to_string())
    }
}

impl From<TokenizationFailure> for CommerceError {
    fn from(e: TokenizationFailure) -> Self {
        CommerceError::PaymentTokenization(e)
    }
}
