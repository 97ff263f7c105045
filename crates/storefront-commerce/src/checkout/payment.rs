//! Payment selection and the payment collaborator.
//!
//! Raw card input only lives as long as the confirmation that uses it. The
//! number and CVC are held as [`SecretString`] and never serialized; an order
//! keeps the token, brand and last four digits.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Datelike, Utc};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkout::BillingDetails;
use crate::error::CommerceError;

/// Test card number the simulated gateway always declines.
pub const DECLINED_TEST_CARD: &str = "4000000000000002";

/// Test card number the simulated gateway fails with a network error.
pub const NETWORK_ERROR_TEST_CARD: &str = "4000000000000119";

/// Opaque token issued by the payment collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentToken(String);

impl PaymentToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why the collaborator refused to tokenize a card.
///
/// The reason string is shown to the shopper as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizationFailure {
    #[error("{0}")]
    InvalidCard(String),

    #[error("{0}")]
    Declined(String),

    #[error("{0}")]
    Network(String),
}

impl TokenizationFailure {
    /// The collaborator's reason.
    pub fn reason(&self) -> &str {
        match self {
            TokenizationFailure::InvalidCard(r)
            | TokenizationFailure::Declined(r)
            | TokenizationFailure::Network(r) => r,
        }
    }
}

/// Card network, derived from the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    /// Detect the brand of a digits-only card number.
    pub fn detect(number: &str) -> Self {
        let prefix = |n: usize| number.get(..n).and_then(|p| p.parse::<u32>().ok());
        match (prefix(1), prefix(2), prefix(4)) {
            (Some(4), _, _) => CardBrand::Visa,
            (_, Some(34 | 37), _) => CardBrand::Amex,
            (_, Some(51..=55), _) => CardBrand::Mastercard,
            (_, _, Some(2221..=2720)) => CardBrand::Mastercard,
            (_, Some(65), _) | (_, _, Some(6011)) => CardBrand::Discover,
            _ => CardBrand::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "American Express",
            CardBrand::Discover => "Discover",
            CardBrand::Unknown => "Card",
        }
    }
}

/// Raw card details as entered.
#[derive(Debug)]
pub struct CardInput {
    number: SecretString,
    expiry_month: u32,
    expiry_year: i32,
    cvc: SecretString,
}

impl CardInput {
    /// Parse card input. `expiry` is `MM/YY` or `MM/YYYY`.
    ///
    /// Spaces and dashes in the number are ignored. Only the shape is checked
    /// here; the gateway decides whether the card is usable.
    pub fn new(number: &str, expiry: &str, cvc: &str) -> Result<Self, CommerceError> {
        let digits: String = number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CommerceError::validation(
                "card_number",
                "card number must contain only digits",
            ));
        }

        let (expiry_month, expiry_year) = parse_expiry(expiry)
            .ok_or_else(|| CommerceError::validation("expiry", "expiry must be MM/YY"))?;

        Ok(Self {
            number: SecretString::from(digits),
            expiry_month,
            expiry_year,
            cvc: SecretString::from(cvc.trim().to_string()),
        })
    }

    /// Last four digits of the number.
    pub fn last4(&self) -> String {
        let number = self.number.expose_secret();
        number[number.len().saturating_sub(4)..].to_string()
    }

    pub fn brand(&self) -> CardBrand {
        CardBrand::detect(self.number.expose_secret())
    }

    pub fn expiry(&self) -> (u32, i32) {
        (self.expiry_month, self.expiry_year)
    }
}

fn parse_expiry(expiry: &str) -> Option<(u32, i32)> {
    let (month, year) = expiry.trim().split_once('/')?;
    let month: u32 = month.trim().parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let year = year.trim();
    let year: i32 = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse().ok()?,
        _ => return None,
    };
    Some((month, year))
}

/// What the shopper picked on the payment step.
#[derive(Debug)]
pub enum PaymentSelection {
    Card(CardInput),
    Upi { upi_id: String },
}

impl PaymentSelection {
    pub fn upi(upi_id: impl Into<String>) -> Self {
        PaymentSelection::Upi {
            upi_id: upi_id.into(),
        }
    }

    /// Check what can be checked without the collaborator.
    pub fn validate(&self) -> Result<(), CommerceError> {
        match self {
            PaymentSelection::Upi { upi_id } if upi_id.trim().is_empty() => {
                Err(CommerceError::validation("upi_id", "UPI ID is required"))
            }
            _ => Ok(()),
        }
    }
}

/// How a placed order was paid, as recorded on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    Card {
        token: PaymentToken,
        brand: CardBrand,
        last4: String,
    },
    Upi {
        upi_id: String,
    },
}

impl PaymentMethod {
    /// Record a tokenized card.
    pub fn card(token: PaymentToken, card: &CardInput) -> Self {
        PaymentMethod::Card {
            token,
            brand: card.brand(),
            last4: card.last4(),
        }
    }

    /// Short description such as "Visa ending 4242".
    pub fn describe(&self) -> String {
        match self {
            PaymentMethod::Card { brand, last4, .. } => {
                format!("{} ending {}", brand.display_name(), last4)
            }
            PaymentMethod::Upi { upi_id } => format!("UPI {}", upi_id),
        }
    }
}

/// External collaborator that turns card input into a token.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn tokenize(
        &self,
        billing: &BillingDetails,
        card: &CardInput,
    ) -> Result<PaymentToken, TokenizationFailure>;
}

/// In-process gateway with the usual test-card behavior.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway {
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every tokenization by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn tokenize(
        &self,
        billing: &BillingDetails,
        card: &CardInput,
    ) -> Result<PaymentToken, TokenizationFailure> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if billing.name.trim().is_empty() {
            return Err(TokenizationFailure::InvalidCard(
                "Cardholder name is required".to_string(),
            ));
        }

        let number = card.number.expose_secret();
        if !(12..=19).contains(&number.len()) || !luhn_valid(number) {
            return Err(TokenizationFailure::InvalidCard(
                "Your card number is invalid.".to_string(),
            ));
        }

        let today = Utc::now().date_naive();
        let (month, year) = card.expiry();
        if (year, month) < (today.year(), today.month()) {
            return Err(TokenizationFailure::InvalidCard(
                "Your card has expired.".to_string(),
            ));
        }

        let cvc = card.cvc.expose_secret();
        if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(TokenizationFailure::InvalidCard(
                "Your card's security code is invalid.".to_string(),
            ));
        }

        match number {
            DECLINED_TEST_CARD => Err(TokenizationFailure::Declined(
                "Your card was declined.".to_string(),
            )),
            NETWORK_ERROR_TEST_CARD => Err(TokenizationFailure::Network(
                "Could not reach the payment network. Please try again.".to_string(),
            )),
            _ => {
                let bytes: [u8; 18] = rand::thread_rng().gen();
                let token = PaymentToken::new(format!("tok_{}", URL_SAFE_NO_PAD.encode(bytes)));
                tracing::debug!(brand = card.brand().display_name(), "card tokenized");
                Ok(token)
            }
        }
    }
}

/// Luhn checksum over a digits-only string.
fn luhn_valid(number: &str) -> bool {
    let mut sum = 0;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
