//! Shipping details captured in the first checkout step.

use crate::error::CommerceError;
use serde::{Deserialize, Serialize};

/// Where and to whom an order ships.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShippingDetails {
    /// Recipient's full name.
    pub full_name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal/ZIP code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

impl ShippingDetails {
    /// Create details with the two required fields.
    pub fn new(full_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = postal_code.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Check the fields the shipping step requires.
    ///
    /// Full name and address must be non-blank; an email, when given, must
    /// look like one. The first failing field is reported.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.full_name.trim().is_empty() {
            return Err(CommerceError::validation("full_name", "full name is required"));
        }
        if self.address.trim().is_empty() {
            return Err(CommerceError::validation("address", "address is required"));
        }
        let email = self.email.trim();
        if !email.is_empty() && !looks_like_email(email) {
            return Err(CommerceError::validation("email", "email address is malformed"));
        }
        Ok(())
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        [&self.address, &self.city, &self.postal_code, &self.country]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Details handed to the payment collaborator.
    pub fn billing(&self) -> BillingDetails {
        BillingDetails {
            name: self.full_name.clone(),
            email: (!self.email.is_empty()).then(|| self.email.clone()),
            address: self.one_line(),
            postal_code: (!self.postal_code.is_empty()).then(|| self.postal_code.clone()),
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Billing details sent along with card input for tokenization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: String,
    pub email: Option<String>,
    pub address: String,
    pub postal_code: Option<String>,
}
