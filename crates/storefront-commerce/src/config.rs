//! Storefront configuration.
//!
//! Every section is optional; an empty file yields the built-in defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cart::{PromotionEngine, DEFAULT_PROMOTIONS};
use crate::currency::{CurrencyFormatter, CurrencyTable};
use crate::money::Currency;
use crate::orders::SpendPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub orders: OrdersConfig,

    #[serde(default)]
    pub promotions: PromotionsConfig,

    #[serde(default)]
    pub currency: CurrencyConfig,
}

impl StorefrontConfig {
    /// Promotion table from the `[promotions]` section.
    pub fn promotion_engine(&self) -> PromotionEngine {
        PromotionEngine::new(self.promotions.codes.clone())
    }

    /// Formatter with any `[currency]` rate overrides applied.
    pub fn currency_formatter(&self) -> CurrencyFormatter {
        let table = self
            .currency
            .rates
            .iter()
            .fold(CurrencyTable::default(), |table, (code, rate)| {
                match Currency::from_code(code) {
                    Some(currency) => table.with_rate(currency, *rate),
                    None => {
                        tracing::warn!(code = %code, "ignoring rate for unsupported currency");
                        table
                    }
                }
            });
        CurrencyFormatter::new(table)
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.checkout.processing_delay_ms)
    }
}

/// Where records are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one file per record.
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    /// Prefix for record keys.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(".shop")
}

fn default_namespace() -> String {
    "shop".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            namespace: default_namespace(),
        }
    }
}

/// Checkout behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Simulated processing time after payment is authorized.
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,
}

fn default_processing_delay_ms() -> u64 {
    1500
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: default_processing_delay_ms(),
        }
    }
}

/// Order history behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(default)]
    pub spend_policy: SpendPolicy,
}

/// Promo code table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionsConfig {
    /// Code to fraction of the subtotal taken off.
    #[serde(default = "default_codes")]
    pub codes: BTreeMap<String, f64>,
}

fn default_codes() -> BTreeMap<String, f64> {
    DEFAULT_PROMOTIONS
        .iter()
        .map(|(code, fraction)| (code.to_string(), *fraction))
        .collect()
}

impl Default for PromotionsConfig {
    fn default() -> Self {
        Self {
            codes: default_codes(),
        }
    }
}

/// Conversion rate overrides, keyed by currency code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}
