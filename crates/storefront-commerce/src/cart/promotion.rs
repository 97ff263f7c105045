//! Promo codes.
//!
//! A promo code maps to a fraction of the subtotal. Only one code is active
//! at a time: applying another replaces it.

use std::collections::BTreeMap;

use crate::error::CommerceError;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// Default promotion table.
pub const DEFAULT_PROMOTIONS: [(&str, f64); 3] =
    [("SAVE10", 0.10), ("SAVE20", 0.20), ("WELCOME15", 0.15)];

/// Normalize user input into table form: trimmed and upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A promo code that has been evaluated against a subtotal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedPromotion {
    /// Normalized code.
    pub code: String,
    /// Fraction of the subtotal taken off.
    pub fraction: f64,
    /// Discount amount, within `[0, subtotal]` at evaluation time.
    pub discount: Money,
}

/// Looks up promo codes and computes their discount.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionEngine {
    codes: BTreeMap<String, f64>,
}

impl Default for PromotionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PROMOTIONS.iter().map(|(c, f)| (c.to_string(), *f)))
    }
}

impl PromotionEngine {
    /// Build an engine from `(code, fraction)` pairs.
    ///
    /// Codes are normalized and fractions clamped into `[0, 1]`.
    pub fn new(codes: impl IntoIterator<Item = (String, f64)>) -> Self {
        let codes = codes
            .into_iter()
            .filter_map(|(code, fraction)| {
                let code = normalize_code(&code);
                if code.is_empty() || !fraction.is_finite() {
                    tracing::warn!(code = %code, fraction, "skipping unusable promo code");
                    return None;
                }
                Some((code, fraction.clamp(0.0, 1.0)))
            })
            .collect();
        Self { codes }
    }

    /// Evaluate `code` against `subtotal`.
    ///
    /// Unknown or blank codes fail with [`CommerceError::InvalidPromoCode`].
    /// The discount is derived from the subtotal passed in; it is not kept in
    /// sync with later cart changes.
    pub fn evaluate(&self, code: &str, subtotal: Money) -> Result<AppliedPromotion, CommerceError> {
        let code = normalize_code(code);
        let fraction = *self
            .codes
            .get(&code)
            .ok_or_else(|| CommerceError::InvalidPromoCode(code.clone()))?;

        let ceiling = subtotal.max(Money::zero());
        let discount = ceiling.scale(fraction).clamp_to(Money::zero(), ceiling);
        Ok(AppliedPromotion {
            code,
            fraction,
            discount,
        })
    }

    /// Whether `code` is in the table.
    pub fn is_known(&self, code: &str) -> bool {
        self.codes.contains_key(&normalize_code(code))
    }

    /// All codes with their fractions.
    pub fn codes(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.codes.iter().map(|(c, f)| (c.as_str(), *f))
    }
}

/// The single active promotion of a checkout, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PromotionState {
    active: Option<AppliedPromotion>,
}

impl PromotionState {
    /// Replace any active promotion with `promotion`.
    pub fn apply(&mut self, promotion: AppliedPromotion) -> &AppliedPromotion {
        self.active.insert(promotion)
    }

    /// Drop the active promotion. Returns what was removed.
    pub fn clear(&mut self) -> Option<AppliedPromotion> {
        self.active.take()
    }

    /// The active promotion.
    pub fn active(&self) -> Option<&AppliedPromotion> {
        self.active.as_ref()
    }

    /// Active code, if any.
    pub fn code(&self) -> Option<&str> {
        self.active.as_ref().map(|p| p.code.as_str())
    }

    /// Active discount, zero when none.
    pub fn discount(&self) -> Money {
        self.active
            .as_ref()
            .map(|p| p.discount)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_discount() {
        let engine = PromotionEngine::default();
        let applied = engine.evaluate("SAVE10", Money::from_cents(30000)).unwrap();
        assert_eq!(applied.code, "SAVE10");
        assert_eq!(applied.discount, Money::from_cents(3000));
    }

    #[test]
    fn test_code_is_normalized() {
        let engine = PromotionEngine::default();
        let applied = engine.evaluate("  save20 ", Money::from_cents(1000)).unwrap();
        assert_eq!(applied.code, "SAVE20");
        assert_eq!(applied.discount, Money::from_cents(200));
    }

    #[test]
    fn test_unknown_code_rejected() {
        let engine = PromotionEngine::default();
        assert_eq!(
            engine.evaluate("badcode", Money::from_cents(1000)),
            Err(CommerceError::InvalidPromoCode("BADCODE".to_string()))
        );
        assert!(engine.evaluate("   ", Money::from_cents(1000)).is_err());
    }

    #[test]
    fn test_same_code_twice_is_idempotent() {
        let engine = PromotionEngine::default();
        let subtotal = Money::from_cents(4599);
        let a = engine.evaluate("WELCOME15", subtotal).unwrap();
        let b = engine.evaluate("WELCOME15", subtotal).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_state_replaces_not_stacks() {
        let engine = PromotionEngine::default();
        let subtotal = Money::from_cents(10000);
        let mut state = PromotionState::default();

        state.apply(engine.evaluate("SAVE10", subtotal).unwrap());
        state.apply(engine.evaluate("SAVE20", subtotal).unwrap());

        assert_eq!(state.code(), Some("SAVE20"));
        assert_eq!(state.discount(), Money::from_cents(2000));
    }

    #[test]
    fn test_discount_clamped() {
        let engine = PromotionEngine::new([("ALL".to_string(), 1.5), ("NONE".to_string(), -0.2)]);
        let subtotal = Money::from_cents(999);
        assert_eq!(engine.evaluate("ALL", subtotal).unwrap().discount, subtotal);
        assert_eq!(engine.evaluate("NONE", subtotal).unwrap().discount, Money::zero());
    }

    #[test]
    fn test_empty_subtotal() {
        let engine = PromotionEngine::default();
        let applied = engine.evaluate("SAVE10", Money::zero()).unwrap();
        assert!(applied.discount.is_zero());
    }
}
