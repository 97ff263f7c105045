//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing an OrderId where a ProductId is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
    ($name:ident, $prefix:literal) => {
        define_id!($name);

        impl $name {
            /// Generate a new random ID carrying this type's prefix.
            pub fn generate() -> Self {
                Self(generate_id($prefix))
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId, "ORD");

/// Generate a short, human-readable random identifier such as `ORD-7K2M9QXA4T`.
fn generate_id(prefix: &str) -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    let body: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{}-{}", prefix, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = ProductId::new("prod-123");
        assert_eq!(id.as_str(), "prod-123");
    }

    #[test]
    fn test_order_id_generation() {
        let id1 = OrderId::generate();
        let id2 = OrderId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("ORD-"));
        assert_eq!(id1.as_str().len(), 14);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = ProductId::new("P1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""P1""#);
    }

    #[test]
    fn test_id_equality() {
        let id1 = ProductId::new("same");
        let id2: ProductId = "same".into();
        let id3 = ProductId::new("different");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }
}
