//! Product catalog types.
//!
//! Products are supplied by the caller; the core only reads them when a
//! line item is added.

mod product;

pub use product::Product;
