//! Faceted search data model.
//!
//! This module contains:
//! - Facet fields, values and per-field value lists
//! - The user-facing search query shape
//! - Raw backend facet counts

mod types;

pub use types::*;
