//! Tests for the facet result cache.
//!
//! Organized by functionality:
//! - Cache population and reuse across actors
//! - Permission filtering
//! - Authorization failure policies
//! - Backend failures

mod mocks;
