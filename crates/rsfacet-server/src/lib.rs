//! rsfacet-server: Configuration and service wiring
//!
//! This crate assembles the domain components into an application:
//! - Configuration loading (YAML file plus environment overrides)
//! - Structured logging setup
//! - The facet service facade
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                rsfacet-server                │
//! ├──────────────────────────────────────────────┤
//! │  config.rs        - Configuration management │
//! │  observability.rs - Logging setup            │
//! │  service.rs       - FacetService facade      │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod observability;
pub mod service;

// Re-exports for convenience
pub use config::{AppConfig, ConfigLoadError};
pub use observability::{init_logging, LoggingConfig};
pub use service::{build_authorizer, build_store, related_records, FacetService};
