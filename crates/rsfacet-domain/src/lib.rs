//! rsfacet-domain: Core faceted search logic
//!
//! This crate contains:
//! - Facet parameter initialization from static configuration
//! - Facet result caching shared across actors
//! - Per-value permission filtering of facet lists
//! - Positional decoding of parent, child and relation records
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  rsfacet-domain                  │
//! ├──────────────────────────────────────────────────┤
//! │  model/      - Facet lists, values, queries      │
//! │  params/     - Facet parameter builder           │
//! │  cache/      - Facet result cache + filtering    │
//! │  permission/ - Value rules and evaluation        │
//! │  decoder/    - Positional multi-value decoding   │
//! │  record/     - Related record resolution         │
//! │  backend     - Search backend seam               │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod cache;
pub mod decoder;
pub mod error;
pub mod model;
pub mod params;
pub mod permission;
pub mod record;

// Re-export commonly used types at the crate root
pub use backend::SearchBackend;
pub use cache::{
    register_facet_cache_metrics, FacetCache, FacetCacheConfig, FacetCacheKey, FacetCacheStore,
    MokaFacetStore,
};
pub use decoder::{decode, PositionalRecord, PositionalSchema};
pub use error::{DomainError, DomainResult};
pub use params::{FacetContext, FacetParamsBuilder, FacetSettings};
pub use permission::{
    ActorContext, AuthorizationFailurePolicy, AuthorizationService, FacetPermissionEvaluator,
    PermissionConfig, RuleBasedAuthorizer,
};
pub use record::{IndexDocument, RelatedRecordResolver};
