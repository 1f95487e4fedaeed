//! Search backend client contract.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{RawFacetData, SearchQuery};
use crate::params::BackendFacetRequest;

/// Client for the search index.
///
/// Timeouts and retries belong to the implementation; errors are returned
/// to the caller unchanged.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs a facet-only query and returns `(value, count)` pairs per field.
    async fn facet_query(
        &self,
        request: &BackendFacetRequest,
        query: &SearchQuery,
    ) -> DomainResult<RawFacetData>;
}
