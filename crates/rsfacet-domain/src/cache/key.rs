//! Cache keys derived from initialized facet requests.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::DomainResult;
use crate::model::{ActiveTab, FacetField, SearchQuery};
use crate::params::{BackendFacetRequest, FacetContext};

/// Key of one unfiltered facet result in the cache store.
///
/// Format: `<context>:<sha256 hex>` where the digest covers the initialized
/// request and the query shape. The context prefix lets a cache manager
/// evict all entries of one call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacetCacheKey(String);

#[derive(Serialize)]
struct KeyMaterial<'a> {
    request: &'a BackendFacetRequest,
    query: &'a str,
    filters: &'a BTreeMap<FacetField, Vec<String>>,
    sort: Option<&'a str>,
    tab: Option<&'a ActiveTab>,
}

impl FacetCacheKey {
    /// Wraps an existing key string (e.g., for explicit eviction).
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derives the key of a query.
    ///
    /// `request` must be the fully initialized request for this query;
    /// deriving from partially built parameters yields keys that collide
    /// across sections or tabs.
    pub fn derive(request: &BackendFacetRequest, query: &SearchQuery) -> DomainResult<Self> {
        let material = KeyMaterial {
            request,
            query: &query.query,
            filters: &query.filters,
            sort: query.sort.as_deref(),
            tab: query.tab.as_ref(),
        };
        let digest = Sha256::digest(serde_json::to_vec(&material)?);
        let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();

        Ok(Self(format!("{}:{hex}", Self::prefix(request.context))))
    }

    /// Key prefix shared by every entry of a context.
    pub fn prefix(context: FacetContext) -> String {
        context.section_name().to_lowercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key belongs to `context`.
    pub fn is_context(&self, context: FacetContext) -> bool {
        self.0
            .split_once(':')
            .is_some_and(|(prefix, _)| prefix == Self::prefix(context))
    }
}

impl fmt::Display for FacetCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
