//! Facet result caching with per-actor permission filtering.
//!
//! # Architecture
//!
//! ```text
//! SearchQuery ──► FacetParamsBuilder ──► BackendFacetRequest ──► FacetCacheKey
//!                                                                    │
//!                         miss: SearchBackend (rows=0) ──► FacetData ┤ store
//!                                                                    │
//!                              hit or stored: FacetData (unfiltered) ┘
//!                                                                    │
//!                    FacetPermissionEvaluator (current actor) ◄──────┘
//!                                                                    │
//!                                                           FacetResults
//! ```
//!
//! # Key Design
//!
//! - The key is derived only after parameters are initialized; a key
//!   computed earlier would not reflect the resolved section or tab.
//! - The store holds every value the backend returned. Two actors sharing
//!   a key see different filtered views without a second backend query.
//! - Filtering runs on every call and is never cached.
//! - Backend failures propagate and leave the store untouched.

mod key;
mod store;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::SearchBackend;
use crate::error::DomainResult;
use crate::model::{
    FacetData, FacetList, FacetResults, FacetValue, FilteredFacetList, RawFacetData, SearchQuery,
};
use crate::params::{BackendFacetRequest, FacetContext, FacetParamsBuilder};
use crate::permission::{
    ActorContext, AuthorizationFailurePolicy, AuthorizationService, EvaluationScope,
    FacetPermissionEvaluator, PermissionConfig,
};

pub use key::FacetCacheKey;
pub use store::{FacetCacheConfig, FacetCacheStore, MokaFacetStore};

/// Facet lookups for one configuration, shared across requests.
///
/// All collaborators are injected; the cache holds no state of its own
/// beyond what the store keeps.
pub struct FacetCache<B, S, A> {
    builder: FacetParamsBuilder,
    backend: Arc<B>,
    store: Arc<S>,
    evaluator: FacetPermissionEvaluator<A>,
    permissions: Arc<PermissionConfig>,
    failure_policy: AuthorizationFailurePolicy,
}

impl<B, S, A> std::fmt::Debug for FacetCache<B, S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetCache")
            .field("builder", &self.builder)
            .field("permissions", &self.permissions)
            .field("failure_policy", &self.failure_policy)
            .finish_non_exhaustive()
    }
}

impl<B, S, A> FacetCache<B, S, A>
where
    B: SearchBackend,
    S: FacetCacheStore,
    A: AuthorizationService,
{
    pub fn new(
        builder: FacetParamsBuilder,
        backend: Arc<B>,
        store: Arc<S>,
        evaluator: FacetPermissionEvaluator<A>,
        permissions: Arc<PermissionConfig>,
    ) -> Self {
        Self {
            builder,
            backend,
            store,
            evaluator,
            permissions,
            failure_policy: AuthorizationFailurePolicy::default(),
        }
    }

    /// Sets what happens to a value whose rules cannot be evaluated.
    pub fn with_failure_policy(mut self, policy: AuthorizationFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the facets of `query` as visible to `actor`.
    ///
    /// `init` selects the configuration section used to initialize the
    /// facet parameters.
    pub async fn get_facets(
        &self,
        query: &SearchQuery,
        init: FacetContext,
        actor: &ActorContext,
    ) -> DomainResult<FacetResults> {
        let request = self.builder.build(init, query.tab.as_ref());
        let key = FacetCacheKey::derive(&request, query)?;

        let data = match self.store.get(&key).await {
            Some(data) => {
                debug!(key = %key, "facet cache hit");
                data
            }
            None => {
                debug!(key = %key, fields = request.fields.len(), "facet cache miss, querying backend");
                let raw = self.backend.facet_query(&request, query).await?;
                let data = Arc::new(assemble(&request, query, &raw));
                self.store.set(key, Arc::clone(&data)).await;
                data
            }
        };

        self.filter(&data, actor).await
    }

    /// Produces the actor-visible view of unfiltered facet data.
    pub async fn filter(&self, data: &FacetData, actor: &ActorContext) -> DomainResult<FacetResults> {
        let mut scope = EvaluationScope::new();
        let mut lists = Vec::with_capacity(data.len());

        for list in data.iter() {
            lists.push(self.filter_list(&mut scope, list, actor).await?);
        }

        Ok(FacetResults::new(lists))
    }

    async fn filter_list(
        &self,
        scope: &mut EvaluationScope,
        list: &FacetList,
        actor: &ActorContext,
    ) -> DomainResult<FilteredFacetList> {
        let field = list.field();

        if !self.permissions.restricts(field.as_str()) {
            return Ok(FilteredFacetList {
                field: field.clone(),
                label: list.label().to_string(),
                values: list.values().to_vec(),
                hidden: 0,
            });
        }

        let mut values = Vec::with_capacity(list.values().len());
        for value in list.values() {
            let rules = self.permissions.rules_for(field.as_str(), value.value());
            let permitted = match self
                .evaluator
                .is_permitted_in(scope, actor, rules, value.value())
                .await
            {
                Ok(permitted) => permitted,
                Err(err) => match self.failure_policy {
                    AuthorizationFailurePolicy::Propagate => return Err(err),
                    AuthorizationFailurePolicy::FailClosed => {
                        warn!(field = %field, value = value.value(), error = %err, "authorization failed, hiding facet value");
                        false
                    }
                    AuthorizationFailurePolicy::FailOpen => {
                        warn!(field = %field, value = value.value(), error = %err, "authorization failed, showing facet value");
                        true
                    }
                },
            };
            if permitted {
                values.push(value.clone());
            }
        }

        let hidden = list.values().len() - values.len();
        if hidden > 0 {
            metrics::counter!("rsfacet_facet_values_hidden_total").increment(hidden as u64);
        }

        Ok(FilteredFacetList {
            field: field.clone(),
            label: list.label().to_string(),
            values,
            hidden,
        })
    }
}

/// Converts raw backend counts into facet lists in configured field order.
fn assemble(request: &BackendFacetRequest, query: &SearchQuery, raw: &RawFacetData) -> FacetData {
    let lists = request
        .fields
        .iter()
        .map(|entry| {
            let field = entry.field.as_str();
            let operator = request.operator(field);
            let values = raw
                .counts(field)
                .unwrap_or_default()
                .iter()
                .map(|(value, count)| {
                    FacetValue::new(value.clone(), *count, operator, query.is_applied(field, value))
                })
                .collect();
            FacetList::new(entry.field.clone(), entry.label.clone(), values)
        })
        .collect();

    FacetData::new(lists)
}

/// Registers facet cache metric descriptions.
///
/// Call once during application startup; optional.
///
/// # Metrics Registered
///
/// - `rsfacet_cache_hits_total` - Facet cache hits
/// - `rsfacet_cache_misses_total` - Facet cache misses
/// - `rsfacet_facet_values_hidden_total` - Facet values removed by permissions
pub fn register_facet_cache_metrics() {
    metrics::describe_counter!("rsfacet_cache_hits_total", "Total number of facet cache hits");
    metrics::describe_counter!("rsfacet_cache_misses_total", "Total number of facet cache misses");
    metrics::describe_counter!(
        "rsfacet_facet_values_hidden_total",
        "Total number of facet values hidden by permission rules"
    );
}
