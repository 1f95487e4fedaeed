//! Application facade over the facet cache.
//!
//! [`FacetService`] owns one [`FacetCache`] built from static configuration
//! and is shared across requests. Search backends are supplied by the
//! caller; the store and authorizer default to the bundled implementations.

use std::sync::Arc;

use tracing::{debug, info};

use rsfacet_domain::cache::{
    register_facet_cache_metrics, FacetCache, FacetCacheStore, MokaFacetStore,
};
use rsfacet_domain::decoder::PositionalSchema;
use rsfacet_domain::model::{FacetResults, SearchQuery};
use rsfacet_domain::params::{FacetContext, FacetParamsBuilder, FacetSettings};
use rsfacet_domain::permission::{
    ActorContext, AuthorizationFailurePolicy, AuthorizationService, FacetPermissionEvaluator,
    PermissionConfig, RuleBasedAuthorizer,
};
use rsfacet_domain::record::RelatedRecordResolver;
use rsfacet_domain::{DomainResult, SearchBackend};

use crate::config::{AppConfig, CacheSettings, PermissionSettings, RecordSettings};

/// Facet lookups for the whole application.
pub struct FacetService<B, S, A> {
    cache: FacetCache<B, S, A>,
}

impl<B, S, A> std::fmt::Debug for FacetService<B, S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetService")
            .field("cache", &self.cache)
            .finish()
    }
}

impl<B, S, A> FacetService<B, S, A>
where
    B: SearchBackend,
    S: FacetCacheStore,
    A: AuthorizationService,
{
    pub fn new(
        settings: FacetSettings,
        permissions: PermissionConfig,
        backend: Arc<B>,
        store: Arc<S>,
        authorizer: Arc<A>,
        policy: AuthorizationFailurePolicy,
    ) -> Self {
        let cache = FacetCache::new(
            FacetParamsBuilder::new(Arc::new(settings)),
            backend,
            store,
            FacetPermissionEvaluator::new(authorizer),
            Arc::new(permissions),
        )
        .with_failure_policy(policy);

        Self { cache }
    }

    /// Builds the service from loaded configuration.
    ///
    /// `config` is expected to have passed [`AppConfig::validate`].
    pub fn from_config(
        config: &AppConfig,
        backend: Arc<B>,
        store: Arc<S>,
        authorizer: Arc<A>,
    ) -> Self {
        info!(
            sections = config.facets.sections.len(),
            restricted_fields = config.permissions.facets.len(),
            policy = ?config.permissions.on_authorization_error,
            "initializing facet service"
        );
        register_facet_cache_metrics();

        Self::new(
            config.facets.clone(),
            config.permissions.facets.clone(),
            backend,
            store,
            authorizer,
            config.permissions.on_authorization_error,
        )
    }

    /// Facets of `query` as `actor` may see them.
    pub async fn facets(
        &self,
        query: &SearchQuery,
        context: FacetContext,
        actor: &ActorContext,
    ) -> DomainResult<FacetResults> {
        self.cache.get_facets(query, context, actor).await
    }

    /// Drops every cached facet set.
    pub async fn invalidate_all(&self) {
        debug!("invalidating all cached facets");
        self.cache.store().invalidate_all().await;
    }

    pub fn cache(&self) -> &FacetCache<B, S, A> {
        &self.cache
    }
}

/// Creates the bundled moka-backed store.
pub fn build_store(settings: &CacheSettings) -> Arc<MokaFacetStore> {
    Arc::new(MokaFacetStore::new(settings.to_cache_config()))
}

/// Creates the bundled rule-based authorizer from the configured rules.
pub fn build_authorizer(settings: &PermissionSettings) -> Arc<RuleBasedAuthorizer> {
    Arc::new(RuleBasedAuthorizer::new(settings.rules.clone()))
}

/// Creates the related record resolver, using built-in layouts where
/// none are configured.
pub fn related_records(settings: &RecordSettings) -> RelatedRecordResolver {
    RelatedRecordResolver::new(
        settings.fields.clone(),
        settings
            .parent_schema
            .clone()
            .unwrap_or_else(PositionalSchema::parent),
        settings
            .child_schema
            .clone()
            .unwrap_or_else(PositionalSchema::child),
        settings
            .relation_schema
            .clone()
            .unwrap_or_else(PositionalSchema::relation),
    )
}
