//! End-to-end tests for the facet service built from YAML configuration.
//!
//! This test suite verifies that:
//! - Configured permissions hide values per actor while sharing one backend query
//! - Tab-scoped sections and field overrides reach the backend request
//! - Invalidation forces a fresh backend query
//! - Related record layouts come from configuration

use std::io::Write;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use rsfacet_domain::model::{ActiveTab, RawFacetData, SearchQuery};
use rsfacet_domain::params::{BackendFacetRequest, FacetContext};
use rsfacet_domain::permission::ActorContext;
use rsfacet_domain::record::IndexDocument;
use rsfacet_domain::{DomainResult, SearchBackend};
use rsfacet_server::{build_authorizer, build_store, related_records, AppConfig, FacetService};

const CONFIG: &str = r#"
facets:
  sections:
    - name: Results
      fields:
        - { field: building, label: Library }
        - { field: format, label: Format }
      overrides:
        - { field: format, operator: or }
    - name: Advanced
      fields:
        - { field: language, label: Language }
    - name: catalog_Advanced
      fields:
        - { field: building, label: Library }
      overrides:
        - { field: building, limit: -1, sort: index }
    - name: myTab_Advanced
      fields:
        - { field: collectionName, label: Collection }

permissions:
  facets:
    - { field: building, value: "Staff Library", rule: staff }
    - { field: building, value: "Staff Library", rule: campus }
    - { field: building, value: "Archive", rule: staff }
    - { field: collectionName, value: "Rare Books", rule: StaffRule }
  rules:
    - name: staff
      role: [staff]
    - name: campus
      ip_range: ["10.0.0.0-10.0.255.255"]
    - name: StaffRule
      role: [staff]
      require: all

records:
  fields:
    relation: related_items
"#;

/// Backend returning fixed counts and recording every request.
struct RecordingBackend {
    calls: AtomicUsize,
    requests: Mutex<Vec<BackendFacetRequest>>,
}

impl RecordingBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> BackendFacetRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl SearchBackend for RecordingBackend {
    async fn facet_query(
        &self,
        request: &BackendFacetRequest,
        _query: &SearchQuery,
    ) -> DomainResult<RawFacetData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok(RawFacetData::new()
            .with_field(
                "building",
                [("Main Library", 40), ("Staff Library", 12), ("Archive", 3)],
            )
            .with_field("format", [("Book", 50), ("Journal", 5)])
            .with_field("language", [("English", 30), ("German", 25)])
            .with_field("collectionName", [("Rare Books", 4), ("Maps", 9)]))
    }
}

fn load_config() -> AppConfig {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{CONFIG}").unwrap();
    AppConfig::load(file.path()).unwrap()
}

fn build_service(
    config: &AppConfig,
) -> (
    Arc<RecordingBackend>,
    FacetService<RecordingBackend, rsfacet_domain::MokaFacetStore, rsfacet_domain::RuleBasedAuthorizer>,
) {
    let backend = Arc::new(RecordingBackend::new());
    let service = FacetService::from_config(
        config,
        Arc::clone(&backend),
        build_store(&config.cache),
        build_authorizer(&config.permissions),
    );
    (backend, service)
}

#[tokio::test]
async fn test_actors_share_one_backend_query_but_see_different_values() {
    // Arrange
    let config = load_config();
    let (backend, service) = build_service(&config);
    let query = SearchQuery::new("history").with_filter("format", "Book");

    let anonymous = ActorContext::anonymous();
    let staff = ActorContext::anonymous().with_username("kim").with_role("staff");
    let on_campus = ActorContext::anonymous().with_ip("10.0.4.20".parse::<IpAddr>().unwrap());

    // Act
    let public = service.facets(&query, FacetContext::Results, &anonymous).await.unwrap();
    let full = service.facets(&query, FacetContext::Results, &staff).await.unwrap();
    let campus = service.facets(&query, FacetContext::Results, &on_campus).await.unwrap();

    // Assert
    assert_eq!(backend.calls(), 1);
    assert_eq!(
        public.get("building").unwrap().value_strings(),
        vec!["Main Library"]
    );
    assert_eq!(public.get("building").unwrap().hidden, 2);
    assert_eq!(
        full.get("building").unwrap().value_strings(),
        vec!["Main Library", "Staff Library", "Archive"]
    );
    assert_eq!(
        campus.get("building").unwrap().value_strings(),
        vec!["Main Library", "Staff Library"]
    );

    // Unrestricted field passes through with applied flags
    let format = public.get("format").unwrap();
    assert_eq!(format.value_strings(), vec!["Book", "Journal"]);
    assert!(format.values[0].is_applied());
    assert!(!format.values[1].is_applied());
}

#[tokio::test]
async fn test_backend_request_reflects_configuration() {
    let config = load_config();
    let (backend, service) = build_service(&config);
    let actor = ActorContext::anonymous();

    service
        .facets(&SearchQuery::new(""), FacetContext::Results, &actor)
        .await
        .unwrap();

    let request = backend.last_request();
    assert_eq!(request.rows, 0);
    let params = request.to_params();
    assert!(params.contains(&("facet.field".to_string(), "building".to_string())));
    assert!(params.contains(&(
        "facet.field".to_string(),
        "{!ex=format_filter}format".to_string()
    )));
    assert!(!params.iter().any(|(name, _)| name.starts_with("f.")));
}

#[tokio::test]
async fn test_tab_scoped_section_replaces_generic_section() {
    let config = load_config();
    let (backend, service) = build_service(&config);
    let actor = ActorContext::anonymous();

    let tabbed = SearchQuery::new("").with_tab(ActiveTab::new("catalog"));
    let results = service
        .facets(&tabbed, FacetContext::Advanced, &actor)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results.get("building").is_some());
    let request = backend.last_request();
    assert_eq!(request.section.as_deref(), Some("catalog_Advanced"));
    let params = request.to_params();
    assert!(params.contains(&("f.building.facet.limit".to_string(), "-1".to_string())));
    assert!(params.contains(&("f.building.facet.sort".to_string(), "index".to_string())));

    // Another tab has no section of its own
    let other = SearchQuery::new("").with_tab(ActiveTab::new("articles"));
    let results = service
        .facets(&other, FacetContext::Advanced, &actor)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results.get("language").is_some());
    assert_eq!(backend.last_request().section.as_deref(), Some("Advanced"));
}

#[tokio::test]
async fn test_mixed_case_tab_section_and_restricted_field() {
    let config = load_config();
    let (backend, service) = build_service(&config);
    let query = SearchQuery::new("").with_tab(ActiveTab::new("myTab"));
    let anonymous = ActorContext::anonymous();
    let staff = ActorContext::anonymous().with_username("kim").with_role("staff");

    let public = service
        .facets(&query, FacetContext::Advanced, &anonymous)
        .await
        .unwrap();
    let full = service
        .facets(&query, FacetContext::Advanced, &staff)
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1);
    assert_eq!(backend.last_request().section.as_deref(), Some("myTab_Advanced"));
    let collection = public.get("collectionName").unwrap();
    assert_eq!(collection.value_strings(), vec!["Maps"]);
    assert_eq!(collection.hidden, 1);
    assert_eq!(
        full.get("collectionName").unwrap().value_strings(),
        vec!["Rare Books", "Maps"]
    );
}

#[tokio::test]
async fn test_invalidate_all_forces_fresh_backend_query() {
    let config = load_config();
    let (backend, service) = build_service(&config);
    let actor = ActorContext::anonymous();
    let query = SearchQuery::new("maps");

    service.facets(&query, FacetContext::Results, &actor).await.unwrap();
    service.facets(&query, FacetContext::Results, &actor).await.unwrap();
    assert_eq!(backend.calls(), 1);

    service.invalidate_all().await;
    service.facets(&query, FacetContext::Results, &actor).await.unwrap();

    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_disabled_cache_queries_backend_every_time() {
    let mut config = load_config();
    config.cache.enabled = false;
    let (backend, service) = build_service(&config);
    let actor = ActorContext::anonymous();
    let query = SearchQuery::new("maps");

    service.facets(&query, FacetContext::Results, &actor).await.unwrap();
    service.facets(&query, FacetContext::Results, &actor).await.unwrap();

    assert_eq!(backend.calls(), 2);
}

#[test]
fn test_related_records_read_configured_field() {
    let config = load_config();
    let resolver = related_records(&config.records);
    let doc = IndexDocument::new().with_values(
        "related_items",
        ["Preceded by", "Older Title", "NoRemainder", "NoPartNo", "NoVolNo", "NoAc", "123"],
    );

    let relations = resolver.relations(&doc);

    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].title.as_deref(), Some("Older Title"));
    assert_eq!(relations[0].sub_title, None);
    assert_eq!(relations[0].id.as_deref(), Some("123"));
}
