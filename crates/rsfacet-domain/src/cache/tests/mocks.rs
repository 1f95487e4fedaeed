//! Mock implementations for facet cache testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::SearchBackend;
use crate::error::{DomainError, DomainResult};
use crate::model::{RawFacetData, SearchQuery};
use crate::params::BackendFacetRequest;

/// Search backend returning canned facet counts and counting calls.
pub struct MockSearchBackend {
    response: Mutex<Result<RawFacetData, String>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<BackendFacetRequest>>,
}

impl MockSearchBackend {
    pub fn new(response: RawFacetData) -> Self {
        Self {
            response: Mutex::new(Ok(response)),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        let backend = Self::new(RawFacetData::new());
        backend.fail_with(message);
        backend
    }

    pub fn fail_with(&self, message: &str) {
        *self.response.lock().unwrap() = Err(message.to_string());
    }

    pub fn respond_with(&self, response: RawFacetData) {
        *self.response.lock().unwrap() = Ok(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<BackendFacetRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SearchBackend for MockSearchBackend {
    async fn facet_query(
        &self,
        request: &BackendFacetRequest,
        _query: &SearchQuery,
    ) -> DomainResult<RawFacetData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(|message| DomainError::Backend { message })
    }
}
