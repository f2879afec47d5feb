//! Scripted provider for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::SearchProvider;
use crate::errors::{FailureCause, SearchError};
use crate::types::{BookMetadata, CanonicalResult, ExternalSource, PagedResult, ResultMetadata};

/// Provider that answers every call with the same canned outcome and
/// records what it was asked.
#[derive(Debug)]
pub struct StubProvider {
    source: ExternalSource,
    outcome: Result<PagedResult<CanonicalResult>, FailureCause>,
    calls: AtomicUsize,
    queries: Mutex<Vec<(String, u32)>>,
}

impl StubProvider {
    pub fn returning(source: ExternalSource, page: PagedResult<CanonicalResult>) -> Self {
        Self::with_outcome(source, Ok(page))
    }

    pub fn failing(source: ExternalSource, cause: FailureCause) -> Self {
        Self::with_outcome(source, Err(cause))
    }

    fn with_outcome(
        source: ExternalSource,
        outcome: Result<PagedResult<CanonicalResult>, FailureCause>,
    ) -> Self {
        Self {
            source,
            outcome,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<(String, u32)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl SearchProvider for StubProvider {
    fn source(&self) -> ExternalSource {
        self.source
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push((query.to_string(), page));

        self.outcome
            .clone()
            .map_err(|cause| SearchError::unavailable(self.source, cause))
    }
}

/// Minimal book result for merge tests.
pub fn book(source: ExternalSource, isbn: &str, title: &str) -> CanonicalResult {
    CanonicalResult {
        external_id: if isbn.is_empty() {
            format!("{}:{title}", source.as_str())
        } else {
            isbn.to_string()
        },
        external_source: source,
        title: title.to_string(),
        creator: String::new(),
        cover_image_url: None,
        metadata: ResultMetadata::Book(BookMetadata {
            isbn: isbn.to_string(),
            ..BookMetadata::default()
        }),
    }
}

/// Page of `count` books whose ISBNs are `prefix` followed by an index.
pub fn book_page(
    source: ExternalSource,
    prefix: &str,
    count: usize,
    has_more: bool,
) -> PagedResult<CanonicalResult> {
    let items = (0..count)
        .map(|i| book(source, &format!("{prefix}{i:03}"), &format!("Book {i}")))
        .collect::<Vec<_>>();
    let total = items.len() as u64;
    PagedResult::new(items, total, has_more)
}
