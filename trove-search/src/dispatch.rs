//! Content-type dispatch table.
//!
//! Books go through the [`BookOrchestrator`]; every other category has a
//! single provider that is called directly.

use std::sync::Arc;

use tracing::debug;
use trove_core::TroveConfig;

use crate::certificate::{CertificateAdapter, CertificateSearch};
use crate::errors::SearchError;
use crate::orchestrator::{BookOrchestrator, BookPolicy, FetchMode};
use crate::providers::{
    BookLookup, GoogleBooksProvider, NaverBookProvider, RawgProvider, SearchProvider,
    SpotifyProvider, TmdbProvider,
};
use crate::types::{CanonicalResult, Category, PagedResult, SearchOptions};

/// Providers backing each category.
#[derive(Debug, Clone)]
pub struct DispatchProviders {
    pub primary_books: Arc<dyn SearchProvider>,
    pub secondary_books: Arc<dyn SearchProvider>,
    pub book_lookup: Arc<dyn BookLookup>,
    pub video: Arc<dyn SearchProvider>,
    pub game: Arc<dyn SearchProvider>,
    pub music: Arc<dyn SearchProvider>,
    pub certificate: Arc<CertificateAdapter>,
}

/// Single entry point for content searches.
#[derive(Debug, Clone)]
pub struct SearchDispatcher {
    books: BookOrchestrator,
    book_lookup: Arc<dyn BookLookup>,
    video: Arc<dyn SearchProvider>,
    game: Arc<dyn SearchProvider>,
    music: Arc<dyn SearchProvider>,
    certificate: Arc<CertificateAdapter>,
}

impl SearchDispatcher {
    /// Builds every live provider adapter from `config`.
    ///
    /// Missing credentials do not fail construction; the affected provider
    /// reports them on first use.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - An HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        let google = Arc::new(GoogleBooksProvider::new(config)?);

        Ok(Self::with_providers(DispatchProviders {
            primary_books: Arc::new(NaverBookProvider::new(config)?),
            secondary_books: google.clone(),
            book_lookup: google,
            video: Arc::new(TmdbProvider::new(config)?),
            game: Arc::new(RawgProvider::new(config)?),
            music: Arc::new(SpotifyProvider::new(config)?),
            certificate: Arc::new(CertificateAdapter::new(config)?),
        }))
    }

    pub fn with_providers(providers: DispatchProviders) -> Self {
        Self {
            books: BookOrchestrator::new(providers.primary_books, providers.secondary_books),
            book_lookup: providers.book_lookup,
            video: providers.video,
            game: providers.game,
            music: providers.music,
            certificate: providers.certificate,
        }
    }

    /// Switches how the book orchestrator schedules its second provider.
    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.books = self.books.with_fetch_mode(fetch_mode);
        self
    }

    /// Searches `content_type` (case-insensitive category name).
    ///
    /// # Errors
    /// - `SearchError::UnsupportedContentType` - `content_type` names no category; no provider is called
    /// - `SearchError::ProviderUnavailable` - The routed provider failed
    /// - `SearchError::MissingCredentials` - The routed provider is not configured
    /// - `SearchError::AuthRejected` - The routed provider refused its credentials
    pub async fn search(
        &self,
        content_type: &str,
        query: &str,
        page: u32,
        options: SearchOptions,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let category: Category = content_type.parse()?;
        self.search_category(category, query, page, options).await
    }

    /// Searches an already parsed category.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - The routed provider failed
    /// - `SearchError::MissingCredentials` - The routed provider is not configured
    /// - `SearchError::AuthRejected` - The routed provider refused its credentials
    pub async fn search_category(
        &self,
        category: Category,
        query: &str,
        page: u32,
        options: SearchOptions,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let page = page.max(1);
        debug!("Dispatching {category} search: query='{query}' page={page}");

        let provider = match category {
            Category::Book => {
                return self
                    .books
                    .search(query, page, BookPolicy::from(options))
                    .await;
            }
            Category::Video => &self.video,
            Category::Game => &self.game,
            Category::Music => &self.music,
            Category::Certificate => {
                return self.certificate.search(query, page).await;
            }
        };

        provider.search(query, page).await
    }

    /// Certificate search that also reports whether the registry or the
    /// local dataset answered.
    pub async fn search_certificates(&self, query: &str, page: u32) -> CertificateSearch {
        self.certificate.search_with_source(query, page.max(1)).await
    }

    /// Direct book lookup by ISBN or volume id.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - The lookup provider failed
    pub async fn lookup_book(&self, id: &str) -> Result<Option<CanonicalResult>, SearchError> {
        self.book_lookup.get_by_external_id(id).await
    }
}
