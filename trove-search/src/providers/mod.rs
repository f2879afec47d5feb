//! Provider adapters, one per external search API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use trove_core::NetworkConfig;

use crate::errors::{FailureCause, SearchError};
use crate::types::{CanonicalResult, ExternalSource, PagedResult};

pub mod google_books;
#[cfg(test)]
pub mod mock;
pub mod naver;
pub mod rawg;
pub mod spotify;
pub mod tmdb;

pub use google_books::GoogleBooksProvider;
#[cfg(test)]
pub use mock::StubProvider;
pub use naver::NaverBookProvider;
pub use rawg::RawgProvider;
pub use spotify::SpotifyProvider;
pub use tmdb::TmdbProvider;

/// Uniform contract every adapter implements.
///
/// `page` is 1-indexed; adapters translate it into their own offset scheme.
/// Page 0 is treated as page 1.
#[async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Provider identity, stamped on every result.
    fn source(&self) -> ExternalSource;

    /// Search one page of results.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - Non-success status, timeout or undecodable body
    /// - `SearchError::MissingCredentials` - A required secret is not configured
    /// - `SearchError::AuthRejected` - Provider refused the configured secret
    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError>;
}

/// Direct lookup of a single book by identifier.
#[async_trait]
pub trait BookLookup: Send + Sync + std::fmt::Debug {
    /// Book for `id` (ISBN or provider id); `None` when unknown.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - Provider failed to answer
    async fn get_by_external_id(&self, id: &str) -> Result<Option<CanonicalResult>, SearchError>;
}

/// Zero-based item offset of a 1-indexed page.
pub(crate) fn page_offset(page: u32, page_size: u32) -> u32 {
    page.max(1).saturating_sub(1).saturating_mul(page_size)
}

/// Builds the HTTP client an adapter uses for its lifetime.
pub(crate) fn http_client(
    provider: ExternalSource,
    network: &NetworkConfig,
) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(network.provider_timeout)
        .user_agent(network.user_agent)
        .build()
        .map_err(|e| SearchError::from_reqwest(provider, e))
}

/// Sends a request and rejects non-success statuses.
pub(crate) async fn send(
    provider: ExternalSource,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, SearchError> {
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::from_reqwest(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!("{provider} answered HTTP {status}");
        return Err(SearchError::unavailable(
            provider,
            FailureCause::Status(status.as_u16()),
        ));
    }
    Ok(response)
}

/// Decodes a JSON body, reporting decode failures as malformed payloads.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: ExternalSource,
    response: reqwest::Response,
) -> Result<T, SearchError> {
    let body = response
        .bytes()
        .await
        .map_err(|e| SearchError::from_reqwest(provider, e))?;

    serde_json::from_slice(&body)
        .map_err(|e| SearchError::unavailable(provider, FailureCause::Malformed(e.to_string())))
}
