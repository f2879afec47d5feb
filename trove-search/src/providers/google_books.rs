//! Google Books, the globally indexed book provider.
//!
//! Supports a fielded `intitle:`/`inauthor:` query mode, which is used when
//! the caller's query splits into title and author. A fielded query that
//! finds nothing is retried once as plain text.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use trove_core::TroveConfig;

use super::{BookLookup, SearchProvider, http_client, page_offset, read_json, send};
use crate::errors::{FailureCause, SearchError};
use crate::normalize::{join_names, looks_like_isbn, non_empty, secure_url};
use crate::query::ParsedQuery;
use crate::types::{BookMetadata, CanonicalResult, ExternalSource, PagedResult, ResultMetadata};

/// Highest `maxResults` value Google Books accepts.
const MAX_RESULTS_CAP: u32 = 40;

/// Google Books volumes adapter. The API key is optional.
#[derive(Debug)]
pub struct GoogleBooksProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    total_items: u64,
    // Absent when nothing matched.
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    #[serde(default)]
    id: String,
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    page_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
    image_links: Option<ImageLinks>,
    info_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

impl GoogleBooksProvider {
    /// Creates the adapter from shared configuration.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client(ExternalSource::GoogleBooks, &config.network)?,
            base_url: config.endpoints.google_books.clone(),
            api_key: config.credentials.google_books_api_key.clone(),
            max_results: config.paging.google_max_results.clamp(1, MAX_RESULTS_CAP),
        })
    }

    /// 0-indexed `startIndex` parameter for `page`.
    pub fn start_index(page: u32, max_results: u32) -> u32 {
        page_offset(page, max_results)
    }

    /// Looks a single book up by ISBN or Google volume id.
    ///
    /// ISBN-shaped ids are searched with `isbn:`; anything else is fetched as
    /// a volume id. Unknown ids yield `None`.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - Non-success status (other than 404) or bad payload
    pub async fn get_by_external_id(
        &self,
        id: &str,
    ) -> Result<Option<CanonicalResult>, SearchError> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        if looks_like_isbn(id) {
            let isbn: String = id.chars().filter(|c| *c != '-').collect();
            let page = self.fetch(&format!("isbn:{isbn}"), 1, 1).await?;
            return Ok(page.items.into_iter().next());
        }

        debug!("Google Books volume lookup: id='{id}'");
        let mut request = self.client.get(format!(
            "{}/books/v1/volumes/{}",
            self.base_url,
            urlencoding::encode(id)
        ));
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        match send(ExternalSource::GoogleBooks, request).await {
            Ok(response) => {
                let volume: Volume = read_json(ExternalSource::GoogleBooks, response).await?;
                Ok(Self::normalize(volume))
            }
            Err(SearchError::ProviderUnavailable {
                cause: FailureCause::Status(status),
                ..
            }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch(
        &self,
        q: &str,
        page: u32,
        max_results: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let start_index = Self::start_index(page, max_results);
        debug!("Google Books search: q='{q}' startIndex={start_index} maxResults={max_results}");

        let start_param = start_index.to_string();
        let max_param = max_results.to_string();
        let mut params = vec![
            ("q", q),
            ("startIndex", start_param.as_str()),
            ("maxResults", max_param.as_str()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key.as_str()));
        }

        let request = self
            .client
            .get(format!("{}/books/v1/volumes", self.base_url))
            .query(&params);
        let response = send(ExternalSource::GoogleBooks, request).await?;
        let body: VolumesResponse = read_json(ExternalSource::GoogleBooks, response).await?;

        let received = body.items.len() as u64;
        let has_more = received > 0 && u64::from(start_index) + received < body.total_items;
        let items = body.items.into_iter().filter_map(Self::normalize).collect();

        Ok(PagedResult::new(items, body.total_items, has_more))
    }

    fn normalize(volume: Volume) -> Option<CanonicalResult> {
        let info = volume.volume_info.unwrap_or_default();
        let title = non_empty(info.title)?;
        if volume.id.trim().is_empty() {
            return None;
        }

        let identifier = |kind: &str| {
            info.industry_identifiers
                .iter()
                .find(|id| id.kind == kind)
                .map(|id| id.identifier.trim().to_string())
        };
        let isbn = identifier("ISBN_13")
            .or_else(|| identifier("ISBN_10"))
            .unwrap_or_default();

        let cover = info
            .image_links
            .and_then(|links| secure_url(links.thumbnail).or(secure_url(links.small_thumbnail)));

        Some(CanonicalResult {
            external_id: volume.id,
            external_source: ExternalSource::GoogleBooks,
            title,
            creator: join_names(&info.authors),
            cover_image_url: cover,
            metadata: ResultMetadata::Book(BookMetadata {
                isbn,
                publisher: non_empty(info.publisher),
                publish_date: non_empty(info.published_date),
                description: non_empty(info.description),
                page_count: info.page_count,
                categories: info.categories,
                link: non_empty(info.info_link),
            }),
        })
    }
}

#[async_trait]
impl SearchProvider for GoogleBooksProvider {
    fn source(&self) -> ExternalSource {
        ExternalSource::GoogleBooks
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let parsed = ParsedQuery::parse(query);
        let plain = parsed.plain();
        if plain.is_empty() {
            return Ok(PagedResult::empty());
        }

        if let Some(parts) = &parsed.parts {
            let fielded = format!("intitle:{} inauthor:{}", parts.title, parts.author);
            let result = self.fetch(&fielded, page, self.max_results).await?;
            // A later page past the end is still the fielded result set.
            if result.total > 0 {
                return Ok(result);
            }
            info!("Fielded Google Books query found nothing, retrying as '{plain}'");
        }

        self.fetch(&plain, page, self.max_results).await
    }
}

#[async_trait]
impl BookLookup for GoogleBooksProvider {
    async fn get_by_external_id(&self, id: &str) -> Result<Option<CanonicalResult>, SearchError> {
        GoogleBooksProvider::get_by_external_id(self, id).await
    }
}
