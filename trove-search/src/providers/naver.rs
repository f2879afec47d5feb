//! Naver Book Search, the regional book provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use trove_core::TroveConfig;

use super::{SearchProvider, http_client, page_offset, read_json, send};
use crate::errors::SearchError;
use crate::normalize::{compact_date, non_empty, pick_isbn, strip_html, synthetic_id};
use crate::query::dash_to_space;
use crate::types::{BookMetadata, CanonicalResult, ExternalSource, PagedResult, ResultMetadata};

/// Highest `start` value Naver accepts.
const MAX_START: u32 = 1000;
/// Highest `display` value Naver accepts.
const MAX_DISPLAY: u32 = 100;

/// Naver book search adapter.
///
/// Authenticates with the client id/secret header pair; both are required.
#[derive(Debug)]
pub struct NaverBookProvider {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
    display: u32,
}

#[derive(Debug, Deserialize)]
struct NaverResponse {
    total: u64,
    items: Vec<NaverItem>,
}

#[derive(Debug, Deserialize)]
struct NaverItem {
    #[serde(default)]
    title: String,
    link: Option<String>,
    image: Option<String>,
    #[serde(default)]
    author: String,
    publisher: Option<String>,
    pubdate: Option<String>,
    #[serde(default)]
    isbn: String,
    description: Option<String>,
}

impl NaverBookProvider {
    /// Creates the adapter from shared configuration.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client(ExternalSource::Naver, &config.network)?,
            base_url: config.endpoints.naver.clone(),
            credentials: config
                .credentials
                .naver()
                .map(|(id, secret)| (id.to_string(), secret.to_string())),
            display: config.paging.naver_display.clamp(1, MAX_DISPLAY),
        })
    }

    /// 1-indexed `start` parameter for `page`.
    pub fn start_offset(page: u32, display: u32) -> u32 {
        page_offset(page, display).saturating_add(1)
    }

    fn normalize(item: NaverItem) -> Option<CanonicalResult> {
        let title = strip_html(&item.title);
        if title.is_empty() {
            return None;
        }

        let creator = strip_html(&item.author)
            .split('^')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let isbn = pick_isbn(&item.isbn);
        let publisher = non_empty(item.publisher.map(|p| strip_html(&p)));

        let external_id = if isbn.is_empty() {
            synthetic_id(
                ExternalSource::Naver,
                &[
                    title.as_str(),
                    creator.as_str(),
                    publisher.as_deref().unwrap_or_default(),
                ],
            )
        } else {
            isbn.clone()
        };

        Some(CanonicalResult {
            external_id,
            external_source: ExternalSource::Naver,
            title,
            creator,
            cover_image_url: non_empty(item.image),
            metadata: ResultMetadata::Book(BookMetadata {
                isbn,
                publisher,
                publish_date: item.pubdate.as_deref().and_then(compact_date),
                description: non_empty(item.description.map(|d| strip_html(&d))),
                page_count: None,
                categories: Vec::new(),
                link: non_empty(item.link),
            }),
        })
    }
}

#[async_trait]
impl SearchProvider for NaverBookProvider {
    fn source(&self) -> ExternalSource {
        ExternalSource::Naver
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let (client_id, client_secret) = self.credentials.as_ref().ok_or(
            SearchError::MissingCredentials {
                provider: ExternalSource::Naver,
            },
        )?;

        let query = dash_to_space(query);
        if query.is_empty() {
            return Ok(PagedResult::empty());
        }

        let start = Self::start_offset(page, self.display);
        if start > MAX_START {
            debug!("Naver start {start} beyond {MAX_START}, nothing to fetch");
            return Ok(PagedResult::empty());
        }

        debug!(
            "Naver book search: query='{}' start={} display={}",
            query, start, self.display
        );

        let display = self.display.to_string();
        let start_param = start.to_string();
        let request = self
            .client
            .get(format!("{}/v1/search/book.json", self.base_url))
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .query(&[
                ("query", query.as_str()),
                ("display", display.as_str()),
                ("start", start_param.as_str()),
            ]);

        let response = send(ExternalSource::Naver, request).await?;
        let body: NaverResponse = read_json(ExternalSource::Naver, response).await?;

        let received = body.items.len() as u64;
        let next_start = u64::from(start) + received;
        let has_more =
            received > 0 && next_start <= body.total && next_start <= u64::from(MAX_START);

        let items: Vec<CanonicalResult> =
            body.items.into_iter().filter_map(Self::normalize).collect();

        Ok(PagedResult::new(items, body.total, has_more))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, isbn: &str) -> NaverItem {
        NaverItem {
            title: title.to_string(),
            link: Some("https://search.shopping.naver.com/book/catalog/1".to_string()),
            image: Some(String::new()),
            author: "로버트 C. 마틴^박재호".to_string(),
            publisher: Some("인사이트".to_string()),
            pubdate: Some("20131224".to_string()),
            isbn: isbn.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_start_offset() {
        assert_eq!(NaverBookProvider::start_offset(1, 20), 1);
        assert_eq!(NaverBookProvider::start_offset(2, 20), 21);
        assert_eq!(NaverBookProvider::start_offset(3, 10), 21);
    }

    #[test]
    fn test_normalize_book() {
        let result =
            NaverBookProvider::normalize(item("<b>클린 코드</b>", "8966260950 9788966260959"))
                .unwrap();

        assert_eq!(result.title, "클린 코드");
        assert_eq!(result.creator, "로버트 C. 마틴, 박재호");
        assert_eq!(result.external_id, "9788966260959");
        assert_eq!(result.cover_image_url, None);
        let ResultMetadata::Book(book) = &result.metadata else {
            panic!("expected book metadata");
        };
        assert_eq!(book.publish_date.as_deref(), Some("2013-12-24"));
        assert_eq!(book.publisher.as_deref(), Some("인사이트"));
    }

    #[test]
    fn test_missing_isbn_gets_synthetic_id() {
        let result = NaverBookProvider::normalize(item("클린 코드", "")).unwrap();
        assert!(result.external_id.starts_with("naver:"));
        assert_eq!(result.isbn(), "");
    }

    #[test]
    fn test_blank_title_is_dropped() {
        assert!(NaverBookProvider::normalize(item("<b></b>", "9788966260959")).is_none());
    }

    #[test]
    fn test_error_body_is_not_a_page() {
        let body = br#"{"errorMessage":"Scope Status Invalid","errorCode":"024"}"#;
        assert!(serde_json::from_slice::<NaverResponse>(body).is_err());
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let provider = NaverBookProvider::new(&TroveConfig::default()).unwrap();
        let err = provider.search("클린 코드", 1).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::MissingCredentials {
                provider: ExternalSource::Naver
            }
        ));
    }
}
