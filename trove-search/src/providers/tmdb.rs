//! TMDB multi-search for movies and TV series.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use trove_core::TroveConfig;

use super::{SearchProvider, http_client, read_json, send};
use crate::errors::SearchError;
use crate::normalize::non_empty;
use crate::query::dash_to_space;
use crate::types::{
    CanonicalResult, ExternalSource, PagedResult, ResultMetadata, VideoKind, VideoMetadata,
};

/// TMDB adapter authenticated with a v4 read access token.
#[derive(Debug)]
pub struct TmdbProvider {
    client: reqwest::Client,
    base_url: String,
    image_base: String,
    access_token: Option<String>,
    language: String,
}

#[derive(Debug, Deserialize)]
struct MultiSearchResponse {
    page: u32,
    total_pages: u32,
    total_results: u64,
    results: Vec<MultiSearchItem>,
}

#[derive(Debug, Deserialize)]
struct MultiSearchItem {
    id: u64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    overview: Option<String>,
    vote_average: Option<f64>,
}

impl TmdbProvider {
    /// Creates the adapter from shared configuration.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client(ExternalSource::Tmdb, &config.network)?,
            base_url: config.endpoints.tmdb.clone(),
            image_base: config.endpoints.tmdb_images.clone(),
            access_token: config.credentials.tmdb_access_token.clone(),
            language: "ko-KR".to_string(),
        })
    }

    fn normalize(&self, item: MultiSearchItem) -> Option<CanonicalResult> {
        // People share the multi endpoint; only titles are content.
        let (kind, title, original_title, release_date) = match item.media_type.as_deref() {
            Some("movie") => (
                VideoKind::Movie,
                item.title,
                item.original_title,
                item.release_date,
            ),
            Some("tv") => (
                VideoKind::Tv,
                item.name,
                item.original_name,
                item.first_air_date,
            ),
            _ => return None,
        };
        let title = non_empty(title)?;

        let external_id = match kind {
            VideoKind::Movie => format!("movie:{}", item.id),
            VideoKind::Tv => format!("tv:{}", item.id),
        };
        let cover = non_empty(item.poster_path).map(|path| format!("{}{}", self.image_base, path));

        Some(CanonicalResult {
            external_id,
            external_source: ExternalSource::Tmdb,
            title,
            creator: String::new(),
            cover_image_url: cover,
            metadata: ResultMetadata::Video(VideoMetadata {
                kind,
                original_title: non_empty(original_title),
                release_date: non_empty(release_date),
                overview: non_empty(item.overview),
                vote_average: item.vote_average,
            }),
        })
    }
}

#[async_trait]
impl SearchProvider for TmdbProvider {
    fn source(&self) -> ExternalSource {
        ExternalSource::Tmdb
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(SearchError::MissingCredentials {
                provider: ExternalSource::Tmdb,
            })?;

        let query = dash_to_space(query);
        if query.is_empty() {
            return Ok(PagedResult::empty());
        }

        let page = page.max(1);
        debug!("TMDB multi search: query='{query}' page={page}");

        let page_param = page.to_string();
        let request = self
            .client
            .get(format!("{}/3/search/multi", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("query", query.as_str()),
                ("page", page_param.as_str()),
                ("language", self.language.as_str()),
                ("include_adult", "false"),
            ]);

        let response = send(ExternalSource::Tmdb, request).await?;
        let body: MultiSearchResponse = read_json(ExternalSource::Tmdb, response).await?;

        let has_more = body.page.max(page) < body.total_pages;
        let items = body
            .results
            .into_iter()
            .filter_map(|item| self.normalize(item))
            .collect();

        Ok(PagedResult::new(items, body.total_results, has_more))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(media_type: &str) -> MultiSearchItem {
        MultiSearchItem {
            id: 27205,
            media_type: Some(media_type.to_string()),
            title: Some("인셉션".to_string()),
            name: Some("Christopher Nolan".to_string()),
            original_title: Some("Inception".to_string()),
            original_name: None,
            release_date: Some("2010-07-15".to_string()),
            first_air_date: None,
            poster_path: Some("/poster.jpg".to_string()),
            overview: Some(String::new()),
            vote_average: Some(8.4),
        }
    }

    #[test]
    fn test_normalize_movie() {
        let provider = TmdbProvider::new(&TroveConfig::default()).unwrap();
        let result = provider.normalize(item("movie")).unwrap();

        assert_eq!(result.external_id, "movie:27205");
        assert_eq!(result.title, "인셉션");
        assert_eq!(result.creator, "");
        assert_eq!(
            result.cover_image_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        let ResultMetadata::Video(video) = result.metadata else {
            panic!("expected video metadata");
        };
        assert_eq!(video.kind, VideoKind::Movie);
        assert_eq!(video.overview, None);
    }

    #[test]
    fn test_people_are_dropped() {
        let provider = TmdbProvider::new(&TroveConfig::default()).unwrap();
        assert!(provider.normalize(item("person")).is_none());
    }
}
