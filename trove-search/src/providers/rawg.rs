//! RAWG video game database.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use trove_core::TroveConfig;

use super::{SearchProvider, http_client, read_json, send};
use crate::errors::SearchError;
use crate::normalize::non_empty;
use crate::query::dash_to_space;
use crate::types::{CanonicalResult, ExternalSource, GameMetadata, PagedResult, ResultMetadata};

/// RAWG adapter; the API key is mandatory.
#[derive(Debug)]
pub struct RawgProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct GamesResponse {
    count: u64,
    next: Option<String>,
    results: Vec<Game>,
}

#[derive(Debug, Deserialize)]
struct Game {
    id: u64,
    slug: Option<String>,
    name: Option<String>,
    released: Option<String>,
    background_image: Option<String>,
    rating: Option<f64>,
    #[serde(default)]
    platforms: Option<Vec<PlatformEntry>>,
    #[serde(default)]
    genres: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct PlatformEntry {
    platform: Named,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl RawgProvider {
    /// Creates the adapter from shared configuration.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client(ExternalSource::Rawg, &config.network)?,
            base_url: config.endpoints.rawg.clone(),
            api_key: config.credentials.rawg_api_key.clone(),
            page_size: config.paging.rawg_page_size.max(1),
        })
    }

    fn normalize(game: Game) -> Option<CanonicalResult> {
        let title = non_empty(game.name)?;

        Some(CanonicalResult {
            external_id: game.id.to_string(),
            external_source: ExternalSource::Rawg,
            title,
            creator: String::new(),
            cover_image_url: non_empty(game.background_image),
            metadata: ResultMetadata::Game(GameMetadata {
                slug: non_empty(game.slug),
                released: non_empty(game.released),
                rating: game.rating,
                platforms: game
                    .platforms
                    .unwrap_or_default()
                    .into_iter()
                    .map(|entry| entry.platform.name)
                    .collect(),
                genres: game.genres.into_iter().map(|genre| genre.name).collect(),
            }),
        })
    }
}

#[async_trait]
impl SearchProvider for RawgProvider {
    fn source(&self) -> ExternalSource {
        ExternalSource::Rawg
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredentials {
                provider: ExternalSource::Rawg,
            })?;

        let query = dash_to_space(query);
        if query.is_empty() {
            return Ok(PagedResult::empty());
        }

        let page = page.max(1);
        debug!("RAWG search: query='{query}' page={page} page_size={}", self.page_size);

        let page_param = page.to_string();
        let size_param = self.page_size.to_string();
        let request = self
            .client
            .get(format!("{}/api/games", self.base_url))
            .query(&[
                ("key", key),
                ("search", query.as_str()),
                ("page", page_param.as_str()),
                ("page_size", size_param.as_str()),
            ]);

        let response = send(ExternalSource::Rawg, request).await?;
        let body: GamesResponse = read_json(ExternalSource::Rawg, response).await?;

        let has_more = body.next.is_some();
        let items = body
            .results
            .into_iter()
            .filter_map(Self::normalize)
            .collect();

        Ok(PagedResult::new(items, body.count, has_more))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_game() {
        let game: Game = serde_json::from_value(serde_json::json!({
            "id": 3498,
            "slug": "grand-theft-auto-v",
            "name": "Grand Theft Auto V",
            "released": "2013-09-17",
            "background_image": "https://media.rawg.io/media/games/gta.jpg",
            "rating": 4.47,
            "platforms": [{"platform": {"name": "PC"}}, {"platform": {"name": "PlayStation 5"}}],
            "genres": [{"name": "Action"}]
        }))
        .unwrap();

        let result = RawgProvider::normalize(game).unwrap();

        assert_eq!(result.external_id, "3498");
        assert_eq!(result.creator, "");
        let ResultMetadata::Game(meta) = result.metadata else {
            panic!("expected game metadata");
        };
        assert_eq!(meta.platforms, vec!["PC", "PlayStation 5"]);
        assert_eq!(meta.genres, vec!["Action"]);
    }

    #[test]
    fn test_null_platforms_and_missing_name() {
        let game: Game = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": null,
            "platforms": null
        }))
        .unwrap();

        assert!(RawgProvider::normalize(game).is_none());
    }
}
