//! Spotify album search.
//!
//! Each search first exchanges the client id/secret for a short-lived bearer
//! token (client credentials flow), then queries the catalogue.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use trove_core::TroveConfig;

use super::{SearchProvider, http_client, page_offset, read_json, send};
use crate::errors::{FailureCause, SearchError};
use crate::normalize::{join_names, non_empty};
use crate::query::dash_to_space;
use crate::types::{CanonicalResult, ExternalSource, MusicMetadata, PagedResult, ResultMetadata};

/// Highest `limit` value Spotify accepts.
const MAX_LIMIT: u32 = 50;

/// Spotify adapter; both client credentials are mandatory.
#[derive(Debug)]
pub struct SpotifyProvider {
    client: reqwest::Client,
    base_url: String,
    accounts_url: String,
    credentials: Option<(String, String)>,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    albums: AlbumPage,
}

#[derive(Debug, Deserialize)]
struct AlbumPage {
    total: u64,
    next: Option<String>,
    items: Vec<Album>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    id: String,
    name: Option<String>,
    album_type: Option<String>,
    release_date: Option<String>,
    total_tracks: Option<u32>,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    images: Vec<Image>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl SpotifyProvider {
    /// Creates the adapter from shared configuration.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client(ExternalSource::Spotify, &config.network)?,
            base_url: config.endpoints.spotify.clone(),
            accounts_url: config.endpoints.spotify_accounts.clone(),
            credentials: config
                .credentials
                .spotify()
                .map(|(id, secret)| (id.to_string(), secret.to_string())),
            limit: config.paging.spotify_limit.clamp(1, MAX_LIMIT),
        })
    }

    async fn access_token(&self, client_id: &str, secret: &str) -> Result<String, SearchError> {
        let request = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(client_id, Some(secret))
            .form(&[("grant_type", "client_credentials")]);

        let response = match send(ExternalSource::Spotify, request).await {
            Ok(response) => response,
            Err(SearchError::ProviderUnavailable {
                cause: FailureCause::Status(400 | 401),
                ..
            }) => {
                return Err(SearchError::AuthRejected {
                    provider: ExternalSource::Spotify,
                });
            }
            Err(e) => return Err(e),
        };

        let token: TokenResponse = read_json(ExternalSource::Spotify, response).await?;
        Ok(token.access_token)
    }

    fn normalize(album: Album) -> Option<CanonicalResult> {
        let title = non_empty(album.name)?;
        if album.id.trim().is_empty() {
            return None;
        }

        Some(CanonicalResult {
            external_id: album.id,
            external_source: ExternalSource::Spotify,
            title,
            creator: join_names(album.artists.iter().map(|artist| artist.name.as_str())),
            cover_image_url: non_empty(album.images.into_iter().next().map(|image| image.url)),
            metadata: ResultMetadata::Music(MusicMetadata {
                album_type: non_empty(album.album_type),
                release_date: non_empty(album.release_date),
                total_tracks: album.total_tracks,
                spotify_url: album.external_urls.and_then(|urls| non_empty(urls.spotify)),
            }),
        })
    }
}

#[async_trait]
impl SearchProvider for SpotifyProvider {
    fn source(&self) -> ExternalSource {
        ExternalSource::Spotify
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let (client_id, secret) = self.credentials.as_ref().ok_or(
            SearchError::MissingCredentials {
                provider: ExternalSource::Spotify,
            },
        )?;

        let query = dash_to_space(query);
        if query.is_empty() {
            return Ok(PagedResult::empty());
        }

        let token = self.access_token(client_id, secret).await?;

        let offset = page_offset(page, self.limit);
        debug!("Spotify album search: query='{query}' offset={offset} limit={}", self.limit);

        let limit_param = self.limit.to_string();
        let offset_param = offset.to_string();
        let request = self
            .client
            .get(format!("{}/v1/search", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("type", "album"),
                ("limit", limit_param.as_str()),
                ("offset", offset_param.as_str()),
            ]);

        let response = send(ExternalSource::Spotify, request).await?;
        let body: SearchResponse = read_json(ExternalSource::Spotify, response).await?;

        let AlbumPage { total, next, items } = body.albums;
        let items = items.into_iter().filter_map(Self::normalize).collect();

        Ok(PagedResult::new(items, total, next.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_album() {
        let album: Album = serde_json::from_value(serde_json::json!({
            "id": "4aawyAB9vmqN3uQ7FjRGTy",
            "name": "Global Warming",
            "album_type": "album",
            "release_date": "2012-11-16",
            "total_tracks": 18,
            "artists": [{"name": "Pitbull"}, {"name": "Christina Aguilera"}],
            "images": [{"url": "https://i.scdn.co/image/large"}, {"url": "https://i.scdn.co/image/small"}],
            "external_urls": {"spotify": "https://open.spotify.com/album/4aawyAB9vmqN3uQ7FjRGTy"}
        }))
        .unwrap();

        let result = SpotifyProvider::normalize(album).unwrap();

        assert_eq!(result.creator, "Pitbull, Christina Aguilera");
        assert_eq!(
            result.cover_image_url.as_deref(),
            Some("https://i.scdn.co/image/large")
        );
    }

    #[test]
    fn test_response_without_albums_is_rejected() {
        let body = serde_json::json!({"tracks": {"total": 0, "items": []}});
        assert!(serde_json::from_value::<SearchResponse>(body).is_err());
    }

    #[test]
    fn test_album_without_images_has_no_cover() {
        let album: Album = serde_json::from_value(serde_json::json!({
            "id": "x",
            "name": "Demo",
            "images": []
        }))
        .unwrap();

        let result = SpotifyProvider::normalize(album).unwrap();
        assert_eq!(result.cover_image_url, None);
        assert_eq!(result.creator, "");
    }
}
