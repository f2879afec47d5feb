use serde_json::json;
use trove_core::ProviderCredentials;
use trove_search::providers::{RawgProvider, SpotifyProvider, TmdbProvider};
use trove_search::types::ResultMetadata;
use trove_search::{ExternalSource, FailureCause, SearchError, SearchProvider};
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{all_credentials, config_for};

#[tokio::test]
async fn test_tmdb_multi_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/search/multi"))
        .and(header("authorization", "Bearer tmdb-token"))
        .and(query_param("query", "인셉션"))
        .and(query_param("page", "1"))
        .and(query_param("language", "ko-KR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "total_pages": 3,
            "total_results": 45,
            "results": [
                {
                    "id": 27205,
                    "media_type": "movie",
                    "title": "인셉션",
                    "original_title": "Inception",
                    "release_date": "2010-07-15",
                    "poster_path": "/inception.jpg",
                    "vote_average": 8.4
                },
                {"id": 525, "media_type": "person", "name": "Christopher Nolan"},
                {
                    "id": 1399,
                    "media_type": "tv",
                    "name": "왕좌의 게임",
                    "first_air_date": "2011-04-17",
                    "poster_path": null
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TmdbProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("인셉션", 1).await.unwrap();

    assert_eq!(page.total, 45);
    assert!(page.has_more);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].external_id, "movie:27205");
    assert_eq!(
        page.items[0].cover_image_url,
        Some(format!("{}/images/inception.jpg", server.uri()))
    );
    assert_eq!(page.items[1].external_id, "tv:1399");
    assert_eq!(page.items[1].cover_image_url, None);
}

#[tokio::test]
async fn test_rawg_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games"))
        .and(query_param("key", "rawg-key"))
        .and(query_param("search", "zelda"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 41,
            "next": null,
            "results": [{
                "id": 22511,
                "slug": "the-legend-of-zelda-breath-of-the-wild",
                "name": "The Legend of Zelda: Breath of the Wild",
                "released": "2017-03-03",
                "background_image": "https://media.rawg.io/media/games/zelda.jpg",
                "rating": 4.45,
                "platforms": [{"platform": {"name": "Nintendo Switch"}}],
                "genres": [{"name": "Adventure"}]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = RawgProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("zelda", 2).await.unwrap();

    assert_eq!(page.total, 41);
    assert!(!page.has_more);
    assert_eq!(page.items[0].external_id, "22511");
    assert_eq!(page.items[0].external_source, ExternalSource::Rawg);
}

fn mount_spotify_token(status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header_exists("authorization"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "access_token": "spotify-access",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
}

#[tokio::test]
async fn test_spotify_token_then_search() {
    let server = MockServer::start().await;
    mount_spotify_token(200).expect(1).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(header("authorization", "Bearer spotify-access"))
        .and(query_param("q", "아이유 팔레트"))
        .and(query_param("type", "album"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "albums": {
                "total": 120,
                "next": "https://api.spotify.com/v1/search?offset=40",
                "items": [{
                    "id": "3tx8gQqWbGwqIGZHqDNrGe",
                    "name": "Palette",
                    "album_type": "album",
                    "release_date": "2017-04-21",
                    "total_tracks": 10,
                    "artists": [{"name": "IU"}],
                    "images": [{"url": "https://i.scdn.co/image/palette"}],
                    "external_urls": {"spotify": "https://open.spotify.com/album/3tx8"}
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = SpotifyProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("아이유 - 팔레트", 2).await.unwrap();

    assert_eq!(page.total, 120);
    assert!(page.has_more);
    let album = &page.items[0];
    assert_eq!(album.creator, "IU");
    let ResultMetadata::Music(meta) = &album.metadata else {
        panic!("expected music metadata");
    };
    assert_eq!(meta.total_tracks, Some(10));
}

#[tokio::test]
async fn test_spotify_rejected_credentials() {
    let server = MockServer::start().await;
    mount_spotify_token(401).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider = SpotifyProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("palette", 1).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::AuthRejected {
            provider: ExternalSource::Spotify
        }
    ));
}

fn assert_malformed(err: SearchError, source: ExternalSource) {
    assert!(
        matches!(
            err,
            SearchError::ProviderUnavailable {
                provider,
                cause: FailureCause::Malformed(_),
            } if provider == source
        ),
        "{source}: unexpected {err:?}"
    );
}

#[tokio::test]
async fn test_tmdb_error_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/search/multi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 7,
            "status_message": "Invalid API key: You must be granted a valid key.",
            "success": false
        })))
        .mount(&server)
        .await;

    let provider = TmdbProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("인셉션", 1).await.unwrap_err();

    assert_malformed(err, ExternalSource::Tmdb);
}

#[tokio::test]
async fn test_rawg_error_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/games"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "The key parameter is not provided"
        })))
        .mount(&server)
        .await;

    let provider = RawgProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("zelda", 1).await.unwrap_err();

    assert_malformed(err, ExternalSource::Rawg);
}

#[tokio::test]
async fn test_spotify_body_without_albums_is_malformed() {
    let server = MockServer::start().await;
    mount_spotify_token(200).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {"total": 0, "next": null, "items": []}
        })))
        .mount(&server)
        .await;

    let provider = SpotifyProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("palette", 1).await.unwrap_err();

    assert_malformed(err, ExternalSource::Spotify);
}

#[tokio::test]
async fn test_single_providers_require_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let config = config_for(&server, ProviderCredentials::default());

    let providers: Vec<Box<dyn SearchProvider>> = vec![
        Box::new(TmdbProvider::new(&config).unwrap()),
        Box::new(RawgProvider::new(&config).unwrap()),
        Box::new(SpotifyProvider::new(&config).unwrap()),
    ];
    for provider in providers {
        let err = provider.search("anything", 1).await.unwrap_err();
        assert_eq!(err.provider(), Some(provider.source()));
        assert!(matches!(err, SearchError::MissingCredentials { .. }));
    }
}
