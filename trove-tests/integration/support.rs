//! Shared fixtures for provider integration tests.

use serde_json::{Value, json};
use trove_core::{ProviderCredentials, TroveConfig};
use wiremock::MockServer;

/// Credentials for every provider.
pub fn all_credentials() -> ProviderCredentials {
    ProviderCredentials {
        naver_client_id: Some("naver-id".to_string()),
        naver_client_secret: Some("naver-secret".to_string()),
        google_books_api_key: Some("google-key".to_string()),
        tmdb_access_token: Some("tmdb-token".to_string()),
        rawg_api_key: Some("rawg-key".to_string()),
        spotify_client_id: Some("spotify-id".to_string()),
        spotify_client_secret: Some("spotify-secret".to_string()),
        qnet_service_key: Some("qnet-key".to_string()),
    }
}

/// Configuration pointing every provider at `server`.
pub fn config_for(server: &MockServer, credentials: ProviderCredentials) -> TroveConfig {
    TroveConfig::for_testing(&server.uri(), credentials)
}

pub fn naver_item(isbn: &str, title: &str) -> Value {
    json!({
        "title": title,
        "link": "https://search.shopping.naver.com/book/catalog/1",
        "image": "https://shopping-phinf.pstatic.net/cover.jpg",
        "author": "로버트 C. 마틴^박재호",
        "discount": "29700",
        "publisher": "인사이트",
        "pubdate": "20131224",
        "isbn": isbn,
        "description": "<b>깨끗한</b> 코드를 작성하는 방법"
    })
}

pub fn naver_page(total: u64, items: Vec<Value>) -> Value {
    json!({
        "lastBuildDate": "Mon, 19 Oct 2026 10:00:00 +0900",
        "total": total,
        "start": 1,
        "display": items.len(),
        "items": items
    })
}

pub fn google_volume(id: &str, isbn_13: &str, title: &str) -> Value {
    json!({
        "id": id,
        "volumeInfo": {
            "title": title,
            "authors": ["Robert C. Martin"],
            "publisher": "Prentice Hall",
            "publishedDate": "2008-08-01",
            "industryIdentifiers": [
                {"type": "ISBN_10", "identifier": "0132350882"},
                {"type": "ISBN_13", "identifier": isbn_13}
            ],
            "pageCount": 464,
            "categories": ["Computers"],
            "imageLinks": {"thumbnail": "http://books.google.com/books/content?id=x"},
            "infoLink": "http://books.google.com/books?id=x"
        }
    })
}

pub fn google_page(total: u64, items: Vec<Value>) -> Value {
    json!({
        "kind": "books#volumes",
        "totalItems": total,
        "items": items
    })
}
