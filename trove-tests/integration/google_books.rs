use serde_json::json;
use trove_core::ProviderCredentials;
use trove_search::providers::GoogleBooksProvider;
use trove_search::{ExternalSource, FailureCause, SearchError, SearchProvider};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{all_credentials, config_for, google_page, google_volume};

#[tokio::test]
async fn test_google_start_index_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "clean code"))
        .and(query_param("startIndex", "40"))
        .and(query_param("maxResults", "20"))
        .and(query_param("key", "google-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(
            61,
            vec![google_volume("hjEFCAAAQBAJ", "9780132350884", "Clean Code")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("clean code", 3).await.unwrap();

    assert_eq!(page.total, 61);
    assert!(page.has_more);

    let book = &page.items[0];
    assert_eq!(book.external_id, "hjEFCAAAQBAJ");
    assert_eq!(book.external_source, ExternalSource::GoogleBooks);
    assert_eq!(book.isbn(), "9780132350884");
    assert_eq!(book.creator, "Robert C. Martin");
    assert_eq!(
        book.cover_image_url.as_deref(),
        Some("https://books.google.com/books/content?id=x")
    );
}

#[tokio::test]
async fn test_google_key_is_optional() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param_is_missing("key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(0, vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        GoogleBooksProvider::new(&config_for(&server, ProviderCredentials::default())).unwrap();
    let page = provider.search("clean code", 1).await.unwrap();

    assert!(page.items.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_google_fielded_query_falls_back_to_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "intitle:클린 코드 inauthor:로버트 마틴"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(0, vec![])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "클린 코드 로버트 마틴"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(
            1,
            vec![google_volume("dwSfGQAACAAJ", "9788966260959", "클린 코드")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("클린 코드 - 로버트 마틴", 1).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "클린 코드");
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_google_fielded_page_past_the_end_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "intitle:클린 코드 inauthor:로버트 마틴"))
        .and(query_param("startIndex", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(12, vec![])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "클린 코드 로버트 마틴"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(
            300,
            vec![google_volume("dwSfGQAACAAJ", "9788966260959", "클린 코드")],
        )))
        .expect(0)
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("클린 코드 - 로버트 마틴", 3).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 12);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_google_body_without_total_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "books#volumes"
        })))
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("clean code", 1).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::ProviderUnavailable {
            provider: ExternalSource::GoogleBooks,
            cause: FailureCause::Malformed(_),
        }
    ));
}

#[tokio::test]
async fn test_google_lookup_by_isbn() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes"))
        .and(query_param("q", "isbn:9788966260959"))
        .and(query_param("maxResults", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(
            1,
            vec![google_volume("dwSfGQAACAAJ", "9788966260959", "클린 코드")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();
    let book = provider
        .get_by_external_id("978-89-6626-095-9")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(book.external_id, "dwSfGQAACAAJ");
    assert_eq!(book.isbn(), "9788966260959");
}

#[tokio::test]
async fn test_google_lookup_by_volume_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes/hjEFCAAAQBAJ"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(google_volume("hjEFCAAAQBAJ", "9780132350884", "Clean Code")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books/v1/volumes/missing-volume"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();

    let found = provider.get_by_external_id("hjEFCAAAQBAJ").await.unwrap();
    assert_eq!(found.map(|b| b.title), Some("Clean Code".to_string()));

    let missing = provider.get_by_external_id("missing-volume").await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn test_google_server_error_is_not_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = GoogleBooksProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.get_by_external_id("hjEFCAAAQBAJ").await.unwrap_err();

    assert!(err.is_unavailable());
}
