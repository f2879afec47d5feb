use serde_json::json;
use trove_core::ProviderCredentials;
use trove_search::providers::NaverBookProvider;
use trove_search::{ExternalSource, FailureCause, SearchError, SearchProvider};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{all_credentials, config_for, naver_item, naver_page};

#[tokio::test]
async fn test_naver_sends_headers_and_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/book.json"))
        .and(header("X-Naver-Client-Id", "naver-id"))
        .and(header("X-Naver-Client-Secret", "naver-secret"))
        .and(query_param("query", "클린 코드 로버트 마틴"))
        .and(query_param("display", "20"))
        .and(query_param("start", "21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(naver_page(
            45,
            vec![
                naver_item("8966260950 9788966260959", "<b>클린 코드</b>"),
                naver_item("", "표지 없는 책"),
            ],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = NaverBookProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("클린 코드 – 로버트 마틴", 2).await.unwrap();

    assert_eq!(page.total, 45);
    assert!(page.has_more);
    assert_eq!(page.items.len(), 2);

    let first = &page.items[0];
    assert_eq!(first.title, "클린 코드");
    assert_eq!(first.external_id, "9788966260959");
    assert_eq!(first.creator, "로버트 C. 마틴, 박재호");
    assert_eq!(first.external_source, ExternalSource::Naver);

    let second = &page.items[1];
    assert_eq!(second.isbn(), "");
    assert!(second.external_id.starts_with("naver:"));
}

#[tokio::test]
async fn test_naver_error_status_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/book.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = NaverBookProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("클린 코드", 1).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::ProviderUnavailable {
            provider: ExternalSource::Naver,
            cause: FailureCause::Status(500),
        }
    ));
}

#[tokio::test]
async fn test_naver_error_body_with_ok_status_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/book.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorMessage": "Scope Status Invalid : Authentication failed. (인증에 실패했습니다.)",
            "errorCode": "024"
        })))
        .mount(&server)
        .await;

    let provider = NaverBookProvider::new(&config_for(&server, all_credentials())).unwrap();
    let err = provider.search("클린 코드", 1).await.unwrap_err();

    assert!(matches!(
        err,
        SearchError::ProviderUnavailable {
            provider: ExternalSource::Naver,
            cause: FailureCause::Malformed(_),
        }
    ));
}

#[tokio::test]
async fn test_naver_zero_results_is_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/book.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(naver_page(0, vec![])))
        .mount(&server)
        .await;

    let provider = NaverBookProvider::new(&config_for(&server, all_credentials())).unwrap();
    let page = provider.search("없는 책 제목", 1).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_naver_without_credentials_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let provider =
        NaverBookProvider::new(&config_for(&server, ProviderCredentials::default())).unwrap();
    let err = provider.search("클린 코드", 1).await.unwrap_err();

    assert!(matches!(err, SearchError::MissingCredentials { .. }));
}
