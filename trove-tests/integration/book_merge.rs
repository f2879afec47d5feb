use futures::future::join_all;
use trove_core::ProviderCredentials;
use trove_search::{
    ContentRecord, ExternalSource, FetchMode, SearchDispatcher, SearchError, SearchOptions,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{
    all_credentials, config_for, google_page, google_volume, naver_item, naver_page,
};

const NAVER_PATH: &str = "/v1/search/book.json";
const GOOGLE_PATH: &str = "/books/v1/volumes";

async fn mount_clean_code(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(NAVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(naver_page(
            3,
            vec![
                naver_item("8966260950 9788966260959", "클린 코드"),
                naver_item("1162242965 9791162242964", "클린 아키텍처"),
                naver_item("8966262473 9788966262472", "클린 코더"),
            ],
        )))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(GOOGLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(
            57,
            vec![
                google_volume("g1", "9788966260959", "Clean Code"),
                google_volume("g2", "9780132350884", "Clean Code (English)"),
                google_volume("g3", "9791162242964", "Clean Architecture"),
                google_volume("g4", "9780134494166", "Clean Architecture (English)"),
                google_volume("g5", "9780137081073", "The Clean Coder"),
            ],
        )))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_short_naver_page_is_completed_by_google() {
    let server = MockServer::start().await;
    mount_clean_code(&server).await;

    let dispatcher = SearchDispatcher::new(&config_for(&server, all_credentials())).unwrap();
    let page = dispatcher
        .search("BOOK", "클린 코드", 1, SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 6);
    assert_eq!(page.total, 57);
    assert!(page.has_more);

    let sources: Vec<ExternalSource> = page.items.iter().map(|b| b.external_source).collect();
    assert_eq!(&sources[..3], &[ExternalSource::Naver; 3]);
    assert_eq!(&sources[3..], &[ExternalSource::GoogleBooks; 3]);

    let records: Vec<ContentRecord> = page.items.iter().map(ContentRecord::from).collect();
    assert_eq!(records[3].external_id, "g2");
    assert_eq!(records[3].metadata["isbn"], "9780132350884");
}

#[tokio::test]
async fn test_full_naver_page_skips_google() {
    let server = MockServer::start().await;
    let items = (0..10)
        .map(|i| naver_item(&format!("97889000000{i:02}"), &format!("책 {i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path(NAVER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(naver_page(250, items)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(GOOGLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(google_page(0, vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = SearchDispatcher::new(&config_for(&server, all_credentials())).unwrap();
    let page = dispatcher
        .search("book", "책", 1, SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 10);
    assert_eq!(page.total, 250);
}

#[tokio::test]
async fn test_admin_flow_prefers_google() {
    let server = MockServer::start().await;
    mount_clean_code(&server).await;

    let dispatcher = SearchDispatcher::new(&config_for(&server, all_credentials())).unwrap();
    let page = dispatcher
        .search(
            "book",
            "클린 코드",
            1,
            SearchOptions {
                prefer_secondary: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.items[0].external_source, ExternalSource::GoogleBooks);
    assert_eq!(page.items.len(), 6);
    assert_eq!(page.items[5].external_source, ExternalSource::Naver);
}

#[tokio::test]
async fn test_concurrent_fetch_matches_sequential() {
    let server = MockServer::start().await;
    mount_clean_code(&server).await;
    let config = config_for(&server, all_credentials());

    let sequential = SearchDispatcher::new(&config).unwrap();
    let concurrent = SearchDispatcher::new(&config)
        .unwrap()
        .with_fetch_mode(FetchMode::Concurrent);

    let a = sequential
        .search("book", "클린 코드", 1, SearchOptions::default())
        .await
        .unwrap();
    let b = concurrent
        .search("book", "클린 코드", 1, SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(a, b);
}

#[tokio::test]
async fn test_google_down_fails_the_book_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(NAVER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(naver_page(1, vec![naver_item("9788966260959", "클린 코드")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(GOOGLE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dispatcher = SearchDispatcher::new(&config_for(&server, all_credentials())).unwrap();
    let err = dispatcher
        .search("book", "클린 코드", 1, SearchOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.provider(), Some(ExternalSource::GoogleBooks));
}

#[tokio::test]
async fn test_unsupported_type_reaches_no_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = SearchDispatcher::new(&config_for(&server, all_credentials())).unwrap();
    let err = dispatcher
        .search("PODCAST", "anything", 1, SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::UnsupportedContentType { ref value } if value == "PODCAST"
    ));
}

#[tokio::test]
async fn test_parallel_requests_are_independent() {
    let server = MockServer::start().await;
    mount_clean_code(&server).await;

    let dispatcher = SearchDispatcher::new(&config_for(&server, all_credentials())).unwrap();
    let calls =
        (1..=4).map(|_| dispatcher.search("book", "클린 코드", 1, SearchOptions::default()));

    for result in join_all(calls).await {
        let page = result.unwrap();
        assert_eq!(page.items.len(), 6);
    }
}

#[tokio::test]
async fn test_missing_naver_credentials_surface() {
    let server = MockServer::start().await;

    let dispatcher =
        SearchDispatcher::new(&config_for(&server, ProviderCredentials::default())).unwrap();
    let err = dispatcher
        .search("book", "클린 코드", 1, SearchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::MissingCredentials {
            provider: ExternalSource::Naver
        }
    ));
}
