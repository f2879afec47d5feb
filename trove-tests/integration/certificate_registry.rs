use std::time::Duration;

use trove_core::ProviderCredentials;
use trove_search::{
    CertificateAdapter, DataSource, ExternalSource, FailureCause, FallbackReason, SearchProvider,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{all_credentials, config_for};

const LIST_PATH: &str = "/api/service/rest/InquiryListNationalQualifcationSVC/getList";

fn registry_xml(items: &[(&str, &str, &str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(code, name, series, major, middle)| {
            format!(
                "<item><jmcd>{code}</jmcd><jmfldnm>{name}</jmfldnm>\
                 <mdobligfldnm>{middle}</mdobligfldnm><obligfldnm>{major}</obligfldnm>\
                 <qualgbnm>국가기술자격</qualgbnm><seriesnm>{series}</seriesnm></item>"
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><response><header>\
         <resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>\
         <body><items>{items}</items></body></response>"
    )
}

#[tokio::test]
async fn test_registry_filters_client_side() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .and(query_param("serviceKey", "qnet-key"))
        .and(query_param("numOfRows", "1000"))
        .and(query_param("pageNo", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(registry_xml(&[
            ("1320", "정보처리기사", "기사", "정보통신", "정보기술"),
            ("2290", "정보처리산업기사", "산업기사", "정보통신", "정보기술"),
            ("1150", "전기기사", "기사", "전기.전자", "전기"),
            ("9999", "레지스트리전용기사", "기사", "정보통신", "정보기술"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = CertificateAdapter::new(&config_for(&server, all_credentials())).unwrap();
    let search = adapter.search_with_source("정보기술", 1).await;

    assert_eq!(search.source, DataSource::Registry);
    assert_eq!(search.result.total, 3);
    assert!(!search.result.has_more);

    let codes: Vec<&str> = search
        .result
        .items
        .iter()
        .map(|c| c.external_id.as_str())
        .collect();
    assert_eq!(codes, vec!["1320", "2290", "9999"]);
    assert_eq!(search.result.items[0].external_source, ExternalSource::QNet);
    assert_eq!(search.result.items[0].creator, "HRD Korea");
}

#[tokio::test]
async fn test_auth_marker_in_success_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<OpenAPI_ServiceResponse><cmmMsgHeader><errMsg>SERVICE ERROR</errMsg>\
             <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>\
             <returnReasonCode>30</returnReasonCode></cmmMsgHeader></OpenAPI_ServiceResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = CertificateAdapter::new(&config_for(&server, all_credentials())).unwrap();
    let search = adapter.search_with_source("정보처리", 1).await;

    assert_eq!(
        search.source,
        DataSource::LocalFallback {
            reason: FallbackReason::AuthRejected
        }
    );
    let names: Vec<&str> = search.result.items.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(names, vec!["정보처리기사", "정보처리산업기사", "정보처리기능사"]);
}

#[tokio::test]
async fn test_http_failure_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = CertificateAdapter::new(&config_for(&server, all_credentials())).unwrap();
    let search = adapter.search_with_source("기사", 1).await;

    assert_eq!(
        search.source,
        DataSource::LocalFallback {
            reason: FallbackReason::Unavailable(FailureCause::Status(500))
        }
    );
    assert!(!search.result.items.is_empty());
}

#[tokio::test]
async fn test_non_registry_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Service temporarily unavailable</body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapter = CertificateAdapter::new(&config_for(&server, all_credentials())).unwrap();
    let search = adapter.search_with_source("정보처리", 1).await;

    assert!(matches!(
        search.source,
        DataSource::LocalFallback {
            reason: FallbackReason::Unavailable(FailureCause::Malformed(_))
        }
    ));
    assert_eq!(search.result.total, 3);
}

#[tokio::test]
async fn test_slow_registry_times_out_into_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LIST_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(registry_xml(&[]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server, all_credentials());
    config.network.provider_timeout = Duration::from_millis(200);

    let adapter = CertificateAdapter::new(&config).unwrap();
    let search = adapter.search_with_source("조리", 1).await;

    assert_eq!(
        search.source,
        DataSource::LocalFallback {
            reason: FallbackReason::Unavailable(FailureCause::Timeout)
        }
    );
    assert!(search.result.items.iter().any(|c| c.title == "한식조리기능사"));
}

#[tokio::test]
async fn test_missing_service_key_never_calls_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let adapter =
        CertificateAdapter::new(&config_for(&server, ProviderCredentials::default())).unwrap();

    let page = adapter.search("", 2).await.unwrap();

    assert_eq!(page.items.len(), 20);
    assert!(page.total >= 30);
}
