//! Q-Net national qualification registry client.
//!
//! The registry has no text search and answers authentication failures with
//! HTTP 200, so the body is screened for error markers before parsing and
//! filtering happens client-side over a window of rows.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::debug;
use trove_core::TroveConfig;

use super::{Qualification, QualificationRepository, filter_and_page};
use crate::errors::{FailureCause, SearchError};
use crate::providers::{http_client, send};
use crate::types::{ExternalSource, PagedResult};

const LIST_PATH: &str = "/api/service/rest/InquiryListNationalQualifcationSVC/getList";

/// Substrings that mark an authentication failure inside a 200 response.
pub const AUTH_ERROR_MARKERS: [&str; 3] = [
    "SERVICE_KEY_IS_NOT_REGISTERED_ERROR",
    "SERVICE_ACCESS_DENIED_ERROR",
    "<cmmMsgHeader>",
];

/// Result code the registry uses for a normal answer.
const RESULT_OK: &str = "00";

/// Remote qualification list authenticated by a service key.
#[derive(Debug)]
pub struct RegistryQualificationRepository {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    window: u32,
}

impl RegistryQualificationRepository {
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig, service_key: &str) -> Result<Self, SearchError> {
        Ok(Self {
            client: http_client(ExternalSource::QNet, &config.network)?,
            base_url: config.endpoints.qnet.clone(),
            service_key: service_key.to_string(),
            window: config.paging.registry_window.max(1),
        })
    }

    /// Rows to request so the filtered page can be cut from one response.
    fn rows_for(&self, page: u32, page_size: u32) -> u32 {
        self.window.max(page.max(1).saturating_mul(page_size))
    }
}

#[async_trait]
impl QualificationRepository for RegistryQualificationRepository {
    fn name(&self) -> &'static str {
        "q-net"
    }

    async fn list(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<Qualification>, SearchError> {
        let rows = self.rows_for(page, page_size).to_string();
        debug!("Q-Net list: numOfRows={rows} query='{query}' page={page}");

        let request = self
            .client
            .get(format!("{}{LIST_PATH}", self.base_url))
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("numOfRows", rows.as_str()),
                ("pageNo", "1"),
            ]);

        let response = send(ExternalSource::QNet, request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::from_reqwest(ExternalSource::QNet, e))?;

        let records = parse_qualification_list(&body)?;
        Ok(filter_and_page(records, query, page, page_size))
    }
}

/// True when `body` carries one of the registry's authentication errors.
pub fn has_auth_error(body: &str) -> bool {
    AUTH_ERROR_MARKERS.iter().any(|marker| body.contains(marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ResultCode,
    ResultMsg,
    JmCode,
    Name,
    Series,
    MajorField,
    MiddleField,
    QualificationType,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        Some(match tag {
            b"resultCode" => Field::ResultCode,
            b"resultMsg" => Field::ResultMsg,
            b"jmcd" => Field::JmCode,
            b"jmfldnm" => Field::Name,
            b"seriesnm" => Field::Series,
            b"obligfldnm" => Field::MajorField,
            b"mdobligfldnm" => Field::MiddleField,
            b"qualgbnm" => Field::QualificationType,
            _ => return None,
        })
    }
}

#[derive(Debug, Default)]
struct QualificationBuilder {
    jm_code: Option<String>,
    name: Option<String>,
    series: Option<String>,
    major_field: Option<String>,
    middle_field: Option<String>,
    qualification_type: Option<String>,
}

impl QualificationBuilder {
    fn set(&mut self, field: Field, text: String) {
        let slot = match field {
            Field::JmCode => &mut self.jm_code,
            Field::Name => &mut self.name,
            Field::Series => &mut self.series,
            Field::MajorField => &mut self.major_field,
            Field::MiddleField => &mut self.middle_field,
            Field::QualificationType => &mut self.qualification_type,
            Field::ResultCode | Field::ResultMsg => return,
        };
        *slot = Some(text);
    }

    fn build(self) -> Option<Qualification> {
        Some(Qualification {
            jm_code: self.jm_code?,
            name: self.name?,
            series: self.series.unwrap_or_default(),
            major_field: self.major_field.unwrap_or_default(),
            middle_field: self.middle_field.unwrap_or_default(),
            qualification_type: self.qualification_type,
        })
    }
}

/// Parses a registry list response into qualification records.
///
/// Items without a code or name are skipped. A body without a `resultCode`
/// is not a registry answer and is rejected.
///
/// # Errors
/// - `SearchError::AuthRejected` - Body carries an authentication marker
/// - `SearchError::ProviderUnavailable` - Malformed XML, a missing or failing result code
pub fn parse_qualification_list(body: &str) -> Result<Vec<Qualification>, SearchError> {
    if has_auth_error(body) {
        return Err(SearchError::AuthRejected {
            provider: ExternalSource::QNet,
        });
    }

    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut current_item: Option<QualificationBuilder> = None;
    let mut current_field: Option<Field> = None;
    let mut result_code: Option<String> = None;
    let mut result_msg: Option<String> = None;

    loop {
        let text = match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"item" {
                    current_item = Some(QualificationBuilder::default());
                }
                current_field = Field::from_tag(name.as_ref());
                continue;
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"item" {
                    if let Some(record) = current_item.take().and_then(QualificationBuilder::build)
                    {
                        records.push(record);
                    }
                }
                current_field = None;
                continue;
            }
            Ok(Event::Text(e)) => e
                .unescape()
                .map_err(|e| malformed(format!("XML text error: {e}")))?
                .trim()
                .to_string(),
            Ok(Event::CData(e)) => String::from_utf8_lossy(&e.into_inner()).trim().to_string(),
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(format!("XML parse error: {e}"))),
            _ => continue,
        };

        let Some(field) = current_field else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        match field {
            Field::ResultCode => result_code = Some(text),
            Field::ResultMsg => result_msg = Some(text),
            _ => {
                if let Some(item) = current_item.as_mut() {
                    item.set(field, text);
                }
            }
        }
    }

    match result_code.as_deref() {
        Some(RESULT_OK) => Ok(records),
        Some(code) => Err(malformed(format!(
            "result code {code}: {}",
            result_msg.unwrap_or_default()
        ))),
        None => Err(malformed("missing resultCode".to_string())),
    }
}

fn malformed(reason: String) -> SearchError {
    SearchError::unavailable(ExternalSource::QNet, FailureCause::Malformed(reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<response>
  <header><resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>
  <body>
    <items>
      <item>
        <jmcd>1320</jmcd>
        <jmfldnm>정보처리기사</jmfldnm>
        <mdobligfldnm>정보기술</mdobligfldnm>
        <obligfldnm>정보통신</obligfldnm>
        <qualgbnm>국가기술자격</qualgbnm>
        <seriesnm>기사</seriesnm>
      </item>
      <item>
        <jmcd>7910</jmcd>
        <jmfldnm><![CDATA[한식조리기능사]]></jmfldnm>
        <mdobligfldnm>조리</mdobligfldnm>
        <obligfldnm>음식서비스</obligfldnm>
        <seriesnm>기능사</seriesnm>
      </item>
      <item>
        <jmfldnm>코드 없음</jmfldnm>
      </item>
    </items>
    <numOfRows>1000</numOfRows><pageNo>1</pageNo><totalCount>3</totalCount>
  </body>
</response>"#;

    #[test]
    fn test_parse_list() {
        let records = parse_qualification_list(LIST_XML).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].jm_code, "1320");
        assert_eq!(records[0].major_field, "정보통신");
        assert_eq!(records[0].middle_field, "정보기술");
        assert_eq!(records[0].qualification_type.as_deref(), Some("국가기술자격"));
        assert_eq!(records[1].name, "한식조리기능사");
        assert_eq!(records[1].qualification_type, None);
    }

    #[test]
    fn test_auth_marker_is_rejection() {
        let body = "<OpenAPI_ServiceResponse><cmmMsgHeader><errMsg>SERVICE ERROR</errMsg>\
                    <returnAuthMsg>SERVICE_KEY_IS_NOT_REGISTERED_ERROR</returnAuthMsg>\
                    </cmmMsgHeader></OpenAPI_ServiceResponse>";

        let err = parse_qualification_list(body).unwrap_err();
        assert!(matches!(err, SearchError::AuthRejected { .. }));
    }

    #[test]
    fn test_failing_result_code_is_malformed() {
        let body = "<response><header><resultCode>99</resultCode>\
                    <resultMsg>LIMITED NUMBER OF SERVICE REQUESTS EXCEEDS ERROR</resultMsg>\
                    </header></response>";

        let err = parse_qualification_list(body).unwrap_err();
        assert!(matches!(
            err,
            SearchError::ProviderUnavailable {
                cause: FailureCause::Malformed(ref reason),
                ..
            } if reason.contains("99")
        ));
    }

    #[test]
    fn test_body_without_envelope_is_malformed() {
        for body in ["", "<html><body>Service temporarily unavailable</body></html>"] {
            let err = parse_qualification_list(body).unwrap_err();
            assert!(matches!(
                err,
                SearchError::ProviderUnavailable {
                    cause: FailureCause::Malformed(ref reason),
                    ..
                } if reason.contains("resultCode")
            ));
        }
    }

    #[test]
    fn test_broken_xml_is_malformed() {
        let err = parse_qualification_list("<response><item><jmcd>1</item>").unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_window_covers_requested_page() {
        let mut config = TroveConfig::default();
        config.paging.registry_window = 100;
        let repository = RegistryQualificationRepository::new(&config, "key").unwrap();

        assert_eq!(repository.rows_for(1, 20), 100);
        assert_eq!(repository.rows_for(8, 20), 160);
    }
}
