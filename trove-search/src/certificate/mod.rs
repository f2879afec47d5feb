//! National qualification search with a local fallback.
//!
//! The qualification registry is the one provider without an availability
//! guarantee: it may be unreachable, reject the service key inside an
//! HTTP 200 body, or not be configured at all. In every such case the
//! adapter answers from an embedded dataset instead of failing, and reports
//! which source served the page through [`DataSource`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trove_core::TroveConfig;

use crate::errors::{FailureCause, SearchError};
use crate::providers::{SearchProvider, page_offset};
use crate::types::{
    CanonicalResult, CertificateMetadata, ExternalSource, PagedResult, ResultMetadata,
};

pub mod local;
pub mod registry;

pub use local::StaticQualificationRepository;
pub use registry::RegistryQualificationRepository;

/// Body issuing national technical qualifications, used as result creator.
pub const ISSUER: &str = "HRD Korea";

/// One qualification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub jm_code: String,
    pub name: String,
    pub series: String,
    pub major_field: String,
    pub middle_field: String,
    pub qualification_type: Option<String>,
}

impl Qualification {
    /// Case-insensitive substring match on name, major field, middle field
    /// and series. `needle` must already be lowercase; empty matches all.
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || [
                &self.name,
                &self.major_field,
                &self.middle_field,
                &self.series,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    pub fn into_result(self) -> CanonicalResult {
        CanonicalResult {
            external_id: self.jm_code.clone(),
            external_source: ExternalSource::QNet,
            title: self.name,
            creator: ISSUER.to_string(),
            cover_image_url: None,
            metadata: ResultMetadata::Certificate(CertificateMetadata {
                jm_code: self.jm_code,
                series: self.series,
                major_field: self.major_field,
                middle_field: self.middle_field,
                qualification_type: self.qualification_type,
            }),
        }
    }
}

/// Filters `records` by `query` then cuts out one page.
///
/// `total` is the filtered count and `has_more` is
/// `offset + page_size < total`.
pub fn filter_and_page(
    records: impl IntoIterator<Item = Qualification>,
    query: &str,
    page: u32,
    page_size: u32,
) -> PagedResult<Qualification> {
    let needle = query.trim().to_lowercase();
    let filtered: Vec<Qualification> = records
        .into_iter()
        .filter(|record| record.matches(&needle))
        .collect();

    let total = filtered.len();
    let offset = page_offset(page, page_size) as usize;
    let limit = page_size as usize;
    let items = filtered.into_iter().skip(offset).take(limit).collect();

    PagedResult::new(items, total as u64, offset + limit < total)
}

/// Source of qualification records.
///
/// Implementations must apply the [`filter_and_page`] contract.
#[async_trait]
pub trait QualificationRepository: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// One filtered page of qualifications.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - Transport failure, bad status or unparsable body
    /// - `SearchError::AuthRejected` - Registry refused the service key
    async fn list(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<Qualification>, SearchError>;
}

/// Why the adapter answered from the local dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    MissingCredentials,
    AuthRejected,
    Unavailable(FailureCause),
}

impl From<SearchError> for FallbackReason {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::MissingCredentials { .. } => FallbackReason::MissingCredentials,
            SearchError::AuthRejected { .. } => FallbackReason::AuthRejected,
            SearchError::ProviderUnavailable { cause, .. } => FallbackReason::Unavailable(cause),
            other => FallbackReason::Unavailable(FailureCause::Transport(other.to_string())),
        }
    }
}

/// Which data source served a certificate page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Registry,
    LocalFallback { reason: FallbackReason },
}

impl DataSource {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DataSource::LocalFallback { .. })
    }
}

/// A certificate page together with its provenance.
#[derive(Debug, Clone)]
pub struct CertificateSearch {
    pub result: PagedResult<CanonicalResult>,
    pub source: DataSource,
}

/// Certificate adapter: registry first, embedded dataset on any failure.
#[derive(Debug)]
pub struct CertificateAdapter {
    registry: Option<Arc<dyn QualificationRepository>>,
    fallback: StaticQualificationRepository,
    page_size: u32,
}

impl CertificateAdapter {
    /// Registry client when a service key is configured, embedded dataset always.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - HTTP client could not be built
    pub fn new(config: &TroveConfig) -> Result<Self, SearchError> {
        let registry = match &config.credentials.qnet_service_key {
            Some(key) => Some(Arc::new(RegistryQualificationRepository::new(config, key)?)
                as Arc<dyn QualificationRepository>),
            None => None,
        };

        Ok(Self::with_repositories(
            registry,
            StaticQualificationRepository::embedded(),
            config.paging.certificate_page_size,
        ))
    }

    /// Assembles the adapter from explicit repositories.
    pub fn with_repositories(
        registry: Option<Arc<dyn QualificationRepository>>,
        fallback: StaticQualificationRepository,
        page_size: u32,
    ) -> Self {
        Self {
            registry,
            fallback,
            page_size: page_size.max(1),
        }
    }

    /// Searches and reports whether the answer came from the registry.
    ///
    /// Never fails: every registry failure degrades to the local dataset.
    pub async fn search_with_source(&self, query: &str, page: u32) -> CertificateSearch {
        let reason = match &self.registry {
            None => FallbackReason::MissingCredentials,
            Some(registry) => match registry.list(query, page, self.page_size).await {
                Ok(found) => {
                    return CertificateSearch {
                        result: found.map(Qualification::into_result),
                        source: DataSource::Registry,
                    };
                }
                Err(e) => {
                    warn!("Qualification registry '{}' failed: {e}", registry.name());
                    FallbackReason::from(e)
                }
            },
        };

        info!("Serving certificate query '{query}' from local dataset ({reason:?})");
        CertificateSearch {
            result: self
                .fallback
                .page(query, page, self.page_size)
                .map(Qualification::into_result),
            source: DataSource::LocalFallback { reason },
        }
    }
}

#[async_trait]
impl SearchProvider for CertificateAdapter {
    fn source(&self) -> ExternalSource {
        ExternalSource::QNet
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        Ok(self.search_with_source(query, page).await.result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn record(code: &str, name: &str, series: &str, major: &str, middle: &str) -> Qualification {
        Qualification {
            jm_code: code.to_string(),
            name: name.to_string(),
            series: series.to_string(),
            major_field: major.to_string(),
            middle_field: middle.to_string(),
            qualification_type: None,
        }
    }

    fn sample() -> Vec<Qualification> {
        vec![
            record("1320", "정보처리기사", "기사", "정보통신", "정보기술"),
            record("1150", "전기기사", "기사", "전기.전자", "전기"),
            record("7910", "한식조리기능사", "기능사", "음식서비스", "조리"),
            record("9001", "Network Engineer", "Expert", "ICT", "Networking"),
        ]
    }

    /// Registry stand-in that always fails with the configured error.
    #[derive(Debug)]
    struct FailingRegistry {
        calls: AtomicUsize,
        rejected: bool,
    }

    #[async_trait]
    impl QualificationRepository for FailingRegistry {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn list(
            &self,
            _query: &str,
            _page: u32,
            _page_size: u32,
        ) -> Result<PagedResult<Qualification>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.rejected {
                Err(SearchError::AuthRejected {
                    provider: ExternalSource::QNet,
                })
            } else {
                Err(SearchError::unavailable(
                    ExternalSource::QNet,
                    FailureCause::Malformed("truncated XML".to_string()),
                ))
            }
        }
    }

    #[test]
    fn test_filter_matches_all_four_fields_case_insensitively() {
        let by_name = filter_and_page(sample(), "정보처리", 1, 10);
        assert_eq!(by_name.total, 1);

        let by_series = filter_and_page(sample(), "기능사", 1, 10);
        assert_eq!(by_series.items[0].jm_code, "7910");

        let by_major = filter_and_page(sample(), "전기.전자", 1, 10);
        assert_eq!(by_major.items[0].jm_code, "1150");

        let by_middle = filter_and_page(sample(), "NETWORKING", 1, 10);
        assert_eq!(by_middle.items[0].jm_code, "9001");

        let by_mixed_case = filter_and_page(sample(), "network eng", 1, 10);
        assert_eq!(by_mixed_case.total, 1);
    }

    #[test]
    fn test_pagination_uses_filtered_count() {
        let first = filter_and_page(sample(), "기사", 1, 1);
        assert_eq!(first.total, 2);
        assert_eq!(first.items.len(), 1);
        assert!(first.has_more);

        let second = filter_and_page(sample(), "기사", 2, 1);
        assert_eq!(second.items[0].jm_code, "1150");
        assert!(!second.has_more);

        let beyond = filter_and_page(sample(), "기사", 5, 1);
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_uses_local_dataset() {
        let adapter = CertificateAdapter::with_repositories(
            None,
            StaticQualificationRepository::new(sample()),
            10,
        );

        let search = adapter.search_with_source("정보", 1).await;

        assert_eq!(
            search.source,
            DataSource::LocalFallback {
                reason: FallbackReason::MissingCredentials
            }
        );
        assert_eq!(search.result.items.len(), 1);
        assert_eq!(search.result.items[0].external_source, ExternalSource::QNet);
        assert_eq!(search.result.items[0].creator, ISSUER);
    }

    #[tokio::test]
    async fn test_registry_failures_degrade_instead_of_failing() {
        for rejected in [true, false] {
            let registry = Arc::new(FailingRegistry {
                calls: AtomicUsize::new(0),
                rejected,
            });
            let adapter = CertificateAdapter::with_repositories(
                Some(registry.clone()),
                StaticQualificationRepository::new(sample()),
                10,
            );

            let result = adapter.search("전기", 1).await.unwrap();

            assert_eq!(registry.calls.load(Ordering::SeqCst), 1);
            assert_eq!(result.items[0].external_id, "1150");
        }
    }

    #[tokio::test]
    async fn test_fallback_reason_reflects_failure() {
        let adapter = CertificateAdapter::with_repositories(
            Some(Arc::new(FailingRegistry {
                calls: AtomicUsize::new(0),
                rejected: true,
            })),
            StaticQualificationRepository::new(Vec::new()),
            10,
        );

        let search = adapter.search_with_source("anything", 1).await;

        assert!(search.source.is_degraded());
        assert_eq!(
            search.source,
            DataSource::LocalFallback {
                reason: FallbackReason::AuthRejected
            }
        );
        assert_eq!(search.result, PagedResult::empty());
    }
}
