//! Embedded qualification dataset used when the registry cannot answer.

use std::sync::LazyLock;

use async_trait::async_trait;
use tracing::error;

use super::{Qualification, QualificationRepository, filter_and_page};
use crate::errors::SearchError;
use crate::types::PagedResult;

static EMBEDDED: LazyLock<Vec<Qualification>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../../data/qualifications.json")).unwrap_or_else(|e| {
        error!("Embedded qualification dataset is unreadable: {e}");
        Vec::new()
    })
});

/// In-memory list of common qualifications.
#[derive(Debug, Clone)]
pub struct StaticQualificationRepository {
    records: Vec<Qualification>,
}

impl StaticQualificationRepository {
    /// Repository over the dataset compiled into the crate.
    pub fn embedded() -> Self {
        Self::new(EMBEDDED.clone())
    }

    pub fn new(records: Vec<Qualification>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Filtered page; infallible.
    pub fn page(&self, query: &str, page: u32, page_size: u32) -> PagedResult<Qualification> {
        filter_and_page(self.records.iter().cloned(), query, page, page_size)
    }
}

#[async_trait]
impl QualificationRepository for StaticQualificationRepository {
    fn name(&self) -> &'static str {
        "embedded"
    }

    async fn list(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PagedResult<Qualification>, SearchError> {
        Ok(self.page(query, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_embedded_dataset_loads() {
        let repository = StaticQualificationRepository::embedded();
        assert!(repository.len() >= 30);

        let codes: HashSet<&str> = repository
            .records
            .iter()
            .map(|r| r.jm_code.as_str())
            .collect();
        assert_eq!(codes.len(), repository.len(), "jm codes must be unique");
        assert!(repository.records.iter().all(|r| !r.name.is_empty()));
    }

    #[test]
    fn test_embedded_search() {
        let repository = StaticQualificationRepository::embedded();

        let page = repository.page("정보처리", 1, 20);
        let names: Vec<&str> = page.items.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["정보처리기사", "정보처리산업기사", "정보처리기능사"]);
        assert_eq!(page.total, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn test_empty_query_lists_everything() {
        let repository = StaticQualificationRepository::embedded();
        let page = repository.page("", 1, 10);

        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total, repository.len() as u64);
        assert!(page.has_more);
    }
}
