//! Book fallback and merge across the regional and global book providers.
//!
//! The leading provider is always asked first. Only when it returns fewer
//! than [`FULL_PAGE_THRESHOLD`] items is the trailing provider consulted, and
//! its items are appended after deduplication by ISBN.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::SearchError;
use crate::providers::SearchProvider;
use crate::types::{CanonicalResult, PagedResult, SearchOptions};

/// Item count at which the leading provider's page is returned unchanged.
pub const FULL_PAGE_THRESHOLD: usize = 10;

/// Which book provider leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookPolicy {
    /// Regional provider first (end-user flow)
    #[default]
    PrimaryFirst,
    /// Global provider first (administrative flow)
    SecondaryFirst,
}

impl From<SearchOptions> for BookPolicy {
    fn from(options: SearchOptions) -> Self {
        if options.prefer_secondary {
            BookPolicy::SecondaryFirst
        } else {
            BookPolicy::PrimaryFirst
        }
    }
}

/// How the trailing provider call is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Trailing call only after the leading page comes back short
    #[default]
    Sequential,
    /// Both calls issued together; the trailing page is discarded when the
    /// leading one is full
    Concurrent,
}

/// Merges a leading and trailing book page.
///
/// Trailing items are kept only when their ISBN is non-empty and absent
/// from the leading page. `total` is the larger of the two totals and
/// `has_more` is true when either side has more.
pub fn merge_book_pages(
    leading: PagedResult<CanonicalResult>,
    trailing: PagedResult<CanonicalResult>,
) -> PagedResult<CanonicalResult> {
    let mut seen: HashSet<String> = leading
        .items
        .iter()
        .map(|item| item.isbn())
        .filter(|isbn| !isbn.is_empty())
        .map(str::to_string)
        .collect();

    let total = leading.total.max(trailing.total);
    let has_more = leading.has_more || trailing.has_more;

    let mut items = leading.items;
    for item in trailing.items {
        let isbn = item.isbn();
        // Insert also guards against duplicates inside the trailing page.
        if !isbn.is_empty() && seen.insert(isbn.to_string()) {
            items.push(item);
        }
    }

    PagedResult::new(items, total, has_more)
}

/// Book orchestrator over the regional (primary) and global (secondary)
/// providers.
#[derive(Debug, Clone)]
pub struct BookOrchestrator {
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
    fetch_mode: FetchMode,
}

impl BookOrchestrator {
    pub fn new(primary: Arc<dyn SearchProvider>, secondary: Arc<dyn SearchProvider>) -> Self {
        Self {
            primary,
            secondary,
            fetch_mode: FetchMode::default(),
        }
    }

    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    /// Searches books under `policy`.
    ///
    /// # Errors
    /// - `SearchError::ProviderUnavailable` - A consulted provider failed
    /// - `SearchError::MissingCredentials` - A consulted provider is not configured
    pub async fn search(
        &self,
        query: &str,
        page: u32,
        policy: BookPolicy,
    ) -> Result<PagedResult<CanonicalResult>, SearchError> {
        let (leading, trailing) = match policy {
            BookPolicy::PrimaryFirst => (&self.primary, &self.secondary),
            BookPolicy::SecondaryFirst => (&self.secondary, &self.primary),
        };

        match self.fetch_mode {
            FetchMode::Sequential => {
                let first = leading.search(query, page).await?;
                if is_full(&first) {
                    info!(
                        "{} returned {} books, skipping {}",
                        leading.source(),
                        first.len(),
                        trailing.source()
                    );
                    return Ok(first);
                }

                debug!(
                    "{} returned {} books, consulting {}",
                    leading.source(),
                    first.len(),
                    trailing.source()
                );
                let second = trailing.search(query, page).await?;
                Ok(merge_book_pages(first, second))
            }
            FetchMode::Concurrent => {
                let (first, second) =
                    tokio::join!(leading.search(query, page), trailing.search(query, page));
                let first = first?;
                if is_full(&first) {
                    info!(
                        "{} returned {} books, discarding {}",
                        leading.source(),
                        first.len(),
                        trailing.source()
                    );
                    return Ok(first);
                }
                Ok(merge_book_pages(first, second?))
            }
        }
    }
}

fn is_full(page: &PagedResult<CanonicalResult>) -> bool {
    page.len() >= FULL_PAGE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::errors::FailureCause;
    use crate::providers::StubProvider;
    use crate::providers::mock::{book, book_page};
    use crate::types::ExternalSource;

    fn orchestrator(
        naver: PagedResult<CanonicalResult>,
        google: PagedResult<CanonicalResult>,
    ) -> (BookOrchestrator, Arc<StubProvider>, Arc<StubProvider>) {
        let naver = Arc::new(StubProvider::returning(ExternalSource::Naver, naver));
        let google = Arc::new(StubProvider::returning(ExternalSource::GoogleBooks, google));
        (
            BookOrchestrator::new(naver.clone(), google.clone()),
            naver,
            google,
        )
    }

    #[tokio::test]
    async fn test_full_primary_page_short_circuits() {
        let naver_page = book_page(ExternalSource::Naver, "978890000", 12, true);
        let (books, naver, google) = orchestrator(
            naver_page.clone(),
            book_page(ExternalSource::GoogleBooks, "978100000", 5, false),
        );

        let result = books.search("클린 코드", 1, BookPolicy::PrimaryFirst).await.unwrap();

        assert_eq!(result, naver_page);
        assert_eq!(naver.calls(), 1);
        assert_eq!(google.calls(), 0);
    }

    #[tokio::test]
    async fn test_exactly_threshold_items_is_full() {
        let (books, _, google) = orchestrator(
            book_page(ExternalSource::Naver, "978890000", FULL_PAGE_THRESHOLD, false),
            PagedResult::empty(),
        );

        books.search("q", 1, BookPolicy::PrimaryFirst).await.unwrap();

        assert_eq!(google.calls(), 0);
    }

    #[tokio::test]
    async fn test_short_primary_page_merges_secondary() {
        let naver = PagedResult::new(
            vec![
                book(ExternalSource::Naver, "9788966260959", "클린 코드"),
                book(ExternalSource::Naver, "9791162242964", "클린 아키텍처"),
                book(ExternalSource::Naver, "9788966262472", "클린 코더"),
            ],
            3,
            false,
        );
        let google = PagedResult::new(
            vec![
                book(ExternalSource::GoogleBooks, "9788966260959", "Clean Code"),
                book(ExternalSource::GoogleBooks, "9780132350884", "Clean Code (EN)"),
                book(ExternalSource::GoogleBooks, "9791162242964", "Clean Architecture"),
                book(ExternalSource::GoogleBooks, "9780134494166", "Clean Architecture (EN)"),
                book(ExternalSource::GoogleBooks, "9780137081073", "The Clean Coder"),
            ],
            57,
            true,
        );
        let (books, naver_stub, google_stub) = orchestrator(naver, google);

        let result = books.search("클린 코드", 2, BookPolicy::PrimaryFirst).await.unwrap();

        assert_eq!(result.len(), 6);
        assert_eq!(result.total, 57);
        assert!(result.has_more);
        assert_eq!(result.items[0].title, "클린 코드");
        assert_eq!(result.items[3].isbn(), "9780132350884");
        assert_eq!(naver_stub.queries(), vec![("클린 코드".to_string(), 2)]);
        assert_eq!(google_stub.queries(), vec![("클린 코드".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_secondary_first_swaps_roles() {
        let (books, naver, google) = orchestrator(
            book_page(ExternalSource::Naver, "978890000", 3, false),
            book_page(ExternalSource::GoogleBooks, "978100000", 15, true),
        );

        let result = books.search("q", 1, BookPolicy::SecondaryFirst).await.unwrap();

        assert_eq!(result.len(), 15);
        assert_eq!(result.items[0].external_source, ExternalSource::GoogleBooks);
        assert_eq!(google.calls(), 1);
        assert_eq!(naver.calls(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_propagates() {
        let naver = Arc::new(StubProvider::failing(
            ExternalSource::Naver,
            FailureCause::Status(503),
        ));
        let google = Arc::new(StubProvider::returning(
            ExternalSource::GoogleBooks,
            PagedResult::empty(),
        ));
        let books = BookOrchestrator::new(naver, google.clone());

        let err = books.search("q", 1, BookPolicy::PrimaryFirst).await.unwrap_err();

        assert!(matches!(
            err,
            SearchError::ProviderUnavailable {
                provider: ExternalSource::Naver,
                cause: FailureCause::Status(503),
            }
        ));
        assert_eq!(google.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_mode_discards_trailing_when_full() {
        let naver = Arc::new(StubProvider::returning(
            ExternalSource::Naver,
            book_page(ExternalSource::Naver, "978890000", 10, true),
        ));
        let google = Arc::new(StubProvider::failing(
            ExternalSource::GoogleBooks,
            FailureCause::Timeout,
        ));
        let books = BookOrchestrator::new(naver, google.clone()).with_fetch_mode(FetchMode::Concurrent);

        let result = books.search("q", 1, BookPolicy::PrimaryFirst).await.unwrap();

        assert_eq!(result.len(), 10);
        assert_eq!(google.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_mode_merges_like_sequential() {
        let naver_page = book_page(ExternalSource::Naver, "978890000", 4, false);
        let google_page = book_page(ExternalSource::GoogleBooks, "978100000", 4, true);
        let (sequential, _, _) = orchestrator(naver_page.clone(), google_page.clone());
        let (concurrent, _, _) = orchestrator(naver_page, google_page);
        let concurrent = concurrent.with_fetch_mode(FetchMode::Concurrent);

        let a = sequential.search("q", 1, BookPolicy::PrimaryFirst).await.unwrap();
        let b = concurrent.search("q", 1, BookPolicy::PrimaryFirst).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_merge_drops_secondary_items_without_isbn() {
        let leading = PagedResult::new(vec![book(ExternalSource::Naver, "", "No ISBN")], 1, false);
        let trailing = PagedResult::new(
            vec![
                book(ExternalSource::GoogleBooks, "", "Also no ISBN"),
                book(ExternalSource::GoogleBooks, "9780132350884", "Clean Code"),
            ],
            2,
            false,
        );

        let merged = merge_book_pages(leading, trailing);

        let titles: Vec<&str> = merged.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["No ISBN", "Clean Code"]);
        assert_eq!(merged.total, 2);
        assert!(!merged.has_more);
    }

    #[test]
    fn test_policy_from_options() {
        assert_eq!(
            BookPolicy::from(SearchOptions::default()),
            BookPolicy::PrimaryFirst
        );
        assert_eq!(
            BookPolicy::from(SearchOptions {
                prefer_secondary: true
            }),
            BookPolicy::SecondaryFirst
        );
    }

    fn isbn_page(source: ExternalSource) -> impl Strategy<Value = PagedResult<CanonicalResult>> {
        (
            prop::collection::vec(prop::sample::select(vec!["", "111", "222", "333", "444"]), 0..12),
            0u64..100,
            any::<bool>(),
        )
            .prop_map(move |(isbns, total, has_more)| {
                let items = isbns
                    .iter()
                    .enumerate()
                    .map(|(i, isbn)| book(source, isbn, &format!("{source}-{i}")))
                    .collect();
                PagedResult::new(items, total, has_more)
            })
    }

    proptest! {
        #[test]
        fn prop_merge_adds_no_duplicate_isbns(
            leading in isbn_page(ExternalSource::Naver),
            trailing in isbn_page(ExternalSource::GoogleBooks),
        ) {
            let leading_len = leading.len();
            let leading_isbns: HashSet<String> =
                leading.items.iter().map(|b| b.isbn().to_string()).collect();
            let expected_total = leading.total.max(trailing.total);
            let expected_more = leading.has_more || trailing.has_more;

            let merged = merge_book_pages(leading, trailing);

            prop_assert_eq!(merged.total, expected_total);
            prop_assert_eq!(merged.has_more, expected_more);
            let mut appended = HashSet::new();
            for item in &merged.items[leading_len..] {
                prop_assert!(!item.isbn().is_empty());
                prop_assert!(!leading_isbns.contains(item.isbn()));
                prop_assert!(appended.insert(item.isbn().to_string()));
            }
        }
    }
}
