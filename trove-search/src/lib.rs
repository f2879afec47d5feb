//! Trove Search - Content metadata aggregation across third-party providers

#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Routes book, video, game, music and certificate searches to their
//! providers, normalizes every answer into [`CanonicalResult`], merges the
//! two book providers, and serves certificates from an embedded dataset when
//! the qualification registry cannot.

pub mod certificate;
pub mod dispatch;
pub mod errors;
pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod query;
pub mod record;
pub mod types;

// Re-export main types
pub use certificate::{CertificateAdapter, CertificateSearch, DataSource, FallbackReason};
pub use dispatch::{DispatchProviders, SearchDispatcher};
pub use errors::{FailureCause, SearchError};
pub use orchestrator::{
    BookOrchestrator, BookPolicy, FULL_PAGE_THRESHOLD, FetchMode, merge_book_pages,
};
pub use providers::{BookLookup, SearchProvider};
pub use query::ParsedQuery;
pub use record::ContentRecord;
pub use types::{CanonicalResult, Category, ExternalSource, PagedResult, SearchOptions};

/// Convenience type alias for Results with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
