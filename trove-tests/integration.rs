//! Integration tests for Trove
//!
//! Every provider adapter runs against a wiremock server standing in for
//! the real API, so request shapes, pagination arithmetic and failure
//! handling are checked end to end over HTTP.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/book_merge.rs"]
mod book_merge;
#[path = "integration/certificate_registry.rs"]
mod certificate_registry;
#[path = "integration/google_books.rs"]
mod google_books;
#[path = "integration/media_providers.rs"]
mod media_providers;
#[path = "integration/naver_books.rs"]
mod naver_books;
