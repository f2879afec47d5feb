//! Canonical data types shared by every provider.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SearchError;

/// Content category served by the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Book,
    Video,
    Game,
    Music,
    Certificate,
}

impl Category {
    /// Every category, in dispatch order.
    pub const ALL: [Category; 5] = [
        Category::Book,
        Category::Video,
        Category::Game,
        Category::Music,
        Category::Certificate,
    ];

    /// Lowercase name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Book => "book",
            Category::Video => "video",
            Category::Game => "game",
            Category::Music => "music",
            Category::Certificate => "certificate",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SearchError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| SearchError::UnsupportedContentType {
                value: value.to_string(),
            })
    }
}

/// External provider a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExternalSource {
    #[serde(rename = "naver")]
    Naver,
    #[serde(rename = "google_books")]
    GoogleBooks,
    #[serde(rename = "tmdb")]
    Tmdb,
    #[serde(rename = "rawg")]
    Rawg,
    #[serde(rename = "spotify")]
    Spotify,
    #[serde(rename = "qnet")]
    QNet,
}

impl ExternalSource {
    /// Stable lowercase identifier, also used as synthetic id prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            ExternalSource::Naver => "naver",
            ExternalSource::GoogleBooks => "google_books",
            ExternalSource::Tmdb => "tmdb",
            ExternalSource::Rawg => "rawg",
            ExternalSource::Spotify => "spotify",
            ExternalSource::QNet => "qnet",
        }
    }

    /// Category of content this provider serves.
    pub fn category(self) -> Category {
        match self {
            ExternalSource::Naver | ExternalSource::GoogleBooks => Category::Book,
            ExternalSource::Tmdb => Category::Video,
            ExternalSource::Rawg => Category::Game,
            ExternalSource::Spotify => Category::Music,
            ExternalSource::QNet => Category::Certificate,
        }
    }
}

impl fmt::Display for ExternalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-agnostic search result.
///
/// `external_id` is never empty and `cover_image_url` is `None` rather than
/// an empty string when the provider has no image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    pub external_id: String,
    pub external_source: ExternalSource,
    pub title: String,
    /// Author, artist or issuing body; empty when unknown
    pub creator: String,
    pub cover_image_url: Option<String>,
    #[serde(flatten)]
    pub metadata: ResultMetadata,
}

impl CanonicalResult {
    /// Category derived from the metadata payload.
    pub fn category(&self) -> Category {
        self.metadata.category()
    }

    /// ISBN used for cross-provider deduplication, empty for non-books.
    pub fn isbn(&self) -> &str {
        match &self.metadata {
            ResultMetadata::Book(book) => &book.isbn,
            _ => "",
        }
    }
}

/// Category-specific payload of a [`CanonicalResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "metadata", rename_all = "lowercase")]
pub enum ResultMetadata {
    Book(BookMetadata),
    Video(VideoMetadata),
    Game(GameMetadata),
    Music(MusicMetadata),
    Certificate(CertificateMetadata),
}

impl ResultMetadata {
    pub fn category(&self) -> Category {
        match self {
            ResultMetadata::Book(_) => Category::Book,
            ResultMetadata::Video(_) => Category::Video,
            ResultMetadata::Game(_) => Category::Game,
            ResultMetadata::Music(_) => Category::Music,
            ResultMetadata::Certificate(_) => Category::Certificate,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    /// ISBN-13 when known, otherwise ISBN-10, otherwise empty
    pub isbn: String,
    pub publisher: Option<String>,
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
    pub publish_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Vec<String>,
    /// Provider page for the book
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Movie,
    Tv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub kind: VideoKind,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMetadata {
    pub slug: Option<String>,
    pub released: Option<String>,
    pub rating: Option<f64>,
    pub platforms: Vec<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicMetadata {
    pub album_type: Option<String>,
    pub release_date: Option<String>,
    pub total_tracks: Option<u32>,
    pub spotify_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateMetadata {
    pub jm_code: String,
    pub series: String,
    pub major_field: String,
    pub middle_field: String,
    pub qualification_type: Option<String>,
}

/// One page of results plus pagination hints.
///
/// After a book merge `items.len()` may exceed what `total` implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub has_more: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, has_more: bool) -> Self {
        Self {
            items,
            total,
            has_more,
        }
    }

    /// The zero-result page: no items, zero total, nothing more.
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Maps every item, keeping pagination untouched.
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}

/// Caller-supplied switches for a dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Prefer the globally indexed book provider (administrative flow)
    pub prefer_secondary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate() -> CanonicalResult {
        CanonicalResult {
            external_id: "1320".to_string(),
            external_source: ExternalSource::QNet,
            title: "정보처리기사".to_string(),
            creator: "HRD Korea".to_string(),
            cover_image_url: None,
            metadata: ResultMetadata::Certificate(CertificateMetadata {
                jm_code: "1320".to_string(),
                series: "기사".to_string(),
                major_field: "정보통신".to_string(),
                middle_field: "정보기술".to_string(),
                qualification_type: Some("국가기술자격".to_string()),
            }),
        }
    }

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!("BOOK".parse::<Category>().unwrap(), Category::Book);
        assert_eq!(" certificate ".parse::<Category>().unwrap(), Category::Certificate);

        let err = "PODCAST".parse::<Category>().unwrap_err();
        assert!(matches!(
            err,
            SearchError::UnsupportedContentType { ref value } if value == "PODCAST"
        ));
    }

    #[test]
    fn test_canonical_json_shape() {
        let json = serde_json::to_value(certificate()).unwrap();

        assert_eq!(json["externalId"], "1320");
        assert_eq!(json["externalSource"], "qnet");
        assert_eq!(json["category"], "certificate");
        assert_eq!(json["coverImageUrl"], serde_json::Value::Null);
        assert_eq!(json["metadata"]["jmCode"], "1320");
        assert_eq!(json["metadata"]["majorField"], "정보통신");
    }

    #[test]
    fn test_category_follows_metadata() {
        let result = certificate();
        assert_eq!(result.category(), Category::Certificate);
        assert_eq!(result.isbn(), "");
        assert_eq!(ExternalSource::GoogleBooks.category(), Category::Book);
    }

    #[test]
    fn test_paged_result_map_keeps_pagination() {
        let page = PagedResult::new(vec![1, 2, 3], 30, true).map(|n| n * 2);
        assert_eq!(page.items, vec![2, 4, 6]);
        assert_eq!(page.total, 30);
        assert!(page.has_more);
        assert!(PagedResult::<u8>::empty().is_empty());
    }
}
