//! Projection of a search result into a persistence-ready record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::types::{CanonicalResult, Category, ExternalSource, ResultMetadata};

/// Row shape the caller stores once a user picks a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub title: String,
    pub creator: String,
    pub cover_image_url: Option<String>,
    pub external_id: String,
    pub external_source: ExternalSource,
    pub category: Category,
    /// Category-specific fields as an opaque JSON object
    pub metadata: Value,
}

impl CanonicalResult {
    /// Field-for-field projection into a [`ContentRecord`].
    pub fn to_record(&self) -> ContentRecord {
        ContentRecord::from(self)
    }
}

impl From<&CanonicalResult> for ContentRecord {
    fn from(result: &CanonicalResult) -> Self {
        Self {
            title: result.title.clone(),
            creator: result.creator.clone(),
            cover_image_url: result.cover_image_url.clone(),
            external_id: result.external_id.clone(),
            external_source: result.external_source,
            category: result.category(),
            metadata: metadata_blob(&result.metadata),
        }
    }
}

/// Category payload through its own `Serialize` impl, without the tag.
fn metadata_blob(metadata: &ResultMetadata) -> Value {
    let projected = match metadata {
        ResultMetadata::Book(book) => serde_json::to_value(book),
        ResultMetadata::Video(video) => serde_json::to_value(video),
        ResultMetadata::Game(game) => serde_json::to_value(game),
        ResultMetadata::Music(music) => serde_json::to_value(music),
        ResultMetadata::Certificate(certificate) => serde_json::to_value(certificate),
    };

    projected.unwrap_or_else(|e| {
        warn!("Could not project {} metadata: {e}", metadata.category());
        Value::Null
    })
}
