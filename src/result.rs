//! Extraction results handed back to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing one extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Request URL as given by the caller
    pub url: String,
    /// Name of the config that was applied
    pub domain_name: String,
    /// When extraction completed
    pub extracted_at: DateTime<Utc>,
    /// Length of `content` in characters
    pub content_length: usize,
}

/// Extracted article markup plus its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Minimal article HTML
    pub content: String,
    /// Extraction metadata
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Build a result stamped with the current time
    pub fn new(url: impl Into<String>, domain_name: impl Into<String>, content: String) -> Self {
        let content_length = content.chars().count();
        Self {
            content,
            metadata: ExtractionMetadata {
                url: url.into(),
                domain_name: domain_name.into(),
                extracted_at: Utc::now(),
                content_length,
            },
        }
    }
}
