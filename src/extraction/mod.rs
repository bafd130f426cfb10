//! Content extraction module
//!
//! This module turns rendered HTML into clean article markup, driven entirely
//! by the domain's configured selectors.

pub mod content;

pub use content::{is_noise, ContentExtractor, ExtractedContent, TextBlock};
