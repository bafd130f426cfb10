//! Newsdesk Extract - Article Extraction for JavaScript-Rendered News Sites
//!
//! This crate renders article pages in headless Chrome, isolates the story
//! body with per-domain selector rules, and returns minimal clean markup.
//! Repeated requests for the same URL are served from a short-lived cache.
//!
//! # Features
//!
//! - **Domain Registry**: Per-publication rules resolved by hostname or name
//! - **Controlled Rendering**: Pooled pages, resource blocking, bounded waits
//! - **Content Extraction**: Allowed-tag text, noise filtering, deduplication
//! - **Result Cache**: TTL cache keyed by a hash of the normalized URL
//! - **HTTP Service**: `/extract`, `/domains`, `/health`, `/cache/*`
//!
//! # Architecture
//!
//! ```text
//! extract(url) ──▶ DomainRegistry ──▶ ResultCache ──(miss)──▶ PageRenderer
//!                                          ▲                       │
//!                                          │                       ▼
//!                                   ExtractionResult ◀── ContentExtractor
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use newsdesk_extract::browser::{BrowserController, BrowserRenderer};
//! use newsdesk_extract::{DomainRegistry, ExtractionPipeline, ResultCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = Arc::new(BrowserController::new().await?);
//!     let pipeline = ExtractionPipeline::new(
//!         BrowserRenderer::new(controller),
//!         Arc::new(DomainRegistry::with_builtins()),
//!         Arc::new(ResultCache::default()),
//!     );
//!
//!     let result = pipeline
//!         .extract("https://sandesh.com/gujarat/news/example", None, None)
//!         .await?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod result;
pub mod server;
pub mod settings;
pub mod urls;

// Re-exports for convenience
pub use browser::{BrowserController, BrowserRenderer, PageRenderer, RenderRequest};
pub use cache::{CacheStats, ResultCache};
pub use config::{DomainConfig, DomainRegistry, Locator, WaitUntil};
pub use error::{ConfigError, Error, ExtractionError, RenderError, Result};
pub use extraction::ContentExtractor;
pub use pipeline::{DomainListing, ExtractionPipeline};
pub use result::{ExtractionMetadata, ExtractionResult};
pub use settings::Settings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
