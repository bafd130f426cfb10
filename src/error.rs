//! Error types for Newsdesk Extract
//!
//! This module provides the error hierarchy for the extraction pipeline using
//! `thiserror`. Render and extraction failures keep their own enums so the
//! service layer can tell a stale selector apart from a flaky network.

use thiserror::Error;

/// The main error type for Newsdesk Extract operations
#[derive(Error, Debug)]
pub enum Error {
    /// Domain configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No configuration could be resolved for the request
    #[error("No configuration found for {0}")]
    ConfigNotFound(String),

    /// Request URL is not an http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Page rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Content extraction errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Browser lifecycle errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),
}

/// Domain configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `domain_name` was empty
    #[error("domain_name must not be empty")]
    MissingDomainName,

    /// `article_container_selector` was empty
    #[error("article_container_selector must not be empty")]
    MissingContainerSelector,

    /// Any other invalid setting
    #[error("{0}")]
    Invalid(String),
}

/// Rendering errors, reported to the orchestrator and never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// DNS or connection failure during navigation
    #[error("Network error: {0}")]
    Network(String),

    /// Article container never appeared
    #[error("Article container not found: {0}")]
    NotFound(String),

    /// Wall-clock bound exceeded
    #[error("Render timed out after {0}ms")]
    Timeout(u64),
}

/// Content extraction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Neither the container selector nor the id pattern matched
    #[error("Article container not found: {0}")]
    ContainerNotFound(String),

    /// Every candidate block was filtered out
    #[error("No content survived filtering")]
    EmptyResult,

    /// A configured CSS selector failed to parse
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// The page pool was shut down
    #[error("Page pool closed")]
    PoolClosed,
}

/// Result type alias for Newsdesk Extract operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a CDP error from a string
    pub fn cdp<S: Into<String>>(msg: S) -> Self {
        Error::Cdp(msg.into())
    }

    /// HTTP status the service layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Error::ConfigNotFound(_) => 404,
            Error::Render(RenderError::NotFound(_)) => 404,
            Error::Extraction(ExtractionError::ContainerNotFound(_))
            | Error::Extraction(ExtractionError::EmptyResult) => 404,
            Error::Extraction(ExtractionError::InvalidSelector(_)) => 400,
            Error::InvalidUrl(_) | Error::Config(_) => 400,
            _ => 500,
        }
    }

    /// Short machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_invalid",
            Error::ConfigNotFound(_) => "config_not_found",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Render(RenderError::Network(_)) => "render_network",
            Error::Render(RenderError::NotFound(_)) => "render_not_found",
            Error::Render(RenderError::Timeout(_)) => "render_timeout",
            Error::Extraction(ExtractionError::ContainerNotFound(_)) => "container_not_found",
            Error::Extraction(ExtractionError::EmptyResult) => "empty_result",
            Error::Extraction(ExtractionError::InvalidSelector(_)) => "invalid_selector",
            Error::Browser(_) => "browser",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Cdp(_) => "cdp",
        }
    }
}

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
