//! Domain configuration module
//!
//! Per-domain extraction rules, the locators built from them, and the
//! registry that resolves a request URL to its rules.

pub mod builtin;
pub mod domain;
pub mod locator;
pub mod registry;

pub use domain::{DomainConfig, DomainConfigBuilder, WaitUntil, DEFAULT_ALLOWED_TAGS};
pub use locator::Locator;
pub use registry::{DomainInfo, DomainRegistry};
