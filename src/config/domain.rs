//! Per-domain extraction rules

use crate::config::Locator;
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Tags eligible for extraction when a config does not name its own
pub const DEFAULT_ALLOWED_TAGS: [&str; 10] =
    ["h1", "h2", "h3", "h4", "h5", "h6", "p", "b", "strong", "li"];

/// Page readiness reached before the container wait begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// Navigation committed, nothing else
    Commit,
    /// DOMContentLoaded fired
    #[default]
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// Load event fired
    Load,
    /// Load fired and the network went quiet
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

impl WaitUntil {
    /// Name used in domain listings
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Commit => "commit",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::Load => "load",
            WaitUntil::NetworkIdle => "networkidle",
        }
    }
}

/// Extraction rules for one publication.
///
/// Configs are frozen once registered; the registry hands out `Arc`s so
/// concurrent requests read the same instance without locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    /// Unique identifier (e.g. `sandesh`)
    pub domain_name: String,
    /// Primary CSS/XPath locator for the article root
    pub article_container_selector: String,
    /// Class prefix of per-article container classes (e.g. `article-`)
    pub article_id_pattern: Option<String>,
    /// Locator for a "load more" control
    pub load_more_selector: Option<String>,
    /// Tag names whose text is extracted, lowercased
    #[serde(deserialize_with = "lowercase_tags")]
    pub allowed_tags: BTreeSet<String>,
    /// Case-insensitive substrings marking a block as noise
    pub noise_keywords: Vec<String>,
    /// CSS selectors stripped before extraction
    pub elements_to_remove: Vec<String>,
    /// Minimum block length in characters
    pub min_text_length: usize,
    /// Container wait bound (ms)
    pub wait_timeout: u64,
    /// Load-more click bound (ms)
    pub click_timeout: u64,
    /// Whole-render bound (ms)
    pub page_load_timeout: u64,
    /// Readiness reached after navigation
    pub wait_until: WaitUntil,
}

fn lowercase_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeSet<String>, D::Error> {
    let tags = Vec::<String>::deserialize(deserializer)?;
    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect())
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            domain_name: String::new(),
            article_container_selector: String::new(),
            article_id_pattern: None,
            load_more_selector: None,
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
            noise_keywords: Vec::new(),
            elements_to_remove: Vec::new(),
            min_text_length: 25,
            wait_timeout: 15000,
            click_timeout: 3000,
            page_load_timeout: 60000,
            wait_until: WaitUntil::DomContentLoaded,
        }
    }
}

impl DomainConfig {
    /// Create a new config builder
    pub fn builder<S, C>(domain_name: S, container: C) -> DomainConfigBuilder
    where
        S: Into<String>,
        C: Into<String>,
    {
        DomainConfigBuilder {
            config: DomainConfig {
                domain_name: domain_name.into(),
                article_container_selector: container.into(),
                ..Default::default()
            },
        }
    }

    /// Reject configs that cannot locate anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain_name.trim().is_empty() {
            return Err(ConfigError::MissingDomainName);
        }
        if self.article_container_selector.trim().is_empty() {
            return Err(ConfigError::MissingContainerSelector);
        }
        Ok(())
    }

    /// Container locators in the order they are tried
    pub fn container_locators(&self) -> Vec<Locator> {
        let mut chain = vec![Locator::parse(&self.article_container_selector)];
        if let Some(pattern) = self.article_id_pattern.as_deref().filter(|p| !p.is_empty()) {
            chain.push(Locator::ClassPrefix(pattern.to_string()));
        }
        chain
    }

    /// Locator of the pagination control, if any
    pub fn load_more_locator(&self) -> Option<Locator> {
        self.load_more_selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(Locator::parse)
    }

    /// Check whether `tag` is eligible for extraction
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.contains(tag)
    }

    /// Container wait bound
    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_timeout)
    }

    /// Click bound
    pub fn click_duration(&self) -> Duration {
        Duration::from_millis(self.click_timeout)
    }

    /// Whole-render bound
    pub fn page_load_duration(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout)
    }
}

/// Builder for DomainConfig
pub struct DomainConfigBuilder {
    config: DomainConfig,
}

impl DomainConfigBuilder {
    /// Set the article id class prefix
    pub fn article_id_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.config.article_id_pattern = Some(pattern.into());
        self
    }

    /// Set the pagination locator
    pub fn load_more_selector<S: Into<String>>(mut self, selector: S) -> Self {
        self.config.load_more_selector = Some(selector.into());
        self
    }

    /// Replace the allowed tag set
    pub fn allowed_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_tags = tags
            .into_iter()
            .map(|t| t.into().to_ascii_lowercase())
            .collect();
        self
    }

    /// Replace the noise keywords
    pub fn noise_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.noise_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the removal selectors
    pub fn elements_to_remove<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.elements_to_remove = selectors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the minimum block length
    pub fn min_text_length(mut self, len: usize) -> Self {
        self.config.min_text_length = len;
        self
    }

    /// Set the container wait bound
    pub fn wait_timeout(mut self, ms: u64) -> Self {
        self.config.wait_timeout = ms;
        self
    }

    /// Set the click bound
    pub fn click_timeout(mut self, ms: u64) -> Self {
        self.config.click_timeout = ms;
        self
    }

    /// Set the whole-render bound
    pub fn page_load_timeout(mut self, ms: u64) -> Self {
        self.config.page_load_timeout = ms;
        self
    }

    /// Set the readiness strategy
    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.config.wait_until = wait_until;
        self
    }

    /// Build the config
    pub fn build(self) -> DomainConfig {
        self.config
    }
}
