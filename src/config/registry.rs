//! Domain configuration registry
//!
//! Maps `domain_name → DomainConfig` and `hostname → domain_name`. Reads
//! vastly outnumber registrations, so both maps sit behind one
//! `parking_lot::RwLock`.

use crate::config::{builtin, DomainConfig};
use crate::error::ConfigError;
use crate::urls;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Summary of one registered domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Domain identifier
    pub domain_name: String,
    /// Primary container locator
    pub article_container_selector: String,
    /// Whether a pagination control is configured
    pub has_load_more: bool,
    /// Readiness strategy name
    pub wait_strategy: String,
    /// Full configuration
    pub config: DomainConfig,
}

impl From<&DomainConfig> for DomainInfo {
    fn from(config: &DomainConfig) -> Self {
        Self {
            domain_name: config.domain_name.clone(),
            article_container_selector: config.article_container_selector.clone(),
            has_load_more: config.load_more_locator().is_some(),
            wait_strategy: config.wait_until.as_str().to_string(),
            config: config.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    configs: BTreeMap<String, Arc<DomainConfig>>,
    hosts: HashMap<String, String>,
}

/// Registry of domain configurations
#[derive(Debug, Default)]
pub struct DomainRegistry {
    inner: RwLock<Inner>,
}

impl DomainRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in portals
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for (config, hostnames) in builtin::builtin_domains() {
            // Built-ins are validated by their own tests
            if let Err(e) = registry.register(config, &hostnames) {
                tracing::error!("Built-in domain rejected: {}", e);
            }
        }
        registry
    }

    /// Register `config` and map each hostname to it.
    ///
    /// An empty hostname list maps the domain name itself. Aliases left over
    /// from an earlier registration of the same name are kept.
    pub fn register<S: AsRef<str>>(
        &self,
        config: DomainConfig,
        hostnames: &[S],
    ) -> Result<(), ConfigError> {
        config.validate()?;
        let name = config.domain_name.clone();

        let mut hosts: Vec<String> = hostnames
            .iter()
            .map(|h| urls::normalize_host(h.as_ref()))
            .filter(|h| !h.is_empty())
            .collect();
        if hosts.is_empty() {
            hosts.push(urls::normalize_host(&name));
        }

        let mut inner = self.inner.write();
        let replaced = inner.configs.insert(name.clone(), Arc::new(config)).is_some();
        for host in &hosts {
            inner.hosts.insert(host.clone(), name.clone());
        }
        drop(inner);

        info!(
            domain = %name,
            hosts = ?hosts,
            replaced,
            "Registered domain configuration"
        );
        Ok(())
    }

    /// Remove a domain and every alias pointing at it
    pub fn unregister(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        let removed = inner.configs.remove(name).is_some();
        inner.hosts.retain(|_, target| target != name);
        if removed {
            debug!(domain = %name, "Unregistered domain configuration");
        }
        removed
    }

    /// Look a config up by the URL's hostname
    pub fn resolve_by_url(&self, url: &str) -> Option<Arc<DomainConfig>> {
        let host = urls::host_of(url)?;
        let inner = self.inner.read();
        let name = inner.hosts.get(&host)?;
        inner.configs.get(name).cloned()
    }

    /// Look a config up by domain name
    pub fn resolve_by_name(&self, name: &str) -> Option<Arc<DomainConfig>> {
        self.inner.read().configs.get(name).cloned()
    }

    /// Registered domain names, sorted
    pub fn list_domains(&self) -> Vec<String> {
        self.inner.read().configs.keys().cloned().collect()
    }

    /// Registered domains with their summaries, sorted by name
    pub fn list_details(&self) -> Vec<DomainInfo> {
        self.inner
            .read()
            .configs
            .values()
            .map(|c| DomainInfo::from(c.as_ref()))
            .collect()
    }

    /// Number of registered domains
    pub fn len(&self) -> usize {
        self.inner.read().configs.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
