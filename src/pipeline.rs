//! Extraction orchestrator
//!
//! Per request: resolve config, consult the cache, and on a miss render,
//! extract and store. Errors from any step reach the caller unchanged and
//! are never cached.
//!
//! Concurrent misses for the same key are coalesced: the first caller
//! renders while the others wait on a per-key lock and then read its result
//! from the cache. Coalescing can be switched off with
//! [`ExtractionPipeline::with_coalescing`].

use crate::browser::{PageRenderer, RenderRequest};
use crate::cache::{CacheStats, ResultCache};
use crate::config::{DomainConfig, DomainInfo, DomainRegistry};
use crate::error::{Error, RenderError, Result};
use crate::extraction::ContentExtractor;
use crate::result::ExtractionResult;
use crate::urls;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument};

/// Default wall-clock bound on one `extract` call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Registered domains, optionally with their configs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainListing {
    /// Sorted domain names
    pub domains: Vec<String>,
    /// Per-domain details, present when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<DomainInfo>>,
}

type FlightMap = parking_lot::Mutex<HashMap<String, Weak<AsyncMutex<()>>>>;

/// The extraction pipeline
pub struct ExtractionPipeline<R> {
    renderer: R,
    registry: Arc<DomainRegistry>,
    cache: Arc<ResultCache>,
    request_timeout: Duration,
    coalesce: bool,
    in_flight: FlightMap,
}

impl<R: PageRenderer> ExtractionPipeline<R> {
    /// Create a pipeline over a renderer, a registry and a cache
    pub fn new(renderer: R, registry: Arc<DomainRegistry>, cache: Arc<ResultCache>) -> Self {
        Self {
            renderer,
            registry,
            cache,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            coalesce: true,
            in_flight: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Bound the whole resolve, render and extract chain
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable coalescing of concurrent identical misses
    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    /// The domain registry
    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    /// The result cache
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// The renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Extract the article at `url`.
    ///
    /// Config precedence: `domain_name`, then the URL's hostname, then the
    /// ad-hoc `config`. An unknown `domain_name` fails immediately.
    #[instrument(skip(self, config))]
    pub async fn extract(
        &self,
        url: &str,
        domain_name: Option<&str>,
        config: Option<DomainConfig>,
    ) -> Result<ExtractionResult> {
        let budget = self.request_timeout;
        match tokio::time::timeout(budget, self.run(url, domain_name, config)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                info!("Request exceeded {}ms", budget.as_millis());
                Err(RenderError::Timeout(budget.as_millis() as u64).into())
            }
        }
    }

    async fn run(
        &self,
        url: &str,
        domain_name: Option<&str>,
        config: Option<DomainConfig>,
    ) -> Result<ExtractionResult> {
        urls::validate(url)?;
        let config = self.resolve_config(url, domain_name, config)?;
        let key = ResultCache::key_for(url, &config.domain_name)?;

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        if !self.coalesce {
            return self.render_and_store(url, &key, config).await;
        }

        let flight = self.flight_lock(&key);
        let _guard = flight.lock().await;
        if let Some(hit) = self.cache.get(&key) {
            debug!("Served by a concurrent extraction");
            return Ok(hit);
        }
        self.render_and_store(url, &key, config).await
    }

    /// Pick the effective config for a request
    pub fn resolve_config(
        &self,
        url: &str,
        domain_name: Option<&str>,
        config: Option<DomainConfig>,
    ) -> Result<Arc<DomainConfig>> {
        if let Some(name) = domain_name.filter(|n| !n.trim().is_empty()) {
            return self
                .registry
                .resolve_by_name(name)
                .ok_or_else(|| Error::ConfigNotFound(format!("domain: {}", name)));
        }
        if let Some(found) = self.registry.resolve_by_url(url) {
            return Ok(found);
        }
        match config {
            Some(adhoc) => {
                adhoc.validate()?;
                Ok(Arc::new(adhoc))
            }
            None => Err(Error::ConfigNotFound(format!("URL: {}", url))),
        }
    }

    async fn render_and_store(
        &self,
        url: &str,
        key: &str,
        config: Arc<DomainConfig>,
    ) -> Result<ExtractionResult> {
        let started = Instant::now();
        info!(domain = %config.domain_name, "Extracting {}", url);

        let request = RenderRequest::new(url, config.clone());
        let html = self.renderer.render(&request).await?;
        let content = ContentExtractor::extract(&html, &config)?;

        let result = ExtractionResult::new(url, config.domain_name.clone(), content.html);
        self.cache.put(key.to_string(), result.clone());

        info!(
            domain = %config.domain_name,
            "Extracted {} chars in {}ms",
            result.metadata.content_length,
            started.elapsed().as_millis()
        );
        Ok(result)
    }

    fn flight_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut flights = self.in_flight.lock();
        flights.retain(|_, lock| lock.strong_count() > 0);
        if let Some(lock) = flights.get(key).and_then(Weak::upgrade) {
            return lock;
        }
        let lock = Arc::new(AsyncMutex::new(()));
        flights.insert(key.to_string(), Arc::downgrade(&lock));
        lock
    }

    /// Registered domain names, with details when `detailed`
    pub fn list_domains(&self, detailed: bool) -> DomainListing {
        DomainListing {
            domains: self.registry.list_domains(),
            details: detailed.then(|| self.registry.list_details()),
        }
    }

    /// Register (or replace) a domain at runtime
    pub fn register_domain<S: AsRef<str>>(&self, config: DomainConfig, hostnames: &[S]) -> Result<()> {
        self.registry.register(config, hostnames)?;
        Ok(())
    }

    /// Cache occupancy snapshot
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Empty the cache, returning how many entries were removed
    pub fn cache_clear(&self) -> usize {
        self.cache.clear()
    }
}
