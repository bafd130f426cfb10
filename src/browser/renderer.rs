//! Controlled page rendering
//!
//! [`BrowserRenderer`] turns a URL plus its [`DomainConfig`] into rendered
//! HTML: lease a page, block heavy resources, navigate, wait for the article
//! container (falling back to the id-pattern locator), press "load more"
//! once, and read the DOM back. The lease is released on every exit path.

use crate::browser::navigation::{PageNavigator, CLICK_SETTLE};
use crate::browser::{BrowserController, PageLease};
use crate::config::{DomainConfig, Locator};
use crate::error::{RenderError, Result};
use chromiumoxide::cdp::browser_protocol::fetch::{
    EnableParams, EventRequestPaused, FailRequestParams, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Request types never fetched while rendering
pub const BLOCKED_RESOURCE_TYPES: [ResourceType; 4] = [
    ResourceType::Image,
    ResourceType::Media,
    ResourceType::Font,
    ResourceType::Stylesheet,
];

/// What happens when a render step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Propagate the error and end the render
    Abort,
    /// Log the error and carry on
    BestEffort,
}

/// Run one render step under `policy`.
///
/// Returns `Ok(None)` when a best-effort step failed.
pub async fn run_step<T, F>(step: &'static str, policy: StepPolicy, fut: F) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(value) => Ok(Some(value)),
        Err(e) if policy == StepPolicy::BestEffort => {
            warn!(step, "Best-effort step failed: {}", e);
            Ok(None)
        }
        Err(e) => {
            debug!(step, "Step failed: {}", e);
            Err(e)
        }
    }
}

/// Run `fut` until `deadline`, failing with `Timeout(timeout_ms)` past it.
///
/// Time already spent before the call (e.g. waiting for a pool slot) counts
/// against the same deadline.
pub async fn within_deadline<T, F>(deadline: Instant, timeout_ms: u64, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| RenderError::Timeout(timeout_ms))?
}

/// One render job
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Page to load
    pub url: String,
    /// Effective config (timeouts, locators)
    pub config: Arc<DomainConfig>,
    /// Click target overriding `load_more_selector`
    pub click_target: Option<String>,
}

impl RenderRequest {
    /// Request using the config's own pagination control
    pub fn new(url: impl Into<String>, config: Arc<DomainConfig>) -> Self {
        Self {
            url: url.into(),
            config,
            click_target: None,
        }
    }

    /// Force a specific click target
    pub fn with_click_target(mut self, target: impl Into<String>) -> Self {
        self.click_target = Some(target.into());
        self
    }

    /// Locator clicked after the container shows up, if any
    pub fn click_locator(&self) -> Option<Locator> {
        self.click_target
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(Locator::parse)
            .or_else(|| self.config.load_more_locator())
    }
}

/// Anything that can produce rendered HTML for a request
pub trait PageRenderer: Send + Sync + 'static {
    /// Render `request` and return the document's HTML
    fn render(&self, request: &RenderRequest) -> impl Future<Output = Result<String>> + Send;
}

/// Renderer backed by a pooled headless Chrome
pub struct BrowserRenderer {
    controller: Arc<BrowserController>,
}

impl BrowserRenderer {
    /// Create a renderer over a launched controller
    pub fn new(controller: Arc<BrowserController>) -> Self {
        Self { controller }
    }

    /// The underlying controller
    pub fn controller(&self) -> &Arc<BrowserController> {
        &self.controller
    }

    async fn drive(&self, lease: &mut PageLease, request: &RenderRequest) -> Result<String> {
        let config = &request.config;

        run_step(
            "block_resources",
            StepPolicy::BestEffort,
            Self::block_resources(lease),
        )
        .await?;

        let page = lease.page().clone();
        run_step(
            "navigate",
            StepPolicy::Abort,
            PageNavigator::goto(&page, &request.url),
        )
        .await?;
        run_step(
            "ready",
            StepPolicy::Abort,
            PageNavigator::wait_for_ready(&page, config.wait_until, config.page_load_duration()),
        )
        .await?;
        run_step(
            "container",
            StepPolicy::Abort,
            Self::wait_for_container(&page, config),
        )
        .await?;

        if let Some(locator) = request.click_locator() {
            run_step(
                "load_more",
                StepPolicy::BestEffort,
                Self::load_more(&page, &locator, config.click_duration()),
            )
            .await?;
        }

        PageNavigator::content(&page).await
    }

    /// Fail every image, media, font and stylesheet request before it is sent
    async fn block_resources(lease: &mut PageLease) -> Result<()> {
        let page = lease.page().clone();
        let patterns = BLOCKED_RESOURCE_TYPES
            .iter()
            .map(|resource_type| RequestPattern {
                url_pattern: Some("*".to_string()),
                resource_type: Some(resource_type.clone()),
                request_stage: Some(RequestStage::Request),
            })
            .collect();

        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        page.execute(EnableParams {
            patterns: Some(patterns),
            handle_auth_requests: None,
        })
        .await?;

        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let params =
                    FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
                if let Err(e) = page.execute(params).await {
                    debug!("Failed to block request: {}", e);
                }
            }
        });
        lease.attach_task(task);
        Ok(())
    }

    /// Try each container locator in order, each bounded by `wait_timeout`
    async fn wait_for_container(page: &Page, config: &DomainConfig) -> Result<Locator> {
        for locator in config.container_locators() {
            if PageNavigator::wait_for_locator(page, &locator, config.wait_duration()).await {
                debug!("Container matched {}", locator);
                return Ok(locator);
            }
            debug!("Container locator {} timed out", locator);
        }
        Err(RenderError::NotFound(config.article_container_selector.clone()).into())
    }

    async fn load_more(page: &Page, locator: &Locator, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, PageNavigator::click(page, locator, timeout))
            .await
            .map_err(|_| RenderError::Timeout(timeout.as_millis() as u64))??;
        tokio::time::sleep(CLICK_SETTLE.min(timeout)).await;
        Ok(())
    }
}

impl PageRenderer for BrowserRenderer {
    #[instrument(skip(self, request), fields(url = %request.url, domain = %request.config.domain_name))]
    async fn render(&self, request: &RenderRequest) -> Result<String> {
        let budget = request.config.page_load_duration();
        let started = Instant::now();
        let deadline = started + budget;

        let mut lease = self.controller.acquire(budget).await?;
        let outcome = within_deadline(
            deadline,
            request.config.page_load_timeout,
            self.drive(&mut lease, request),
        )
        .await;
        lease.release().await;

        let html = outcome?;
        info!(
            "Rendered {} bytes in {}ms",
            html.len(),
            started.elapsed().as_millis()
        );
        Ok(html)
    }
}
