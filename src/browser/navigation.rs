//! Page navigation and DOM waits
//!
//! Everything here talks to one live page. Waits poll a JavaScript predicate
//! instead of relying on a single promise, because the execution context is
//! torn down and rebuilt while a navigation commits.

use crate::config::{Locator, WaitUntil};
use crate::error::{Error, RenderError, Result};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Page;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Delay between predicate evaluations
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet period assumed after `load` for `networkidle`
pub const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Upper bound on the pause after a pagination click
pub const CLICK_SETTLE: Duration = Duration::from_millis(500);

/// Page navigator with the waits the renderer composes
pub struct PageNavigator;

impl PageNavigator {
    /// Start navigating; returns once the navigation has committed
    #[instrument(skip(page))]
    pub async fn goto(page: &Page, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);

        let response = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| RenderError::Network(e.to_string()))?;

        if let Some(error_text) = response.result.error_text.as_ref() {
            return Err(RenderError::Network(format!("{}: {}", url, error_text)).into());
        }
        Ok(())
    }

    /// Wait for the document to reach `wait_until`
    #[instrument(skip(page))]
    pub async fn wait_for_ready(page: &Page, wait_until: WaitUntil, timeout: Duration) -> Result<()> {
        let predicate = match wait_until {
            WaitUntil::Commit => return Ok(()),
            WaitUntil::DomContentLoaded => {
                "location.href !== 'about:blank' && document.readyState !== 'loading'"
            }
            WaitUntil::Load | WaitUntil::NetworkIdle => {
                "location.href !== 'about:blank' && document.readyState === 'complete'"
            }
        };

        if !Self::poll_until(page, predicate, timeout).await {
            return Err(RenderError::Timeout(timeout.as_millis() as u64).into());
        }

        if wait_until == WaitUntil::NetworkIdle {
            tokio::time::sleep(NETWORK_IDLE_WINDOW).await;
        }
        debug!("Document ready ({})", wait_until.as_str());
        Ok(())
    }

    /// Wait for `locator` to match; `false` once `timeout` is spent
    #[instrument(skip(page))]
    pub async fn wait_for_locator(page: &Page, locator: &Locator, timeout: Duration) -> bool {
        let predicate = format!("!!({})", locator.js_query());
        Self::poll_until(page, &predicate, timeout).await
    }

    /// Wait for `locator` and click the first match
    #[instrument(skip(page))]
    pub async fn click(page: &Page, locator: &Locator, timeout: Duration) -> Result<()> {
        if !Self::wait_for_locator(page, locator, timeout).await {
            return Err(RenderError::NotFound(locator.to_string()).into());
        }

        let script = format!(
            "(() => {{ const el = {}; if (!el) return false; el.scrollIntoView({{block: 'center'}}); el.click(); return true; }})()",
            locator.js_query()
        );
        let clicked: bool = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| Error::cdp(e.to_string()))?
            .into_value()
            .map_err(|e| Error::cdp(e.to_string()))?;

        if !clicked {
            return Err(RenderError::NotFound(locator.to_string()).into());
        }
        debug!("Clicked {}", locator);
        Ok(())
    }

    /// Serialized DOM of the page
    pub async fn content(page: &Page) -> Result<String> {
        page.content().await.map_err(|e| Error::cdp(e.to_string()))
    }

    /// Evaluate `predicate` until it is true or `timeout` elapses.
    ///
    /// Evaluation errors count as "not yet"; they are expected while a new
    /// document replaces the old one.
    async fn poll_until(page: &Page, predicate: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let satisfied = match page.evaluate(predicate).await {
                Ok(value) => value.into_value::<bool>().unwrap_or(false),
                Err(e) => {
                    debug!("Predicate evaluation failed: {}", e);
                    false
                }
            };
            if satisfied {
                return true;
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
