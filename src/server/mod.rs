//! HTTP service layer
//!
//! A thin axum router over an [`ExtractionPipeline`]. The router is generic
//! over the renderer so tests can drive it with a fake browser.
//!
//! ```text
//! HTTP Request ──> CORS ──> Router ──> handler ──> ExtractionPipeline
//!                                         │              │
//!                                         ▼              ▼
//!                                  ServiceMetrics   Registry + Cache
//! ```

pub mod cors;
pub mod handlers;
pub mod status;

use crate::browser::PageRenderer;
use crate::error::Result;
use crate::pipeline::ExtractionPipeline;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};

pub use handlers::{ApiError, ErrorResponse, ExtractRequest, ExtractResponse};
pub use status::{LatencyHistogram, LatencyMetrics, ServiceMetrics};

/// Shared state behind every route
pub struct AppState<R> {
    pipeline: Arc<ExtractionPipeline<R>>,
    metrics: ServiceMetrics,
}

impl<R: PageRenderer> AppState<R> {
    /// Wrap a pipeline with fresh counters
    pub fn new(pipeline: Arc<ExtractionPipeline<R>>) -> Result<Self> {
        Ok(Self {
            pipeline,
            metrics: ServiceMetrics::new()?,
        })
    }

    /// The extraction pipeline
    pub fn pipeline(&self) -> &ExtractionPipeline<R> {
        &self.pipeline
    }

    /// Service counters
    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }
}

/// Build the router; `cors_origins` empty means loopback only
pub fn router<R: PageRenderer>(state: Arc<AppState<R>>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler::<R>))
        .route("/extract", post(handlers::extract_handler::<R>))
        .route(
            "/domains",
            get(handlers::list_domains_handler::<R>).post(handlers::register_domain_handler::<R>),
        )
        .route("/cache/stats", get(handlers::cache_stats_handler::<R>))
        .route("/cache/clear", post(handlers::cache_clear_handler::<R>))
        .layer(cors::cors_layer(cors_origins))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve<R: PageRenderer>(
    state: Arc<AppState<R>>,
    addr: &str,
    cors_origins: &[String],
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state, cors_origins))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
