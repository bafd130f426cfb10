//! HTTP handlers
//!
//! Every failure answers `{success: false, error, detail}` with the status
//! from [`Error::status_code`]; a successful extraction is never empty.

use crate::browser::PageRenderer;
use crate::cache::CacheStats;
use crate::config::{DomainConfig, DomainInfo};
use crate::error::Error;
use crate::result::ExtractionMetadata;
use crate::server::status::{HealthResponse, StatusResponse, SERVER_NAME, SERVER_VERSION};
use crate::server::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Body of `POST /extract`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    /// Article URL
    pub url: String,
    /// Registered domain to apply
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Ad-hoc config used when nothing else resolves
    #[serde(default)]
    pub config: Option<DomainConfig>,
}

/// Successful extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    /// Always true
    pub success: bool,
    /// Article markup
    pub content: String,
    /// Extraction metadata
    pub metadata: ExtractionMetadata,
}

/// Query of `GET /domains`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainsQuery {
    /// Include per-domain details
    #[serde(default)]
    pub include_details: bool,
}

/// Response of `GET /domains`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainsResponse {
    /// Always true
    pub success: bool,
    /// Number of domains
    pub count: usize,
    /// Sorted domain names
    pub domains: Vec<String>,
    /// Per-domain details, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<DomainInfo>>,
}

/// Body of `POST /domains`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Config to register
    pub config: DomainConfig,
    /// Hostnames mapped to it; empty maps the domain name
    #[serde(default)]
    pub hostnames: Vec<String>,
}

/// Generic acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

/// Response of `POST /cache/clear`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    /// Always true
    pub success: bool,
    /// Entries dropped
    pub removed: usize,
    /// Human-readable outcome
    pub message: String,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Machine-readable tag
    pub error: String,
    /// Human-readable detail
    pub detail: String,
}

/// An error ready to be sent
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                success: false,
                error: error.to_string(),
                detail: detail.into(),
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// `GET /`
pub async fn index_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "endpoints": {
            "extract": "POST /extract",
            "domains": "GET /domains",
            "register": "POST /domains",
            "health": "GET /health",
            "status": "GET /status",
            "cache_stats": "GET /cache/stats",
            "cache_clear": "POST /cache/clear",
        }
    }))
}

/// `GET /health`
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::now()))
}

/// `GET /status`
#[instrument(skip_all)]
pub async fn status_handler<R: PageRenderer>(
    State(state): State<Arc<AppState<R>>>,
) -> impl IntoResponse {
    let metrics = state.metrics();
    let pipeline = state.pipeline();
    let response = StatusResponse {
        version: SERVER_VERSION.to_string(),
        name: SERVER_NAME.to_string(),
        uptime_seconds: metrics.uptime_seconds(),
        extractions: metrics.extractions(),
        errors: metrics.errors(),
        domains: pipeline.registry().len(),
        cache_size: pipeline.cache_stats().size,
        latency: metrics.latency(),
        status: "running".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(response))
}

/// `POST /extract`
#[instrument(skip_all)]
pub async fn extract_handler<R: PageRenderer>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let Json(request) = payload?;
    let started = Instant::now();

    let outcome = state
        .pipeline()
        .extract(&request.url, request.domain_name.as_deref(), request.config)
        .await;

    match outcome {
        Ok(result) => {
            state.metrics().record_success(started.elapsed());
            Ok(Json(ExtractResponse {
                success: true,
                content: result.content,
                metadata: result.metadata,
            }))
        }
        Err(err) => {
            state.metrics().record_error();
            warn!(url = %request.url, kind = err.kind(), "Extraction failed: {}", err);
            Err(err.into())
        }
    }
}

/// `GET /domains`
pub async fn list_domains_handler<R: PageRenderer>(
    State(state): State<Arc<AppState<R>>>,
    query: Result<Query<DomainsQuery>, QueryRejection>,
) -> Result<Json<DomainsResponse>, ApiError> {
    let Query(query) = query?;
    let listing = state.pipeline().list_domains(query.include_details);
    Ok(Json(DomainsResponse {
        success: true,
        count: listing.domains.len(),
        domains: listing.domains,
        details: listing.details,
    }))
}

/// `POST /domains`
#[instrument(skip_all)]
pub async fn register_domain_handler<R: PageRenderer>(
    State(state): State<Arc<AppState<R>>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = payload?;
    let name = request.config.domain_name.clone();
    state
        .pipeline()
        .register_domain(request.config, &request.hostnames)?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: format!("Registered domain {}", name),
        }),
    ))
}

/// `GET /cache/stats`
pub async fn cache_stats_handler<R: PageRenderer>(
    State(state): State<Arc<AppState<R>>>,
) -> Json<CacheStats> {
    Json(state.pipeline().cache_stats())
}

/// `POST /cache/clear`
pub async fn cache_clear_handler<R: PageRenderer>(
    State(state): State<Arc<AppState<R>>>,
) -> Json<ClearResponse> {
    let removed = state.pipeline().cache_clear();
    Json(ClearResponse {
        success: true,
        removed,
        message: format!("Cache cleared. Removed {} entries.", removed),
    })
}
