//! Health and status reporting
//!
//! `/health` answers liveness probes. `/status` reports uptime, extraction
//! and error counters, and latency percentiles from an HdrHistogram.

use crate::error::{ConfigError, Result};
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name from Cargo.toml
pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");

/// Highest latency tracked, in microseconds (10 minutes)
const MAX_TRACKED_US: u64 = 600_000_000;

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "healthy" if responding
    pub status: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// Server version
    pub version: String,
}

impl HealthResponse {
    /// A response stamped with the current time
    pub fn now() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: SERVER_VERSION.to_string(),
        }
    }
}

/// Detailed server status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server version (from Cargo.toml)
    pub version: String,
    /// Server name
    pub name: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Successful extractions, cache hits included
    pub extractions: u64,
    /// Failed extractions
    pub errors: u64,
    /// Registered domains
    pub domains: usize,
    /// Live cache entries
    pub cache_size: usize,
    /// Extraction latency percentiles
    pub latency: LatencyMetrics,
    /// Always "running" if responding
    pub status: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

/// Request latency percentile metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// 50th percentile (median) latency in milliseconds
    pub p50_ms: f64,
    /// 95th percentile latency in milliseconds
    pub p95_ms: f64,
    /// 99th percentile latency in milliseconds
    pub p99_ms: f64,
    /// Total number of requests recorded
    pub total_requests: u64,
    /// Mean latency in milliseconds
    pub mean_ms: f64,
    /// Maximum latency recorded in milliseconds
    pub max_ms: f64,
}

/// Thread-safe latency histogram.
///
/// Tracks 1us to 10 minutes with 3 significant figures; larger values are
/// clamped to the upper bound.
#[derive(Debug)]
pub struct LatencyHistogram {
    inner: RwLock<Histogram<u64>>,
}

impl LatencyHistogram {
    /// Create an empty histogram
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, MAX_TRACKED_US, 3)
            .map_err(|e| ConfigError::Invalid(format!("latency histogram: {}", e)))?;
        Ok(Self {
            inner: RwLock::new(histogram),
        })
    }

    /// Record one duration
    pub fn record(&self, duration: Duration) {
        let micros = (duration.as_micros() as u64).clamp(1, MAX_TRACKED_US);
        // In bounds after the clamp
        let _ = self.inner.write().record(micros);
    }

    /// Number of recorded values
    pub fn count(&self) -> u64 {
        self.inner.read().len()
    }

    /// Percentiles converted to milliseconds
    pub fn metrics(&self) -> LatencyMetrics {
        let hist = self.inner.read();
        LatencyMetrics {
            p50_ms: hist.value_at_percentile(50.0) as f64 / 1000.0,
            p95_ms: hist.value_at_percentile(95.0) as f64 / 1000.0,
            p99_ms: hist.value_at_percentile(99.0) as f64 / 1000.0,
            total_requests: hist.len(),
            mean_ms: hist.mean() / 1000.0,
            max_ms: hist.max() as f64 / 1000.0,
        }
    }

    /// Clear all recorded values
    pub fn reset(&self) {
        self.inner.write().reset();
    }
}

/// Counters behind `/status`
#[derive(Debug)]
pub struct ServiceMetrics {
    start_time: Instant,
    extractions: AtomicU64,
    errors: AtomicU64,
    latency: LatencyHistogram,
}

impl ServiceMetrics {
    /// Fresh counters starting now
    pub fn new() -> Result<Self> {
        Ok(Self {
            start_time: Instant::now(),
            extractions: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency: LatencyHistogram::new()?,
        })
    }

    /// Server uptime in seconds
    #[inline]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Count a successful extraction and its latency
    pub fn record_success(&self, elapsed: Duration) -> u64 {
        self.latency.record(elapsed);
        self.extractions.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count a failed extraction
    pub fn record_error(&self) -> u64 {
        self.errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Successful extractions so far
    #[inline]
    pub fn extractions(&self) -> u64 {
        self.extractions.load(Ordering::Relaxed)
    }

    /// Failed extractions so far
    #[inline]
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Latency percentiles
    pub fn latency(&self) -> LatencyMetrics {
        self.latency.metrics()
    }
}
