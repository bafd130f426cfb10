//! Process settings read from `NEWSDESK_*` environment variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NEWSDESK_HOST` | `127.0.0.1` |
//! | `NEWSDESK_PORT` | `8000` |
//! | `NEWSDESK_POOL_SIZE` | `4` |
//! | `NEWSDESK_CACHE_TTL_SECS` | `300` |
//! | `NEWSDESK_REQUEST_TIMEOUT_MS` | `90000` |
//! | `NEWSDESK_CHROME_PATH` | auto-detect |
//! | `NEWSDESK_HEADLESS` | `true` |
//! | `NEWSDESK_CORS_ORIGINS` | loopback only |

use crate::browser::BrowserConfig;
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

/// Prefix shared by every variable
pub const ENV_PREFIX: &str = "NEWSDESK_";

/// Runtime settings for the binary and the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Concurrent page renders
    pub pool_size: usize,
    /// Result cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Whole-request bound in milliseconds
    pub request_timeout_ms: u64,
    /// Chrome/Chromium executable
    pub chrome_path: Option<String>,
    /// Run the browser headless
    pub headless: bool,
    /// Allowed CORS origins; empty means loopback only
    pub cors_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            pool_size: 4,
            cache_ttl_secs: 300,
            request_timeout_ms: 90_000,
            chrome_path: None,
            headless: true,
            cors_origins: Vec::new(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which receives full variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let pool_size: usize = parse_or(get("POOL_SIZE"), "POOL_SIZE", defaults.pool_size)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}POOL_SIZE must be at least 1",
                ENV_PREFIX
            )));
        }

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            pool_size,
            cache_ttl_secs: parse_or(get("CACHE_TTL_SECS"), "CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
            request_timeout_ms: parse_or(
                get("REQUEST_TIMEOUT_MS"),
                "REQUEST_TIMEOUT_MS",
                defaults.request_timeout_ms,
            )?,
            chrome_path: get("CHROME_PATH"),
            headless: match get("HEADLESS") {
                Some(raw) => parse_bool(&raw)?,
                None => defaults.headless,
            },
            cors_origins: get("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Cache TTL as a duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Request bound as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Browser launch config derived from these settings
    pub fn browser_config(&self) -> BrowserConfig {
        let mut builder = BrowserConfig::builder()
            .headless(self.headless)
            .pool_size(self.pool_size);
        if let Some(ref path) = self.chrome_path {
            builder = builder.chrome_path(path);
        }
        builder.build()
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.parse().map_err(|_| {
            ConfigError::Invalid(format!("{}{} has invalid value {:?}", ENV_PREFIX, name, value))
        }),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{}HEADLESS has invalid value {:?}",
            ENV_PREFIX, raw
        ))),
    }
}
