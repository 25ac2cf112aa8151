//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible
//! defaults for development. In production, configure via environment
//! variables or a `.env` file.
//!
//! # Policy Configuration
//!
//! - `ACCESS_WINDOW_START` / `ACCESS_WINDOW_END`: allowed time-of-day
//!   interval, `HH:MM` or `HH:MM:SS` (defaults: 18:00 / 21:00, local time)
//! - `RATE_LIMIT_MAX_REQUESTS`: sliding-window ceiling per client (default: 5)
//! - `RATE_LIMIT_WINDOW_SECS`: window length in seconds (default: 60)
//! - `RATE_LIMITED_PATH_PREFIX`: only paths under this prefix are rate
//!   limited (default: "/chats/")
//! - `RATE_LIMITED_METHODS`: comma-separated methods that consume budget
//!   (default: "POST")

use std::env;
use std::time::Duration;

use axum::http::Method;
use chrono::NaiveTime;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::middleware::AccessWindow;
use crate::middleware::rate_limit::RateLimitPolicy;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Access Window Configuration
    // =========================================================================
    /// Inclusive start of the allowed access interval (default: 18:00)
    pub access_window_start: NaiveTime,

    /// Inclusive end of the allowed access interval (default: 21:00)
    pub access_window_end: NaiveTime,

    // =========================================================================
    // Rate Limiting Configuration
    // =========================================================================
    /// Maximum qualifying requests per client per window (default: 5)
    pub rate_limit_max_requests: u32,

    /// Sliding window length (default: 60 seconds)
    pub rate_limit_window: Duration,

    /// Path prefix of rate-limited resources (default: "/chats/")
    pub rate_limited_path_prefix: String,

    /// Methods that consume rate budget (default: [POST])
    pub rate_limited_methods: Vec<Method>,

    /// Interval between background sweeps evicting idle client identities
    /// from the limiter map (default: 300 seconds)
    pub limiter_sweep_interval: Duration,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Append-only request log file; empty disables the file sink and lines
    /// go through the tracing pipeline instead (default: "requests.log")
    pub request_log_path: Option<String>,

    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value fails to parse or
    /// validation fails.
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,

            // Access window
            access_window_start: Self::parse_time_env("ACCESS_WINDOW_START", "18:00")?,
            access_window_end: Self::parse_time_env("ACCESS_WINDOW_END", "21:00")?,

            // Rate limiting
            rate_limit_max_requests: Self::parse_env("RATE_LIMIT_MAX_REQUESTS", 5)?,
            rate_limit_window: Duration::from_secs(Self::parse_env("RATE_LIMIT_WINDOW_SECS", 60)?),
            rate_limited_path_prefix: env::var("RATE_LIMITED_PATH_PREFIX")
                .unwrap_or_else(|_| "/chats/".to_string()),
            rate_limited_methods: Self::parse_methods_env()?,
            limiter_sweep_interval: Duration::from_secs(Self::parse_env(
                "LIMITER_SWEEP_INTERVAL_SECS",
                300,
            )?),

            // Observability
            request_log_path: Some(
                env::var("REQUEST_LOG_PATH").unwrap_or_else(|_| "requests.log".to_string()),
            )
            .filter(|p| !p.is_empty()),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.rate_limit_max_requests == 0 {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_MAX_REQUESTS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit_window.is_zero() {
            return Err(AppError::ConfigError(
                "RATE_LIMIT_WINDOW_SECS must be greater than 0".to_string(),
            ));
        }

        if !self.rate_limited_path_prefix.starts_with('/') {
            return Err(AppError::ConfigError(
                "RATE_LIMITED_PATH_PREFIX must start with '/'".to_string(),
            ));
        }

        if self.rate_limited_methods.is_empty() {
            return Err(AppError::ConfigError(
                "RATE_LIMITED_METHODS must name at least one method".to_string(),
            ));
        }

        // A start after the end matches no time of day at all; the inclusive
        // comparison cannot express a window wrapping past midnight, and we
        // do not invert it silently.
        if self.access_window_start > self.access_window_end {
            warn!(
                start = %self.access_window_start,
                end = %self.access_window_end,
                "ACCESS_WINDOW_START is after ACCESS_WINDOW_END; the window will reject every request (midnight wraparound is not supported)"
            );
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured access window.
    pub fn access_window(&self) -> AccessWindow {
        AccessWindow::new(self.access_window_start, self.access_window_end)
    }

    /// The configured rate-limit selection policy.
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            path_prefix: self.rate_limited_path_prefix.clone(),
            methods: self.rate_limited_methods.clone(),
        }
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a time-of-day environment variable, accepting `HH:MM` or `HH:MM:SS`.
    fn parse_time_env(name: &str, default: &str) -> AppResult<NaiveTime> {
        let raw = env::var(name).unwrap_or_else(|_| default.to_string());
        parse_time_of_day(&raw).map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}")))
    }

    /// Parse the rate-limited method set from `RATE_LIMITED_METHODS`.
    fn parse_methods_env() -> AppResult<Vec<Method>> {
        let raw = env::var("RATE_LIMITED_METHODS").unwrap_or_else(|_| "POST".to_string());
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|_| {
                    AppError::ConfigError(format!("Invalid RATE_LIMITED_METHODS entry: {s}"))
                })
            })
            .collect()
    }
}

/// Parse `HH:MM` or `HH:MM:SS` into a time of day.
fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("expected HH:MM or HH:MM:SS, got {raw:?}"))
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        // 18:00 and 21:00 are always valid times of day.
        let start = NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default();
        let end = NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default();
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            // Access window
            access_window_start: start,
            access_window_end: end,
            // Rate limiting
            rate_limit_max_requests: 5,
            rate_limit_window: Duration::from_secs(60),
            rate_limited_path_prefix: "/chats/".to_string(),
            rate_limited_methods: vec![Method::POST],
            limiter_sweep_interval: Duration::from_secs(300),
            // Observability
            request_log_path: Some("requests.log".to_string()),
            log_level: "info".to_string(),
            metrics_port: 9090,
        }
    }
}
