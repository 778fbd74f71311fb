//! Configuration module for warwatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default upstream War API base URL.
pub const DEFAULT_API_BASE: &str = "https://war-service-live.foxholeservices.com/api/worldconquest";

/// Largest accepted history bound.
pub const MAX_HISTORY_LEN: usize = 10_000;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP port for the read-only web surface (default: 8080)
    pub http_port: u16,
    /// Base URL of the upstream War API
    pub api_base: String,
    /// Path to the persisted report history (default: "war_reports.json")
    pub reports_path: PathBuf,
    /// Maximum number of retained snapshots (default: 12, two hours of 10 minute ticks)
    pub history_len: usize,
    /// Cadence of the selected map and war state refresh (default: 30s)
    pub map_interval: Duration,
    /// Cadence of the war report fan-out (default: 600s)
    pub report_interval: Duration,
    /// Per-request timeout against the upstream API (default: 10s)
    pub request_timeout: Duration,
    /// Map selected at startup, if any
    pub initial_map: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            api_base: DEFAULT_API_BASE.to_string(),
            reports_path: PathBuf::from("war_reports.json"),
            history_len: 12,
            map_interval: Duration::from_secs(30),
            report_interval: Duration::from_secs(600),
            request_timeout: Duration::from_secs(10),
            initial_map: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WARWATCH_HTTP_PORT`: HTTP port (default: 8080)
    /// - `WARWATCH_API_BASE`: upstream base URL
    /// - `WARWATCH_REPORTS_PATH`: history file path (default: "war_reports.json")
    /// - `WARWATCH_HISTORY_LEN`: retained snapshots, 1 to 10000 (default: 12)
    /// - `WARWATCH_MAP_INTERVAL_SECS`: selected map cadence (default: 30)
    /// - `WARWATCH_REPORT_INTERVAL_SECS`: war report cadence (default: 600)
    /// - `WARWATCH_REQUEST_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `WARWATCH_MAP`: map selected at startup
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Some(port) = env::var("WARWATCH_HTTP_PORT").ok().and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Ok(base) = env::var("WARWATCH_API_BASE") {
            cfg.api_base = base.trim_end_matches('/').to_string();
        }

        if let Ok(path) = env::var("WARWATCH_REPORTS_PATH") {
            cfg.reports_path = PathBuf::from(path);
        }

        if let Some(len) = env::var("WARWATCH_HISTORY_LEN").ok().and_then(|s| parse_history_len(&s)) {
            cfg.history_len = len;
        }

        if let Some(d) = env::var("WARWATCH_MAP_INTERVAL_SECS").ok().and_then(|s| parse_secs(&s)) {
            cfg.map_interval = d;
        }

        if let Some(d) = env::var("WARWATCH_REPORT_INTERVAL_SECS").ok().and_then(|s| parse_secs(&s)) {
            cfg.report_interval = d;
        }

        if let Some(d) = env::var("WARWATCH_REQUEST_TIMEOUT_SECS").ok().and_then(|s| parse_secs(&s)) {
            cfg.request_timeout = d;
        }

        if let Ok(map) = env::var("WARWATCH_MAP") {
            if !map.trim().is_empty() {
                cfg.initial_map = Some(map.trim().to_string());
            }
        }

        cfg
    }
}

/// Parse a positive number of seconds.
fn parse_secs(s: &str) -> Option<Duration> {
    match s.trim().parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
    }
}

/// Parse a history bound, clamped to [`MAX_HISTORY_LEN`].
/// A zero bound would make every append a no-op.
fn parse_history_len(s: &str) -> Option<usize> {
    match s.trim().parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(len) => Some(len.min(MAX_HISTORY_LEN)),
    }
}
