//! JSON configuration file.
//!
//! Keys are PascalCase. Every gateway setting has a default, so a file that
//! only carries credentials is valid:
//!
//! ```json
//! {
//!   "XivapiApiKey": "...",
//!   "SheetsAccessToken": "...",
//!   "LogLevel": "debug",
//!   "Xivapi": { "RequestsPerSecond": 1, "MaxWaitSeconds": 3600 },
//!   "Sheets": { "RequestsPerSecond": 1, "MaxRetries": 10 }
//! }
//! ```
//!
//! Values are validated into [`gateway`] types on load; an invalid rate or
//! cap fails startup rather than the first request.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use gateway::{CorrelationConfig, CorrelationMode, GatewayConfig, RateLimitConfig};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

// ---------------------------------------------------------------------------
// Log level
// ---------------------------------------------------------------------------

/// Configured verbosity. `fatal` and `panic` both map to `error`; anything
/// unrecognised falls back to `info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<String> for LogLevel {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" | "fatal" | "panic" => Self::Error,
            _ => Self::Info,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-gateway settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    #[default]
    Reply,
    Broadcast,
}

impl From<ModeSetting> for CorrelationMode {
    fn from(mode: ModeSetting) -> Self {
        match mode {
            ModeSetting::Reply => CorrelationMode::Reply,
            ModeSetting::Broadcast => CorrelationMode::Broadcast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GatewaySettings {
    pub requests_per_second: f64,
    pub max_wait_seconds: f64,
    pub max_retries: Option<u32>,
    pub correlation_mode: ModeSetting,
    pub max_attempts: u32,
    pub poll_interval_ms: u64,
    pub requeue_delay_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        let rate = RateLimitConfig::default();
        let correlation = CorrelationConfig::default();
        Self {
            requests_per_second: rate.rate.per_second(),
            max_wait_seconds: rate.max_wait.as_secs_f64(),
            max_retries: None,
            correlation_mode: ModeSetting::default(),
            max_attempts: correlation.max_attempts,
            poll_interval_ms: millis(correlation.poll_interval),
            requeue_delay_ms: millis(correlation.requeue_delay),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl GatewaySettings {
    /// Validates the raw values. `section` names the offending block in errors.
    pub fn gateway_config(&self, section: &str) -> anyhow::Result<GatewayConfig> {
        let rate_limit = RateLimitConfig::new(self.requests_per_second, self.max_wait_seconds)
            .with_context(|| {
                format!(
                    "{section}: RequestsPerSecond ({}) and MaxWaitSeconds ({}) must be positive and finite",
                    self.requests_per_second, self.max_wait_seconds
                )
            })?;
        if self.max_attempts == 0 {
            bail!("{section}: MaxAttempts must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            bail!("{section}: PollIntervalMs must be at least 1");
        }
        Ok(GatewayConfig {
            rate_limit,
            max_retries: self.max_retries,
            correlation: CorrelationConfig {
                max_attempts: self.max_attempts,
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                requeue_delay: Duration::from_millis(self.requeue_delay_ms),
            },
            mode: self.correlation_mode.into(),
        })
    }
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    pub xivapi_api_key: Option<String>,
    pub sheets_access_token: Option<String>,
    pub log_level: LogLevel,
    /// OTLP gRPC collector; traces are only exported when set.
    pub otlp_endpoint: Option<String>,
    pub xivapi: GatewaySettings,
    pub sheets: GatewaySettings,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.xivapi.gateway_config("Xivapi")?;
        config.sheets.gateway_config("Sheets")?;
        Ok(config)
    }

    pub fn xivapi_api_key(&self) -> anyhow::Result<&str> {
        self.xivapi_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .context("XivapiApiKey is required for Lodestone commands")
    }

    pub fn sheets_access_token(&self) -> anyhow::Result<&str> {
        self.sheets_access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .context("SheetsAccessToken is required for spreadsheet writes")
    }
}
