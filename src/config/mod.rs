//! # Configuration
//!
//! One immutable [`CheckerConfig`], validated once at startup and passed
//! explicitly to the components that need it. Loading and layering live in
//! [`loader`]; this module only defines the shape.

pub mod error;
pub mod loader;

pub use error::{ConfigProblem, ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

use crate::constants::{api, defaults};
use crate::models::{
    Bandwidth, BandwidthTarget, ContactBlock, Credentials, ServiceDescriptor,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Fully validated checker configuration
#[derive(Debug, Clone, Serialize)]
pub struct CheckerConfig {
    pub credentials: Credentials,
    pub service: ServiceDescriptor,
    pub contact: ContactBlock,
    pub external_id_prefix: String,
    pub bandwidth: BandwidthConfig,
    /// Address whose reachability decides the tier
    pub lumen_ip: IpAddr,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub probe: ProbeConfig,
    pub retry: RetryConfig,
    pub verifier: VerifierConfig,
}

impl CheckerConfig {
    /// JSON rendering safe to log; secrets are masked by their serializers
    pub fn sanitized(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Bandwidth values for each tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandwidthConfig {
    pub full: Bandwidth,
    pub heartbeat: Bandwidth,
}

impl BandwidthConfig {
    pub fn value_for(&self, target: BandwidthTarget) -> &Bandwidth {
        match target {
            BandwidthTarget::Full => &self.full,
            BandwidthTarget::Heartbeat => &self.heartbeat,
        }
    }
}

/// Carrier API location and per-request timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub token_path: String,
    pub inventory_path: String,
    pub price_request_path: String,
    pub order_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: api::DEFAULT_BASE_URL.to_string(),
            timeout_ms: defaults::API_TIMEOUT_MS,
            token_path: api::TOKEN_PATH.to_string(),
            inventory_path: api::INVENTORY_PATH.to_string(),
            price_request_path: api::PRICE_REQUEST_PATH.to_string(),
            order_path: api::ORDER_PATH.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Tokens closer than this to expiry are refreshed before use
    pub safety_margin_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            safety_margin_secs: defaults::TOKEN_SAFETY_MARGIN_SECS,
        }
    }
}

impl AuthConfig {
    pub fn safety_margin(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.safety_margin_secs as i64)
    }
}

/// How reachability of `LUMEN_IP` is established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Public egress address equals `LUMEN_IP`
    Egress,
    /// TCP connect to `LUMEN_IP:port` succeeds
    Tcp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub mode: ProbeMode,
    pub egress_url: String,
    pub port: u16,
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            mode: ProbeMode::Egress,
            egress_url: defaults::PROBE_EGRESS_URL.to_string(),
            port: defaults::PROBE_PORT,
            timeout_ms: defaults::PROBE_TIMEOUT_MS,
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Backoff applied when a state fails transiently
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per state, including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Upper bound of the random extra delay, as a fraction of the computed delay
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay_ms: defaults::RETRY_BASE_DELAY_MS,
            max_delay_ms: defaults::RETRY_MAX_DELAY_MS,
            backoff_multiplier: defaults::RETRY_BACKOFF_MULTIPLIER,
            jitter_factor: defaults::RETRY_JITTER_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
    /// Extra tries for a poll that fails transiently
    pub poll_retry_attempts: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: defaults::VERIFIER_POLL_INTERVAL_SECS,
            max_wait_secs: defaults::VERIFIER_MAX_WAIT_SECS,
            poll_retry_attempts: defaults::VERIFIER_POLL_RETRY_ATTEMPTS,
        }
    }
}

impl VerifierConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}
