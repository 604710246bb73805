//! # Reachability Probe
//!
//! Bounded-time check of whether traffic to `LUMEN_IP` flows over the carrier
//! circuit. Every failure, including the timeout itself, folds into
//! `reachable = false`; nothing escapes as an error.

use crate::config::{ConfigProblem, ConfigurationError, ProbeConfig, ProbeMode};
use crate::models::ReachabilityResult;
use async_trait::async_trait;
use reqwest::Client;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Never takes longer than `timeout`
    async fn probe(&self, address: IpAddr, timeout: Duration) -> ReachabilityResult;
}

/// Compares this host's public egress address with the target address
#[derive(Debug, Clone)]
pub struct EgressIpProbe {
    client: Client,
    echo_url: String,
}

impl EgressIpProbe {
    pub fn new(echo_url: impl Into<String>) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .user_agent(format!("naas-checker/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigurationError::Invalid {
                problems: vec![ConfigProblem {
                    field: "probe.egress_url".to_string(),
                    reason: format!("failed to create HTTP client: {e}"),
                }],
            })?;
        Ok(Self {
            client,
            echo_url: echo_url.into(),
        })
    }

    async fn egress_address(&self) -> Result<IpAddr, String> {
        let response = self
            .client
            .get(&self.echo_url)
            .send()
            .await
            .map_err(|e| format!("echo request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!("echo service returned HTTP {}", response.status()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| format!("echo response unreadable: {e}"))?;
        body.trim()
            .parse()
            .map_err(|_| format!("echo service returned '{}'", body.trim()))
    }
}

#[async_trait]
impl ReachabilityProbe for EgressIpProbe {
    async fn probe(&self, address: IpAddr, timeout: Duration) -> ReachabilityResult {
        let result = match tokio::time::timeout(timeout, self.egress_address()).await {
            Ok(Ok(egress)) if egress == address => {
                ReachabilityResult::reachable(address, egress.to_string())
            }
            Ok(Ok(egress)) => ReachabilityResult::unreachable(address, egress.to_string()),
            Ok(Err(reason)) => ReachabilityResult::unreachable(address, reason),
            Err(_) => ReachabilityResult::unreachable(address, "timeout"),
        };

        info!(
            target_ip = %address,
            reachable = result.reachable,
            observed = result.observed.as_deref().unwrap_or_default(),
            "Egress probe completed"
        );
        result
    }
}

/// Opens a TCP connection to the target address
#[derive(Debug, Clone, Copy)]
pub struct TcpConnectProbe {
    port: u16,
}

impl TcpConnectProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl ReachabilityProbe for TcpConnectProbe {
    async fn probe(&self, address: IpAddr, timeout: Duration) -> ReachabilityResult {
        let socket = SocketAddr::new(address, self.port);
        debug!(socket = %socket, timeout_ms = timeout.as_millis() as u64, "Probing TCP reachability");

        let result = match tokio::time::timeout(timeout, TcpStream::connect(socket)).await {
            Ok(Ok(_stream)) => ReachabilityResult::reachable(address, format!("connected to {socket}")),
            Ok(Err(e)) => ReachabilityResult::unreachable(address, e.to_string()),
            Err(_) => ReachabilityResult::unreachable(address, "timeout"),
        };

        info!(
            target_ip = %address,
            port = self.port,
            reachable = result.reachable,
            "TCP probe completed"
        );
        result
    }
}

/// Probe selected by configuration
pub fn probe_from_config(
    config: &ProbeConfig,
) -> Result<Arc<dyn ReachabilityProbe>, ConfigurationError> {
    Ok(match config.mode {
        ProbeMode::Egress => Arc::new(EgressIpProbe::new(&config.egress_url)?),
        ProbeMode::Tcp => Arc::new(TcpConnectProbe::new(config.port)),
    })
}
