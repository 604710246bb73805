//! Shared test fixtures
#![allow(dead_code)]

pub mod fake_carrier;

use naas_checker::config::{BandwidthConfig, CheckerConfig, ConfigLoader, RetryConfig};
use naas_checker::models::{BillingAccount, ContactBlock, InventoryState, ServiceDescriptor};
use naas_checker::orchestration::RunSettings;
use naas_checker::resilience::RetryPolicy;
use std::collections::HashMap;
use std::time::Duration;

pub const LUMEN_IP: &str = "203.0.113.10";
pub const FULL: &str = "1 Gbps";
pub const HEARTBEAT: &str = "1 Mbps";

/// The complete flat environment a deployment would provide
pub fn base_env() -> HashMap<String, String> {
    [
        ("USERNAME", "client-id"),
        ("SECRET", "client-secret"),
        ("CUSTOMER_NUMBER", "C-100"),
        ("SERVICE_ID", "SVC-42"),
        ("CURRENCY_CODE", "USD"),
        ("PARTNER_ID", "P-7"),
        ("PRODUCT_CODE", "718"),
        ("PRODUCT_NAME", "Internet On-Demand"),
        ("EXTERNAL_ID_PREFIX", "NAAS"),
        ("CONTACT_NAME", "Network Ops"),
        ("CONTACT_ROLE", "Technical"),
        ("CONTACT_EMAIL", "noc@example.com"),
        ("CONTACT_ORG", "Example Corp"),
        ("CONTACT_PHONE", "555-0100"),
        ("BANDWIDTH_FULL", FULL),
        ("BANDWIDTH_HEARTBEAT", HEARTBEAT),
        ("LUMEN_IP", LUMEN_IP),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Configuration pointed at a fake carrier, with short delays
pub fn config_for(base_url: &str, egress_url: &str) -> CheckerConfig {
    let mut env = base_env();
    env.extend(
        [
            ("NAAS_API__BASE_URL", base_url),
            ("NAAS_API__TIMEOUT_MS", "2000"),
            ("NAAS_PROBE__EGRESS_URL", egress_url),
            ("NAAS_PROBE__TIMEOUT_MS", "2000"),
            ("NAAS_RETRY__BASE_DELAY_MS", "1"),
            ("NAAS_RETRY__MAX_DELAY_MS", "5"),
            ("NAAS_VERIFIER__POLL_INTERVAL_SECS", "1"),
            ("NAAS_VERIFIER__MAX_WAIT_SECS", "2"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string())),
    );
    ConfigLoader::from_sources(None, env).expect("test configuration is valid")
}

pub fn service() -> ServiceDescriptor {
    ServiceDescriptor {
        customer_number: "C-100".into(),
        service_id: "SVC-42".into(),
        product_code: "718".into(),
        product_name: "Internet On-Demand".into(),
        currency_code: "USD".into(),
    }
}

pub fn contact() -> ContactBlock {
    ContactBlock {
        name: "Network Ops".into(),
        role: "Technical".into(),
        email: "noc@example.com".into(),
        organization: "Example Corp".into(),
        phone: "555-0100".into(),
    }
}

pub fn bandwidth_config() -> BandwidthConfig {
    BandwidthConfig {
        full: FULL.parse().unwrap(),
        heartbeat: HEARTBEAT.parse().unwrap(),
    }
}

pub fn inventory_at(bandwidth: &str) -> InventoryState {
    InventoryState {
        service_id: "SVC-42".into(),
        current_bandwidth: bandwidth.parse().unwrap(),
        status: "active".into(),
        billing_account: Some(BillingAccount {
            id: "BA-100".into(),
            name: "Example Corp".into(),
        }),
        master_site_id: Some("MS-9".into()),
    }
}

/// Poll every 5 s for at most 30 s
pub fn run_settings() -> RunSettings {
    RunSettings {
        lumen_ip: LUMEN_IP.parse().unwrap(),
        bandwidth: bandwidth_config(),
        probe_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_secs(5),
        max_wait: Duration::from_secs(30),
        poll_retry_attempts: 2,
        dry_run: false,
    }
}

pub fn retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::from(&RetryConfig {
        max_attempts,
        base_delay_ms: 10,
        max_delay_ms: 100,
        backoff_multiplier: 2.0,
        jitter_factor: 0.0,
    })
}
