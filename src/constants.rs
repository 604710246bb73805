//! # System Constants
//!
//! Carrier API paths, request literals, and the defaults applied when
//! configuration leaves a tunable unset.

/// Carrier API endpoint paths, relative to the configured base URL
pub mod api {
    pub const DEFAULT_BASE_URL: &str = "https://api.lumen.com";
    pub const TOKEN_PATH: &str = "/oauth/v2/token";
    pub const INVENTORY_PATH: &str = "/ProductInventory/v1/inventory";
    pub const PRICE_REQUEST_PATH: &str = "/Product/v1/priceRequest";
    pub const ORDER_PATH: &str = "/Customer/v3/Ordering/orderRequest";

    pub const CUSTOMER_NUMBER_HEADER: &str = "x-customer-number";
}

/// Literal values the carrier expects in request payloads
pub mod carrier {
    pub const SOURCE_SYSTEM: &str = "NaaS ExternalApi";
    pub const CHANNEL_ID: u32 = 99;
    pub const PRICE_REQUEST_DESCRIPTION: &str = "NaaS Price Request";
    pub const ORDER_NOTE: &str = "Change";
    pub const ORDER_ACTION: &str = "modify";
    pub const PRODUCT_SPECIFICATION_ID: &str = "5001";
    pub const PRODUCT_SPECIFICATION_NAME: &str = "NaaS Internet";
    pub const SERVICE_TYPE: &str = "Internet";
    pub const BANDWIDTH_CHARACTERISTIC: &str = "Bandwidth";
    pub const INVENTORY_PAGE_SIZE: u32 = 10;
}

/// Defaults for configuration tunables
pub mod defaults {
    pub const API_TIMEOUT_MS: u64 = 30_000;

    pub const TOKEN_SAFETY_MARGIN_SECS: u64 = 60;
    pub const TOKEN_SAFETY_MARGIN_MAX_SECS: u64 = 3_600;
    /// Lifetime assumed when the token endpoint omits `expires_in`
    pub const TOKEN_LIFETIME_SECS: i64 = 300;
    /// Longer advertised lifetimes are cached for this long at most
    pub const TOKEN_MAX_LIFETIME_SECS: i64 = 86_400;

    pub const PROBE_EGRESS_URL: &str = "https://ifconfig.me/ip";
    pub const PROBE_PORT: u16 = 443;
    pub const PROBE_TIMEOUT_MS: u64 = 5_000;

    pub const RETRY_MAX_ATTEMPTS: u32 = 4;
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
    pub const RETRY_MAX_DELAY_MS: u64 = 30_000;
    pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const RETRY_JITTER_FACTOR: f64 = 0.1;

    pub const VERIFIER_POLL_INTERVAL_SECS: u64 = 5;
    pub const VERIFIER_MAX_WAIT_SECS: u64 = 30;
    /// Upper bound on how long a run may spend verifying one order
    pub const VERIFIER_MAX_WAIT_LIMIT_SECS: u64 = 86_400;
    pub const VERIFIER_POLL_RETRY_ATTEMPTS: u32 = 2;

    pub const CONFIG_FILE_PATH: &str = "config/naas-checker.yaml";
}

/// Environment variables read outside the flat configuration keys
pub mod env {
    pub const CONFIG_PATH: &str = "NAAS_CONFIG_PATH";
    pub const ENVIRONMENT: &str = "NAAS_ENV";
    pub const LOG_DIR: &str = "NAAS_LOG_DIR";
    /// Prefix for nested tunables, e.g. `NAAS_RETRY__MAX_ATTEMPTS`
    pub const TUNABLE_PREFIX: &str = "NAAS";
    pub const TUNABLE_SEPARATOR: &str = "__";
}

/// Process exit codes used by the CLI
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const FAILED: u8 = 1;
    pub const CONFIGURATION: u8 = 2;
    pub const NOT_CONVERGED: u8 = 3;
}
