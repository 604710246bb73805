//! # Structured Logging Module
//!
//! Environment-aware structured logging to the console and to a JSON file
//! under `log/` (or `NAAS_LOG_DIR`), so an unattended cron run leaves a
//! machine-readable trail of every transition and carrier call.

use crate::constants::env as env_keys;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `verbosity` raises the console level (`-v` debug, `-vv` trace). `RUST_LOG`
/// always wins when it is set.
pub fn init_structured_logging(verbosity: u8) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment, verbosity);

        let console = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
            .with_filter(build_filter(&log_level));

        let log_dir = std::env::var(env_keys::LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("log"));

        // File output is best effort; an unwritable directory leaves console only
        if let Err(e) = fs::create_dir_all(&log_dir) {
            let _ = tracing_subscriber::registry().with(console).try_init();
            tracing::warn!(
                log_dir = %log_dir.display(),
                error = %e,
                "⚠️ LOGGING: Could not create log directory, console output only"
            );
            return None;
        }

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry().with(console).with(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(build_filter(&log_level)),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "🔧 STRUCTURED LOGGING: Initialized with file output"
        );

        Some(guard)
    });
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var(env_keys::ENVIRONMENT)
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "production".to_string())
}

/// Get log level based on environment and CLI verbosity
fn get_log_level(environment: &str, verbosity: u8) -> String {
    let base = match environment {
        "test" | "development" => "debug",
        _ => "info",
    };
    match verbosity {
        0 => base.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Log a state machine transition of a check run
pub fn log_check_transition(
    run_id: &str,
    service_id: &str,
    from_state: &str,
    to_state: &str,
    event: &str,
) {
    tracing::info!(
        run_id = %run_id,
        service_id = %service_id,
        from_state = %from_state,
        to_state = %to_state,
        event = %event,
        timestamp = %Utc::now().to_rfc3339(),
        "🔀 CHECK_TRANSITION"
    );
}

/// Log a call to the carrier API
pub fn log_carrier_operation(
    operation: &str,
    service_id: Option<&str>,
    status: &str,
    duration_ms: Option<u64>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        service_id = service_id,
        status = %status,
        duration_ms = duration_ms,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📡 CARRIER_OPERATION"
    );
}

/// Log the tier decision for a service
pub fn log_decision(
    service_id: &str,
    reachable: bool,
    target: &str,
    current_bandwidth: &str,
    target_bandwidth: &str,
    order_required: bool,
) {
    tracing::info!(
        service_id = %service_id,
        reachable = reachable,
        target = %target,
        current_bandwidth = %current_bandwidth,
        target_bandwidth = %target_bandwidth,
        order_required = order_required,
        timestamp = %Utc::now().to_rfc3339(),
        "⚖️ DECISION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
