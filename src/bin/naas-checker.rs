//! # NaaS Bandwidth Checker
//!
//! One-shot check: authenticate, read inventory, probe reachability, and
//! submit a bandwidth change order when the service is on the wrong tier.
//! Intended to run from cron or a systemd timer.

use anyhow::Context;
use clap::Parser;
use naas_checker::config::{CheckerConfig, ConfigLoader};
use naas_checker::constants::exit_codes;
use naas_checker::logging::{init_structured_logging, log_error};
use naas_checker::orchestration::{CancellationHandle, CancellationSignal, CheckerOrchestrator};
use naas_checker::report::{self, ReportFormat};
use naas_checker::ServiceDescriptor;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "naas-checker")]
#[command(about = "Keep a NaaS circuit's bandwidth tier in line with its reachability")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// YAML configuration file (default: config/naas-checker.yaml when present)
    #[arg(short, long, env = "NAAS_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Env file to load instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Service to check; repeat to check several concurrently (default: SERVICE_ID)
    #[arg(long = "service-id", value_name = "ID")]
    service_ids: Vec<String>,

    /// Decide and report, but never submit orders
    #[arg(long)]
    dry_run: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    format: ReportFormat,

    /// Also write the report to this file
    #[arg(long)]
    report_file: Option<PathBuf>,

    /// Exit 3 when an order was rejected or timed out
    #[arg(long)]
    strict: bool,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_structured_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            log_error("cli", "load_config", &format!("{e:#}"), None);
            eprintln!("configuration error: {e:#}");
            return ExitCode::from(exit_codes::CONFIGURATION);
        }
    };

    let orchestrator = match CheckerOrchestrator::from_config(&config) {
        Ok(orchestrator) => orchestrator.with_dry_run(cli.dry_run),
        Err(e) => {
            log_error("cli", "build_orchestrator", &e.to_string(), None);
            eprintln!("configuration error: {e}");
            return ExitCode::from(exit_codes::CONFIGURATION);
        }
    };

    let services = services_to_check(&config, &cli.service_ids);
    let (handle, cancel) = CancellationSignal::channel();
    tokio::spawn(cancel_on_shutdown(handle));

    let results = orchestrator.run_many(&services, &cancel).await;
    let rendered = report::render(&results, cli.format);
    println!("{rendered}");

    if let Some(path) = &cli.report_file {
        if let Err(e) = report::write_report(path, &rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))
        {
            log_error("cli", "write_report", &format!("{e:#}"), None);
            return ExitCode::from(exit_codes::FAILED);
        }
    }

    let code = report::exit_code(&results, cli.strict);
    info!(exit_code = code, runs = results.len(), "naas-checker finished");
    ExitCode::from(code)
}

fn load_config(cli: &Cli) -> anyhow::Result<CheckerConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    loader.load().context("failed to load configuration")
}

fn services_to_check(config: &CheckerConfig, service_ids: &[String]) -> Vec<ServiceDescriptor> {
    if service_ids.is_empty() {
        return vec![config.service.clone()];
    }
    let mut seen = std::collections::HashSet::new();
    service_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .map(|id| config.service.for_service(id.clone()))
        .collect()
}

/// Request cooperative cancellation on Ctrl+C or SIGTERM
async fn cancel_on_shutdown(handle: CancellationHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, cancelling checks");
        },
        _ = terminate => {
            info!("Received SIGTERM, cancelling checks");
        },
    }
    handle.cancel();
}
