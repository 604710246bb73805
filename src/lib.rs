#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # NaaS Bandwidth Checker
//!
//! Keeps a carrier Network-as-a-Service circuit at the right bandwidth tier.
//!
//! ## Overview
//!
//! Each run authenticates against the carrier's OAuth endpoint, reads the
//! service's current bandwidth from product inventory, probes whether traffic
//! to a designated address flows over the circuit, and decides between the
//! FULL and HEARTBEAT tiers. When the current bandwidth does not match the
//! chosen tier, a quoted change order is submitted under a deterministic
//! external id and polled until the carrier accepts, rejects, or the wait
//! budget runs out.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (`.env`, YAML, environment) and validation
//! - [`client`] - Carrier API clients: token, inventory, price request, ordering
//! - [`probe`] - Bounded-time reachability probes
//! - [`state_machine`] - States and transitions of a check run
//! - [`orchestration`] - The orchestrator, decision engine, and order verifier
//! - [`resilience`] - Retry with exponential backoff and jitter
//! - [`report`] - JSON/text reports and exit codes
//! - [`error`] - Structured error handling
//! - [`logging`] - Console and JSON file logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use naas_checker::config::ConfigLoader;
//! use naas_checker::orchestration::{CancellationSignal, CheckerOrchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().load()?;
//! let orchestrator = CheckerOrchestrator::from_config(&config)?;
//!
//! let result = orchestrator
//!     .run(&config.service, &CancellationSignal::never())
//!     .await;
//! println!("{} finished in {}", result.service_id, result.final_state);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod probe;
pub mod report;
pub mod resilience;
pub mod state_machine;

pub use config::{CheckerConfig, ConfigLoader, ConfigurationError};
pub use error::{
    AuthError, InventoryError, NaasError, NaasResult, OrderStatusError, OrderSubmissionError,
};
pub use models::{
    AccessToken, Bandwidth, BandwidthTarget, ChangeOrder, InventoryState, OrderOutcome,
    OrderReference, ReachabilityResult, ServiceDescriptor,
};
pub use orchestration::{CancellationSignal, CheckResult, CheckerOrchestrator};
pub use state_machine::CheckState;
