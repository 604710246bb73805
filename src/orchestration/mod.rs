//! # Orchestration Engine
//!
//! Runs a bandwidth check end to end:
//!
//! - **CheckerOrchestrator**: drives the state machine, applies retries and
//!   token refresh, converts every error into a [`CheckResult`]
//! - **Decision engine**: pure choice of target tier and whether an order is needed
//! - **OrderVerifier**: polls a submitted order to a terminal outcome or timeout
//! - **CancellationSignal**: cooperative cancellation checked at each transition

pub mod cancellation;
pub mod checker;
pub mod decision;
pub mod types;
pub mod verifier;

pub use cancellation::{CancellationHandle, CancellationSignal};
pub use checker::{CheckerDependencies, CheckerOrchestrator, RunSettings};
pub use decision::{decide, evaluate, Decision};
pub use types::{CheckResult, RunError};
pub use verifier::OrderVerifier;
