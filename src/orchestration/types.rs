//! # Orchestration Types
//!
//! The report a check run produces. Every run ends in exactly one
//! [`CheckResult`], whether it finished, decided nothing was needed, or failed.

use crate::models::{BandwidthTarget, OrderOutcome, OrderReference, ReachabilityResult};
use crate::state_machine::{CheckState, Transition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Why and where a run failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunError {
    /// State the run was in (or about to enter) when the error occurred
    pub state: CheckState,
    pub kind: String,
    pub message: String,
}

/// Outcome of one check run
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub run_id: Uuid,
    pub service_id: String,
    pub final_state: CheckState,
    /// A tier change was required (even if not submitted on a dry run)
    pub decision_made: bool,
    pub dry_run: bool,
    pub previous_bandwidth: Option<String>,
    pub target: Option<BandwidthTarget>,
    pub target_bandwidth: Option<String>,
    pub reachability: Option<ReachabilityResult>,
    pub order: Option<OrderReference>,
    pub order_outcome: Option<OrderOutcome>,
    pub error: Option<RunError>,
    pub transitions: Vec<Transition>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CheckResult {
    pub(crate) fn started(service_id: impl Into<String>, dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            service_id: service_id.into(),
            final_state: CheckState::Init,
            decision_made: false,
            dry_run,
            previous_bandwidth: None,
            target: None,
            target_bandwidth: None,
            reachability: None,
            order: None,
            order_outcome: None,
            error: None,
            transitions: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.final_state == CheckState::Failed
    }

    /// Reached TERMINAL without an order, or with an accepted one
    pub fn converged(&self) -> bool {
        self.final_state == CheckState::Terminal
            && !matches!(
                self.order_outcome,
                Some(OrderOutcome::Rejected | OrderOutcome::TimedOut)
            )
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
