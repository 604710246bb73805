use crate::models::OrderOutcome;
use serde::{Deserialize, Serialize};

/// Events that drive a check run between states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CheckEvent {
    TokenAcquired,
    InventoryFetched,
    ProbeCompleted,
    /// A target tier was chosen
    DecisionMade,
    /// No order needed (already at target, or dry run)
    SkipOrder,
    SubmissionStarted,
    /// The carrier holds a reference for the change order
    OrderSubmitted,
    /// Verification finished with a terminal outcome
    OrderResolved(OrderOutcome),
    /// Close out a finished run
    Finalize,
    /// Abort with error message
    Fail(String),
}

impl CheckEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TokenAcquired => "token_acquired",
            Self::InventoryFetched => "inventory_fetched",
            Self::ProbeCompleted => "probe_completed",
            Self::DecisionMade => "decision_made",
            Self::SkipOrder => "skip_order",
            Self::SubmissionStarted => "submission_started",
            Self::OrderSubmitted => "order_submitted",
            Self::OrderResolved(_) => "order_resolved",
            Self::Finalize => "finalize",
            Self::Fail(_) => "fail",
        }
    }
}
