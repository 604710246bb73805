use super::bandwidth::Bandwidth;
use super::service::ServiceDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bandwidth tier a service should be running at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BandwidthTarget {
    Full,
    Heartbeat,
}

impl BandwidthTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Heartbeat => "HEARTBEAT",
        }
    }
}

impl fmt::Display for BandwidthTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final (or still pending) disposition of a submitted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderOutcome {
    Accepted,
    Rejected,
    Pending,
    TimedOut,
}

impl OrderOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Map the carrier's order state onto an outcome; unknown states keep polling
    pub fn from_carrier_state(state: &str) -> Self {
        match state.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "accepted" | "acknowledged" => Self::Accepted,
            "rejected" | "failed" | "cancelled" | "canceled" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl fmt::Display for OrderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Pending => "PENDING",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(label)
    }
}

/// Contact attached to every change order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBlock {
    pub name: String,
    pub role: String,
    pub email: String,
    pub organization: String,
    pub phone: String,
}

/// A request to move a service to a new bandwidth tier
///
/// Immutable once submitted. `external_id` is a pure function of prefix,
/// service id and target, so resubmitting the same change is recognised by
/// the carrier as the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeOrder {
    pub external_id: String,
    pub service_id: String,
    pub target: BandwidthTarget,
    pub target_bandwidth: Bandwidth,
    pub contact: ContactBlock,
    pub currency_code: String,
    pub quote_id: Option<String>,
}

impl ChangeOrder {
    pub fn external_id_for(prefix: &str, service_id: &str, target: BandwidthTarget) -> String {
        format!("{prefix}-{service_id}-{}", target.as_str())
    }

    pub fn new(
        external_id_prefix: &str,
        descriptor: &ServiceDescriptor,
        target: BandwidthTarget,
        target_bandwidth: Bandwidth,
        contact: ContactBlock,
    ) -> Self {
        Self {
            external_id: Self::external_id_for(
                external_id_prefix,
                &descriptor.service_id,
                target,
            ),
            service_id: descriptor.service_id.clone(),
            target,
            target_bandwidth,
            contact,
            currency_code: descriptor.currency_code.clone(),
            quote_id: None,
        }
    }

    pub fn with_quote(mut self, quote_id: impl Into<String>) -> Self {
        self.quote_id = Some(quote_id.into());
        self
    }
}

/// The carrier's handle on a submitted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReference {
    pub order_id: String,
    pub external_id: String,
    /// The carrier already held an order with this external id
    pub duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedOrder {
    pub order: ChangeOrder,
    pub reference: OrderReference,
}
