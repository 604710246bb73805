use super::bandwidth::Bandwidth;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// The NaaS service under check, as named in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub customer_number: String,
    pub service_id: String,
    pub product_code: String,
    pub product_name: String,
    pub currency_code: String,
}

impl ServiceDescriptor {
    /// Same customer and product, different service
    pub fn for_service(&self, service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAccount {
    pub id: String,
    pub name: String,
}

/// Service state as reported by the carrier's inventory, fetched fresh each run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryState {
    pub service_id: String,
    pub current_bandwidth: Bandwidth,
    pub status: String,
    pub billing_account: Option<BillingAccount>,
    pub master_site_id: Option<String>,
}

/// Outcome of a single reachability probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReachabilityResult {
    pub target_ip: IpAddr,
    pub reachable: bool,
    pub checked_at: DateTime<Utc>,
    /// What the probe saw: an egress address, a connect error, "timeout"
    pub observed: Option<String>,
}

impl ReachabilityResult {
    pub fn reachable(target_ip: IpAddr, observed: impl Into<String>) -> Self {
        Self {
            target_ip,
            reachable: true,
            checked_at: Utc::now(),
            observed: Some(observed.into()),
        }
    }

    pub fn unreachable(target_ip: IpAddr, observed: impl Into<String>) -> Self {
        Self {
            target_ip,
            reachable: false,
            checked_at: Utc::now(),
            observed: Some(observed.into()),
        }
    }
}
