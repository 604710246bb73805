//! Decision engine: which tier a service should run at, and whether an order
//! is needed to get there. Pure functions only.

use crate::config::BandwidthConfig;
use crate::models::{Bandwidth, BandwidthTarget, InventoryState, ReachabilityResult};

/// Target tier for the given reachability; FULL iff the address is reachable
pub fn decide(_current: &InventoryState, reach: &ReachabilityResult) -> BandwidthTarget {
    if reach.reachable {
        BandwidthTarget::Full
    } else {
        BandwidthTarget::Heartbeat
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub target: BandwidthTarget,
    pub target_bandwidth: Bandwidth,
    /// Current bandwidth differs from the target's configured value
    pub order_required: bool,
}

pub fn evaluate(
    current: &InventoryState,
    reach: &ReachabilityResult,
    bandwidth: &BandwidthConfig,
) -> Decision {
    let target = decide(current, reach);
    let target_bandwidth = bandwidth.value_for(target).clone();
    Decision {
        target,
        order_required: current.current_bandwidth != target_bandwidth,
        target_bandwidth,
    }
}
