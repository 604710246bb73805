use naas_checker::config::{BandwidthConfig, RetryConfig};
use naas_checker::models::{
    Bandwidth, BandwidthTarget, ChangeOrder, InventoryState, ReachabilityResult,
};
use naas_checker::orchestration::evaluate;
use naas_checker::resilience::RetryPolicy;
use proptest::prelude::*;
use std::time::Duration;

fn unit_strategy() -> impl Strategy<Value = (&'static str, u64)> {
    prop_oneof![
        Just(("kbps", 1)),
        Just((" Kbps", 1)),
        Just(("Mbps", 1_000)),
        Just((" mbps", 1_000)),
        Just(("Mb/s", 1_000)),
        Just((" Gbps", 1_000_000)),
        Just(("G", 1_000_000)),
        Just(("", 1_000)),
    ]
}

fn tiers() -> BandwidthConfig {
    BandwidthConfig {
        full: "1 Gbps".parse().unwrap(),
        heartbeat: "1 Mbps".parse().unwrap(),
    }
}

fn inventory(bandwidth: Bandwidth) -> InventoryState {
    InventoryState {
        service_id: "SVC-42".into(),
        current_bandwidth: bandwidth,
        status: "active".into(),
        billing_account: None,
        master_site_id: None,
    }
}

proptest! {
    /// Property: a whole-number bandwidth normalizes to value times unit scale
    #[test]
    fn bandwidth_normalizes_to_kbps(value in 1u64..100_000, (unit, scale) in unit_strategy()) {
        let text = format!("{value}{unit}");
        let parsed: Bandwidth = text.parse().unwrap();
        prop_assert_eq!(parsed.kbps(), value * scale);
        prop_assert_eq!(parsed.raw(), text.trim());
    }

    /// Property: spelling does not affect equality
    #[test]
    fn bandwidth_equality_ignores_spelling(value in 1u64..10_000) {
        let mbps: Bandwidth = format!("{value} Mbps").parse().unwrap();
        let kbps: Bandwidth = format!("{} kbps", value * 1_000).parse().unwrap();
        prop_assert_eq!(mbps, kbps);
    }

    /// Property: the external id depends only on prefix, service and target
    #[test]
    fn external_id_is_deterministic(
        prefix in "[A-Z]{2,6}",
        service_id in "[A-Z0-9-]{1,20}",
        full in any::<bool>(),
    ) {
        let target = if full { BandwidthTarget::Full } else { BandwidthTarget::Heartbeat };
        let first = ChangeOrder::external_id_for(&prefix, &service_id, target);
        let second = ChangeOrder::external_id_for(&prefix, &service_id, target);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, format!("{prefix}-{service_id}-{}", target.as_str()));
    }

    /// Property: an order is required exactly when current bandwidth differs from the target tier
    #[test]
    fn order_required_iff_bandwidth_differs(current_mbps in 1u64..2_000, reachable in any::<bool>()) {
        let current: Bandwidth = format!("{current_mbps} Mbps").parse().unwrap();
        let ip = "203.0.113.10".parse().unwrap();
        let reach = if reachable {
            ReachabilityResult::reachable(ip, "203.0.113.10")
        } else {
            ReachabilityResult::unreachable(ip, "timeout")
        };

        let decision = evaluate(&inventory(current.clone()), &reach, &tiers());
        let expected_target = if reachable { BandwidthTarget::Full } else { BandwidthTarget::Heartbeat };
        prop_assert_eq!(decision.target, expected_target);
        prop_assert_eq!(decision.order_required, current != decision.target_bandwidth);
    }

    /// Property: retry delays never exceed the configured cap
    #[test]
    fn retry_delay_is_capped(
        attempt in 1u32..40,
        base in 1u64..5_000,
        cap in 1u64..60_000,
        jitter in 0.0f64..1.0,
    ) {
        let policy = RetryPolicy::from(&RetryConfig {
            max_attempts: 10,
            base_delay_ms: base,
            max_delay_ms: cap,
            backoff_multiplier: 2.0,
            jitter_factor: jitter,
        });
        prop_assert!(policy.delay_for(attempt) <= Duration::from_millis(cap));
    }
}
