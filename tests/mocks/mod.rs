//! Trait-object doubles for the orchestrator's collaborators
//!
//! Each mock keeps its script and call log in an `Arc<Mutex<_>>` so tests can
//! hold a clone and inspect it after the run.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use naas_checker::client::{InventoryClient, OrderStatusClient, OrderSubmitter, TokenSource};
use naas_checker::error::{AuthError, InventoryError, OrderStatusError, OrderSubmissionError};
use naas_checker::models::{
    AccessToken, BandwidthTarget, ChangeOrder, InventoryState, OrderOutcome, OrderReference,
    ReachabilityResult, ServiceDescriptor, SubmittedOrder,
};
use naas_checker::orchestration::{CancellationHandle, CheckerDependencies};
use naas_checker::probe::ReachabilityProbe;
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::common;

// =============================================================================
// Token source
// =============================================================================

#[derive(Debug, Default)]
pub struct MockTokenState {
    pub token_calls: u32,
    pub refresh_calls: u32,
    pub generation: u32,
    pub failures: VecDeque<AuthError>,
    pub refresh_failures: VecDeque<AuthError>,
}

#[derive(Clone, Default)]
pub struct MockTokenSource {
    pub state: Arc<Mutex<MockTokenState>>,
}

impl MockTokenSource {
    pub fn failing_with(errors: Vec<AuthError>) -> Self {
        let source = Self::default();
        source.state.lock().unwrap().failures = errors.into();
        source
    }

    pub fn failing_refresh_with(errors: Vec<AuthError>) -> Self {
        let source = Self::default();
        source.state.lock().unwrap().refresh_failures = errors.into();
        source
    }

    fn current(generation: u32) -> AccessToken {
        AccessToken::new(
            format!("token-{generation}"),
            Utc::now() + ChronoDuration::hours(1),
        )
    }
}

#[async_trait]
impl TokenSource for MockTokenSource {
    async fn token(&self) -> Result<AccessToken, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.token_calls += 1;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        Ok(Self::current(state.generation))
    }

    async fn refresh_rejected(&self, _stale: &AccessToken) -> Result<AccessToken, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.refresh_calls += 1;
        if let Some(error) = state.refresh_failures.pop_front() {
            return Err(error);
        }
        state.generation += 1;
        Ok(Self::current(state.generation))
    }
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug)]
pub struct MockInventoryState {
    pub calls: u32,
    pub tokens_seen: Vec<String>,
    pub script: VecDeque<Result<InventoryState, InventoryError>>,
    pub fallback: Result<InventoryState, InventoryError>,
}

#[derive(Clone)]
pub struct MockInventory {
    pub state: Arc<Mutex<MockInventoryState>>,
}

impl MockInventory {
    pub fn at(bandwidth: &str) -> Self {
        Self::with_fallback(Ok(common::inventory_at(bandwidth)))
    }

    pub fn with_fallback(fallback: Result<InventoryState, InventoryError>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockInventoryState {
                calls: 0,
                tokens_seen: Vec::new(),
                script: VecDeque::new(),
                fallback,
            })),
        }
    }

    /// Answers returned before falling back
    pub fn scripted(self, script: Vec<Result<InventoryState, InventoryError>>) -> Self {
        self.state.lock().unwrap().script = script.into();
        self
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl InventoryClient for MockInventory {
    async fn fetch_state(
        &self,
        _service: &ServiceDescriptor,
        token: &AccessToken,
    ) -> Result<InventoryState, InventoryError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.tokens_seen.push(token.value().to_string());
        match state.script.pop_front() {
            Some(answer) => answer,
            None => state.fallback.clone(),
        }
    }
}

// =============================================================================
// Probe
// =============================================================================

#[derive(Clone)]
pub struct MockProbe {
    pub reachable: bool,
    pub calls: Arc<Mutex<u32>>,
}

impl MockProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ReachabilityProbe for MockProbe {
    async fn probe(&self, address: IpAddr, _timeout: Duration) -> ReachabilityResult {
        *self.calls.lock().unwrap() += 1;
        if self.reachable {
            ReachabilityResult::reachable(address, address.to_string())
        } else {
            ReachabilityResult::unreachable(address, "timeout")
        }
    }
}

// =============================================================================
// Ordering
// =============================================================================

pub struct MockOrderingState {
    pub submissions: Vec<ChangeOrder>,
    pub submit_script: VecDeque<Result<(), OrderSubmissionError>>,
    /// Report the carrier already held the order
    pub duplicate: bool,
    pub status_calls: u32,
    pub status_script: VecDeque<Result<OrderOutcome, OrderStatusError>>,
    pub status_fallback: OrderOutcome,
    /// Raised once the order is submitted, to cancel mid-run
    pub cancel_on_submit: Option<Arc<CancellationHandle>>,
}

#[derive(Clone)]
pub struct MockOrdering {
    pub state: Arc<Mutex<MockOrderingState>>,
}

impl MockOrdering {
    pub fn resolving_to(outcome: OrderOutcome) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockOrderingState {
                submissions: Vec::new(),
                submit_script: VecDeque::new(),
                duplicate: false,
                status_calls: 0,
                status_script: VecDeque::new(),
                status_fallback: outcome,
                cancel_on_submit: None,
            })),
        }
    }

    pub fn duplicate(self) -> Self {
        self.state.lock().unwrap().duplicate = true;
        self
    }

    pub fn submit_script(self, script: Vec<Result<(), OrderSubmissionError>>) -> Self {
        self.state.lock().unwrap().submit_script = script.into();
        self
    }

    pub fn status_script(self, script: Vec<Result<OrderOutcome, OrderStatusError>>) -> Self {
        self.state.lock().unwrap().status_script = script.into();
        self
    }

    pub fn cancel_on_submit(self, handle: Arc<CancellationHandle>) -> Self {
        self.state.lock().unwrap().cancel_on_submit = Some(handle);
        self
    }

    pub fn submission_attempts(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    pub fn status_calls(&self) -> u32 {
        self.state.lock().unwrap().status_calls
    }
}

#[async_trait]
impl OrderSubmitter for MockOrdering {
    async fn submit(
        &self,
        service: &ServiceDescriptor,
        _inventory: &InventoryState,
        target: BandwidthTarget,
        _token: &AccessToken,
    ) -> Result<SubmittedOrder, OrderSubmissionError> {
        let mut state = self.state.lock().unwrap();
        let bandwidth = common::bandwidth_config().value_for(target).clone();
        let order = ChangeOrder::new("NAAS", service, target, bandwidth, common::contact())
            .with_quote("Q-1");
        state.submissions.push(order.clone());

        if let Some(Err(error)) = state.submit_script.pop_front() {
            return Err(error);
        }
        if let Some(handle) = &state.cancel_on_submit {
            handle.cancel();
        }

        let reference = OrderReference {
            order_id: if state.duplicate {
                "ORD-EXISTING".into()
            } else {
                format!("ORD-{}", state.submissions.len())
            },
            external_id: order.external_id.clone(),
            duplicate: state.duplicate,
        };
        Ok(SubmittedOrder { order, reference })
    }
}

#[async_trait]
impl OrderStatusClient for MockOrdering {
    async fn order_status(
        &self,
        _service: &ServiceDescriptor,
        _reference: &OrderReference,
        _token: &AccessToken,
    ) -> Result<OrderOutcome, OrderStatusError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        match state.status_script.pop_front() {
            Some(answer) => answer,
            None => Ok(state.status_fallback),
        }
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub struct Mocks {
    pub tokens: MockTokenSource,
    pub inventory: MockInventory,
    pub probe: MockProbe,
    pub ordering: MockOrdering,
}

impl Mocks {
    pub fn new(inventory: MockInventory, reachable: bool, ordering: MockOrdering) -> Self {
        Self {
            tokens: MockTokenSource::default(),
            inventory,
            probe: MockProbe::new(reachable),
            ordering,
        }
    }

    pub fn dependencies(&self) -> CheckerDependencies {
        CheckerDependencies {
            tokens: Arc::new(self.tokens.clone()),
            inventory: Arc::new(self.inventory.clone()),
            probe: Arc::new(self.probe.clone()),
            submitter: Arc::new(self.ordering.clone()),
            status: Arc::new(self.ordering.clone()),
        }
    }
}
