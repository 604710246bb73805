//! # Checker Orchestrator
//!
//! Drives one check run through the state machine and is the single place
//! where errors become a report. Transient failures retry the same state under
//! the [`RetryPolicy`]; a 401 gets one token refresh per attempt; anything
//! permanent moves the run to FAILED with the state and cause recorded.

use super::cancellation::CancellationSignal;
use super::decision;
use super::types::{CheckResult, RunError};
use super::verifier::OrderVerifier;
use crate::client::{
    CarrierHttpClient, HttpInventoryClient, HttpOrderingClient, InventoryClient,
    OAuthTokenProvider, OrderSettings, OrderStatusClient, OrderSubmitter, TokenSource,
};
use crate::config::{BandwidthConfig, CheckerConfig, ConfigurationError};
use crate::error::{NaasError, NaasResult};
use crate::logging::{log_decision, log_error};
use crate::models::{AccessToken, OrderOutcome, ServiceDescriptor};
use crate::probe::{probe_from_config, ReachabilityProbe};
use crate::resilience::RetryPolicy;
use crate::state_machine::{CheckEvent, CheckState, CheckStateMachine};
use chrono::Utc;
use futures::future::join_all;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The external collaborators of a check run
#[derive(Clone)]
pub struct CheckerDependencies {
    pub tokens: Arc<dyn TokenSource>,
    pub inventory: Arc<dyn InventoryClient>,
    pub probe: Arc<dyn ReachabilityProbe>,
    pub submitter: Arc<dyn OrderSubmitter>,
    pub status: Arc<dyn OrderStatusClient>,
}

/// Per-run tunables taken from configuration
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub lumen_ip: IpAddr,
    pub bandwidth: BandwidthConfig,
    pub probe_timeout: Duration,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub poll_retry_attempts: u32,
    pub dry_run: bool,
}

impl RunSettings {
    pub fn from_config(config: &CheckerConfig) -> Self {
        Self {
            lumen_ip: config.lumen_ip,
            bandwidth: config.bandwidth.clone(),
            probe_timeout: config.probe.timeout(),
            poll_interval: config.verifier.poll_interval(),
            max_wait: config.verifier.max_wait(),
            poll_retry_attempts: config.verifier.poll_retry_attempts,
            dry_run: false,
        }
    }
}

pub struct CheckerOrchestrator {
    tokens: Arc<dyn TokenSource>,
    inventory: Arc<dyn InventoryClient>,
    probe: Arc<dyn ReachabilityProbe>,
    submitter: Arc<dyn OrderSubmitter>,
    verifier: OrderVerifier,
    retry: RetryPolicy,
    settings: RunSettings,
}

impl CheckerOrchestrator {
    pub fn new(deps: CheckerDependencies, settings: RunSettings, retry: RetryPolicy) -> Self {
        let verifier = OrderVerifier::new(
            deps.status,
            Arc::clone(&deps.tokens),
            settings.poll_retry_attempts,
            retry.clone(),
        );
        Self {
            tokens: deps.tokens,
            inventory: deps.inventory,
            probe: deps.probe,
            submitter: deps.submitter,
            verifier,
            retry,
            settings,
        }
    }

    /// Wire the HTTP implementations from a validated configuration
    pub fn from_config(config: &CheckerConfig) -> Result<Self, ConfigurationError> {
        let http = CarrierHttpClient::new(&config.api)?;
        let tokens = Arc::new(OAuthTokenProvider::new(
            http.clone(),
            config.credentials.clone(),
            config.api.token_path.clone(),
            &config.auth,
        ));
        let ordering = Arc::new(HttpOrderingClient::new(
            http.clone(),
            OrderSettings::from_config(config),
        ));

        let deps = CheckerDependencies {
            tokens,
            inventory: Arc::new(HttpInventoryClient::new(http, config.api.inventory_path.clone())),
            probe: probe_from_config(&config.probe)?,
            submitter: ordering.clone(),
            status: ordering,
        };

        Ok(Self::new(
            deps,
            RunSettings::from_config(config),
            RetryPolicy::from(&config.retry),
        ))
    }

    /// Record the tier decision without submitting orders
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.settings.dry_run = dry_run;
        self
    }

    /// Run checks for several services concurrently, sharing one token source
    pub async fn run_many(
        &self,
        services: &[ServiceDescriptor],
        cancel: &CancellationSignal,
    ) -> Vec<CheckResult> {
        join_all(services.iter().map(|service| self.run(service, cancel))).await
    }

    /// Run one check to completion; never returns an error
    pub async fn run(&self, service: &ServiceDescriptor, cancel: &CancellationSignal) -> CheckResult {
        let mut result = CheckResult::started(&service.service_id, self.settings.dry_run);
        let mut machine = CheckStateMachine::new(result.run_id.to_string(), &service.service_id);

        info!(
            run_id = %result.run_id,
            service_id = %service.service_id,
            dry_run = self.settings.dry_run,
            "Starting bandwidth check"
        );

        if let Err(error) = self.drive(service, cancel, &mut machine, &mut result).await {
            let state = machine.current_state();
            log_error(
                "checker",
                &state.to_string(),
                &error.to_string(),
                Some(&service.service_id),
            );
            result.error = Some(RunError {
                state,
                kind: error.kind().to_string(),
                message: error.to_string(),
            });
            if let Err(e) = machine.transition(CheckEvent::Fail(error.to_string())) {
                warn!(error = %e, "Could not record failure transition");
            }
        }

        result.final_state = machine.current_state();
        result.transitions = machine.into_history();
        result.finished_at = Utc::now();

        info!(
            run_id = %result.run_id,
            service_id = %result.service_id,
            final_state = %result.final_state,
            order_outcome = ?result.order_outcome,
            duration_ms = result.duration_ms(),
            "Bandwidth check finished"
        );
        result
    }

    async fn drive(
        &self,
        service: &ServiceDescriptor,
        cancel: &CancellationSignal,
        machine: &mut CheckStateMachine,
        result: &mut CheckResult,
    ) -> NaasResult<()> {
        Self::checkpoint(cancel, CheckState::Authenticated)?;
        let tokens = &self.tokens;
        self.retry
            .execute("authenticate", move |_| async move {
                tokens.token().await.map_err(NaasError::from)
            })
            .await?;
        Self::advance(machine, CheckEvent::TokenAcquired)?;

        Self::checkpoint(cancel, CheckState::Inventoried)?;
        let inventory_client = &self.inventory;
        let inventory = self
            .authorized("inventory", move |token: AccessToken| async move {
                inventory_client
                    .fetch_state(service, &token)
                    .await
                    .map_err(NaasError::from)
            })
            .await?;
        result.previous_bandwidth = Some(inventory.current_bandwidth.raw().to_string());
        Self::advance(machine, CheckEvent::InventoryFetched)?;

        Self::checkpoint(cancel, CheckState::Probed)?;
        let reach = self
            .probe
            .probe(self.settings.lumen_ip, self.settings.probe_timeout)
            .await;
        result.reachability = Some(reach.clone());
        Self::advance(machine, CheckEvent::ProbeCompleted)?;

        Self::checkpoint(cancel, CheckState::Decided)?;
        let decision = decision::evaluate(&inventory, &reach, &self.settings.bandwidth);
        log_decision(
            &service.service_id,
            reach.reachable,
            decision.target.as_str(),
            inventory.current_bandwidth.raw(),
            decision.target_bandwidth.raw(),
            decision.order_required,
        );
        result.target = Some(decision.target);
        result.target_bandwidth = Some(decision.target_bandwidth.raw().to_string());
        result.decision_made = decision.order_required;
        Self::advance(machine, CheckEvent::DecisionMade)?;

        if !decision.order_required || self.settings.dry_run {
            if decision.order_required {
                info!(
                    service_id = %service.service_id,
                    target = %decision.target,
                    "Dry run: change order not submitted"
                );
            }
            Self::advance(machine, CheckEvent::SkipOrder)?;
            Self::advance(machine, CheckEvent::Finalize)?;
            return Ok(());
        }

        Self::checkpoint(cancel, CheckState::Submitting)?;
        Self::advance(machine, CheckEvent::SubmissionStarted)?;
        let submitter = &self.submitter;
        let target = decision.target;
        let inventory_ref = &inventory;
        let submitted = self
            .authorized("submit", move |token: AccessToken| async move {
                submitter
                    .submit(service, inventory_ref, target, &token)
                    .await
                    .map_err(NaasError::from)
            })
            .await?;
        result.order = Some(submitted.reference.clone());
        Self::advance(machine, CheckEvent::OrderSubmitted)?;

        // The reference is on record; cancellation may now take effect
        Self::checkpoint(cancel, CheckState::Verifying)?;
        let outcome = tokio::select! {
            outcome = self.verifier.await_terminal(
                service,
                &submitted.reference,
                self.settings.poll_interval,
                self.settings.max_wait,
            ) => outcome?,
            _ = cancel.cancelled() => {
                return Err(NaasError::Cancelled { state: CheckState::Verifying.to_string() });
            }
        };
        result.order_outcome = Some(outcome);

        let event = match outcome {
            OrderOutcome::Pending => CheckEvent::OrderResolved(OrderOutcome::TimedOut),
            terminal => CheckEvent::OrderResolved(terminal),
        };
        Self::advance(machine, event)?;
        Self::advance(machine, CheckEvent::Finalize)?;
        Ok(())
    }

    /// Retry `call` under the policy, refreshing the token once per attempt on 401
    async fn authorized<T, F, Fut>(&self, operation: &str, call: F) -> NaasResult<T>
    where
        F: Fn(AccessToken) -> Fut,
        Fut: Future<Output = NaasResult<T>>,
    {
        let call = &call;
        let tokens = &self.tokens;
        self.retry
            .execute(operation, move |_| async move {
                let token = tokens.token().await?;
                match call(token.clone()).await {
                    Err(error) if error.is_unauthorized() => {
                        warn!(operation = %operation, "Carrier rejected token, refreshing once");
                        let fresh = tokens.refresh_rejected(&token).await?;
                        call(fresh).await
                    }
                    other => other,
                }
            })
            .await
    }

    fn checkpoint(cancel: &CancellationSignal, next: CheckState) -> NaasResult<()> {
        if cancel.is_cancelled() {
            return Err(NaasError::Cancelled {
                state: next.to_string(),
            });
        }
        Ok(())
    }

    fn advance(machine: &mut CheckStateMachine, event: CheckEvent) -> NaasResult<CheckState> {
        machine.transition(event).map_err(|e| NaasError::Internal(e.to_string()))
    }
}
