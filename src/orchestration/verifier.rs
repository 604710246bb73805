//! # Order Verifier
//!
//! Polls a submitted order until the carrier reports a terminal state or the
//! wait budget runs out. Running out of time is an outcome
//! ([`OrderOutcome::TimedOut`]), not an error.

use crate::client::{OrderStatusClient, TokenSource};
use crate::error::{NaasError, NaasResult, OrderStatusError};
use crate::models::{OrderOutcome, OrderReference, ServiceDescriptor};
use crate::resilience::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct OrderVerifier {
    status: Arc<dyn OrderStatusClient>,
    tokens: Arc<dyn TokenSource>,
    poll_retry_attempts: u32,
    backoff: RetryPolicy,
}

impl OrderVerifier {
    pub fn new(
        status: Arc<dyn OrderStatusClient>,
        tokens: Arc<dyn TokenSource>,
        poll_retry_attempts: u32,
        backoff: RetryPolicy,
    ) -> Self {
        Self {
            status,
            tokens,
            poll_retry_attempts,
            backoff,
        }
    }

    /// Poll every `poll_interval` until terminal, or `TimedOut` after `max_wait`
    pub async fn await_terminal(
        &self,
        service: &ServiceDescriptor,
        reference: &OrderReference,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> NaasResult<OrderOutcome> {
        let deadline = Instant::now() + max_wait;
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            if let Some(outcome) = self.poll_once(service, reference).await? {
                if outcome.is_terminal() {
                    info!(
                        order_id = %reference.order_id,
                        outcome = %outcome,
                        polls,
                        "Order reached a terminal state"
                    );
                    return Ok(outcome);
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    order_id = %reference.order_id,
                    polls,
                    max_wait_secs = max_wait.as_secs(),
                    "Order did not reach a terminal state in time"
                );
                return Ok(OrderOutcome::TimedOut);
            }

            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// One poll, with bounded retries for transient failures and one token refresh on 401
    ///
    /// `None` means the poll produced no answer; the time still counts toward `max_wait`.
    async fn poll_once(
        &self,
        service: &ServiceDescriptor,
        reference: &OrderReference,
    ) -> NaasResult<Option<OrderOutcome>> {
        let mut token = match self.tokens.token().await {
            Ok(token) => token,
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Token unavailable for poll, counting toward max wait");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let mut refreshed = false;
        let mut transient_failures: u32 = 0;

        loop {
            match self.status.order_status(service, reference, &token).await {
                Ok(outcome) => {
                    debug!(order_id = %reference.order_id, outcome = %outcome, "Poll answered");
                    return Ok(Some(outcome));
                }
                Err(OrderStatusError::Unauthorized) if !refreshed => {
                    refreshed = true;
                    token = match self.tokens.refresh_rejected(&token).await {
                        Ok(fresh) => fresh,
                        Err(e) if e.is_transient() => {
                            warn!(error = %e, "Token refresh failed, counting toward max wait");
                            return Ok(None);
                        }
                        Err(e) => return Err(e.into()),
                    };
                }
                Err(e) if e.is_transient() && transient_failures < self.poll_retry_attempts => {
                    transient_failures += 1;
                    let delay = self.backoff.delay_for(transient_failures);
                    warn!(
                        order_id = %reference.order_id,
                        attempt = transient_failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient poll failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        order_id = %reference.order_id,
                        error = %e,
                        "Poll retries exhausted, counting toward max wait"
                    );
                    return Ok(None);
                }
                Err(e) => return Err(NaasError::from(e)),
            }
        }
    }
}
