use super::{
    errors::{StateMachineError, StateMachineResult},
    events::CheckEvent,
    states::CheckState,
};
use crate::logging::log_check_transition;
use crate::models::OrderOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One recorded state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: CheckState,
    pub to: CheckState,
    pub event: String,
    pub at: DateTime<Utc>,
}

/// In-memory lifecycle of one check run, with its transition history
#[derive(Debug, Clone)]
pub struct CheckStateMachine {
    run_id: String,
    service_id: String,
    current: CheckState,
    history: Vec<Transition>,
}

impl CheckStateMachine {
    pub fn new(run_id: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            service_id: service_id.into(),
            current: CheckState::default(),
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> CheckState {
        self.current
    }

    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    pub fn into_history(self) -> Vec<Transition> {
        self.history
    }

    /// Attempt to transition the run state
    pub fn transition(&mut self, event: CheckEvent) -> StateMachineResult<CheckState> {
        let from = self.current;
        let to = Self::determine_target_state(from, &event)?;

        log_check_transition(
            &self.run_id,
            &self.service_id,
            &from.to_string(),
            &to.to_string(),
            event.event_type(),
        );

        self.history.push(Transition {
            from,
            to,
            event: event.event_type().to_string(),
            at: Utc::now(),
        });
        self.current = to;
        Ok(to)
    }

    /// Determine the target state based on current state and event
    fn determine_target_state(
        current_state: CheckState,
        event: &CheckEvent,
    ) -> StateMachineResult<CheckState> {
        let target = match (current_state, event) {
            // Happy path
            (CheckState::Init, CheckEvent::TokenAcquired) => CheckState::Authenticated,
            (CheckState::Authenticated, CheckEvent::InventoryFetched) => CheckState::Inventoried,
            (CheckState::Inventoried, CheckEvent::ProbeCompleted) => CheckState::Probed,
            (CheckState::Probed, CheckEvent::DecisionMade) => CheckState::Decided,

            // Branch on whether an order is needed
            (CheckState::Decided, CheckEvent::SkipOrder) => CheckState::NoAction,
            (CheckState::Decided, CheckEvent::SubmissionStarted) => CheckState::Submitting,
            (CheckState::Submitting, CheckEvent::OrderSubmitted) => CheckState::Verifying,

            // Verification outcomes
            (CheckState::Verifying, CheckEvent::OrderResolved(OrderOutcome::Accepted)) => {
                CheckState::DoneAccepted
            }
            (CheckState::Verifying, CheckEvent::OrderResolved(OrderOutcome::Rejected)) => {
                CheckState::DoneRejected
            }
            (CheckState::Verifying, CheckEvent::OrderResolved(OrderOutcome::TimedOut)) => {
                CheckState::DoneTimeout
            }

            (state, CheckEvent::Finalize) if state.is_done() => CheckState::Terminal,

            // Failure is reachable from anywhere not yet finished
            (state, CheckEvent::Fail(_)) if !state.is_terminal() => CheckState::Failed,

            // Invalid transitions
            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: format!("{event:?}"),
                })
            }
        };

        Ok(target)
    }
}
