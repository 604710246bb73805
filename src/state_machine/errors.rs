use thiserror::Error;

pub type StateMachineResult<T> = Result<T, StateMachineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("invalid transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}
