// State machine for a single check run
//
// INIT → AUTHENTICATED → INVENTORIED → PROBED → DECIDED → {NO_ACTION | SUBMITTING →
// VERIFYING → DONE_*} → TERMINAL, with FAILED reachable from any unfinished state.

pub mod check_state_machine;
pub mod errors;
pub mod events;
pub mod states;

// Re-export main types for convenient access
pub use check_state_machine::{CheckStateMachine, Transition};
pub use errors::{StateMachineError, StateMachineResult};
pub use events::CheckEvent;
pub use states::CheckState;
