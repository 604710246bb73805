use serde::{Deserialize, Serialize};
use std::fmt;

/// States of a single check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckState {
    /// Nothing done yet
    #[default]
    Init,
    /// Bearer token obtained
    Authenticated,
    /// Current service state read from inventory
    Inventoried,
    /// Reachability of the target address known
    Probed,
    /// Target tier chosen
    Decided,
    /// Current bandwidth already matches the target, or dry run
    NoAction,
    /// Quote and change order in flight
    Submitting,
    /// Polling the submitted order
    Verifying,
    DoneAccepted,
    DoneRejected,
    DoneTimeout,
    /// Run finished with a report
    Terminal,
    /// Run aborted on a permanent error or exhausted retries
    Failed,
}

impl CheckState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal | Self::Failed)
    }

    /// Check if this is a successful final state
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Terminal)
    }

    /// Check if the run has an order outcome waiting to be finalized
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            Self::NoAction | Self::DoneAccepted | Self::DoneRejected | Self::DoneTimeout
        )
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::Authenticated => write!(f, "AUTHENTICATED"),
            Self::Inventoried => write!(f, "INVENTORIED"),
            Self::Probed => write!(f, "PROBED"),
            Self::Decided => write!(f, "DECIDED"),
            Self::NoAction => write!(f, "NO_ACTION"),
            Self::Submitting => write!(f, "SUBMITTING"),
            Self::Verifying => write!(f, "VERIFYING"),
            Self::DoneAccepted => write!(f, "DONE_ACCEPTED"),
            Self::DoneRejected => write!(f, "DONE_REJECTED"),
            Self::DoneTimeout => write!(f, "DONE_TIMEOUT"),
            Self::Terminal => write!(f, "TERMINAL"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for CheckState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INIT" => Ok(Self::Init),
            "AUTHENTICATED" => Ok(Self::Authenticated),
            "INVENTORIED" => Ok(Self::Inventoried),
            "PROBED" => Ok(Self::Probed),
            "DECIDED" => Ok(Self::Decided),
            "NO_ACTION" => Ok(Self::NoAction),
            "SUBMITTING" => Ok(Self::Submitting),
            "VERIFYING" => Ok(Self::Verifying),
            "DONE_ACCEPTED" => Ok(Self::DoneAccepted),
            "DONE_REJECTED" => Ok(Self::DoneRejected),
            "DONE_TIMEOUT" => Ok(Self::DoneTimeout),
            "TERMINAL" => Ok(Self::Terminal),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Invalid check state: {s}")),
        }
    }
}
