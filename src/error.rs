//! # Error Types
//!
//! Component-level errors for each stage of a check run, and the crate-level
//! [`NaasError`] the orchestrator works with.
//!
//! Every error answers two questions the orchestrator cares about:
//!
//! - [`NaasError::is_transient`]: may the same state be retried after a backoff?
//! - [`NaasError::is_unauthorized`]: did the carrier reject the bearer token?
//!
//! Nothing else about an error influences control flow.

use crate::config::ConfigurationError;
use thiserror::Error;

/// Result alias used across the crate
pub type NaasResult<T> = std::result::Result<T, NaasError>;

/// OAuth client-credentials exchange failures
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token endpoint answered with a non-success status
    #[error("token endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The token endpoint answered 2xx but the payload was unusable
    #[error("malformed token response: {0}")]
    Malformed(String),

    /// The exchange never got an HTTP answer
    #[error("token request failed: {0}")]
    Transport(String),
}

impl AuthError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::Malformed(_) => false,
        }
    }
}

/// Inventory lookup failures
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// Network failure, 5xx or rate limiting
    #[error("transient inventory failure: {0}")]
    Transient(String),

    /// 4xx (other than 401), unknown service, or unusable payload
    #[error("permanent inventory failure: {0}")]
    Permanent(String),

    /// The carrier rejected the bearer token
    #[error("inventory request unauthorized")]
    Unauthorized,
}

/// Price request and order submission failures
#[derive(Debug, Clone, Error)]
pub enum OrderSubmissionError {
    /// The carrier refused the order (invalid contact block, currency mismatch, ...)
    #[error("order rejected by carrier (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The order could not be built or the carrier's answer could not be understood
    #[error("malformed order exchange: {0}")]
    Malformed(String),

    /// Network failure or 5xx; resubmission is safe because the external id is deterministic
    #[error("transient order submission failure: {0}")]
    Transient(String),

    /// The carrier rejected the bearer token
    #[error("order submission unauthorized")]
    Unauthorized,
}

/// Order status polling failures
#[derive(Debug, Clone, Error)]
pub enum OrderStatusError {
    #[error("transient order status failure: {0}")]
    Transient(String),

    #[error("permanent order status failure: {0}")]
    Permanent(String),

    #[error("order status request unauthorized")]
    Unauthorized,
}

impl OrderStatusError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Crate-level error carried through the check workflow
#[derive(Debug, Error)]
pub enum NaasError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("inventory lookup failed: {0}")]
    Inventory(#[from] InventoryError),

    #[error("order submission failed: {0}")]
    OrderSubmission(#[from] OrderSubmissionError),

    #[error("order verification failed: {0}")]
    OrderStatus(#[from] OrderStatusError),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetryExhausted { attempts: u32, last: Box<NaasError> },

    #[error("check cancelled before entering {state}")]
    Cancelled { state: String },

    /// A bug in the workflow itself, such as an illegal state transition
    #[error("internal error: {0}")]
    Internal(String),
}

impl NaasError {
    /// Whether the operation that produced this error may be retried as-is
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Auth(e) => e.is_transient(),
            Self::Inventory(InventoryError::Transient(_)) => true,
            Self::OrderSubmission(OrderSubmissionError::Transient(_)) => true,
            Self::OrderStatus(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether the carrier rejected the bearer token
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Inventory(InventoryError::Unauthorized)
                | Self::OrderSubmission(OrderSubmissionError::Unauthorized)
                | Self::OrderStatus(OrderStatusError::Unauthorized)
        )
    }

    /// Short machine-readable category for reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_error",
            Self::Inventory(_) => "inventory_error",
            Self::OrderSubmission(_) => "order_submission_error",
            Self::OrderStatus(_) => "order_status_error",
            Self::Configuration(_) => "configuration_error",
            Self::RetryExhausted { last, .. } => last.kind(),
            Self::Cancelled { .. } => "cancelled",
            Self::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transience_classification() {
        assert!(NaasError::from(InventoryError::Transient("503".into())).is_transient());
        assert!(!NaasError::from(InventoryError::Permanent("404".into())).is_transient());
        assert!(!NaasError::from(InventoryError::Unauthorized).is_transient());
        assert!(NaasError::from(AuthError::Transport("reset".into())).is_transient());
        assert!(!NaasError::from(AuthError::Rejected {
            status: 400,
            body: "invalid_client".into()
        })
        .is_transient());
        assert!(NaasError::from(AuthError::Rejected {
            status: 503,
            body: String::new()
        })
        .is_transient());
        assert!(!NaasError::from(OrderSubmissionError::Rejected {
            status: 422,
            reason: "currency mismatch".into()
        })
        .is_transient());
    }

    #[test]
    fn test_unauthorized_detection() {
        assert!(NaasError::from(InventoryError::Unauthorized).is_unauthorized());
        assert!(NaasError::from(OrderStatusError::Unauthorized).is_unauthorized());
        assert!(!NaasError::from(OrderStatusError::Transient("timeout".into())).is_unauthorized());
    }

    #[test]
    fn test_retry_exhausted_reports_underlying_kind() {
        let error = NaasError::RetryExhausted {
            attempts: 3,
            last: Box::new(InventoryError::Transient("502".into()).into()),
        };
        assert_eq!(error.kind(), "inventory_error");
        assert!(!error.is_transient());
        assert!(error.to_string().contains("3 attempts"));
    }
}
