//! # Resilience Module
//!
//! Retry with bounded exponential backoff and jitter, applied uniformly by the
//! orchestrator to every state that talks to the carrier.
//!
//! ## Usage
//!
//! ```rust
//! use naas_checker::config::RetryConfig;
//! use naas_checker::error::{InventoryError, NaasError};
//! use naas_checker::resilience::RetryPolicy;
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::from(&RetryConfig {
//!     base_delay_ms: 1,
//!     jitter_factor: 0.0,
//!     ..RetryConfig::default()
//! });
//! let answer = policy
//!     .execute("example", |attempt| async move {
//!         if attempt < 2 {
//!             Err(NaasError::from(InventoryError::Transient("HTTP 503".into())))
//!         } else {
//!             Ok(42)
//!         }
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(answer, 42);
//! # });
//! ```

pub mod retry;

pub use retry::RetryPolicy;
