//! # Carrier API Clients
//!
//! One trait per external dependency of a check run, each with an HTTP
//! implementation over a shared [`CarrierHttpClient`]. The orchestrator only
//! sees the traits, so tests substitute in-memory doubles.

pub mod auth;
pub mod http;
pub mod inventory;
pub mod ordering;

pub use auth::{OAuthTokenProvider, TokenSource};
pub use http::{ApiFailure, CarrierHttpClient};
pub use inventory::{HttpInventoryClient, InventoryClient};
pub use ordering::{HttpOrderingClient, OrderSettings, OrderStatusClient, OrderSubmitter};
