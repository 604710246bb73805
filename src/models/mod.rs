//! # Data Model
//!
//! Values exchanged between the check components. Everything here is plain
//! data; behaviour lives in the clients and the orchestrator.

pub mod bandwidth;
pub mod credentials;
pub mod order;
pub mod service;

pub use bandwidth::{Bandwidth, BandwidthParseError};
pub use credentials::{AccessToken, Credentials, Secret};
pub use order::{
    BandwidthTarget, ChangeOrder, ContactBlock, OrderOutcome, OrderReference, SubmittedOrder,
};
pub use service::{BillingAccount, InventoryState, ReachabilityResult, ServiceDescriptor};
