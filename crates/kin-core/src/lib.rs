//! Core types and reconciliation logic for the Kin identity store.
//!
//! No HTTP or database code lives here. Reconciliation runs over a
//! [`gateway::ContactGateway`] (one open transaction); backends expose the
//! result through the async [`store::IdentityStore`].

pub mod consolidated;
pub mod contact;
pub mod error;
pub mod gateway;
pub mod merge;
pub mod reconcile;
pub mod resolve;
pub mod store;

pub use error::{Error, ErrorClass, Result, StoreError};

#[cfg(test)]
mod memory;
#[cfg(test)]
mod tests;
