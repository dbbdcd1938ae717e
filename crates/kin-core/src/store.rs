//! The `IdentityStore` trait: the async surface consumed by the API layer.
//!
//! Implemented by storage backends (e.g. `kin-store-sqlite`). Each backend
//! decides how to run [`crate::reconcile::reconcile`] inside a single
//! serialisable transaction and how to retry contention.

use std::future::Future;

use crate::{
  consolidated::ConsolidatedContact,
  contact::{Contact, ContactId, Signal},
  error::StoreError,
};

/// Abstraction over an identity store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IdentityStore: Send + Sync {
  type Error: StoreError;

  /// Fold `signal` into the identity graph and return the consolidated view
  /// of the resulting cluster. Either every write commits or none does.
  fn reconcile(
    &self,
    signal: Signal,
  ) -> impl Future<Output = Result<ConsolidatedContact, Self::Error>> + Send + '_;

  /// Retrieve a single contact. Returns `None` if not found.
  fn get_contact(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// The consolidated view of the cluster containing `id`, whether `id` is a
  /// primary or a secondary. Performs no writes.
  fn cluster_of(
    &self,
    id: ContactId,
  ) -> impl Future<Output = Result<Option<ConsolidatedContact>, Self::Error>>
  + Send
  + '_;

  /// Every stored contact, ordered by id.
  fn list_contacts(
    &self,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;
}
