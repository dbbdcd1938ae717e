//! Error types for `kin-core`.

use thiserror::Error;

use crate::contact::ContactId;

#[derive(Debug, Error)]
pub enum Error {
  /// The caller supplied a signal the reconciler cannot act on.
  #[error("validation error: {0}")]
  Validation(String),

  #[error("contact not found: {0}")]
  ContactNotFound(ContactId),

  /// A secondary whose `linked_id` does not lead to a primary.
  #[error("contact {contact} has a broken link (linked to {linked:?})")]
  BrokenLink {
    contact: ContactId,
    linked:  Option<ContactId>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// How a failure should be handled at the caller boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// The input was wrong; never retried.
  Validation,
  /// Lock contention or a timeout; safe to retry from the read step.
  Transient,
  /// Anything else: constraint violations, corrupt rows, an unreachable store.
  Failure,
}

/// Implemented by backend error types so that higher layers can map failures
/// without depending on a concrete backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn class(&self) -> ErrorClass;
}

impl StoreError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Validation(_) => ErrorClass::Validation,
      Self::ContactNotFound(_) | Self::BrokenLink { .. } => ErrorClass::Failure,
    }
  }
}
