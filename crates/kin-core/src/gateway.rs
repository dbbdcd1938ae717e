//! The `ContactGateway` trait: the read/write operations reconciliation
//! needs from persistent storage.
//!
//! A gateway value represents one open transaction. Everything done through
//! it commits or rolls back together; the backend decides where that
//! boundary sits (see `kin-store-sqlite`).

use crate::contact::{Contact, ContactId, NewContact};

/// Synchronous access to contact records inside a transaction.
///
/// Matching is exact equality between two present values: an absent input
/// never matches anything in [`find_by_exact_match`](Self::find_by_exact_match).
pub trait ContactGateway {
  type Error: std::error::Error + From<crate::Error>;

  /// Every contact whose phone equals `phone` or whose email equals `email`.
  fn find_by_exact_match(
    &self,
    phone: Option<&str>,
    email: Option<&str>,
  ) -> Result<Vec<Contact>, Self::Error>;

  fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, Self::Error>;

  /// Every contact whose `linked_id` is `id`.
  fn find_by_linked_id(&self, id: ContactId) -> Result<Vec<Contact>, Self::Error>;

  /// A contact storing exactly this pair. Unlike
  /// [`find_by_exact_match`](Self::find_by_exact_match), an absent value
  /// matches an absent stored value here.
  fn find_by_exact_pair(
    &self,
    phone: Option<&str>,
    email: Option<&str>,
  ) -> Result<Option<Contact>, Self::Error>;

  /// Persist a new contact, assigning its id and timestamps.
  fn insert(&mut self, contact: NewContact) -> Result<Contact, Self::Error>;

  /// Persist the mutable fields (`linked_id`, `link_precedence`,
  /// `updated_at`) of an existing contact.
  fn update(&mut self, contact: &Contact) -> Result<(), Self::Error>;
}
