//! Contact records: the unit of stored identity.
//!
//! A contact is one observed `(phone, email)` fact. Contacts are grouped into
//! clusters: exactly one primary per cluster, every other member a secondary
//! whose `linked_id` points directly at that primary.

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Store-assigned identifier; monotonically increasing.
pub type ContactId = i64;

/// The current wall-clock time at the precision the store persists.
pub fn timestamp() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact is the canonical representative of its cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// A stored contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub phone_number:    Option<String>,
  pub email:           Option<String>,
  /// Set only on secondaries; always the id of the cluster's primary.
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  /// Immutable; the precedence tie-break key.
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Soft-delete marker. Carried through storage, ignored by reconciliation.
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// Ordering key for precedence disputes: earliest `created_at`, then
  /// lowest `id`.
  pub fn seniority(&self) -> (DateTime<Utc>, ContactId) {
    (self.created_at, self.id)
  }

  /// Point this contact at `primary_id` as a secondary.
  pub fn link_to(&mut self, primary_id: ContactId, at: DateTime<Utc>) {
    self.link_precedence = LinkPrecedence::Secondary;
    self.linked_id = Some(primary_id);
    self.updated_at = at;
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::gateway::ContactGateway::insert`]. The id and timestamps
/// are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub phone_number:    Option<String>,
  pub email:           Option<String>,
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
}

impl NewContact {
  /// A contact that starts a new cluster.
  pub fn primary(signal: &Signal) -> Self {
    Self {
      phone_number:    signal.phone_number.clone(),
      email:           signal.email.clone(),
      linked_id:       None,
      link_precedence: LinkPrecedence::Primary,
    }
  }

  /// A contact that adds new information to the cluster owned by
  /// `primary_id`.
  pub fn secondary(signal: &Signal, primary_id: ContactId) -> Self {
    Self {
      phone_number:    signal.phone_number.clone(),
      email:           signal.email.clone(),
      linked_id:       Some(primary_id),
      link_precedence: LinkPrecedence::Secondary,
    }
  }
}

// ─── Signal ──────────────────────────────────────────────────────────────────

/// A validated incoming observation. At least one value is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
  phone_number: Option<String>,
  email:        Option<String>,
}

impl Signal {
  /// Build a signal, treating empty strings as absent.
  ///
  /// Fails with [`Error::Validation`] when neither value remains.
  pub fn new(phone_number: Option<String>, email: Option<String>) -> Result<Self> {
    let phone_number = phone_number.filter(|p| !p.is_empty());
    let email = email.filter(|e| !e.is_empty());

    if phone_number.is_none() && email.is_none() {
      return Err(Error::Validation(
        "at least one of phoneNumber or email must be provided".into(),
      ));
    }

    Ok(Self { phone_number, email })
  }

  pub fn phone_number(&self) -> Option<&str> { self.phone_number.as_deref() }

  pub fn email(&self) -> Option<&str> { self.email.as_deref() }
}
