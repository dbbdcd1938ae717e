//! The consolidated view of a cluster, as returned to callers.

use serde::{Deserialize, Serialize};

use crate::{
  contact::{Contact, ContactId},
  gateway::ContactGateway,
  resolve::members_of,
};

/// Every phone, email and secondary id in one cluster, keyed by its primary.
///
/// Lists are deduplicated and ordered by first sight: the primary's values
/// come first, then secondaries in seniority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedContact {
  pub primary_contact_id:    ContactId,
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  pub secondary_contact_ids: Vec<ContactId>,
}

/// The response envelope: `{ "contact": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedContact,
}

impl From<ConsolidatedContact> for IdentifyResponse {
  fn from(contact: ConsolidatedContact) -> Self { Self { contact } }
}

/// Re-read every member below `primary` and build its consolidated view.
pub fn compose_cluster<G: ContactGateway>(
  gateway: &G,
  primary: &Contact,
) -> Result<ConsolidatedContact, G::Error> {
  let mut secondaries = members_of(gateway, primary)?;
  secondaries.sort_by_key(Contact::seniority);
  Ok(compose(primary, &secondaries))
}

/// Build the consolidated view from a primary and its full secondary set.
pub fn compose(primary: &Contact, secondaries: &[Contact]) -> ConsolidatedContact {
  let mut emails = Vec::new();
  let mut phone_numbers = Vec::new();
  let mut secondary_contact_ids = Vec::with_capacity(secondaries.len());

  for contact in std::iter::once(primary).chain(secondaries) {
    push_unique(&mut emails, contact.email.as_deref());
    push_unique(&mut phone_numbers, contact.phone_number.as_deref());
  }
  for contact in secondaries {
    if !secondary_contact_ids.contains(&contact.id) {
      secondary_contact_ids.push(contact.id);
    }
  }

  ConsolidatedContact {
    primary_contact_id: primary.id,
    emails,
    phone_numbers,
    secondary_contact_ids,
  }
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
  if let Some(v) = value
    && !values.iter().any(|existing| existing == v)
  {
    values.push(v.to_owned());
  }
}
