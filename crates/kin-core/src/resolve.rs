//! Cluster resolution: decides what a signal does to the identity graph.
//!
//! Resolution only reads. It produces a [`ResolutionPlan`] which
//! [`crate::merge::apply`] later writes in the same transaction, so the
//! decision is always made against the state it is applied to.

use std::collections::{HashSet, VecDeque};

use crate::{
  contact::{Contact, NewContact, Signal},
  gateway::ContactGateway,
  Error,
};

/// Maximum number of `linked_id` hops followed when looking for a root.
const MAX_LINK_DEPTH: usize = 64;

// ─── Plan ────────────────────────────────────────────────────────────────────

/// The outcome of resolving a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPlan {
  /// Nothing matched; the signal starts a new cluster.
  CreatePrimary(NewContact),
  /// The signal belongs to (and possibly joins) existing clusters.
  Merge(MergePlan),
}

/// State transitions for a signal that matched stored contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
  /// The most senior primary among all matched clusters.
  pub primary:       Contact,
  /// Other primaries to turn into secondaries of `primary`, most senior
  /// first.
  pub demotions:     Vec<Contact>,
  /// Secondaries to re-point at `primary`.
  pub relinks:       Vec<Contact>,
  /// A secondary carrying values the merged cluster has not seen yet.
  pub new_secondary: Option<NewContact>,
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve `signal` against the contacts visible through `gateway`.
pub fn resolve<G: ContactGateway>(
  gateway: &G,
  signal: &Signal,
) -> Result<ResolutionPlan, G::Error> {
  let phone = signal.phone_number();
  let email = signal.email();

  let matches = gateway.find_by_exact_match(phone, email)?;
  if matches.is_empty() {
    return Ok(ResolutionPlan::CreatePrimary(NewContact::primary(signal)));
  }

  // Each matched contact nominates the primary of its own cluster.
  let mut contenders: Vec<Contact> = Vec::new();
  for contact in &matches {
    let root = if contact.is_primary() {
      contact.clone()
    } else {
      root_of(gateway, contact)?
    };
    if !contenders.iter().any(|c| c.id == root.id) {
      contenders.push(root);
    }
  }

  let (primary, demotions) = elect(contenders);

  // Everything below the winner or a demoted root that does not already
  // point straight at the winner. Catches chains left by older data.
  let mut members = members_of(gateway, &primary)?;
  for demoted in &demotions {
    members.extend(members_of(gateway, demoted)?);
  }
  let relinks: Vec<Contact> = members
    .iter()
    .filter(|c| c.linked_id != Some(primary.id))
    .cloned()
    .collect();

  let new_secondary = if gateway.find_by_exact_pair(phone, email)?.is_some() {
    None
  } else {
    members.push(primary.clone());
    members.extend(demotions.iter().cloned());

    carries_new_information(signal, &members)
      .then(|| NewContact::secondary(signal, primary.id))
  };

  Ok(ResolutionPlan::Merge(MergePlan {
    primary,
    demotions,
    relinks,
    new_secondary,
  }))
}

/// Follow `linked_id` from `contact` until a primary is reached.
pub fn root_of<G: ContactGateway>(
  gateway: &G,
  contact: &Contact,
) -> Result<Contact, G::Error> {
  let mut current = contact.clone();
  for _ in 0..MAX_LINK_DEPTH {
    if current.is_primary() {
      return Ok(current);
    }
    let linked = current.linked_id.ok_or(Error::BrokenLink {
      contact: current.id,
      linked:  None,
    })?;
    current = gateway.find_by_id(linked)?.ok_or(Error::BrokenLink {
      contact: current.id,
      linked:  Some(linked),
    })?;
  }
  Err(
    Error::BrokenLink {
      contact: contact.id,
      linked:  contact.linked_id,
    }
    .into(),
  )
}

/// Every contact that reaches `root` through `linked_id`, at any depth,
/// breadth-first.
pub fn members_of<G: ContactGateway>(
  gateway: &G,
  root: &Contact,
) -> Result<Vec<Contact>, G::Error> {
  let mut seen = HashSet::from([root.id]);
  let mut queue = VecDeque::from([root.id]);
  let mut members = Vec::new();
  while let Some(id) = queue.pop_front() {
    for child in gateway.find_by_linked_id(id)? {
      if seen.insert(child.id) {
        queue.push_back(child.id);
        members.push(child);
      }
    }
  }
  Ok(members)
}

/// Split `contenders` into the most senior primary and everyone else, the
/// rest ordered by seniority.
///
/// Panics if `contenders` is empty; callers always pass at least one.
fn elect(mut contenders: Vec<Contact>) -> (Contact, Vec<Contact>) {
  contenders.sort_by_key(Contact::seniority);
  let rest = contenders.split_off(1);
  let primary = contenders.remove(0);
  (primary, rest)
}

/// Whether `signal` carries a phone or email absent from every contact in
/// `members`.
fn carries_new_information(signal: &Signal, members: &[Contact]) -> bool {
  let phones: HashSet<&str> = members
    .iter()
    .filter_map(|c| c.phone_number.as_deref())
    .collect();
  let emails: HashSet<&str> =
    members.iter().filter_map(|c| c.email.as_deref()).collect();

  signal.phone_number().is_some_and(|p| !phones.contains(p))
    || signal.email().is_some_and(|e| !emails.contains(e))
}
