//! Merge execution: writes a [`ResolutionPlan`] through a gateway.
//!
//! The caller owns the transaction. If any write fails the error is returned
//! immediately and the caller must roll back; no partial plan is ever
//! committed.

use crate::{
  contact::{timestamp, Contact, ContactId},
  gateway::ContactGateway,
  resolve::ResolutionPlan,
};

/// What applying a plan changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
  /// The authoritative primary after the merge.
  pub primary:  Contact,
  /// Id of the contact inserted by this plan, if any.
  pub created:  Option<ContactId>,
  pub demoted:  Vec<ContactId>,
  pub relinked: Vec<ContactId>,
}

/// Apply `plan`: demotions first, then relinks, then the optional insert.
pub fn apply<G: ContactGateway>(
  gateway: &mut G,
  plan: ResolutionPlan,
) -> Result<MergeOutcome, G::Error> {
  let plan = match plan {
    ResolutionPlan::CreatePrimary(new) => {
      let primary = gateway.insert(new)?;
      tracing::info!(primary_id = primary.id, "created new identity");
      return Ok(MergeOutcome {
        created: Some(primary.id),
        primary,
        demoted: Vec::new(),
        relinked: Vec::new(),
      });
    }
    ResolutionPlan::Merge(plan) => plan,
  };

  let primary_id = plan.primary.id;
  let now = timestamp();

  let mut demoted = Vec::with_capacity(plan.demotions.len());
  for mut contact in plan.demotions {
    contact.link_to(primary_id, now);
    gateway.update(&contact)?;
    demoted.push(contact.id);
  }

  let mut relinked = Vec::with_capacity(plan.relinks.len());
  for mut contact in plan.relinks {
    contact.link_to(primary_id, now);
    gateway.update(&contact)?;
    relinked.push(contact.id);
  }

  let created = match plan.new_secondary {
    Some(new) => Some(gateway.insert(new)?.id),
    None => None,
  };

  if !demoted.is_empty() {
    tracing::info!(primary_id, ?demoted, ?relinked, "merged clusters");
  }
  if let Some(id) = created {
    tracing::debug!(primary_id, secondary_id = id, "recorded new secondary");
  }

  Ok(MergeOutcome {
    primary: plan.primary,
    created,
    demoted,
    relinked,
  })
}
