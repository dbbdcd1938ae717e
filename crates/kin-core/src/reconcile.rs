//! Reconciliation: resolve, apply, and read back, all through one gateway.

use crate::{
  consolidated::{compose_cluster, ConsolidatedContact},
  contact::{ContactId, Signal},
  gateway::ContactGateway,
  merge::apply,
  resolve::{resolve, root_of},
};

/// Reconcile `signal` against the store behind `gateway`.
///
/// Must run inside a single transaction: the plan is computed from the same
/// snapshot it is written to, and the response reflects the committed state.
pub fn reconcile<G: ContactGateway>(
  gateway: &mut G,
  signal: &Signal,
) -> Result<ConsolidatedContact, G::Error> {
  let plan = resolve(gateway, signal)?;
  tracing::debug!(?plan, "resolved signal");
  let outcome = apply(gateway, plan)?;
  compose_cluster(gateway, &outcome.primary)
}

/// The consolidated view of the cluster containing contact `id`, or `None`
/// if no such contact exists.
pub fn cluster_of<G: ContactGateway>(
  gateway: &G,
  id: ContactId,
) -> Result<Option<ConsolidatedContact>, G::Error> {
  let Some(contact) = gateway.find_by_id(id)? else {
    return Ok(None);
  };
  let primary = root_of(gateway, &contact)?;
  compose_cluster(gateway, &primary).map(Some)
}
