//! Reconciliation tests against the in-memory gateway.

use chrono::{TimeZone as _, Utc};

use crate::{
  consolidated::ConsolidatedContact,
  contact::{Contact, ContactId, LinkPrecedence, Signal},
  memory::MemoryGateway,
  reconcile::{cluster_of, reconcile},
  resolve::{resolve, ResolutionPlan},
  Error,
};

fn signal(phone: Option<&str>, email: Option<&str>) -> Signal {
  Signal::new(phone.map(str::to_owned), email.map(str::to_owned)).unwrap()
}

fn run(g: &mut MemoryGateway, phone: Option<&str>, email: Option<&str>) -> ConsolidatedContact {
  let view = reconcile(g, &signal(phone, email)).unwrap();
  assert_invariants(g);
  view
}

/// Every secondary points directly at a primary; no primary carries a link.
fn assert_invariants(g: &MemoryGateway) {
  for c in &g.contacts {
    match c.link_precedence {
      LinkPrecedence::Primary => assert_eq!(c.linked_id, None, "primary {} is linked", c.id),
      LinkPrecedence::Secondary => {
        let target = c.linked_id.expect("secondary without link");
        assert!(g.get(target).is_primary(), "{} points at non-primary {target}", c.id);
      }
    }
  }
}

fn seeded(id: ContactId, phone: Option<&str>, email: Option<&str>, linked_id: Option<ContactId>) -> Contact {
  let at = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
  Contact {
    id,
    phone_number: phone.map(str::to_owned),
    email: email.map(str::to_owned),
    linked_id,
    link_precedence: if linked_id.is_some() {
      LinkPrecedence::Secondary
    } else {
      LinkPrecedence::Primary
    },
    created_at: at,
    updated_at: at,
    deleted_at: None,
  }
}

// ─── New identities ──────────────────────────────────────────────────────────

#[test]
fn email_only_signal_on_empty_store_creates_primary() {
  let mut g = MemoryGateway::new();
  let view = run(&mut g, None, Some("a@x.com"));

  assert_eq!(g.contacts.len(), 1);
  assert!(g.contacts[0].is_primary());
  assert_eq!(view.primary_contact_id, g.contacts[0].id);
  assert_eq!(view.emails, vec!["a@x.com"]);
  assert!(view.phone_numbers.is_empty());
  assert!(view.secondary_contact_ids.is_empty());
}

#[test]
fn unrelated_signals_create_separate_primaries() {
  let mut g = MemoryGateway::new();
  run(&mut g, Some("1"), Some("a@x.com"));
  run(&mut g, Some("2"), Some("b@x.com"));
  assert_eq!(g.primaries().len(), 2);
}

#[test]
fn absent_values_never_match_each_other() {
  let mut g = MemoryGateway::new();
  run(&mut g, None, Some("a@x.com"));
  run(&mut g, None, Some("b@x.com"));
  assert_eq!(g.primaries().len(), 2);
}

// ─── Extending a cluster ─────────────────────────────────────────────────────

#[test]
fn new_email_for_known_phone_adds_secondary() {
  let mut g = MemoryGateway::new();
  let first = run(&mut g, Some("1"), Some("a@x.com"));
  let view = run(&mut g, Some("1"), Some("b@x.com"));

  assert_eq!(g.contacts.len(), 2);
  let secondary = &g.contacts[1];
  assert_eq!(secondary.link_precedence, LinkPrecedence::Secondary);
  assert_eq!(secondary.linked_id, Some(first.primary_contact_id));
  assert_eq!(secondary.email.as_deref(), Some("b@x.com"));

  assert_eq!(view.primary_contact_id, first.primary_contact_id);
  assert_eq!(view.emails, vec!["a@x.com", "b@x.com"]);
  assert_eq!(view.phone_numbers, vec!["1"]);
  assert_eq!(view.secondary_contact_ids, vec![secondary.id]);
}

#[test]
fn known_values_create_nothing() {
  let mut g = MemoryGateway::new();
  run(&mut g, Some("1"), Some("a@x.com"));
  run(&mut g, Some("1"), Some("b@x.com"));
  let before = g.contacts.clone();

  let a = run(&mut g, Some("1"), Some("b@x.com"));
  let b = run(&mut g, None, Some("b@x.com"));
  let c = run(&mut g, Some("1"), None);

  assert_eq!(g.contacts, before);
  assert_eq!(a, b);
  assert_eq!(b, c);
}

#[test]
fn values_known_to_secondaries_are_not_new() {
  let mut g = MemoryGateway::new();
  run(&mut g, Some("1"), Some("a@x.com"));
  run(&mut g, Some("2"), Some("a@x.com"));
  run(&mut g, Some("1"), Some("b@x.com"));
  let before = g.contacts.len();

  // Neither "2" nor "b@x.com" is new, although the pair was never seen.
  run(&mut g, Some("2"), Some("b@x.com"));
  assert_eq!(g.contacts.len(), before);
}

// ─── Merging clusters ────────────────────────────────────────────────────────

#[test]
fn bridging_signal_demotes_younger_primary() {
  let mut g = MemoryGateway::new();
  let p1 = run(&mut g, Some("1"), Some("a@x.com")).primary_contact_id;
  let p2 = run(&mut g, Some("2"), Some("b@x.com")).primary_contact_id;

  let view = run(&mut g, Some("1"), Some("b@x.com"));

  assert_eq!(g.contacts.len(), 2, "no new record for a fully known signal");
  assert_eq!(g.get(p2).linked_id, Some(p1));
  assert_eq!(g.get(p2).link_precedence, LinkPrecedence::Secondary);
  assert!(g.get(p2).updated_at >= g.get(p2).created_at);

  assert_eq!(view.primary_contact_id, p1);
  assert_eq!(view.secondary_contact_ids, vec![p2]);
  assert_eq!(view.emails, vec!["a@x.com", "b@x.com"]);
  assert_eq!(view.phone_numbers, vec!["1", "2"]);
}

#[test]
fn merge_direction_does_not_depend_on_which_value_matched() {
  let mut g = MemoryGateway::new();
  let p1 = run(&mut g, Some("1"), Some("a@x.com")).primary_contact_id;
  run(&mut g, Some("2"), Some("b@x.com"));

  let view = run(&mut g, Some("2"), Some("a@x.com"));
  assert_eq!(view.primary_contact_id, p1);
}

#[test]
fn merge_relinks_secondaries_of_demoted_primary() {
  let mut g = MemoryGateway::new();
  let p1 = run(&mut g, Some("1"), Some("a@x.com")).primary_contact_id;
  let p2 = run(&mut g, Some("2"), Some("b@x.com")).primary_contact_id;
  let s3 = run(&mut g, Some("2"), Some("c@x.com")).secondary_contact_ids[0];
  assert_eq!(g.get(s3).linked_id, Some(p2));

  let view = run(&mut g, Some("1"), Some("b@x.com"));

  assert_eq!(g.get(s3).linked_id, Some(p1));
  assert_eq!(view.secondary_contact_ids, vec![p2, s3]);
  assert_eq!(view.emails, vec!["a@x.com", "b@x.com", "c@x.com"]);
}

#[test]
fn signal_matching_only_secondaries_merges_their_clusters() {
  let mut g = MemoryGateway::new();
  let p1 = run(&mut g, Some("1"), Some("a@x.com")).primary_contact_id;
  run(&mut g, Some("1"), Some("b@x.com"));
  let p3 = run(&mut g, Some("3"), Some("c@x.com")).primary_contact_id;
  run(&mut g, Some("4"), Some("c@x.com"));

  // "4" belongs to a secondary of p3, "b@x.com" to a secondary of p1.
  let view = run(&mut g, Some("4"), Some("b@x.com"));

  assert_eq!(view.primary_contact_id, p1);
  assert_eq!(g.primaries().len(), 1);
  assert_eq!(g.get(p3).linked_id, Some(p1));
  assert_eq!(view.secondary_contact_ids.len(), 3);
  assert_eq!(g.contacts.len(), 4);
}

#[test]
fn signal_matching_one_secondary_resolves_its_primary() {
  let mut g = MemoryGateway::new();
  let p1 = run(&mut g, Some("1"), Some("a@x.com")).primary_contact_id;
  run(&mut g, Some("2"), Some("a@x.com"));

  let view = run(&mut g, Some("2"), None);
  assert_eq!(view.primary_contact_id, p1);
  assert_eq!(g.contacts.len(), 2);
}

#[test]
fn equal_timestamps_fall_back_to_lowest_id() {
  let mut g = MemoryGateway::new();
  g.contacts.push(seeded(2, None, Some("b@x.com"), None));
  g.contacts.push(seeded(1, Some("1"), None, None));

  let view = run(&mut g, Some("1"), Some("b@x.com"));
  assert_eq!(view.primary_contact_id, 1);
  assert_eq!(g.get(2).linked_id, Some(1));
}

#[test]
fn plan_is_complete_before_any_write() {
  let mut g = MemoryGateway::new();
  run(&mut g, Some("1"), Some("a@x.com"));
  run(&mut g, Some("2"), Some("b@x.com"));
  run(&mut g, Some("2"), Some("c@x.com"));

  let ResolutionPlan::Merge(plan) = resolve(&g, &signal(Some("1"), Some("d@x.com"))).unwrap()
  else {
    panic!("expected a merge plan");
  };
  assert!(plan.demotions.is_empty());
  assert!(plan.new_secondary.is_some());

  let ResolutionPlan::Merge(plan) = resolve(&g, &signal(Some("1"), Some("b@x.com"))).unwrap()
  else {
    panic!("expected a merge plan");
  };
  assert_eq!(plan.demotions.len(), 1);
  assert_eq!(plan.relinks.len(), 1);
  assert!(plan.new_secondary.is_none());
}

// ─── Link following ──────────────────────────────────────────────────────────

#[test]
fn legacy_chains_are_followed_and_flattened() {
  let mut g = MemoryGateway::new();
  g.contacts.push(seeded(1, Some("1"), None, None));
  g.contacts.push(seeded(2, Some("2"), None, Some(1)));
  g.contacts.push(seeded(3, Some("3"), None, Some(2)));

  let view = reconcile(&mut g, &signal(Some("3"), None)).unwrap();
  assert_invariants(&g);
  assert_eq!(g.contacts.len(), 3);
  assert_eq!(view.primary_contact_id, 1);
  assert_eq!(view.secondary_contact_ids, vec![2, 3]);
  assert_eq!(view.phone_numbers, vec!["1", "2", "3"]);
}

#[test]
fn matching_the_middle_of_a_chain_flattens_all_of_it() {
  let mut g = MemoryGateway::new();
  g.contacts.push(seeded(1, Some("1"), None, None));
  g.contacts.push(seeded(2, Some("2"), None, Some(1)));
  g.contacts.push(seeded(3, Some("3"), None, Some(2)));

  let ResolutionPlan::Merge(plan) = resolve(&g, &signal(Some("2"), None)).unwrap() else {
    panic!("expected a merge plan");
  };
  assert_eq!(plan.relinks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3]);

  let view = run(&mut g, Some("2"), None);
  assert_eq!(g.get(3).linked_id, Some(1));
  assert_eq!(view.secondary_contact_ids, vec![2, 3]);
  assert_eq!(view.phone_numbers, vec!["1", "2", "3"]);
}

#[test]
fn chains_below_a_demoted_primary_are_flattened() {
  let mut g = MemoryGateway::new();
  g.contacts.push(seeded(1, Some("1"), None, None));
  g.contacts.push(seeded(4, None, Some("b@x.com"), None));
  g.contacts.push(seeded(5, Some("5"), None, Some(4)));
  g.contacts.push(seeded(6, Some("6"), None, Some(5)));

  let view = run(&mut g, Some("1"), Some("b@x.com"));
  assert_eq!(view.primary_contact_id, 1);
  assert_eq!(view.secondary_contact_ids, vec![4, 5, 6]);
  for id in [4, 5, 6] {
    assert_eq!(g.get(id).linked_id, Some(1));
  }
  assert_eq!(g.contacts.len(), 4);
}

#[test]
fn cluster_of_sees_unflattened_chains() {
  let mut g = MemoryGateway::new();
  g.contacts.push(seeded(1, Some("1"), None, None));
  g.contacts.push(seeded(2, Some("2"), None, Some(1)));
  g.contacts.push(seeded(3, Some("3"), None, Some(2)));

  let view = cluster_of(&g, 3).unwrap().unwrap();
  assert_eq!(view.primary_contact_id, 1);
  assert_eq!(view.secondary_contact_ids, vec![2, 3]);
  assert_eq!(view, cluster_of(&g, 1).unwrap().unwrap());
}

#[test]
fn dangling_link_is_reported() {
  let mut g = MemoryGateway::new();
  g.contacts.push(seeded(1, Some("1"), None, Some(99)));

  let err = reconcile(&mut g, &signal(Some("1"), None)).unwrap_err();
  assert!(matches!(err, Error::BrokenLink { contact: 1, linked: Some(99) }));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[test]
fn cluster_of_any_member_is_the_same_view() {
  let mut g = MemoryGateway::new();
  let p1 = run(&mut g, Some("1"), Some("a@x.com")).primary_contact_id;
  let s2 = run(&mut g, Some("1"), Some("b@x.com")).secondary_contact_ids[0];

  let from_primary = cluster_of(&g, p1).unwrap().unwrap();
  let from_secondary = cluster_of(&g, s2).unwrap().unwrap();
  assert_eq!(from_primary, from_secondary);
  assert_eq!(from_primary, cluster_of(&g, p1).unwrap().unwrap());
  assert!(cluster_of(&g, 42).unwrap().is_none());
}

#[test]
fn single_primary_per_cluster_over_a_sequence() {
  let mut g = MemoryGateway::new();
  let steps: &[(Option<&str>, Option<&str>)] = &[
    (Some("1"), Some("a@x.com")),
    (Some("2"), Some("b@x.com")),
    (Some("3"), Some("c@x.com")),
    (Some("2"), Some("d@x.com")),
    (Some("4"), Some("c@x.com")),
    (Some("4"), Some("d@x.com")),
    (None, Some("e@x.com")),
    (Some("1"), Some("e@x.com")),
    (Some("3"), Some("a@x.com")),
    (Some("5"), None),
  ];
  for (phone, email) in steps {
    run(&mut g, *phone, *email);
  }

  // Everything except "5" is one cluster rooted at the first contact.
  let roots: Vec<ContactId> = g.primaries().iter().map(|c| c.id).collect();
  assert_eq!(roots.len(), 2);
  assert_eq!(roots[0], 1);
  let view = cluster_of(&g, 1).unwrap().unwrap();
  assert_eq!(view.emails, vec!["a@x.com", "b@x.com", "c@x.com", "d@x.com", "e@x.com"]);
}
