//! In-memory [`ContactGateway`] used by the reconciliation tests.

use chrono::{DateTime, Duration, TimeZone as _, Utc};

use crate::{
  contact::{Contact, ContactId, NewContact},
  gateway::ContactGateway,
  Error,
};

/// A vector-backed gateway with a deterministic clock: every insert is one
/// second younger than the previous one.
pub struct MemoryGateway {
  pub contacts: Vec<Contact>,
  clock:        DateTime<Utc>,
}

impl MemoryGateway {
  pub fn new() -> Self {
    Self {
      contacts: Vec::new(),
      clock:    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
  }

  fn tick(&mut self) -> DateTime<Utc> {
    self.clock += Duration::seconds(1);
    self.clock
  }

  pub fn get(&self, id: ContactId) -> &Contact {
    self.contacts.iter().find(|c| c.id == id).unwrap()
  }

  pub fn primaries(&self) -> Vec<&Contact> {
    self.contacts.iter().filter(|c| c.is_primary()).collect()
  }
}

fn eq(stored: Option<&String>, wanted: Option<&str>) -> bool {
  matches!((stored, wanted), (Some(s), Some(w)) if s == w)
}

impl ContactGateway for MemoryGateway {
  type Error = Error;

  fn find_by_exact_match(
    &self,
    phone: Option<&str>,
    email: Option<&str>,
  ) -> Result<Vec<Contact>, Error> {
    Ok(
      self
        .contacts
        .iter()
        .filter(|c| {
          eq(c.phone_number.as_ref(), phone) || eq(c.email.as_ref(), email)
        })
        .cloned()
        .collect(),
    )
  }

  fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>, Error> {
    Ok(self.contacts.iter().find(|c| c.id == id).cloned())
  }

  fn find_by_linked_id(&self, id: ContactId) -> Result<Vec<Contact>, Error> {
    Ok(
      self
        .contacts
        .iter()
        .filter(|c| c.linked_id == Some(id))
        .cloned()
        .collect(),
    )
  }

  fn find_by_exact_pair(
    &self,
    phone: Option<&str>,
    email: Option<&str>,
  ) -> Result<Option<Contact>, Error> {
    Ok(
      self
        .contacts
        .iter()
        .find(|c| c.phone_number.as_deref() == phone && c.email.as_deref() == email)
        .cloned(),
    )
  }

  fn insert(&mut self, new: NewContact) -> Result<Contact, Error> {
    let at = self.tick();
    let contact = Contact {
      id:              self.contacts.len() as ContactId + 1,
      phone_number:    new.phone_number,
      email:           new.email,
      linked_id:       new.linked_id,
      link_precedence: new.link_precedence,
      created_at:      at,
      updated_at:      at,
      deleted_at:      None,
    };
    self.contacts.push(contact.clone());
    Ok(contact)
  }

  fn update(&mut self, contact: &Contact) -> Result<(), Error> {
    let stored = self
      .contacts
      .iter_mut()
      .find(|c| c.id == contact.id)
      .ok_or(Error::ContactNotFound(contact.id))?;
    stored.linked_id = contact.linked_id;
    stored.link_precedence = contact.link_precedence;
    stored.updated_at = contact.updated_at;
    Ok(())
  }
}
