//! [`TxGateway`]: the SQLite implementation of [`ContactGateway`].

use kin_core::{
  contact::{timestamp, Contact, ContactId, NewContact},
  gateway::ContactGateway,
};

use crate::{
  encode::{encode_dt, encode_precedence, RawContact, CONTACT_COLUMNS},
  Error, Result,
};

/// Gateway over a connection that is already inside a transaction.
///
/// Only constructed by [`crate::SqliteStore`], which owns the
/// `BEGIN`/`COMMIT` boundary around it.
pub struct TxGateway<'a> {
  conn: &'a rusqlite::Connection,
}

impl<'a> TxGateway<'a> {
  pub(crate) fn new(conn: &'a rusqlite::Connection) -> Self { Self { conn } }

  fn query(
    &self,
    filter: &str,
    params: impl rusqlite::Params,
  ) -> Result<Vec<Contact>> {
    let sql = format!("SELECT {CONTACT_COLUMNS} FROM contact {filter}");
    let mut stmt = self.conn.prepare_cached(&sql)?;
    let raws = stmt
      .query_map(params, RawContact::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawContact::into_contact).collect()
  }

  /// Every stored contact, ordered by id.
  pub fn all(&self) -> Result<Vec<Contact>> {
    self.query("ORDER BY id", [])
  }
}

impl ContactGateway for TxGateway<'_> {
  type Error = Error;

  fn find_by_exact_match(
    &self,
    phone: Option<&str>,
    email: Option<&str>,
  ) -> Result<Vec<Contact>> {
    // `NULL = x` is never true, so an absent input matches nothing.
    self.query(
      "WHERE phone_number = ?1 OR email = ?2 ORDER BY created_at, id",
      rusqlite::params![phone, email],
    )
  }

  fn find_by_id(&self, id: ContactId) -> Result<Option<Contact>> {
    Ok(
      self
        .query("WHERE id = ?1", rusqlite::params![id])?
        .into_iter()
        .next(),
    )
  }

  fn find_by_linked_id(&self, id: ContactId) -> Result<Vec<Contact>> {
    self.query(
      "WHERE linked_id = ?1 ORDER BY created_at, id",
      rusqlite::params![id],
    )
  }

  fn find_by_exact_pair(
    &self,
    phone: Option<&str>,
    email: Option<&str>,
  ) -> Result<Option<Contact>> {
    Ok(
      self
        .query(
          "WHERE phone_number IS ?1 AND email IS ?2 ORDER BY id LIMIT 1",
          rusqlite::params![phone, email],
        )?
        .into_iter()
        .next(),
    )
  }

  fn insert(&mut self, new: NewContact) -> Result<Contact> {
    let at = timestamp();
    let at_str = encode_dt(at);

    self.conn.execute(
      "INSERT INTO contact (
         phone_number, email, linked_id, link_precedence, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
      rusqlite::params![
        new.phone_number,
        new.email,
        new.linked_id,
        encode_precedence(new.link_precedence),
        at_str,
      ],
    )?;

    Ok(Contact {
      id:              self.conn.last_insert_rowid(),
      phone_number:    new.phone_number,
      email:           new.email,
      linked_id:       new.linked_id,
      link_precedence: new.link_precedence,
      created_at:      at,
      updated_at:      at,
      deleted_at:      None,
    })
  }

  fn update(&mut self, contact: &Contact) -> Result<()> {
    let changed = self.conn.execute(
      "UPDATE contact
          SET linked_id = ?2, link_precedence = ?3, updated_at = ?4
        WHERE id = ?1",
      rusqlite::params![
        contact.id,
        contact.linked_id,
        encode_precedence(contact.link_precedence),
        encode_dt(contact.updated_at),
      ],
    )?;

    if changed == 0 {
      return Err(kin_core::Error::ContactNotFound(contact.id).into());
    }
    Ok(())
  }
}
