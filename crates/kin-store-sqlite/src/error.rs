//! Error type for `kin-store-sqlite`.

use std::time::Duration;

use kin_core::{ErrorClass, StoreError};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kin_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown link precedence: {0:?}")]
  UnknownPrecedence(String),

  /// A single attempt exceeded the configured store timeout.
  #[error("store call timed out after {0:?}")]
  Timeout(Duration),

  /// Every retry hit a transient failure.
  #[error("gave up after {attempts} attempts: {source}")]
  Exhausted {
    attempts: u32,
    #[source]
    source:   Box<Error>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn is_transient(&self) -> bool { self.class() == ErrorClass::Transient }
}

impl StoreError for Error {
  fn class(&self) -> ErrorClass {
    match self {
      Self::Core(e) => e.class(),
      Self::Sqlite(e) | Self::Database(tokio_rusqlite::Error::Rusqlite(e)) => {
        sqlite_class(e)
      }
      Self::Timeout(_) | Self::Exhausted { .. } => ErrorClass::Transient,
      Self::Database(_) | Self::DateParse(_) | Self::UnknownPrecedence(_) => {
        ErrorClass::Failure
      }
    }
  }
}

/// Lock contention is worth retrying; everything else is not.
fn sqlite_class(e: &rusqlite::Error) -> ErrorClass {
  match e.sqlite_error_code() {
    Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
      ErrorClass::Transient
    }
    _ => ErrorClass::Failure,
  }
}
