//! [`SqliteStore`]: the SQLite implementation of [`IdentityStore`].

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
  },
  time::Duration,
};

use rusqlite::{InterruptHandle, TransactionBehavior};

use kin_core::{
  consolidated::ConsolidatedContact,
  contact::{Contact, ContactId, Signal},
  gateway::ContactGateway as _,
  reconcile,
  store::IdentityStore,
};

use crate::{gateway::TxGateway, schema::SCHEMA, Error, Result};

// ─── Options ─────────────────────────────────────────────────────────────────

/// Retry and timeout policy for store operations.
#[derive(Debug, Clone)]
pub struct StoreOptions {
  /// Attempts per operation, including the first. At least one.
  pub max_attempts: u32,
  /// Delay before the first retry; doubled for each further retry.
  pub backoff:      Duration,
  /// Upper bound on a single attempt, measured from the async side.
  pub timeout:      Duration,
  /// How long SQLite itself waits on a locked database before reporting
  /// `SQLITE_BUSY`.
  pub busy_timeout: Duration,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      backoff:      Duration::from_millis(25),
      timeout:      Duration::from_secs(5),
      busy_timeout: Duration::from_millis(250),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kin identity store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  interrupt: Arc<InterruptHandle>,
  options:   StoreOptions,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with default options.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open_with(
    path: impl AsRef<Path>,
    options: StoreOptions,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, options).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, StoreOptions::default()).await
  }

  pub fn options(&self) -> &StoreOptions { &self.options }

  async fn init(
    conn: tokio_rusqlite::Connection,
    options: StoreOptions,
  ) -> Result<Self> {
    let busy_timeout = options.busy_timeout;
    let interrupt = conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn.get_interrupt_handle())
      })
      .await?;
    Ok(Self { conn, interrupt: Arc::new(interrupt), options })
  }

  /// Run `f` in a transaction, retrying transient failures from the start.
  async fn transact<T, F>(
    &self,
    op: &'static str,
    behavior: TransactionBehavior,
    f: F,
  ) -> Result<T>
  where
    F: FnOnce(&mut TxGateway<'_>) -> Result<T> + Clone + Send + 'static,
    T: Send + 'static,
  {
    let max_attempts = self.options.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match self.attempt(behavior, f.clone()).await {
        Ok(value) => return Ok(value),
        Err(e) if e.is_transient() && attempt < max_attempts => {
          let delay = self.options.backoff * 2u32.saturating_pow(attempt - 1);
          tracing::warn!(op, attempt, ?delay, error = %e, "transient store failure, retrying");
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) if e.is_transient() => {
          tracing::warn!(op, attempts = attempt, error = %e, "giving up");
          return Err(Error::Exhausted { attempts: attempt, source: Box::new(e) });
        }
        Err(e) => return Err(e),
      }
    }
  }

  /// One attempt: `BEGIN`, run `f`, `COMMIT`. Any error drops the
  /// transaction, which rolls it back.
  ///
  /// When the timeout fires before the attempt reaches `COMMIT`, the attempt
  /// is cancelled: a queued closure never starts, and a running one is
  /// interrupted and rolls back. Once `COMMIT` has begun the outcome is
  /// already decided, so the caller waits for it instead.
  async fn attempt<T, F>(&self, behavior: TransactionBehavior, f: F) -> Result<T>
  where
    F: FnOnce(&mut TxGateway<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let timeout = self.options.timeout;
    let state = Arc::new(AttemptState::default());
    let worker = Arc::clone(&state);

    let call = self.conn.call(move |conn| {
      if !worker.advance(QUEUED, RUNNING) {
        return Ok(Err(Error::Timeout(timeout)));
      }
      let result = run_in_transaction(conn, behavior, &worker, timeout, f);
      worker.0.store(DONE, Ordering::Release);
      Ok(result)
    });
    tokio::pin!(call);

    match tokio::time::timeout(timeout, &mut call).await {
      Ok(result) => result?,
      Err(_) => {
        if state.advance(QUEUED, CANCELLED) {
          return Err(Error::Timeout(timeout));
        }
        if state.advance(RUNNING, CANCELLED) {
          self.interrupt.interrupt();
          return Err(Error::Timeout(timeout));
        }
        call.await?
      }
    }
  }

  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn run_in_transaction<T>(
  conn: &mut rusqlite::Connection,
  behavior: TransactionBehavior,
  state: &AttemptState,
  timeout: Duration,
  f: impl FnOnce(&mut TxGateway<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction_with_behavior(behavior)?;
  let value = f(&mut TxGateway::new(&tx))?;
  if !state.advance(RUNNING, COMMITTING) {
    // The caller already gave up; dropping `tx` rolls back.
    return Err(Error::Timeout(timeout));
  }
  tx.commit()?;
  Ok(value)
}

// ─── Attempt state ───────────────────────────────────────────────────────────

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const COMMITTING: u8 = 2;
const CANCELLED: u8 = 3;
const DONE: u8 = 4;

/// Progress of one attempt, shared between the waiting caller and the
/// connection thread.
#[derive(Default)]
struct AttemptState(AtomicU8);

impl AttemptState {
  fn advance(&self, from: u8, to: u8) -> bool {
    self
      .0
      .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn reconcile(&self, signal: Signal) -> Result<ConsolidatedContact> {
    let view = self
      .transact("reconcile", TransactionBehavior::Immediate, move |gw| {
        reconcile::reconcile(gw, &signal)
      })
      .await?;
    tracing::debug!(
      primary_id = view.primary_contact_id,
      secondaries = view.secondary_contact_ids.len(),
      "reconciled"
    );
    Ok(view)
  }

  async fn get_contact(&self, id: ContactId) -> Result<Option<Contact>> {
    self
      .transact("get_contact", TransactionBehavior::Deferred, move |gw| {
        gw.find_by_id(id)
      })
      .await
  }

  async fn cluster_of(&self, id: ContactId) -> Result<Option<ConsolidatedContact>> {
    self
      .transact("cluster_of", TransactionBehavior::Deferred, move |gw| {
        reconcile::cluster_of(gw, id)
      })
      .await
  }

  async fn list_contacts(&self) -> Result<Vec<Contact>> {
    self
      .transact("list_contacts", TransactionBehavior::Deferred, |gw| gw.all())
      .await
  }
}
