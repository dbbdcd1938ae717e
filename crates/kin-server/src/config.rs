//! Runtime server configuration, deserialised from `config.toml` and `KIN_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use kin_store_sqlite::StoreOptions;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Attempts per store operation, including the first.
  pub max_attempts:     u32,
  pub retry_backoff_ms: u64,
  pub store_timeout_ms: u64,
  pub busy_timeout_ms:  u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let store = StoreOptions::default();
    Self {
      host:             "127.0.0.1".into(),
      port:             3000,
      store_path:       PathBuf::from("kin.db"),
      max_attempts:     store.max_attempts,
      retry_backoff_ms: store.backoff.as_millis() as u64,
      store_timeout_ms: store.timeout.as_millis() as u64,
      busy_timeout_ms:  store.busy_timeout.as_millis() as u64,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The store path with a leading `~/` expanded to `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn store_options(&self) -> StoreOptions {
    StoreOptions {
      max_attempts: self.max_attempts.max(1),
      backoff:      Duration::from_millis(self.retry_backoff_ms),
      timeout:      Duration::from_millis(self.store_timeout_ms),
      busy_timeout: Duration::from_millis(self.busy_timeout_ms),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
