//! JSON REST API for Kin.
//!
//! Exposes an axum [`Router`] backed by any [`kin_core::store::IdentityStore`].
//! CORS, tracing middleware, and transport concerns are the caller's
//! responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/identify` | Reconcile a `(phoneNumber, email)` signal; 201 |
//! | `GET`  | `/contacts/{id}` | Consolidated view of the cluster containing `id` |

pub mod contacts;
pub mod error;
pub mod identify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kin_core::store::IdentityStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IdentityStore + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/contacts/{id}", get(contacts::get_one::<S>))
    .with_state(store)
}
