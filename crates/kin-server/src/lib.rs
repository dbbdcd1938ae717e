//! Wiring for the Kin identity server: configuration and the top-level
//! router.

pub mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use axum::Router;
use kin_store_sqlite::SqliteStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the served application: the API router plus tracing and CORS
/// middleware.
pub fn app(store: SqliteStore) -> Router {
  kin_api::api_router(Arc::new(store))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}
