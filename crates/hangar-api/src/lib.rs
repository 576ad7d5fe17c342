//! JSON REST API for Hangar.
//!
//! Exposes an axum [`Router`] backed by any
//! [`hangar_core::store::CollectionStore`]. Auth, TLS, body limits and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hangar_api::api_router(store.clone()))
//! ```

pub mod cleanup;
pub mod editions;
pub mod error;
pub mod import;
pub mod migrations;
pub mod orphans;
pub mod references;

use std::sync::Arc;

use axum::{
  Json,
  Router,
  routing::{get, post},
};
use hangar_core::store::CollectionStore;
use serde::Serialize;

pub use error::ApiError;

/// Successful response envelope: `{"success": true, ...body}`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
  pub success: bool,
  #[serde(flatten)]
  pub body:    T,
}

pub(crate) fn success<T: Serialize>(body: T) -> Json<Success<T>> {
  Json(Success { success: true, body })
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CollectionStore + 'static,
{
  Router::new()
    // Import
    .route("/import", post(import::handler::<S>))
    // Identifier migration
    .route("/migrations/identifiers", post(migrations::run::<S>))
    .route("/migrations/identifiers/{old_id}", get(migrations::mapping::<S>))
    // Orphans and cleanup
    .route("/orphans", get(orphans::report::<S>))
    .route("/cleanup", post(cleanup::handler::<S>))
    // Editions
    .route("/editions", post(editions::create::<S>))
    .route("/editions/import", post(editions::import::<S>))
    .route("/editions/{id}/template.csv", get(editions::template::<S>))
    // Reference tables
    .route("/references/{kind}/sync", post(references::sync::<S>))
    .with_state(store)
}
