//! Handlers for `/migrations/identifiers`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/migrations/identifiers` | 400 on a failed precondition, 409 while locked |
//! | `GET`  | `/migrations/identifiers/{old_id}` | 404 if the id was never migrated |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hangar_core::{migration::IdentifierMapping, store::CollectionStore};
use hangar_engine::{MigrationError, MigrationReport, mapping_for, migrate_identifiers};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiError, Success, success};

#[derive(Debug, Serialize)]
pub struct MigrationResults {
  pub results: MigrationReport,
}

/// `POST /migrations/identifiers`
pub async fn run<S: CollectionStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Success<MigrationResults>>, ApiError> {
  let results = migrate_identifiers(store.as_ref())
    .await
    .map_err(|e| match e {
      MigrationError::Locked => ApiError::Conflict(e.to_string()),
      MigrationError::Precondition(p) => ApiError::BadRequest(p.to_string()),
      MigrationError::Store(e) => ApiError::store(e),
    })?;
  Ok(success(MigrationResults { results }))
}

/// `GET /migrations/identifiers/{old_id}`
pub async fn mapping<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Path(old_id): Path<Uuid>,
) -> Result<Json<IdentifierMapping>, ApiError> {
  mapping_for(store.as_ref(), old_id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("no mapping for {old_id}")))
}
