//! `GET /orphans`: read-only orphan report across every reference table.

use std::sync::Arc;

use axum::{Json, extract::State};
use hangar_core::store::CollectionStore;
use hangar_engine::{OrphanReport, find_orphans};

use crate::{ApiError, Success, success};

pub async fn report<S: CollectionStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Success<OrphanReport>>, ApiError> {
  let report = find_orphans(store.as_ref()).await.map_err(ApiError::store)?;
  Ok(success(report))
}
