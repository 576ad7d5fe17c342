//! `POST /references/{kind}/sync`: create missing reference entities from
//! the labels starships use.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hangar_core::{reference::ReferenceKind, store::CollectionStore};
use hangar_engine::{SyncSummary, sync_references};
use serde::Serialize;

use crate::{ApiError, Success, success};

#[derive(Debug, Serialize)]
pub struct SyncData {
  pub data: SyncSummary,
}

pub async fn sync<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Path(kind): Path<ReferenceKind>,
) -> Result<Json<Success<SyncData>>, ApiError> {
  let data = sync_references(store.as_ref(), kind)
    .await
    .map_err(ApiError::store)?;
  Ok(success(SyncData { data }))
}
