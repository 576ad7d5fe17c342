//! `POST /cleanup` with body `{"action": "<action>", "confirm": true}`.

use std::sync::Arc;

use axum::{Json, extract::State};
use hangar_core::store::CollectionStore;
use hangar_engine::{CleanupAction, run_cleanup};
use serde::{Deserialize, Serialize};

use crate::{ApiError, Success, success};

#[derive(Debug, Deserialize)]
pub struct CleanupBody {
  pub action:  String,
  #[serde(default)]
  pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct CleanupResults {
  pub action:  CleanupAction,
  pub actions: Vec<String>,
}

pub async fn handler<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<CleanupBody>,
) -> Result<Json<Success<CleanupResults>>, ApiError> {
  let action = CleanupAction::authorize(&body.action, body.confirm)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let actions = run_cleanup(store.as_ref(), action)
    .await
    .map_err(ApiError::store)?;
  Ok(success(CleanupResults { action, actions }))
}
