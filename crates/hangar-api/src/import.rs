//! `POST /import?filename=<name>[&edition_id=<uuid>][&franchise=<name>]`
//!
//! The request body is the raw uploaded file; its format is chosen by the
//! filename's extension.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use bytes::Bytes;
use hangar_core::store::CollectionStore;
use hangar_engine::{ImportError, ImportSummary, import_context, import_file};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, Success, success};

#[derive(Debug, Deserialize)]
pub struct ImportParams {
  pub filename:   Option<String>,
  pub edition_id: Option<Uuid>,
  pub franchise:  Option<String>,
}

pub async fn handler<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ImportParams>,
  body: Bytes,
) -> Result<Json<Success<ImportSummary>>, ApiError> {
  let Some(filename) = params.filename.filter(|f| !f.trim().is_empty()) else {
    return Err(ApiError::BadRequest("No file uploaded".into()));
  };
  if body.is_empty() {
    return Err(ApiError::BadRequest("No file uploaded".into()));
  }

  let context = import_context(store.as_ref(), params.edition_id, params.franchise)
    .await
    .map_err(|e| match e {
      ImportError::Ingest(e) => e.into(),
      ImportError::EditionNotFound(id) => {
        ApiError::NotFound(format!("edition not found: {id}"))
      }
      ImportError::Store(e) => ApiError::store(e),
    })?;

  let summary = import_file(store.as_ref(), &filename, &body, &context).await?;
  Ok(success(summary))
}
