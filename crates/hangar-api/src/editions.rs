//! Handlers for `/editions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/editions` | Body: `NewEdition`; 409 on a duplicate name or internal name |
//! | `POST` | `/editions/import` | `?franchise=<name>[&is_default=true]`, raw CSV body |
//! | `GET`  | `/editions/{id}/template.csv` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use hangar_core::{reference::NewEdition, store::CollectionStore};
use hangar_engine::{EditionImportSummary, create_edition, import_editions};
use hangar_ingest::encode_template;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, Success, success};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /editions`
pub async fn create<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewEdition>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() || body.franchise.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "Edition name and franchise are required".into(),
    ));
  }
  let edition = create_edition(store.as_ref(), body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(edition)))
}

// ─── Import ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ImportParams {
  pub franchise:  Option<String>,
  #[serde(default)]
  pub is_default: bool,
}

/// `POST /editions/import?franchise=<name>`
pub async fn import<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Query(params): Query<ImportParams>,
  body: Bytes,
) -> Result<Json<Success<EditionImportSummary>>, ApiError> {
  let Some(franchise) = params.franchise.filter(|f| !f.trim().is_empty()) else {
    return Err(ApiError::BadRequest("Franchise is required".into()));
  };
  let csv = std::str::from_utf8(&body)
    .map_err(|_| ApiError::from(hangar_ingest::Error::NotUtf8))?;

  let summary =
    import_editions(store.as_ref(), csv, &franchise, params.is_default).await?;
  Ok(success(summary))
}

// ─── Template ─────────────────────────────────────────────────────────────────

/// `GET /editions/{id}/template.csv`
pub async fn template<S: CollectionStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let edition = store
    .get_edition(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("edition not found: {id}")))?;

  let csv = encode_template(&edition.name, edition.retail_price)?;
  let disposition = format!(
    "attachment; filename=\"{}-template.csv\"",
    attachment_name(&edition.name)
  );

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    csv,
  ))
}

/// Edition names are free text; keep only what is safe in a quoted header
/// parameter.
fn attachment_name(name: &str) -> String {
  name
    .trim()
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
        c
      } else {
        '_'
      }
    })
    .collect()
}
