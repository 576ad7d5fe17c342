//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hangar_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend failure, surfacing uniqueness conflicts and missing rows
  /// with their own status codes.
  pub fn store<E: StoreError>(error: E) -> Self {
    match error.domain() {
      Some(domain) if domain.is_conflict() => Self::Conflict(domain.to_string()),
      Some(domain)
        if matches!(
          domain,
          hangar_core::Error::EditionNotFound(_)
            | hangar_core::Error::StarshipNotFound(_)
        ) =>
      {
        Self::NotFound(domain.to_string())
      }
      _ => Self::Store(Box::new(error)),
    }
  }
}

impl From<hangar_ingest::Error> for ApiError {
  fn from(error: hangar_ingest::Error) -> Self {
    Self::BadRequest(error.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure while handling request");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "success": false, "error": message }))).into_response()
  }
}
