//! Hangar server: configuration and the HTTP application around
//! [`hangar_api::api_router`], plus the operator commands the `hangar`
//! binary exposes.

pub mod commands;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, extract::DefaultBodyLimit};
use hangar_core::store::CollectionStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `hangar.toml` layered with
/// `HANGAR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Largest accepted request body, uploads included.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String {
  "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
  8080
}

fn default_store_path() -> PathBuf {
  PathBuf::from("hangar.db")
}

fn default_max_upload_bytes() -> usize {
  10 * 1024 * 1024
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      max_upload_bytes: default_max_upload_bytes(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf {
    expand_tilde(&self.store_path)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, request tracing and the
/// configured body limit.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: CollectionStore + 'static,
{
  Router::new()
    .nest("/api", hangar_api::api_router(store))
    .layer(DefaultBodyLimit::max(config.max_upload_bytes))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use hangar_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  async fn app(config: &ServerConfig) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    router(Arc::new(store), config)
  }

  #[tokio::test]
  async fn api_is_nested_under_prefix() {
    let app = app(&ServerConfig::default()).await;
    let req = Request::builder()
      .uri("/api/orphans")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn oversized_upload_is_rejected() {
    let config = ServerConfig { max_upload_bytes: 16, ..ServerConfig::default() };
    let app = app(&config).await;
    let body = "issue,edition,shipName,faction\n1,Regular,USS Enterprise,Federation\n";
    let req = Request::builder()
      .method("POST")
      .uri("/api/import?filename=ships.csv")
      .body(Body::from(body))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let config: ServerConfig = config::Config::builder()
      .set_override("port", 9000)
      .unwrap()
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(config.port, 9000);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    assert_eq!(config.address(), "127.0.0.1:9000");
  }

  #[test]
  fn tilde_expansion_only_touches_home_prefix() {
    assert_eq!(expand_tilde(Path::new("/var/hangar.db")), PathBuf::from("/var/hangar.db"));
    assert_eq!(expand_tilde(Path::new("hangar.db")), PathBuf::from("hangar.db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/data/hangar.db")),
        PathBuf::from(home).join("data/hangar.db")
      );
    }
  }
}
