//! Error type for the operator commands.

use std::path::PathBuf;

use hangar_engine::{CleanupRejected, Precondition};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to read {path:?}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Ingest(#[from] hangar_ingest::Error),

  #[error("edition not found: {0}")]
  EditionNotFound(Uuid),

  #[error("another identifier migration is already running")]
  Locked,

  #[error(transparent)]
  Precondition(#[from] Precondition),

  #[error(transparent)]
  Cleanup(#[from] CleanupRejected),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
