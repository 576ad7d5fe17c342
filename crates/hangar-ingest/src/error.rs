//! Error types for the hangar-ingest codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported file format {0:?}; upload a .csv or .json file")]
  UnsupportedFormat(String),

  #[error("input is not valid UTF-8")]
  NotUtf8,

  #[error("invalid JSON format: expected an array of starships")]
  NotAnArray,

  #[error("item {0} is not a JSON object")]
  NotAnObject(usize),

  #[error("CSV error: {0}")]
  Csv(#[from] csv::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
