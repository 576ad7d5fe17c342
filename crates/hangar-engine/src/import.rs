//! Bulk import: decode, normalise, resolve and upsert every row of an upload.

use hangar_core::store::CollectionStore;
use hangar_ingest::{ImportContext, RawRow, SourceKind, normalize};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  resolve::{apply_edition, resolve_edition},
  upsert::upsert,
};

/// Per-row failure messages kept in an [`ImportSummary`].
pub const ERROR_SAMPLE: usize = 10;

#[derive(Debug, Error)]
pub enum ImportError<E> {
  #[error(transparent)]
  Ingest(#[from] hangar_ingest::Error),

  #[error("edition not found: {0}")]
  EditionNotFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] E),
}

/// Counts for one import batch. `total == imported + errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
  pub imported:     u64,
  pub errors:       u64,
  pub total:        u64,
  /// The first few per-row failures, as `row N: reason`.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub error_sample: Vec<String>,
}

impl ImportSummary {
  fn record_error(&mut self, row: usize, reason: impl std::fmt::Display) {
    self.errors += 1;
    if self.error_sample.len() < ERROR_SAMPLE {
      self.error_sample.push(format!("row {row}: {reason}"));
    }
  }
}

/// Build the import-wide defaults. An `edition_id` names the edition rows
/// default to; an explicit `franchise` overrides the edition's own.
pub async fn import_context<S: CollectionStore>(
  store: &S,
  edition_id: Option<Uuid>,
  franchise: Option<String>,
) -> Result<ImportContext, ImportError<S::Error>> {
  let mut context = ImportContext {
    edition:   None,
    franchise: franchise.filter(|f| !f.trim().is_empty()),
  };

  if let Some(id) = edition_id {
    let edition = store
      .get_edition(id)
      .await
      .map_err(ImportError::Store)?
      .ok_or(ImportError::EditionNotFound(id))?;
    context.franchise.get_or_insert_with(|| edition.franchise.clone());
    context.edition = Some(edition);
  }

  Ok(context)
}

/// Normalise, resolve and upsert each row in order. Rows are independent: a
/// rejected row or a failed write is counted and the batch carries on. When
/// two rows share a natural key the later one wins.
pub async fn import_rows<S: CollectionStore>(
  store: &S,
  rows: &[RawRow],
  kind: SourceKind,
  context: &ImportContext,
) -> ImportSummary {
  let mut summary = ImportSummary::default();

  for (index, row) in rows.iter().enumerate() {
    let line = index + 1;

    let draft = match normalize(row, kind, context) {
      Ok(draft) => draft,
      Err(rejection) => {
        tracing::warn!(row = line, %rejection, "skipping import row");
        summary.record_error(line, rejection);
        continue;
      }
    };

    // Rows on the caller's chosen edition skip the name lookup, which
    // cannot tell same-named editions of different franchises apart.
    let resolved = match context.edition.as_ref().filter(|e| e.name == draft.edition) {
      Some(edition) => Ok(apply_edition(draft, edition)),
      None => resolve_edition(store, draft).await,
    };
    let written = match resolved {
      Ok(draft) => upsert(store, draft).await,
      Err(e) => Err(e),
    };

    match written {
      Ok(outcome) => {
        tracing::debug!(row = line, id = %outcome.id(), ?outcome, "imported row");
        summary.imported += 1;
      }
      Err(error) => {
        tracing::warn!(row = line, %error, "failed to import row");
        summary.record_error(line, error);
      }
    }
  }

  summary.total = summary.imported + summary.errors;
  tracing::info!(
    imported = summary.imported,
    errors = summary.errors,
    total = summary.total,
    "import finished"
  );
  summary
}

/// Decode an uploaded file by its extension and import its rows. Only
/// decoding failures abort the whole request.
pub async fn import_file<S: CollectionStore>(
  store: &S,
  filename: &str,
  bytes: &[u8],
  context: &ImportContext,
) -> Result<ImportSummary, hangar_ingest::Error> {
  let kind = SourceKind::from_filename(filename)?;
  let rows = hangar_ingest::decode(bytes, kind)?;
  tracing::info!(filename, rows = rows.len(), "importing upload");
  Ok(import_rows(store, &rows, kind, context).await)
}
