//! Reference-table maintenance: edition creation and CSV import, and
//! syncing reference tables from the labels starships actually use.

use std::collections::BTreeSet;

use hangar_core::{
  reference::{Edition, NewEdition, ReferenceKind},
  store::{CollectionStore, StoreError},
};
use hangar_ingest::decode_editions_csv;
use serde::Serialize;

/// Franchise given to editions synced from records that carry none.
pub const UNASSIGNED_FRANCHISE: &str = "Unassigned";

const SYNC_DESCRIPTION: &str = "Imported from starship records";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EditionImportSummary {
  pub imported: u64,
  pub errors:   u64,
  pub total:    u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
  /// Distinct labels in use.
  pub total:    u64,
  /// Labels that already had an entity.
  pub existing: u64,
  /// Entities created by this sync.
  pub imported: u64,
}

fn is_conflict<E: StoreError>(e: &E) -> bool {
  e.domain().is_some_and(hangar_core::Error::is_conflict)
}

/// Create an edition. Name and franchise are trimmed; the internal name is
/// generated from them unless given.
pub async fn create_edition<S: CollectionStore>(
  store: &S,
  mut input: NewEdition,
) -> Result<Edition, S::Error> {
  input.name = input.name.trim().to_owned();
  input.franchise = input.franchise.trim().to_owned();

  let edition = store.create_edition(input).await?;
  tracing::info!(
    name = %edition.name,
    franchise = %edition.franchise,
    internal_name = %edition.internal_name,
    "created edition"
  );
  Ok(edition)
}

/// Upsert every edition in an edition CSV under `franchise`, keyed on
/// (name, franchise). Rows without a name and rows the store rejects are
/// counted as errors.
pub async fn import_editions<S: CollectionStore>(
  store: &S,
  csv: &str,
  franchise: &str,
  is_default: bool,
) -> Result<EditionImportSummary, hangar_ingest::Error> {
  let rows = decode_editions_csv(csv, franchise.trim(), is_default)?;
  let mut summary = EditionImportSummary {
    errors: rows.errors,
    ..EditionImportSummary::default()
  };

  for input in rows.editions {
    let name = input.name.clone();
    match store.upsert_edition(input).await {
      Ok((edition, created)) => {
        tracing::debug!(name = %edition.name, created, "upserted edition");
        summary.imported += 1;
      }
      Err(error) => {
        tracing::warn!(%name, %error, "failed to import edition");
        summary.errors += 1;
      }
    }
  }

  summary.total = summary.imported + summary.errors;
  Ok(summary)
}

/// Create an entity of `kind` for every label canonical starships use that
/// has none yet. Editions take the franchise recorded alongside them.
pub async fn sync_references<S: CollectionStore>(
  store: &S,
  kind: ReferenceKind,
) -> Result<SyncSummary, S::Error> {
  let used: BTreeSet<String> = store
    .distinct_labels(kind)
    .await?
    .into_iter()
    .map(|l| l.trim().to_owned())
    .collect();
  let known: BTreeSet<String> = store
    .list_references(kind)
    .await?
    .into_iter()
    .map(|e| e.name)
    .collect();

  let mut summary = SyncSummary {
    total: used.len() as u64,
    existing: used.intersection(&known).count() as u64,
    imported: 0,
  };

  let franchises = if kind == ReferenceKind::Edition {
    store.edition_franchises().await?
  } else {
    Default::default()
  };

  for name in used.difference(&known) {
    let created = if kind == ReferenceKind::Edition {
      let franchise = franchises
        .get(name)
        .map_or(UNASSIGNED_FRANCHISE, String::as_str);
      let mut input = NewEdition::new(name.clone(), franchise.trim());
      input.description = Some(SYNC_DESCRIPTION.to_owned());
      store.create_edition(input).await.map(|_| ())
    } else {
      store
        .add_reference(kind, name.clone(), Some(SYNC_DESCRIPTION.to_owned()))
        .await
        .map(|_| ())
    };

    match created {
      Ok(()) => summary.imported += 1,
      Err(error) if is_conflict(&error) => {
        tracing::warn!(%kind, %name, %error, "skipping conflicting reference");
      }
      Err(error) => return Err(error),
    }
  }

  tracing::info!(
    %kind,
    total = summary.total,
    existing = summary.existing,
    imported = summary.imported,
    "synced reference table"
  );
  Ok(summary)
}
