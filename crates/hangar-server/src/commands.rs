//! One-shot operator commands run from the command line instead of over
//! HTTP. Each returns a serialisable result the binary prints as JSON.

use std::path::Path;

use hangar_core::store::CollectionStore;
use hangar_engine::{
  CleanupAction, ImportError, ImportSummary, MigrationError, MigrationReport,
  OrphanReport, find_orphans, import_context, import_file, migrate_identifiers,
  run_cleanup,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Import one file from disk. The format follows the file extension.
pub async fn import<S: CollectionStore>(
  store: &S,
  path: &Path,
  edition_id: Option<Uuid>,
  franchise: Option<String>,
) -> Result<ImportSummary> {
  let bytes = tokio::fs::read(path).await.map_err(|source| Error::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let context = import_context(store, edition_id, franchise)
    .await
    .map_err(|e| match e {
      ImportError::Ingest(e) => Error::Ingest(e),
      ImportError::EditionNotFound(id) => Error::EditionNotFound(id),
      ImportError::Store(e) => Error::store(e),
    })?;

  let filename = path
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_default();
  Ok(import_file(store, &filename, &bytes, &context).await?)
}

pub async fn migrate<S: CollectionStore>(store: &S) -> Result<MigrationReport> {
  migrate_identifiers(store).await.map_err(|e| match e {
    MigrationError::Locked => Error::Locked,
    MigrationError::Precondition(p) => Error::Precondition(p),
    MigrationError::Store(e) => Error::store(e),
  })
}

pub async fn orphans<S: CollectionStore>(store: &S) -> Result<OrphanReport> {
  find_orphans(store).await.map_err(Error::store)
}

#[derive(Debug, Serialize)]
pub struct CleanupOutput {
  pub action:  CleanupAction,
  pub actions: Vec<String>,
}

/// Run a cleanup action. `confirmed` comes from `--yes`.
pub async fn cleanup<S: CollectionStore>(
  store: &S,
  action: &str,
  confirmed: bool,
) -> Result<CleanupOutput> {
  let action = CleanupAction::authorize(action, confirmed)?;
  let actions = run_cleanup(store, action).await.map_err(Error::store)?;
  Ok(CleanupOutput { action, actions })
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use hangar_core::migration::StarshipCollection;
  use hangar_engine::Precondition;
  use hangar_store_sqlite::SqliteStore;

  use super::*;

  fn ships_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
      .suffix(".csv")
      .tempfile()
      .unwrap();
    write!(
      file,
      "issue,edition,shipName,faction\n\
       1,Regular,USS Enterprise,Federation\n\
       2,Regular,USS Defiant,Federation\n"
    )
    .unwrap();
    file
  }

  #[tokio::test]
  async fn import_reads_file_by_extension() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let file = ships_file();

    let summary = import(&store, file.path(), None, None).await.unwrap();
    assert_eq!((summary.imported, summary.errors, summary.total), (2, 0, 2));
  }

  #[tokio::test]
  async fn import_of_missing_file_names_the_path() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let err = import(&store, Path::new("/nonexistent/ships.csv"), None, None)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(err.to_string().contains("ships.csv"));
  }

  #[tokio::test]
  async fn migrate_then_refuse_rerun() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let file = ships_file();
    import(&store, file.path(), None, None).await.unwrap();

    let report = migrate(&store).await.unwrap();
    assert_eq!(report.successful, 2);
    assert_eq!(
      store.count_starships(StarshipCollection::Rekeyed).await.unwrap(),
      2
    );

    let err = migrate(&store).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Precondition(Precondition::MappingsExist { count: 2 })
    ));
  }

  #[tokio::test]
  async fn cleanup_needs_yes() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let err = cleanup(&store, "remove_mapping_collection", false)
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Cleanup(_)));

    let out = cleanup(&store, "remove_mapping_collection", true).await.unwrap();
    assert_eq!(out.actions, vec!["Identifier mapping table is already empty"]);
  }

  #[tokio::test]
  async fn orphans_report_is_read_only() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let report = orphans(&store).await.unwrap();
    assert_eq!(report.starships, 0);
    assert_eq!(report.total_orphans(), 0);
  }
}
