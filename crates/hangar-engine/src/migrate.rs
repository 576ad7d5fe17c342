//! One-shot identifier migration.
//!
//! Copies every canonical starship into the re-keyed collection under a new
//! UUID and records the old→new pairing. The run is guarded by an advisory
//! lock and refuses to start unless both the target collection and the
//! mapping table are empty, so it can never merge into a previous attempt.

use chrono::Utc;
use hangar_core::{
  migration::{IdentifierMapping, StarshipCollection},
  store::CollectionStore,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Mappings echoed back in a [`MigrationReport`].
pub const SAMPLE_SIZE: usize = 10;

/// Progress is logged every this many records.
const PROGRESS_EVERY: u64 = 10;

/// A state the database must be in before a migration may start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
  #[error(
    "ID mapping collection already exists ({count} rows). Please check the \
     database first."
  )]
  MappingsExist { count: u64 },

  #[error(
    "Target collection already exists and has data ({count} records). \
     Please check the database first."
  )]
  TargetNotEmpty { count: u64 },
}

#[derive(Debug, Error)]
pub enum MigrationError<E> {
  #[error("another identifier migration is already running")]
  Locked,

  #[error(transparent)]
  Precondition(#[from] Precondition),

  #[error("store error: {0}")]
  Store(#[source] E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSample {
  pub old_id: Uuid,
  pub new_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
  pub total_starships:    u64,
  pub processed:          u64,
  pub successful:         u64,
  pub failed:             u64,
  pub id_mappings_sample: Vec<MappingSample>,
}

/// Run the identifier migration.
///
/// The lock is taken before the precondition check and released afterwards,
/// whether or not the run succeeded. Per-record failures (including records
/// that fail to decode) are counted in `failed` and never roll back records
/// already copied.
pub async fn migrate_identifiers<S: CollectionStore>(
  store: &S,
) -> Result<MigrationReport, MigrationError<S::Error>> {
  let holder = Uuid::new_v4();
  if !store
    .try_acquire_migration_lock(holder)
    .await
    .map_err(MigrationError::Store)?
  {
    tracing::warn!("identifier migration refused: lock is held");
    return Err(MigrationError::Locked);
  }

  let result = run(store).await;

  match store.release_migration_lock(holder).await {
    Ok(()) => result,
    Err(e) => {
      tracing::error!(error = %e, "failed to release identifier migration lock");
      match result {
        Ok(_) => Err(MigrationError::Store(e)),
        Err(original) => Err(original),
      }
    }
  }
}

async fn run<S: CollectionStore>(
  store: &S,
) -> Result<MigrationReport, MigrationError<S::Error>> {
  let mappings = store.count_mappings().await.map_err(MigrationError::Store)?;
  if mappings > 0 {
    return Err(Precondition::MappingsExist { count: mappings }.into());
  }

  let target = store
    .count_starships(StarshipCollection::Rekeyed)
    .await
    .map_err(MigrationError::Store)?;
  if target > 0 {
    return Err(Precondition::TargetNotEmpty { count: target }.into());
  }

  let ids = store
    .list_starship_ids(StarshipCollection::Canonical)
    .await
    .map_err(MigrationError::Store)?;

  let mut report = MigrationReport {
    total_starships: ids.len() as u64,
    ..MigrationReport::default()
  };
  tracing::info!(total = report.total_starships, "starting identifier migration");

  for old_id in ids {
    report.processed += 1;

    match copy_one(store, old_id).await {
      Ok(Some(mapping)) => {
        report.successful += 1;
        if report.id_mappings_sample.len() < SAMPLE_SIZE {
          report.id_mappings_sample.push(MappingSample {
            old_id: mapping.old_id,
            new_id: mapping.new_id,
          });
        }
      }
      Ok(None) => {
        report.failed += 1;
        tracing::warn!(%old_id, "starship disappeared during migration");
      }
      Err(error) => {
        report.failed += 1;
        tracing::warn!(%old_id, %error, "failed to migrate starship");
      }
    }

    if report.processed % PROGRESS_EVERY == 0 {
      tracing::info!(
        processed = report.processed,
        total = report.total_starships,
        "identifier migration progress"
      );
    }
  }

  store
    .create_migration_indexes()
    .await
    .map_err(MigrationError::Store)?;

  tracing::info!(
    processed = report.processed,
    successful = report.successful,
    failed = report.failed,
    "identifier migration finished"
  );
  Ok(report)
}

/// Copy one record. `None` means the source id no longer resolves.
async fn copy_one<S: CollectionStore>(
  store: &S,
  old_id: Uuid,
) -> Result<Option<IdentifierMapping>, S::Error> {
  let Some(source) = store
    .get_starship(StarshipCollection::Canonical, old_id)
    .await?
  else {
    return Ok(None);
  };

  let now = Utc::now();
  let new_id = Uuid::new_v4();
  let mapping = IdentifierMapping::new(old_id, new_id, now);

  store
    .insert_migrated(mapping.clone(), source.rekeyed(new_id, now))
    .await?;
  Ok(Some(mapping))
}

/// The mapping recorded for `old_id`, if that record was migrated.
pub async fn mapping_for<S: CollectionStore>(
  store: &S,
  old_id: Uuid,
) -> Result<Option<IdentifierMapping>, S::Error> {
  store.get_mapping(old_id).await
}
