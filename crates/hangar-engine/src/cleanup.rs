//! Destructive maintenance actions. Nothing here runs implicitly; callers
//! go through [`CleanupAction::authorize`] first.

use std::str::FromStr;

use hangar_core::{reference::ReferenceKind, store::CollectionStore};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

use crate::orphans::{delete_orphans, find_table_orphans};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CleanupAction {
  /// Replace the legacy canonical table with the re-keyed copy.
  RemoveLegacyCollections,
  /// Drop every identifier mapping row.
  RemoveMappingCollection,
  RemoveOrphanedEditions,
  RemoveOrphanedFactions,
  RemoveOrphanedFranchises,
  RemoveOrphanedCollectionTypes,
  RemoveOrphanedManufacturers,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanupRejected {
  #[error("Invalid action {action:?}. Supported actions: {supported}")]
  UnknownAction { action: String, supported: String },

  #[error("cleanup action {0} is destructive and must be explicitly confirmed")]
  NotConfirmed(CleanupAction),
}

impl CleanupAction {
  /// Parse a requested action and check the caller confirmed it.
  pub fn authorize(action: &str, confirm: bool) -> Result<Self, CleanupRejected> {
    let parsed = Self::from_str(action.trim()).map_err(|_| {
      CleanupRejected::UnknownAction {
        action:    action.to_owned(),
        supported: Self::iter()
          .map(|a| a.to_string())
          .collect::<Vec<_>>()
          .join(", "),
      }
    })?;
    if !confirm {
      return Err(CleanupRejected::NotConfirmed(parsed));
    }
    Ok(parsed)
  }
}

/// Run one action and describe what it did, one line per step.
pub async fn run_cleanup<S: CollectionStore>(
  store: &S,
  action: CleanupAction,
) -> Result<Vec<String>, S::Error> {
  tracing::info!(%action, "running cleanup action");

  match action {
    CleanupAction::RemoveLegacyCollections => retire_legacy(store).await,
    CleanupAction::RemoveMappingCollection => {
      let removed = store.drop_mappings().await?;
      Ok(vec![if removed == 0 {
        "Identifier mapping table is already empty".to_owned()
      } else {
        format!("Removed {removed} identifier mappings")
      }])
    }
    CleanupAction::RemoveOrphanedEditions => {
      remove_orphans(store, ReferenceKind::Edition).await
    }
    CleanupAction::RemoveOrphanedFactions => {
      remove_orphans(store, ReferenceKind::Faction).await
    }
    CleanupAction::RemoveOrphanedFranchises => {
      remove_orphans(store, ReferenceKind::Franchise).await
    }
    CleanupAction::RemoveOrphanedCollectionTypes => {
      remove_orphans(store, ReferenceKind::CollectionType).await
    }
    CleanupAction::RemoveOrphanedManufacturers => {
      remove_orphans(store, ReferenceKind::Manufacturer).await
    }
  }
}

async fn retire_legacy<S: CollectionStore>(
  store: &S,
) -> Result<Vec<String>, S::Error> {
  let retired = store.retire_legacy().await?;
  if retired.promoted == 0 {
    return Ok(vec![
      "No re-keyed starships to promote; legacy table left in place".to_owned(),
    ]);
  }
  Ok(vec![
    format!("Removed {} legacy starship records", retired.removed),
    format!("Promoted {} re-keyed starship records", retired.promoted),
  ])
}

async fn remove_orphans<S: CollectionStore>(
  store: &S,
  kind: ReferenceKind,
) -> Result<Vec<String>, S::Error> {
  let table = find_table_orphans(store, kind).await?;
  if table.orphans.is_empty() {
    return Ok(vec![format!("No orphaned {} found", kind.label())]);
  }
  let removed = delete_orphans(store, &table).await?;
  Ok(vec![format!("Removed {removed} orphaned {}", kind.label())])
}
