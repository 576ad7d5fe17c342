//! Identifier migration records.
//!
//! A migration copies every canonical starship into a separate re-keyed
//! collection under a fresh UUID. The old→new pairing is recorded in an
//! append-only mapping table that is never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the advisory lock row guarding identifier migrations.
pub const MIGRATION_LOCK: &str = "identifier-migration";

/// Which physical collection of starships an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarshipCollection {
  /// The authoritative store that imports write to.
  Canonical,
  /// The migration target, populated once by an identifier migration.
  Rekeyed,
}

/// One old-id → new-id pairing. Write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierMapping {
  pub mapping_id: Uuid,
  pub old_id:     Uuid,
  pub new_id:     Uuid,
  pub created_at: DateTime<Utc>,
}

impl IdentifierMapping {
  pub fn new(old_id: Uuid, new_id: Uuid, created_at: DateTime<Utc>) -> Self {
    Self { mapping_id: Uuid::new_v4(), old_id, new_id, created_at }
  }
}

/// Outcome of retiring the legacy canonical collection in favour of the
/// re-keyed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRetirement {
  /// Legacy canonical rows deleted.
  pub removed:  u64,
  /// Re-keyed rows moved into the canonical collection.
  pub promoted: u64,
}
