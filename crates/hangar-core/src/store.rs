//! The `CollectionStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `hangar-store-sqlite`).
//! The engine, API and server depend on this abstraction, not on any concrete
//! backend. A store value is the process's single client handle: it is opened
//! at startup and passed explicitly to every component.

use std::{
  collections::{BTreeMap, BTreeSet},
  future::Future,
};

use uuid::Uuid;

use crate::{
  migration::{IdentifierMapping, LegacyRetirement, StarshipCollection},
  reference::{Edition, NewEdition, ReferenceEntity, ReferenceKind},
  starship::{NaturalKey, Starship},
};

/// Implemented by backend error types so callers can recover the domain
/// reason (a uniqueness conflict, a missing row) behind a store failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

/// Abstraction over a Hangar collection store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CollectionStore: Send + Sync {
  type Error: StoreError;

  // ── Starships ───────────────────────────────────────────────────────────

  fn count_starships(
    &self,
    collection: StarshipCollection,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn list_starship_ids(
    &self,
    collection: StarshipCollection,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Load one record. Returns `None` if not found; a row that exists but
  /// cannot be decoded is an error.
  fn get_starship(
    &self,
    collection: StarshipCollection,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Starship>, Self::Error>> + Send + '_;

  /// Look up a canonical record by its natural key.
  fn find_starship(
    &self,
    key: NaturalKey,
  ) -> impl Future<Output = Result<Option<Starship>, Self::Error>> + Send + '_;

  /// Insert a canonical record. Fails with
  /// [`crate::Error::DuplicateNaturalKey`] if the key is taken.
  fn insert_starship(
    &self,
    starship: Starship,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace every field of the canonical record with `starship.id`.
  fn update_starship(
    &self,
    starship: Starship,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Distinct non-blank values of the canonical column that refers to `kind`.
  fn distinct_labels(
    &self,
    kind: ReferenceKind,
  ) -> impl Future<Output = Result<BTreeSet<String>, Self::Error>> + Send + '_;

  /// Edition label → the first non-blank franchise recorded alongside it.
  fn edition_franchises(
    &self,
  ) -> impl Future<Output = Result<BTreeMap<String, String>, Self::Error>> + Send + '_;

  // ── Reference tables ────────────────────────────────────────────────────

  fn list_references(
    &self,
    kind: ReferenceKind,
  ) -> impl Future<Output = Result<Vec<ReferenceEntity>, Self::Error>> + Send + '_;

  /// Create a non-edition reference entity. Editions need a franchise and go
  /// through [`CollectionStore::create_edition`].
  fn add_reference(
    &self,
    kind: ReferenceKind,
    name: String,
    description: Option<String>,
  ) -> impl Future<Output = Result<ReferenceEntity, Self::Error>> + Send + '_;

  /// Delete the given ids from `kind`'s table, skipping any entity whose
  /// name a canonical starship uses at the time of the delete. Returns rows
  /// removed.
  fn delete_unused_references(
    &self,
    kind: ReferenceKind,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Insert a new edition. Fails with
  /// [`crate::Error::DuplicateEditionName`] or
  /// [`crate::Error::DuplicateInternalName`]. A default edition clears the
  /// default flag on the rest of its franchise.
  fn create_edition(
    &self,
    input: NewEdition,
  ) -> impl Future<Output = Result<Edition, Self::Error>> + Send + '_;

  /// Insert or update the edition keyed on (name, franchise). Returns the
  /// stored edition and `true` if it was created.
  fn upsert_edition(
    &self,
    input: NewEdition,
  ) -> impl Future<Output = Result<(Edition, bool), Self::Error>> + Send + '_;

  fn get_edition(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Edition>, Self::Error>> + Send + '_;

  /// First edition (by creation time) whose display name equals `name`,
  /// restricted to `franchise` when one is given.
  fn find_edition_by_name(
    &self,
    name: String,
    franchise: Option<String>,
  ) -> impl Future<Output = Result<Option<Edition>, Self::Error>> + Send + '_;

  // ── Identifier migration ────────────────────────────────────────────────

  /// Compare-and-swap insert of the migration marker. Returns `false` if
  /// another holder already has it.
  fn try_acquire_migration_lock(
    &self,
    holder: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove the marker if `holder` owns it.
  fn release_migration_lock(
    &self,
    holder: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn count_mappings(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Write the mapping row and the re-keyed copy in one transaction: either
  /// both exist afterwards or neither does.
  fn insert_migrated(
    &self,
    mapping: IdentifierMapping,
    record: Starship,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_mapping(
    &self,
    old_id: Uuid,
  ) -> impl Future<Output = Result<Option<IdentifierMapping>, Self::Error>> + Send + '_;

  /// Index the re-keyed collection and the mapping table for the canonical
  /// access patterns. Idempotent.
  fn create_migration_indexes(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove every mapping row; returns rows removed.
  fn drop_mappings(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Replace the canonical collection with the re-keyed one in a single
  /// transaction. A no-op when the re-keyed collection is empty.
  fn retire_legacy(
    &self,
  ) -> impl Future<Output = Result<LegacyRetirement, Self::Error>> + Send + '_;
}
