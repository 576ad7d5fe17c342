//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use hangar_core::{
  Error as CoreError,
  migration::{IdentifierMapping, StarshipCollection},
  reference::{NewEdition, ReferenceKind},
  starship::{Sighting, Starship, StarshipDraft},
  store::{CollectionStore, StoreError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore, schema::MIGRATION_INDEX_NAMES};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ship(issue: &str, edition: &str) -> Starship {
  StarshipDraft::new(issue, edition, format!("Ship {issue}"), "Federation")
    .into_starship(Uuid::new_v4(), Utc::now())
}

fn domain(err: &Error) -> &CoreError {
  err.domain().expect("domain error")
}

// ─── Starships ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_find_by_natural_key() {
  let s = store().await;
  let mut ship = ship("1", "Regular");
  ship.release_date = NaiveDate::from_ymd_opt(2024, 3, 15);
  ship.condition_photos = vec!["front.jpg".into()];
  ship.sightings = vec![Sighting {
    id:       Uuid::new_v4(),
    location: "eBay".into(),
    date:     NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
    price:    30.0,
    url:      None,
    notes:    Some("boxed".into()),
  }];
  s.insert_starship(ship.clone()).await.unwrap();

  let found = s.find_starship(ship.natural_key()).await.unwrap().unwrap();
  assert_eq!(found.id, ship.id);
  assert_eq!(found.release_date, ship.release_date);
  assert_eq!(found.condition_photos, ship.condition_photos);
  assert_eq!(found.sightings, ship.sightings);

  let by_id = s
    .get_starship(StarshipCollection::Canonical, ship.id)
    .await
    .unwrap();
  assert_eq!(by_id.map(|s| s.natural_key()), Some(ship.natural_key()));
}

#[tokio::test]
async fn duplicate_natural_key_is_a_conflict() {
  let s = store().await;
  s.insert_starship(ship("1", "Regular")).await.unwrap();

  let err = s.insert_starship(ship("1", "Regular")).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::DuplicateNaturalKey(_)));
  assert!(domain(&err).is_conflict());

  // Same issue under another edition is a different record.
  s.insert_starship(ship("1", "Special")).await.unwrap();
  assert_eq!(
    s.count_starships(StarshipCollection::Canonical).await.unwrap(),
    2
  );
}

#[tokio::test]
async fn update_replaces_fields() {
  let s = store().await;
  let mut ship = ship("1", "Regular");
  s.insert_starship(ship.clone()).await.unwrap();

  ship.owned = true;
  ship.market_value = Some(55.5);
  s.update_starship(ship.clone()).await.unwrap();

  let got = s.find_starship(ship.natural_key()).await.unwrap().unwrap();
  assert!(got.owned);
  assert_eq!(got.market_value, Some(55.5));
}

#[tokio::test]
async fn update_of_missing_record_fails() {
  let s = store().await;
  let ship = ship("9", "Regular");
  let err = s.update_starship(ship.clone()).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::StarshipNotFound(id) if *id == ship.id));
}

#[tokio::test]
async fn distinct_labels_skip_blanks() {
  let s = store().await;
  let mut a = ship("1", "Regular");
  a.manufacturer = Some("Eaglemoss".into());
  let mut b = ship("2", "Regular");
  b.manufacturer = Some("  ".into());
  let c = ship("3", "Special");
  for x in [a, b, c] {
    s.insert_starship(x).await.unwrap();
  }

  let editions = s.distinct_labels(ReferenceKind::Edition).await.unwrap();
  assert_eq!(editions.into_iter().collect::<Vec<_>>(), ["Regular", "Special"]);

  let makers = s.distinct_labels(ReferenceKind::Manufacturer).await.unwrap();
  assert_eq!(makers.len(), 1);
  assert!(makers.contains("Eaglemoss"));
}

#[tokio::test]
async fn edition_franchises_take_first_seen() {
  let s = store().await;
  let mut a = ship("1", "Regular");
  a.franchise = Some("Star Trek".into());
  let mut b = ship("2", "Regular");
  b.franchise = Some("Star Wars".into());
  let c = ship("3", "Special");
  for x in [a, b, c] {
    s.insert_starship(x).await.unwrap();
  }

  let map = s.edition_franchises().await.unwrap();
  assert_eq!(map.get("Regular").map(String::as_str), Some("Star Trek"));
  assert!(!map.contains_key("Special"));
}

// ─── Reference entities ──────────────────────────────────────────────────────

#[tokio::test]
async fn add_list_and_delete_unused_references() {
  let s = store().await;
  let klingon = s
    .add_reference(ReferenceKind::Faction, "Klingon".into(), None)
    .await
    .unwrap();
  s.add_reference(ReferenceKind::Faction, "Romulan".into(), Some("pointy".into()))
    .await
    .unwrap();
  s.add_reference(ReferenceKind::Manufacturer, "Klingon".into(), None)
    .await
    .unwrap();

  let factions = s.list_references(ReferenceKind::Faction).await.unwrap();
  assert_eq!(factions.len(), 2);
  assert_eq!(factions[0].name, "Klingon");

  let err = s
    .add_reference(ReferenceKind::Faction, "Klingon".into(), None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::DuplicateReference { .. }));

  // Deleting by id is scoped to the kind.
  let removed = s
    .delete_unused_references(ReferenceKind::Manufacturer, vec![klingon.id])
    .await
    .unwrap();
  assert_eq!(removed, 0);
  let removed = s
    .delete_unused_references(ReferenceKind::Faction, vec![klingon.id])
    .await
    .unwrap();
  assert_eq!(removed, 1);
  assert_eq!(s.list_references(ReferenceKind::Faction).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_skips_references_a_starship_now_uses() {
  let s = store().await;
  let federation = s
    .add_reference(ReferenceKind::Faction, "Federation".into(), None)
    .await
    .unwrap();
  let regular = s
    .create_edition(NewEdition::new("Regular", "Star Trek"))
    .await
    .unwrap();
  s.insert_starship(ship("1", "Regular")).await.unwrap();

  let removed = s
    .delete_unused_references(ReferenceKind::Faction, vec![federation.id])
    .await
    .unwrap();
  assert_eq!(removed, 0);
  let removed = s
    .delete_unused_references(ReferenceKind::Edition, vec![regular.id])
    .await
    .unwrap();
  assert_eq!(removed, 0);
  assert_eq!(s.list_references(ReferenceKind::Faction).await.unwrap().len(), 1);
  assert!(s.get_edition(regular.id).await.unwrap().is_some());
}

#[tokio::test]
async fn edition_lookup_can_be_scoped_to_a_franchise() {
  let s = store().await;
  let trek = s
    .create_edition(NewEdition::new("Regular", "Star Trek"))
    .await
    .unwrap();
  let wars = s
    .create_edition(NewEdition::new("Regular", "Star Wars"))
    .await
    .unwrap();

  let any = s.find_edition_by_name("Regular".into(), None).await.unwrap();
  assert_eq!(any.map(|e| e.id), Some(trek.id));
  let scoped = s
    .find_edition_by_name("Regular".into(), Some("Star Wars".into()))
    .await
    .unwrap();
  assert_eq!(scoped.map(|e| e.id), Some(wars.id));
  let none = s
    .find_edition_by_name("Regular".into(), Some("Babylon 5".into()))
    .await
    .unwrap();
  assert!(none.is_none());
}

#[tokio::test]
async fn editions_cannot_go_through_add_reference() {
  let s = store().await;
  let err = s
    .add_reference(ReferenceKind::Edition, "Regular".into(), None)
    .await
    .unwrap_err();
  assert!(matches!(domain(&err), CoreError::EditionNeedsFranchise));
}

#[tokio::test]
async fn edition_conflicts_are_distinguishable() {
  let s = store().await;
  let regular = s
    .create_edition(NewEdition::new("Regular", "Star Trek"))
    .await
    .unwrap();
  assert_eq!(regular.internal_name, "regular-star-trek");

  let err = s
    .create_edition(NewEdition::new("Regular", "Star Trek"))
    .await
    .unwrap_err();
  assert!(matches!(
    domain(&err),
    CoreError::DuplicateEditionName { name, franchise }
      if name == "Regular" && franchise == "Star Trek"
  ));

  let mut clash = NewEdition::new("Regular Line", "Star Trek");
  clash.internal_name = Some("regular-star-trek".into());
  let err = s.create_edition(clash).await.unwrap_err();
  assert!(matches!(domain(&err), CoreError::DuplicateInternalName(n) if n == "regular-star-trek"));

  // Same name in another franchise is fine.
  s.create_edition(NewEdition::new("Regular", "Star Wars"))
    .await
    .unwrap();
}

#[tokio::test]
async fn one_default_edition_per_franchise() {
  let s = store().await;
  let mut a = NewEdition::new("Regular", "Star Trek");
  a.is_default = true;
  let a = s.create_edition(a).await.unwrap();

  let mut other = NewEdition::new("Regular", "Star Wars");
  other.is_default = true;
  let other = s.create_edition(other).await.unwrap();

  let mut b = NewEdition::new("Special", "Star Trek");
  b.is_default = true;
  let b = s.create_edition(b).await.unwrap();

  assert!(!s.get_edition(a.id).await.unwrap().unwrap().is_default);
  assert!(s.get_edition(b.id).await.unwrap().unwrap().is_default);
  assert!(s.get_edition(other.id).await.unwrap().unwrap().is_default);
}

#[tokio::test]
async fn upsert_edition_updates_in_place() {
  let s = store().await;
  let mut first = NewEdition::new("Regular", "Star Trek");
  first.retail_price = Some(12.99);
  first.description = Some("main line".into());
  let (created, was_new) = s.upsert_edition(first).await.unwrap();
  assert!(was_new);

  let mut second = NewEdition::new("Regular", "Star Trek");
  second.retail_price = Some(14.99);
  let (updated, was_new) = s.upsert_edition(second).await.unwrap();
  assert!(!was_new);
  assert_eq!(updated.id, created.id);
  assert_eq!(updated.retail_price, Some(14.99));
  assert_eq!(updated.description.as_deref(), Some("main line"));

  let found = s
    .find_edition_by_name("Regular".into(), None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.id, created.id);
  assert_eq!(s.list_references(ReferenceKind::Edition).await.unwrap().len(), 1);
}

// ─── Identifier migration ────────────────────────────────────────────────────

#[tokio::test]
async fn migration_lock_is_exclusive() {
  let s = store().await;
  let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

  assert!(s.try_acquire_migration_lock(a).await.unwrap());
  assert!(!s.try_acquire_migration_lock(b).await.unwrap());

  // Only the holder can release.
  s.release_migration_lock(b).await.unwrap();
  assert!(!s.try_acquire_migration_lock(b).await.unwrap());

  s.release_migration_lock(a).await.unwrap();
  assert!(s.try_acquire_migration_lock(b).await.unwrap());
}

#[tokio::test]
async fn migrated_copy_and_mapping_are_written_together() {
  let s = store().await;
  let source = ship("1", "Regular");
  s.insert_starship(source.clone()).await.unwrap();

  let new_id = Uuid::new_v4();
  let mapping = IdentifierMapping::new(source.id, new_id, Utc::now());
  s.insert_migrated(mapping.clone(), source.rekeyed(new_id, Utc::now()))
    .await
    .unwrap();

  assert_eq!(s.count_mappings().await.unwrap(), 1);
  assert_eq!(s.get_mapping(source.id).await.unwrap(), Some(mapping.clone()));

  let copy = s
    .get_starship(StarshipCollection::Rekeyed, new_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(copy.original_id, Some(source.id));

  // A second copy under the same mapping id fails and leaves no stray copy.
  let other = Uuid::new_v4();
  let err = s
    .insert_migrated(
      IdentifierMapping { new_id: other, ..mapping },
      source.rekeyed(other, Utc::now()),
    )
    .await;
  assert!(err.is_err());
  assert_eq!(s.count_starships(StarshipCollection::Rekeyed).await.unwrap(), 1);
  assert_eq!(s.count_mappings().await.unwrap(), 1);
}

#[tokio::test]
async fn migration_indexes_are_created() {
  let s = store().await;
  s.create_migration_indexes().await.unwrap();
  s.create_migration_indexes().await.unwrap();

  let names: Vec<String> = s
    .conn
    .call(|conn| {
      let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'index'")?;
      let rows = stmt
        .query_map([], |r| r.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      Ok(rows)
    })
    .await
    .unwrap();

  for expected in MIGRATION_INDEX_NAMES {
    assert!(names.iter().any(|n| n == expected), "missing {expected}");
  }
}

#[tokio::test]
async fn retire_legacy_promotes_rekeyed_rows() {
  let s = store().await;

  // Nothing to promote: canonical rows stay.
  let source = ship("1", "Regular");
  s.insert_starship(source.clone()).await.unwrap();
  let r = s.retire_legacy().await.unwrap();
  assert_eq!((r.removed, r.promoted), (0, 0));
  assert_eq!(s.count_starships(StarshipCollection::Canonical).await.unwrap(), 1);

  let new_id = Uuid::new_v4();
  s.insert_migrated(
    IdentifierMapping::new(source.id, new_id, Utc::now()),
    source.rekeyed(new_id, Utc::now()),
  )
  .await
  .unwrap();

  let r = s.retire_legacy().await.unwrap();
  assert_eq!((r.removed, r.promoted), (1, 1));
  assert_eq!(s.count_starships(StarshipCollection::Rekeyed).await.unwrap(), 0);

  let promoted = s.find_starship(source.natural_key()).await.unwrap().unwrap();
  assert_eq!(promoted.id, new_id);
  assert_eq!(promoted.original_id, Some(source.id));

  assert_eq!(s.drop_mappings().await.unwrap(), 1);
  assert_eq!(s.count_mappings().await.unwrap(), 0);
}

#[tokio::test]
async fn on_disk_store_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("hangar.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.insert_starship(ship("1", "Regular")).await.unwrap();
  s.close().await.unwrap();

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.count_starships(StarshipCollection::Canonical).await.unwrap(), 1);
}
