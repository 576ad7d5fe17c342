//! [`SqliteStore`], the SQLite implementation of [`CollectionStore`].

use std::{
  collections::{BTreeMap, BTreeSet},
  path::Path,
};

use chrono::Utc;
use hangar_core::{
  Error as CoreError,
  migration::{
    IdentifierMapping, LegacyRetirement, MIGRATION_LOCK, StarshipCollection,
  },
  reference::{Edition, NewEdition, ReferenceEntity, ReferenceKind},
  store::CollectionStore,
  starship::{NaturalKey, Starship},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    EDITION_COLUMNS, RawEdition, RawMapping, RawReference, RawStarship,
    decode_uuid, encode_dt, encode_uuid,
  },
  schema::{
    CANONICAL, MIGRATION_INDEXES, REKEYED, SCHEMA, STARSHIP_COLUMNS,
    starship_table,
  },
};

/// Outcome of a closure run on the database thread: the outer result carries
/// SQLite failures, the inner one domain rejections decided inside the
/// transaction.
type Checked<T> = tokio_rusqlite::Result<std::result::Result<T, CoreError>>;

fn table(collection: StarshipCollection) -> &'static str {
  match collection {
    StarshipCollection::Canonical => CANONICAL,
    StarshipCollection::Rekeyed => REKEYED,
  }
}

/// The canonical starship column that holds labels of `kind`.
fn label_column(kind: ReferenceKind) -> &'static str {
  match kind {
    ReferenceKind::Edition => "edition",
    ReferenceKind::Faction => "faction",
    ReferenceKind::Franchise => "franchise",
    ReferenceKind::CollectionType => "collection_type",
    ReferenceKind::Manufacturer => "manufacturer",
  }
}

fn starship_columns() -> impl Iterator<Item = &'static str> {
  STARSHIP_COLUMNS.split(',').map(str::trim)
}

fn insert_starship_row(
  conn: &rusqlite::Connection,
  table: &str,
  raw: &RawStarship,
) -> rusqlite::Result<()> {
  let placeholders = (1..=starship_columns().count())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  conn.execute(
    &format!("INSERT INTO {table} ({STARSHIP_COLUMNS}) VALUES ({placeholders})"),
    &raw.params()[..],
  )?;
  Ok(())
}

fn exists(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params, |_| Ok(())).optional()?.is_some())
}

fn select_edition(
  conn: &rusqlite::Connection,
  filter: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Option<RawEdition>> {
  conn
    .query_row(
      &format!(
        "SELECT {EDITION_COLUMNS} FROM editions WHERE {filter}
         ORDER BY created_at, rowid LIMIT 1"
      ),
      params,
      RawEdition::from_row,
    )
    .optional()
}

/// Clear the default flag on every edition of `franchise` except `keep`.
fn clear_default(
  conn: &rusqlite::Connection,
  franchise: &str,
  keep: &str,
  at: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE editions SET is_default = 0, updated_at = ?3
     WHERE franchise = ?1 AND id != ?2 AND is_default = 1",
    rusqlite::params![franchise, keep, at],
  )?;
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hangar collection store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, flushing the WAL.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(&starship_table(CANONICAL))?;
        conn.execute_batch(&starship_table(REKEYED))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── CollectionStore impl ────────────────────────────────────────────────────

impl CollectionStore for SqliteStore {
  type Error = Error;

  // ── Starships ─────────────────────────────────────────────────────────────

  async fn count_starships(&self, collection: StarshipCollection) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table(collection));
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(n as u64)
  }

  async fn list_starship_ids(
    &self,
    collection: StarshipCollection,
  ) -> Result<Vec<Uuid>> {
    let sql = format!(
      "SELECT id FROM {} ORDER BY created_at, rowid",
      table(collection)
    );
    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn get_starship(
    &self,
    collection: StarshipCollection,
    id: Uuid,
  ) -> Result<Option<Starship>> {
    let sql = format!(
      "SELECT {STARSHIP_COLUMNS} FROM {} WHERE id = ?1",
      table(collection)
    );
    let id_str = encode_uuid(id);

    let raw: Option<RawStarship> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawStarship::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStarship::into_starship).transpose()
  }

  async fn find_starship(&self, key: NaturalKey) -> Result<Option<Starship>> {
    let raw: Option<RawStarship> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {STARSHIP_COLUMNS} FROM {CANONICAL}
                 WHERE issue = ?1 AND edition = ?2"
              ),
              rusqlite::params![key.issue, key.edition],
              RawStarship::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStarship::into_starship).transpose()
  }

  async fn insert_starship(&self, starship: Starship) -> Result<()> {
    let raw = RawStarship::encode(&starship)?;
    let key = starship.natural_key();

    self
      .conn
      .call(move |conn| -> Checked<()> {
        let tx = conn.transaction()?;
        if exists(
          &tx,
          &format!("SELECT 1 FROM {CANONICAL} WHERE issue = ?1 AND edition = ?2"),
          rusqlite::params![raw.issue, raw.edition],
        )? {
          return Ok(Err(CoreError::DuplicateNaturalKey(key)));
        }
        insert_starship_row(&tx, CANONICAL, &raw)?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  async fn update_starship(&self, starship: Starship) -> Result<()> {
    let raw = RawStarship::encode(&starship)?;
    let id = starship.id;
    let assignments = starship_columns()
      .enumerate()
      .skip(1)
      .map(|(i, col)| format!("{col} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");

    self
      .conn
      .call(move |conn| -> Checked<()> {
        let changed = conn.execute(
          &format!("UPDATE {CANONICAL} SET {assignments} WHERE id = ?1"),
          &raw.params()[..],
        )?;
        if changed == 0 {
          return Ok(Err(CoreError::StarshipNotFound(id)));
        }
        Ok(Ok(()))
      })
      .await??;
    Ok(())
  }

  async fn distinct_labels(&self, kind: ReferenceKind) -> Result<BTreeSet<String>> {
    let col = label_column(kind);
    let sql = format!(
      "SELECT DISTINCT {col} FROM {CANONICAL}
       WHERE {col} IS NOT NULL AND TRIM({col}) != ''"
    );

    let labels = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(labels)
  }

  async fn edition_franchises(&self) -> Result<BTreeMap<String, String>> {
    let pairs: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT edition, franchise FROM {CANONICAL}
           WHERE franchise IS NOT NULL AND TRIM(franchise) != ''
           ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut out = BTreeMap::new();
    for (edition, franchise) in pairs {
      out.entry(edition).or_insert(franchise);
    }
    Ok(out)
  }

  // ── Reference tables ──────────────────────────────────────────────────────

  async fn list_references(&self, kind: ReferenceKind) -> Result<Vec<ReferenceEntity>> {
    if kind == ReferenceKind::Edition {
      let raws: Vec<RawEdition> = self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {EDITION_COLUMNS} FROM editions ORDER BY created_at, rowid"
          ))?;
          let rows = stmt
            .query_map([], RawEdition::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      return raws
        .into_iter()
        .map(|raw| raw.into_edition().map(|e| e.as_reference()))
        .collect();
    }

    let kind_str = kind.to_string();
    let raws: Vec<RawReference> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, name, description, created_at FROM reference_entities
           WHERE kind = ?1 ORDER BY created_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str], RawReference::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_reference(kind)).collect()
  }

  async fn add_reference(
    &self,
    kind: ReferenceKind,
    name: String,
    description: Option<String>,
  ) -> Result<ReferenceEntity> {
    if kind == ReferenceKind::Edition {
      return Err(CoreError::EditionNeedsFranchise.into());
    }

    let entity = ReferenceEntity {
      id: Uuid::new_v4(),
      kind,
      name,
      description,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(entity.id);
    let kind_str = kind.to_string();
    let name = entity.name.clone();
    let description = entity.description.clone();
    let at_str = encode_dt(entity.created_at);

    self
      .conn
      .call(move |conn| -> Checked<()> {
        let tx = conn.transaction()?;
        if exists(
          &tx,
          "SELECT 1 FROM reference_entities WHERE kind = ?1 AND name = ?2",
          rusqlite::params![kind_str, name],
        )? {
          return Ok(Err(CoreError::DuplicateReference { kind, name }));
        }
        tx.execute(
          "INSERT INTO reference_entities (id, kind, name, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, kind_str, name, description, at_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(entity)
  }

  async fn delete_unused_references(
    &self,
    kind: ReferenceKind,
    ids: Vec<Uuid>,
  ) -> Result<u64> {
    let kind_str = kind.to_string();
    let ids: Vec<String> = ids.into_iter().map(encode_uuid).collect();
    let col = label_column(kind);
    let unused = format!(
      "name NOT IN (SELECT {col} FROM {CANONICAL} WHERE {col} IS NOT NULL)"
    );

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        for id in &ids {
          removed += if kind == ReferenceKind::Edition {
            tx.execute(
              &format!("DELETE FROM editions WHERE id = ?1 AND {unused}"),
              rusqlite::params![id],
            )?
          } else {
            tx.execute(
              &format!(
                "DELETE FROM reference_entities
                 WHERE id = ?1 AND kind = ?2 AND {unused}"
              ),
              rusqlite::params![id, kind_str],
            )?
          };
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    Ok(removed as u64)
  }

  async fn create_edition(&self, input: NewEdition) -> Result<Edition> {
    let now = Utc::now();
    let edition = Edition {
      id:              Uuid::new_v4(),
      internal_name:   input.resolved_internal_name(),
      name:            input.name,
      description:     input.description,
      retail_price:    input.retail_price,
      franchise:       input.franchise,
      collection_type: input.collection_type,
      is_default:      input.is_default,
      created_at:      now,
      updated_at:      now,
    };

    let e = edition.clone();
    let id_str = encode_uuid(e.id);
    let at_str = encode_dt(now);

    self
      .conn
      .call(move |conn| -> Checked<()> {
        let tx = conn.transaction()?;
        if exists(
          &tx,
          "SELECT 1 FROM editions WHERE name = ?1 AND franchise = ?2",
          rusqlite::params![e.name, e.franchise],
        )? {
          return Ok(Err(CoreError::DuplicateEditionName {
            name:      e.name,
            franchise: e.franchise,
          }));
        }
        if exists(
          &tx,
          "SELECT 1 FROM editions WHERE internal_name = ?1",
          rusqlite::params![e.internal_name],
        )? {
          return Ok(Err(CoreError::DuplicateInternalName(e.internal_name)));
        }
        if e.is_default {
          clear_default(&tx, &e.franchise, &id_str, &at_str)?;
        }
        tx.execute(
          &format!(
            "INSERT INTO editions ({EDITION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)"
          ),
          rusqlite::params![
            id_str,
            e.name,
            e.internal_name,
            e.description,
            e.retail_price,
            e.franchise,
            e.collection_type,
            e.is_default,
            at_str,
          ],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await??;

    Ok(edition)
  }

  async fn upsert_edition(&self, input: NewEdition) -> Result<(Edition, bool)> {
    let internal_name = input.resolved_internal_name();
    let at_str = encode_dt(Utc::now());
    let fresh_id = encode_uuid(Uuid::new_v4());

    let (raw, created) = self
      .conn
      .call(move |conn| -> Checked<(RawEdition, bool)> {
        let tx = conn.transaction()?;
        let existing = select_edition(
          &tx,
          "name = ?1 AND franchise = ?2",
          rusqlite::params![input.name, input.franchise],
        )?;
        let id = existing.as_ref().map_or(fresh_id, |e| e.id.clone());

        if exists(
          &tx,
          "SELECT 1 FROM editions WHERE internal_name = ?1 AND id != ?2",
          rusqlite::params![internal_name, id],
        )? {
          return Ok(Err(CoreError::DuplicateInternalName(internal_name)));
        }
        if input.is_default {
          clear_default(&tx, &input.franchise, &id, &at_str)?;
        }

        if existing.is_some() {
          tx.execute(
            "UPDATE editions SET
               internal_name   = ?2,
               description     = COALESCE(?3, description),
               retail_price    = COALESCE(?4, retail_price),
               collection_type = COALESCE(?5, collection_type),
               is_default      = ?6,
               updated_at      = ?7
             WHERE id = ?1",
            rusqlite::params![
              id,
              internal_name,
              input.description,
              input.retail_price,
              input.collection_type,
              input.is_default,
              at_str,
            ],
          )?;
        } else {
          tx.execute(
            &format!(
              "INSERT INTO editions ({EDITION_COLUMNS})
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)"
            ),
            rusqlite::params![
              id,
              input.name,
              internal_name,
              input.description,
              input.retail_price,
              input.franchise,
              input.collection_type,
              input.is_default,
              at_str,
            ],
          )?;
        }

        let Some(row) = select_edition(&tx, "id = ?1", rusqlite::params![id])?
        else {
          return Err(rusqlite::Error::QueryReturnedNoRows.into());
        };
        tx.commit()?;
        Ok(Ok((row, existing.is_none())))
      })
      .await??;

    Ok((raw.into_edition()?, created))
  }

  async fn get_edition(&self, id: Uuid) -> Result<Option<Edition>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(select_edition(conn, "id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    raw.map(RawEdition::into_edition).transpose()
  }

  async fn find_edition_by_name(
    &self,
    name: String,
    franchise: Option<String>,
  ) -> Result<Option<Edition>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(select_edition(
          conn,
          "name = ?1 AND (?2 IS NULL OR franchise = ?2)",
          rusqlite::params![name, franchise],
        )?)
      })
      .await?;
    raw.map(RawEdition::into_edition).transpose()
  }

  // ── Identifier migration ──────────────────────────────────────────────────

  async fn try_acquire_migration_lock(&self, holder: Uuid) -> Result<bool> {
    let holder_str = encode_uuid(holder);
    let at_str = encode_dt(Utc::now());

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO migration_locks (name, holder, acquired_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![MIGRATION_LOCK, holder_str, at_str],
        )?)
      })
      .await?;
    Ok(inserted == 1)
  }

  async fn release_migration_lock(&self, holder: Uuid) -> Result<()> {
    let holder_str = encode_uuid(holder);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM migration_locks WHERE name = ?1 AND holder = ?2",
          rusqlite::params![MIGRATION_LOCK, holder_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count_mappings(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM id_mappings", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as u64)
  }

  async fn insert_migrated(
    &self,
    mapping: IdentifierMapping,
    record: Starship,
  ) -> Result<()> {
    let m = RawMapping::encode(&mapping);
    let raw = RawStarship::encode(&record)?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO id_mappings (mapping_id, old_id, new_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![m.mapping_id, m.old_id, m.new_id, m.created_at],
        )?;
        insert_starship_row(&tx, REKEYED, &raw)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_mapping(&self, old_id: Uuid) -> Result<Option<IdentifierMapping>> {
    let id_str = encode_uuid(old_id);
    let raw: Option<RawMapping> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT mapping_id, old_id, new_id, created_at FROM id_mappings
               WHERE old_id = ?1",
              rusqlite::params![id_str],
              RawMapping::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawMapping::into_mapping).transpose()
  }

  async fn create_migration_indexes(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(MIGRATION_INDEXES)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn drop_mappings(&self) -> Result<u64> {
    let removed = self
      .conn
      .call(|conn| Ok(conn.execute("DELETE FROM id_mappings", [])?))
      .await?;
    Ok(removed as u64)
  }

  async fn retire_legacy(&self) -> Result<LegacyRetirement> {
    let retirement = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let waiting: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM {REKEYED}"),
          [],
          |r| r.get(0),
        )?;
        if waiting == 0 {
          return Ok(LegacyRetirement::default());
        }

        let removed = tx.execute(&format!("DELETE FROM {CANONICAL}"), [])?;
        let promoted = tx.execute(
          &format!(
            "INSERT INTO {CANONICAL} ({STARSHIP_COLUMNS})
             SELECT {STARSHIP_COLUMNS} FROM {REKEYED}"
          ),
          [],
        )?;
        tx.execute(&format!("DELETE FROM {REKEYED}"), [])?;
        tx.commit()?;

        Ok(LegacyRetirement {
          removed:  removed as u64,
          promoted: promoted as u64,
        })
      })
      .await?;

    tracing::info!(
      removed = retirement.removed,
      promoted = retirement.promoted,
      "retired legacy starship table"
    );
    Ok(retirement)
  }
}
