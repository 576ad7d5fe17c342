//! SQL schema for the Hangar SQLite store.
//!
//! Executed once at connection startup. The canonical and re-keyed starship
//! tables share one column layout so that legacy retirement can move rows
//! between them with a plain `INSERT … SELECT`.

/// Canonical starship table: the store imports write to.
pub const CANONICAL: &str = "starships";

/// Identifier migration target.
pub const REKEYED: &str = "starships_rekeyed";

/// Column list shared by both starship tables, in DDL order.
pub const STARSHIP_COLUMNS: &str = "
    id, original_id, issue, edition, edition_internal_name, ship_name,
    faction, franchise, collection_type, manufacturer, release_date,
    image_url, magazine_pdf_url, owned, wishlist, wishlist_priority,
    on_order, not_interested, price_paid, order_date, retail_price,
    purchase_price, market_value, condition, condition_notes,
    condition_photos, last_inspection_date, description, sightings,
    created_at, updated_at";

/// DDL for one starship table. Dates are `YYYY-MM-DD`, timestamps RFC 3339,
/// list fields compact JSON.
pub fn starship_table(table: &str) -> String {
  format!(
    "
CREATE TABLE IF NOT EXISTS {table} (
    id                    TEXT PRIMARY KEY,
    original_id           TEXT,
    issue                 TEXT NOT NULL,
    edition               TEXT NOT NULL,
    edition_internal_name TEXT,
    ship_name             TEXT NOT NULL,
    faction               TEXT NOT NULL,
    franchise             TEXT,
    collection_type       TEXT,
    manufacturer          TEXT,
    release_date          TEXT,
    image_url             TEXT,
    magazine_pdf_url      TEXT,
    owned                 INTEGER NOT NULL DEFAULT 0,
    wishlist              INTEGER NOT NULL DEFAULT 0,
    wishlist_priority     INTEGER NOT NULL DEFAULT 0,
    on_order              INTEGER NOT NULL DEFAULT 0,
    not_interested        INTEGER NOT NULL DEFAULT 0,
    price_paid            REAL,
    order_date            TEXT,
    retail_price          REAL,
    purchase_price        REAL,
    market_value          REAL,
    condition             TEXT,
    condition_notes       TEXT,
    condition_photos      TEXT NOT NULL DEFAULT '[]',
    last_inspection_date  TEXT,
    description           TEXT,
    sightings             TEXT NOT NULL DEFAULT '[]',
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL,
    UNIQUE (issue, edition)
);
"
  )
}

/// Everything except the starship tables; idempotent thanks to
/// `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Write-once old-id -> new-id pairs. Indexed by the migration itself.
CREATE TABLE IF NOT EXISTS id_mappings (
    mapping_id TEXT PRIMARY KEY,
    old_id     TEXT NOT NULL,
    new_id     TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Advisory locks, acquired by INSERT OR IGNORE on the primary key.
CREATE TABLE IF NOT EXISTS migration_locks (
    name        TEXT PRIMARY KEY,
    holder      TEXT NOT NULL,
    acquired_at TEXT NOT NULL
);

-- Factions, franchises, collection types and manufacturers.
CREATE TABLE IF NOT EXISTS reference_entities (
    id          TEXT PRIMARY KEY,
    kind        TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (kind, name)
);

CREATE TABLE IF NOT EXISTS editions (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    internal_name   TEXT NOT NULL UNIQUE,
    description     TEXT,
    retail_price    REAL,
    franchise       TEXT NOT NULL,
    collection_type TEXT,
    is_default      INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE (name, franchise)
);

PRAGMA user_version = 1;
";

/// Indexes created on the re-keyed table once a migration has copied every
/// record, mirroring the canonical access patterns.
pub const MIGRATION_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS starships_rekeyed_original_id_idx ON starships_rekeyed(original_id);
CREATE INDEX IF NOT EXISTS starships_rekeyed_issue_idx       ON starships_rekeyed(issue);
CREATE INDEX IF NOT EXISTS starships_rekeyed_edition_idx     ON starships_rekeyed(edition);
CREATE INDEX IF NOT EXISTS starships_rekeyed_ship_name_idx   ON starships_rekeyed(ship_name);
CREATE INDEX IF NOT EXISTS starships_rekeyed_faction_idx     ON starships_rekeyed(faction);
CREATE INDEX IF NOT EXISTS starships_rekeyed_owned_idx       ON starships_rekeyed(owned);
CREATE INDEX IF NOT EXISTS starships_rekeyed_wishlist_idx    ON starships_rekeyed(wishlist);
CREATE INDEX IF NOT EXISTS starships_rekeyed_on_order_idx    ON starships_rekeyed(on_order);

CREATE UNIQUE INDEX IF NOT EXISTS id_mappings_old_id_idx ON id_mappings(old_id);
CREATE UNIQUE INDEX IF NOT EXISTS id_mappings_new_id_idx ON id_mappings(new_id);
";

/// Index names created by [`MIGRATION_INDEXES`]; exposed for tests.
#[cfg(test)]
pub const MIGRATION_INDEX_NAMES: [&str; 10] = [
  "starships_rekeyed_original_id_idx",
  "starships_rekeyed_issue_idx",
  "starships_rekeyed_edition_idx",
  "starships_rekeyed_ship_name_idx",
  "starships_rekeyed_faction_idx",
  "starships_rekeyed_owned_idx",
  "starships_rekeyed_wishlist_idx",
  "starships_rekeyed_on_order_idx",
  "id_mappings_old_id_idx",
  "id_mappings_new_id_idx",
];
