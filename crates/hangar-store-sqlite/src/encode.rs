//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`, UUIDs
//! hyphenated lowercase. List fields (condition photos, sightings) are stored
//! as compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use hangar_core::{
  migration::IdentifierMapping,
  reference::{Edition, ReferenceEntity, ReferenceKind},
  starship::{Sighting, Starship},
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Starships ───────────────────────────────────────────────────────────────

/// Column values of one starship row, in [`crate::schema::STARSHIP_COLUMNS`]
/// order.
pub struct RawStarship {
  pub id:                    String,
  pub original_id:           Option<String>,
  pub issue:                 String,
  pub edition:               String,
  pub edition_internal_name: Option<String>,
  pub ship_name:             String,
  pub faction:               String,
  pub franchise:             Option<String>,
  pub collection_type:       Option<String>,
  pub manufacturer:          Option<String>,
  pub release_date:          Option<String>,
  pub image_url:             Option<String>,
  pub magazine_pdf_url:      Option<String>,
  pub owned:                 bool,
  pub wishlist:              bool,
  pub wishlist_priority:     i32,
  pub on_order:              bool,
  pub not_interested:        bool,
  pub price_paid:            Option<f64>,
  pub order_date:            Option<String>,
  pub retail_price:          Option<f64>,
  pub purchase_price:        Option<f64>,
  pub market_value:          Option<f64>,
  pub condition:             Option<String>,
  pub condition_notes:       Option<String>,
  pub condition_photos:      String,
  pub last_inspection_date:  Option<String>,
  pub description:           Option<String>,
  pub sightings:             String,
  pub created_at:            String,
  pub updated_at:            String,
}

impl RawStarship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      original_id:           row.get(1)?,
      issue:                 row.get(2)?,
      edition:               row.get(3)?,
      edition_internal_name: row.get(4)?,
      ship_name:             row.get(5)?,
      faction:               row.get(6)?,
      franchise:             row.get(7)?,
      collection_type:       row.get(8)?,
      manufacturer:          row.get(9)?,
      release_date:          row.get(10)?,
      image_url:             row.get(11)?,
      magazine_pdf_url:      row.get(12)?,
      owned:                 row.get(13)?,
      wishlist:              row.get(14)?,
      wishlist_priority:     row.get(15)?,
      on_order:              row.get(16)?,
      not_interested:        row.get(17)?,
      price_paid:            row.get(18)?,
      order_date:            row.get(19)?,
      retail_price:          row.get(20)?,
      purchase_price:        row.get(21)?,
      market_value:          row.get(22)?,
      condition:             row.get(23)?,
      condition_notes:       row.get(24)?,
      condition_photos:      row.get(25)?,
      last_inspection_date:  row.get(26)?,
      description:           row.get(27)?,
      sightings:             row.get(28)?,
      created_at:            row.get(29)?,
      updated_at:            row.get(30)?,
    })
  }

  pub fn encode(s: &Starship) -> Result<Self> {
    Ok(Self {
      id:                    encode_uuid(s.id),
      original_id:           s.original_id.map(encode_uuid),
      issue:                 s.issue.clone(),
      edition:               s.edition.clone(),
      edition_internal_name: s.edition_internal_name.clone(),
      ship_name:             s.ship_name.clone(),
      faction:               s.faction.clone(),
      franchise:             s.franchise.clone(),
      collection_type:       s.collection_type.clone(),
      manufacturer:          s.manufacturer.clone(),
      release_date:          s.release_date.map(encode_date),
      image_url:             s.image_url.clone(),
      magazine_pdf_url:      s.magazine_pdf_url.clone(),
      owned:                 s.owned,
      wishlist:              s.wishlist,
      wishlist_priority:     s.wishlist_priority,
      on_order:              s.on_order,
      not_interested:        s.not_interested,
      price_paid:            s.price_paid,
      order_date:            s.order_date.map(encode_date),
      retail_price:          s.retail_price,
      purchase_price:        s.purchase_price,
      market_value:          s.market_value,
      condition:             s.condition.clone(),
      condition_notes:       s.condition_notes.clone(),
      condition_photos:      serde_json::to_string(&s.condition_photos)?,
      last_inspection_date:  s.last_inspection_date.map(encode_date),
      description:           s.description.clone(),
      sightings:             serde_json::to_string(&s.sightings)?,
      created_at:            encode_dt(s.created_at),
      updated_at:            encode_dt(s.updated_at),
    })
  }

  /// Bind as `?1..?31` in column order.
  pub fn params(&self) -> [&dyn rusqlite::ToSql; 31] {
    [
      &self.id,
      &self.original_id,
      &self.issue,
      &self.edition,
      &self.edition_internal_name,
      &self.ship_name,
      &self.faction,
      &self.franchise,
      &self.collection_type,
      &self.manufacturer,
      &self.release_date,
      &self.image_url,
      &self.magazine_pdf_url,
      &self.owned,
      &self.wishlist,
      &self.wishlist_priority,
      &self.on_order,
      &self.not_interested,
      &self.price_paid,
      &self.order_date,
      &self.retail_price,
      &self.purchase_price,
      &self.market_value,
      &self.condition,
      &self.condition_notes,
      &self.condition_photos,
      &self.last_inspection_date,
      &self.description,
      &self.sightings,
      &self.created_at,
      &self.updated_at,
    ]
  }

  pub fn into_starship(self) -> Result<Starship> {
    let condition_photos: Vec<String> =
      serde_json::from_str(&self.condition_photos)?;
    let sightings: Vec<Sighting> = serde_json::from_str(&self.sightings)?;

    Ok(Starship {
      id: decode_uuid(&self.id)?,
      original_id: self.original_id.as_deref().map(decode_uuid).transpose()?,
      issue: self.issue,
      edition: self.edition,
      edition_internal_name: self.edition_internal_name,
      ship_name: self.ship_name,
      faction: self.faction,
      franchise: self.franchise,
      collection_type: self.collection_type,
      manufacturer: self.manufacturer,
      release_date: decode_opt_date(self.release_date)?,
      image_url: self.image_url,
      magazine_pdf_url: self.magazine_pdf_url,
      owned: self.owned,
      wishlist: self.wishlist,
      wishlist_priority: self.wishlist_priority,
      on_order: self.on_order,
      not_interested: self.not_interested,
      price_paid: self.price_paid,
      order_date: decode_opt_date(self.order_date)?,
      retail_price: self.retail_price,
      purchase_price: self.purchase_price,
      market_value: self.market_value,
      condition: self.condition,
      condition_notes: self.condition_notes,
      condition_photos,
      last_inspection_date: decode_opt_date(self.last_inspection_date)?,
      description: self.description,
      sightings,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Reference rows ──────────────────────────────────────────────────────────

pub const EDITION_COLUMNS: &str = "id, name, internal_name, description, \
  retail_price, franchise, collection_type, is_default, created_at, updated_at";

pub struct RawEdition {
  pub id:              String,
  pub name:            String,
  pub internal_name:   String,
  pub description:     Option<String>,
  pub retail_price:    Option<f64>,
  pub franchise:       String,
  pub collection_type: Option<String>,
  pub is_default:      bool,
  pub created_at:      String,
  pub updated_at:      String,
}

impl RawEdition {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      name:            row.get(1)?,
      internal_name:   row.get(2)?,
      description:     row.get(3)?,
      retail_price:    row.get(4)?,
      franchise:       row.get(5)?,
      collection_type: row.get(6)?,
      is_default:      row.get(7)?,
      created_at:      row.get(8)?,
      updated_at:      row.get(9)?,
    })
  }

  pub fn into_edition(self) -> Result<Edition> {
    Ok(Edition {
      id:              decode_uuid(&self.id)?,
      name:            self.name,
      internal_name:   self.internal_name,
      description:     self.description,
      retail_price:    self.retail_price,
      franchise:       self.franchise,
      collection_type: self.collection_type,
      is_default:      self.is_default,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawReference {
  pub id:          String,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawReference {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      created_at:  row.get(3)?,
    })
  }

  pub fn into_reference(self, kind: ReferenceKind) -> Result<ReferenceEntity> {
    Ok(ReferenceEntity {
      id: decode_uuid(&self.id)?,
      kind,
      name: self.name,
      description: self.description,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawMapping {
  pub mapping_id: String,
  pub old_id:     String,
  pub new_id:     String,
  pub created_at: String,
}

impl RawMapping {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      mapping_id: row.get(0)?,
      old_id:     row.get(1)?,
      new_id:     row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn encode(m: &IdentifierMapping) -> Self {
    Self {
      mapping_id: encode_uuid(m.mapping_id),
      old_id:     encode_uuid(m.old_id),
      new_id:     encode_uuid(m.new_id),
      created_at: encode_dt(m.created_at),
    }
  }

  pub fn into_mapping(self) -> Result<IdentifierMapping> {
    Ok(IdentifierMapping {
      mapping_id: decode_uuid(&self.mapping_id)?,
      old_id:     decode_uuid(&self.old_id)?,
      new_id:     decode_uuid(&self.new_id)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
