//! Row normalisation: one [`RawRow`] in, one [`StarshipDraft`] or
//! [`Rejection`] out.

use hangar_core::{
  reference::Edition,
  starship::{Sighting, StarshipDraft},
};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  RawRow, SourceKind,
  coerce::{
    is_blank, parse_date, parse_flag, parse_float, parse_integer, parse_text,
  },
};

/// Why a row did not become a draft. Rejections are counted per row; they
/// never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
  #[error("missing required field {0:?}")]
  MissingField(&'static str),
}

/// Import-wide defaults applied to rows that omit the corresponding field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportContext {
  /// Edition the caller picked. Rows with no `edition` take its name, and
  /// rows naming it are enriched from it rather than by a name lookup.
  pub edition:   Option<Edition>,
  /// Franchise used when a row has no `franchise`.
  pub franchise: Option<String>,
}

impl ImportContext {
  pub fn with_edition(mut self, edition: Edition) -> Self {
    self.edition = Some(edition);
    self
  }

  pub fn with_franchise(mut self, franchise: impl Into<String>) -> Self {
    self.franchise = Some(franchise.into());
    self
  }
}

/// The non-blank value under `key`, if any.
fn field<'a>(row: &'a RawRow, key: &str) -> Option<&'a Value> {
  row.get(key).filter(|v| !is_blank(v))
}

fn text(row: &RawRow, key: &str) -> Option<String> {
  field(row, key).and_then(parse_text)
}

fn required(
  row: &RawRow,
  key: &'static str,
  fallback: Option<&str>,
) -> Result<String, Rejection> {
  text(row, key)
    .or_else(|| {
      fallback.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
    })
    .ok_or(Rejection::MissingField(key))
}

/// Present-but-unrecognised flags read as `false`; absent ones stay `None`.
fn flag(row: &RawRow, key: &str) -> Option<bool> {
  field(row, key).map(|v| parse_flag(v).unwrap_or(false))
}

fn float(row: &RawRow, key: &str) -> Option<f64> {
  field(row, key).and_then(parse_float)
}

fn date(row: &RawRow, key: &str) -> Option<chrono::NaiveDate> {
  field(row, key).and_then(parse_date)
}

/// The raw list under `key`. CSV cells are never list-shaped, so CSV rows
/// leave stored lists alone; a JSON value that is not an array reads as
/// empty.
fn list<'a>(
  row: &'a RawRow,
  key: &str,
  kind: SourceKind,
) -> Option<&'a [Value]> {
  if kind == SourceKind::Csv {
    return None;
  }
  match row.get(key)? {
    Value::Array(items) => Some(items.as_slice()),
    _ => Some(&[] as &[Value]),
  }
}

fn sighting(value: &Value) -> Option<Sighting> {
  let Value::Object(obj) = value else {
    return None;
  };
  let get = |key: &str| obj.get(key).filter(|v| !is_blank(v));

  Some(Sighting {
    id:       Uuid::new_v4(),
    location: get("location").and_then(parse_text)?,
    date:     get("date").and_then(parse_date)?,
    price:    get("price").and_then(parse_float)?,
    url:      get("url").and_then(parse_text),
    notes:    get("notes").and_then(parse_text),
  })
}

/// Normalise one row.
///
/// `issue`, `edition`, `shipName` and `faction` are required; `context`
/// supplies `edition` and `franchise` for rows that lack them. Every optional
/// field that is absent, blank or unparseable is left `None` so that a merge
/// does not touch it.
pub fn normalize(
  row: &RawRow,
  kind: SourceKind,
  context: &ImportContext,
) -> Result<StarshipDraft, Rejection> {
  let issue = required(row, "issue", None)?;
  let edition = required(
    row,
    "edition",
    context.edition.as_ref().map(|e| e.name.as_str()),
  )?;
  let ship_name = required(row, "shipName", None)?;
  let faction = required(row, "faction", None)?;

  let condition_photos = list(row, "conditionPhotos", kind).map(|items| {
    items.iter().filter_map(parse_text).collect::<Vec<_>>()
  });
  let sightings = list(row, "sightings", kind)
    .map(|items| items.iter().filter_map(sighting).collect::<Vec<_>>());

  Ok(StarshipDraft {
    issue,
    edition,
    ship_name,
    faction,
    edition_internal_name: None,
    franchise: text(row, "franchise").or_else(|| context.franchise.clone()),
    collection_type: text(row, "collectionType"),
    manufacturer: text(row, "manufacturer"),
    release_date: date(row, "releaseDate"),
    image_url: text(row, "imageUrl"),
    magazine_pdf_url: text(row, "magazinePdfUrl"),
    owned: flag(row, "owned"),
    wishlist: flag(row, "wishlist"),
    wishlist_priority: field(row, "wishlistPriority").and_then(parse_integer),
    on_order: flag(row, "onOrder"),
    not_interested: flag(row, "notInterested"),
    price_paid: float(row, "pricePaid"),
    order_date: date(row, "orderDate"),
    retail_price: float(row, "retailPrice"),
    purchase_price: float(row, "purchasePrice"),
    market_value: float(row, "marketValue"),
    condition: text(row, "condition"),
    condition_notes: text(row, "conditionNotes"),
    condition_photos,
    last_inspection_date: date(row, "lastInspectionDate"),
    description: text(row, "description"),
    sightings,
  })
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use serde_json::json;

  use super::*;

  fn edition(name: &str, franchise: &str) -> Edition {
    Edition {
      id:              Uuid::new_v4(),
      name:            name.into(),
      internal_name:   hangar_core::reference::edition_internal_name(name, franchise),
      description:     None,
      retail_price:    None,
      franchise:       franchise.into(),
      collection_type: None,
      is_default:      false,
      created_at:      Utc::now(),
      updated_at:      Utc::now(),
    }
  }

  fn row(value: Value) -> RawRow {
    match value {
      Value::Object(map) => map,
      _ => panic!("test rows must be objects"),
    }
  }

  fn base() -> Value {
    json!({
      "issue": "1",
      "edition": "Regular",
      "shipName": "USS Enterprise",
      "faction": "Federation",
    })
  }

  fn with(extra: Value) -> RawRow {
    let mut r = row(base());
    r.extend(row(extra));
    r
  }

  #[test]
  fn minimal_row_leaves_optionals_absent() {
    let d = normalize(&row(base()), SourceKind::Csv, &ImportContext::default())
      .unwrap();
    assert_eq!(d, StarshipDraft::new("1", "Regular", "USS Enterprise", "Federation"));
  }

  #[test]
  fn blank_required_field_is_rejected() {
    let r = with(json!({ "faction": "  " }));
    assert_eq!(
      normalize(&r, SourceKind::Csv, &ImportContext::default()),
      Err(Rejection::MissingField("faction"))
    );
  }

  #[test]
  fn context_fills_edition_before_required_check() {
    let mut r = row(base());
    r.remove("edition");
    let ctx = ImportContext::default()
      .with_edition(edition("Special", "Star Trek"))
      .with_franchise("Star Trek");

    let d = normalize(&r, SourceKind::Csv, &ctx).unwrap();
    assert_eq!(d.edition, "Special");
    assert_eq!(d.franchise.as_deref(), Some("Star Trek"));

    assert_eq!(
      normalize(&r, SourceKind::Csv, &ImportContext::default()),
      Err(Rejection::MissingField("edition"))
    );
  }

  #[test]
  fn row_values_beat_context() {
    let r = with(json!({ "franchise": "Star Wars" }));
    let ctx = ImportContext::default()
      .with_edition(edition("Special", "Star Trek"))
      .with_franchise("Star Trek");
    let d = normalize(&r, SourceKind::Csv, &ctx).unwrap();
    assert_eq!(d.edition, "Regular");
    assert_eq!(d.franchise.as_deref(), Some("Star Wars"));
  }

  #[test]
  fn flags_absent_blank_and_unrecognised() {
    let r = with(json!({
      "owned": "TRUE",
      "wishlist": "",
      "onOrder": "maybe",
    }));
    let d = normalize(&r, SourceKind::Csv, &ImportContext::default()).unwrap();
    assert_eq!(d.owned, Some(true));
    assert_eq!(d.wishlist, None);
    assert_eq!(d.on_order, Some(false));
    assert_eq!(d.not_interested, None);
  }

  #[test]
  fn invalid_numbers_are_omitted_not_zeroed() {
    let r = with(json!({
      "pricePaid": "abc",
      "marketValue": "19.99",
      "wishlistPriority": "2",
      "retailPrice": 12,
    }));
    let d = normalize(&r, SourceKind::Csv, &ImportContext::default()).unwrap();
    assert_eq!(d.price_paid, None);
    assert_eq!(d.market_value, Some(19.99));
    assert_eq!(d.wishlist_priority, Some(2));
    assert_eq!(d.retail_price, Some(12.0));
  }

  #[test]
  fn dates_follow_the_attempt_order() {
    let r = with(json!({
      "releaseDate": "15/03/2024",
      "orderDate": "not-a-date",
    }));
    let d = normalize(&r, SourceKind::Csv, &ImportContext::default()).unwrap();
    assert_eq!(d.release_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    assert_eq!(d.order_date, None);
  }

  #[test]
  fn csv_rows_never_carry_lists() {
    let r = with(json!({ "conditionPhotos": "a.jpg" }));
    let d = normalize(&r, SourceKind::Csv, &ImportContext::default()).unwrap();
    assert_eq!(d.condition_photos, None);
    assert_eq!(d.sightings, None);
  }

  #[test]
  fn json_lists_default_to_empty_and_skip_bad_sightings() {
    let r = with(json!({
      "conditionPhotos": "not-a-list",
      "sightings": [
        { "location": "eBay", "date": "2024-01-02", "price": "30" },
        { "location": "Shop", "date": "nope", "price": 10 },
        { "date": "2024-01-02", "price": 10 },
        "garbage",
      ],
    }));
    let d = normalize(&r, SourceKind::Json, &ImportContext::default()).unwrap();
    assert_eq!(d.condition_photos, Some(vec![]));

    let sightings = d.sightings.unwrap();
    assert_eq!(sightings.len(), 1);
    assert_eq!(sightings[0].location, "eBay");
    assert_eq!(sightings[0].price, 30.0);
    assert_eq!(sightings[0].url, None);
  }

  #[test]
  fn json_numbers_in_text_fields_are_read() {
    let mut r = row(base());
    r.insert("issue".into(), json!(12));
    let d = normalize(&r, SourceKind::Json, &ImportContext::default()).unwrap();
    assert_eq!(d.issue, "12");
  }
}
