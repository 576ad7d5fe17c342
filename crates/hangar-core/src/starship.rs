//! Starship, the canonical collection record.
//!
//! A starship is identified by an opaque UUID but is unique on its natural
//! key, the pair (issue, edition name). Bulk ingestion never addresses records
//! by id; it produces [`StarshipDraft`]s which are merged by natural key.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Natural key ─────────────────────────────────────────────────────────────

/// The business uniqueness key of a [`Starship`].
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NaturalKey {
  pub issue:   String,
  /// The edition's display name, not its internal name.
  pub edition: String,
}

impl NaturalKey {
  pub fn new(issue: impl Into<String>, edition: impl Into<String>) -> Self {
    Self { issue: issue.into(), edition: edition.into() }
  }
}

impl fmt::Display for NaturalKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({:?}, {:?})", self.issue, self.edition)
  }
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

/// A market sighting: where an item was seen for sale, when, and at what
/// price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sighting {
  pub id:       Uuid,
  pub location: String,
  pub date:     NaiveDate,
  pub price:    f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:    Option<String>,
}

// ─── Starship ────────────────────────────────────────────────────────────────

/// A persisted collection record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Starship {
  pub id:                    Uuid,
  /// Identity this record had before an identifier migration, if any.
  pub original_id:           Option<Uuid>,
  pub issue:                 String,
  pub edition:               String,
  pub edition_internal_name: Option<String>,
  pub ship_name:             String,
  pub faction:               String,
  pub franchise:             Option<String>,
  pub collection_type:       Option<String>,
  pub manufacturer:          Option<String>,
  pub release_date:          Option<NaiveDate>,
  pub image_url:             Option<String>,
  pub magazine_pdf_url:      Option<String>,
  pub owned:                 bool,
  pub wishlist:              bool,
  /// Lower numbers are more wanted; 0 means unranked.
  pub wishlist_priority:     i32,
  pub on_order:              bool,
  pub not_interested:        bool,
  pub price_paid:            Option<f64>,
  pub order_date:            Option<NaiveDate>,
  pub retail_price:          Option<f64>,
  pub purchase_price:        Option<f64>,
  pub market_value:          Option<f64>,
  pub condition:             Option<String>,
  pub condition_notes:       Option<String>,
  pub condition_photos:      Vec<String>,
  pub last_inspection_date:  Option<NaiveDate>,
  pub description:           Option<String>,
  pub sightings:             Vec<Sighting>,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
}

impl Starship {
  pub fn natural_key(&self) -> NaturalKey {
    NaturalKey::new(self.issue.clone(), self.edition.clone())
  }

  /// A full copy of this record under `new_id`, remembering the identity it
  /// was copied from.
  pub fn rekeyed(&self, new_id: Uuid, at: DateTime<Utc>) -> Starship {
    Starship {
      id: new_id,
      original_id: Some(self.id),
      updated_at: at,
      ..self.clone()
    }
  }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// A typed candidate produced by normalising one bulk-input row.
///
/// The four natural/required fields are always present. Every other field is
/// `None` when the input did not carry it, which lets an upsert leave the
/// stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarshipDraft {
  pub issue:                 String,
  pub edition:               String,
  pub ship_name:             String,
  pub faction:               String,
  pub edition_internal_name: Option<String>,
  pub franchise:             Option<String>,
  pub collection_type:       Option<String>,
  pub manufacturer:          Option<String>,
  pub release_date:          Option<NaiveDate>,
  pub image_url:             Option<String>,
  pub magazine_pdf_url:      Option<String>,
  pub owned:                 Option<bool>,
  pub wishlist:              Option<bool>,
  pub wishlist_priority:     Option<i32>,
  pub on_order:              Option<bool>,
  pub not_interested:        Option<bool>,
  pub price_paid:            Option<f64>,
  pub order_date:            Option<NaiveDate>,
  pub retail_price:          Option<f64>,
  pub purchase_price:        Option<f64>,
  pub market_value:          Option<f64>,
  pub condition:             Option<String>,
  pub condition_notes:       Option<String>,
  pub condition_photos:      Option<Vec<String>>,
  pub last_inspection_date:  Option<NaiveDate>,
  pub description:           Option<String>,
  pub sightings:             Option<Vec<Sighting>>,
}

impl StarshipDraft {
  /// Convenience constructor with every optional field absent.
  pub fn new(
    issue: impl Into<String>,
    edition: impl Into<String>,
    ship_name: impl Into<String>,
    faction: impl Into<String>,
  ) -> Self {
    Self {
      issue: issue.into(),
      edition: edition.into(),
      ship_name: ship_name.into(),
      faction: faction.into(),
      ..Self::default()
    }
  }

  pub fn natural_key(&self) -> NaturalKey {
    NaturalKey::new(self.issue.clone(), self.edition.clone())
  }

  /// Build a brand-new record, defaulting every field the draft omitted.
  pub fn into_starship(self, id: Uuid, now: DateTime<Utc>) -> Starship {
    Starship {
      id,
      original_id: None,
      issue: self.issue,
      edition: self.edition,
      edition_internal_name: self.edition_internal_name,
      ship_name: self.ship_name,
      faction: self.faction,
      franchise: self.franchise,
      collection_type: self.collection_type,
      manufacturer: self.manufacturer,
      release_date: self.release_date,
      image_url: self.image_url,
      magazine_pdf_url: self.magazine_pdf_url,
      owned: self.owned.unwrap_or(false),
      wishlist: self.wishlist.unwrap_or(false),
      wishlist_priority: self.wishlist_priority.unwrap_or(0),
      on_order: self.on_order.unwrap_or(false),
      not_interested: self.not_interested.unwrap_or(false),
      price_paid: self.price_paid,
      order_date: self.order_date,
      retail_price: self.retail_price,
      purchase_price: self.purchase_price,
      market_value: self.market_value,
      condition: self.condition,
      condition_notes: self.condition_notes,
      condition_photos: self.condition_photos.unwrap_or_default(),
      last_inspection_date: self.last_inspection_date,
      description: self.description,
      sightings: self.sightings.unwrap_or_default(),
      created_at: now,
      updated_at: now,
    }
  }

  /// Partial merge: overwrite the fields this draft carries, leave the rest.
  ///
  /// Identity, `original_id` and `created_at` are never touched.
  pub fn merge_into(self, target: &mut Starship, now: DateTime<Utc>) {
    macro_rules! overwrite {
      ($src:ident; $($field:ident),* $(,)?) => {
        $( if let Some(v) = $src.$field { target.$field = Some(v); } )*
      };
    }
    macro_rules! overwrite_plain {
      ($src:ident; $($field:ident),* $(,)?) => {
        $( if let Some(v) = $src.$field { target.$field = v; } )*
      };
    }

    let draft = self;
    target.issue = draft.issue;
    target.edition = draft.edition;
    target.ship_name = draft.ship_name;
    target.faction = draft.faction;

    overwrite!(
      draft;
      edition_internal_name,
      franchise,
      collection_type,
      manufacturer,
      release_date,
      image_url,
      magazine_pdf_url,
      price_paid,
      order_date,
      retail_price,
      purchase_price,
      market_value,
      condition,
      condition_notes,
      last_inspection_date,
      description,
    );
    overwrite_plain!(
      draft;
      owned,
      wishlist,
      wishlist_priority,
      on_order,
      not_interested,
      condition_photos,
      sightings,
    );

    target.updated_at = now;
  }
}
