//! Reference entities: the lookup tables starships refer to by name.
//!
//! Factions, franchises, collection types and manufacturers carry only a name
//! and a description. Editions additionally carry pricing defaults, a franchise
//! and a globally unique internal name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which reference table an entity lives in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReferenceKind {
  Edition,
  Faction,
  Franchise,
  CollectionType,
  Manufacturer,
}

impl ReferenceKind {
  /// Key used for this table in JSON reports.
  pub fn report_key(self) -> &'static str {
    match self {
      Self::Edition => "editions",
      Self::Faction => "factions",
      Self::Franchise => "franchises",
      Self::CollectionType => "collectionTypes",
      Self::Manufacturer => "manufacturers",
    }
  }

  /// Human-readable plural for log lines and action descriptions.
  pub fn label(self) -> &'static str {
    match self {
      Self::Edition => "editions",
      Self::Faction => "factions",
      Self::Franchise => "franchises",
      Self::CollectionType => "collection types",
      Self::Manufacturer => "manufacturers",
    }
  }
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// The name-bearing view of any reference row, editions included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntity {
  pub id:          Uuid,
  pub kind:        ReferenceKind,
  pub name:        String,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// A publication line within a franchise (e.g. "Regular", "Special Issue").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edition {
  pub id:              Uuid,
  /// Display name; unique together with `franchise`.
  pub name:            String,
  /// Globally unique slug, `<name>-<franchise>` unless given explicitly.
  pub internal_name:   String,
  pub description:     Option<String>,
  /// Default retail price for items of this edition.
  pub retail_price:    Option<f64>,
  pub franchise:       String,
  pub collection_type: Option<String>,
  /// At most one edition per franchise is the default.
  pub is_default:      bool,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

impl Edition {
  pub fn as_reference(&self) -> ReferenceEntity {
    ReferenceEntity {
      id:          self.id,
      kind:        ReferenceKind::Edition,
      name:        self.name.clone(),
      description: self.description.clone(),
      created_at:  self.created_at,
    }
  }
}

/// Input to edition creation and edition upserts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEdition {
  pub name:            String,
  pub franchise:       String,
  #[serde(default)]
  pub internal_name:   Option<String>,
  #[serde(default)]
  pub description:     Option<String>,
  #[serde(default)]
  pub retail_price:    Option<f64>,
  #[serde(default)]
  pub collection_type: Option<String>,
  #[serde(default)]
  pub is_default:      bool,
}

impl NewEdition {
  pub fn new(name: impl Into<String>, franchise: impl Into<String>) -> Self {
    Self { name: name.into(), franchise: franchise.into(), ..Self::default() }
  }

  /// The explicit internal name if one was given, else the generated slug.
  pub fn resolved_internal_name(&self) -> String {
    match self.internal_name.as_deref().map(str::trim) {
      Some(given) if !given.is_empty() => given.to_owned(),
      _ => edition_internal_name(&self.name, &self.franchise),
    }
  }
}

// ─── Internal names ──────────────────────────────────────────────────────────

/// Lowercase, collapse whitespace runs into `-`, drop everything that is not
/// a word character or `-`.
pub fn slug(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut in_space = false;
  for c in input.to_lowercase().chars() {
    if c.is_whitespace() {
      if !in_space {
        out.push('-');
        in_space = true;
      }
      continue;
    }
    in_space = false;
    if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
      out.push(c);
    }
  }
  out
}

pub fn edition_internal_name(name: &str, franchise: &str) -> String {
  format!("{}-{}", slug(name), slug(franchise))
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn slug_matches_stored_internal_names() {
    assert_eq!(slug("Star Trek"), "star-trek");
    assert_eq!(slug("  Special   Issue! "), "-special-issue-");
    assert_eq!(edition_internal_name("Regular", "Star Trek"), "regular-star-trek");
    assert_eq!(
      edition_internal_name("XL Edition", "Battlestar Galactica"),
      "xl-edition-battlestar-galactica"
    );
  }

  #[test]
  fn explicit_internal_name_wins() {
    let mut e = NewEdition::new("Regular", "Star Trek");
    assert_eq!(e.resolved_internal_name(), "regular-star-trek");
    e.internal_name = Some("st-regular".into());
    assert_eq!(e.resolved_internal_name(), "st-regular");
    e.internal_name = Some("   ".into());
    assert_eq!(e.resolved_internal_name(), "regular-star-trek");
  }

  #[test]
  fn kinds_parse_from_snake_case() {
    assert_eq!(
      ReferenceKind::from_str("collection_type").unwrap(),
      ReferenceKind::CollectionType
    );
    assert_eq!(ReferenceKind::Manufacturer.to_string(), "manufacturer");
    assert_eq!(ReferenceKind::iter().count(), 5);
  }
}
