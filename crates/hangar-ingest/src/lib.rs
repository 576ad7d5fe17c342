//! Bulk-input codec for Hangar.
//!
//! Turns CSV and JSON uploads into typed
//! [`StarshipDraft`](hangar_core::starship::StarshipDraft)s and renders the
//! CSV import template. Pure synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use hangar_ingest::{ImportContext, SourceKind, decode, normalize};
//!
//! let csv = "issue,edition,shipName,faction\n1,Regular,USS Enterprise,Federation\n";
//! let rows = decode(csv.as_bytes(), SourceKind::Csv).unwrap();
//! let draft = normalize(&rows[0], SourceKind::Csv, &ImportContext::default()).unwrap();
//! assert_eq!(draft.ship_name, "USS Enterprise");
//! ```

pub mod coerce;
mod decode;
mod editions;
pub mod error;
mod normalize;
mod template;

pub use decode::{decode_csv, decode_json};
pub use editions::{EditionRows, decode_editions_csv};
pub use error::{Error, Result};
pub use normalize::{ImportContext, Rejection, normalize};
pub use template::{TEMPLATE_COLUMNS, encode_template};

/// One untyped input row: column/key name → scalar (or, for JSON, any value).
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// The declared shape of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  Csv,
  Json,
}

impl SourceKind {
  /// Pick the source kind from an uploaded file's name.
  pub fn from_filename(filename: &str) -> Result<Self> {
    let lower = filename.trim().to_ascii_lowercase();
    if lower.ends_with(".csv") {
      Ok(Self::Csv)
    } else if lower.ends_with(".json") {
      Ok(Self::Json)
    } else {
      Err(Error::UnsupportedFormat(filename.to_owned()))
    }
  }
}

/// Decode an upload into raw rows.
pub fn decode(input: &[u8], kind: SourceKind) -> Result<Vec<RawRow>> {
  let text = std::str::from_utf8(input).map_err(|_| Error::NotUtf8)?;
  let text = text.strip_prefix('\u{feff}').unwrap_or(text);
  match kind {
    SourceKind::Csv => decode_csv(text),
    SourceKind::Json => decode_json(text),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_kind_from_extension() {
    assert_eq!(SourceKind::from_filename("ships.CSV").unwrap(), SourceKind::Csv);
    assert_eq!(SourceKind::from_filename("backup.json").unwrap(), SourceKind::Json);
    assert!(matches!(
      SourceKind::from_filename("ships.xlsx"),
      Err(Error::UnsupportedFormat(_))
    ));
  }

  #[test]
  fn decode_rejects_invalid_utf8() {
    let err = decode(&[0xff, 0xfe, 0x00], SourceKind::Csv).unwrap_err();
    assert!(matches!(err, Error::NotUtf8));
  }

  #[test]
  fn rejected_rows_keep_their_position() {
    let csv = "issue,edition,shipName,faction\n\
               1,Regular,USS Enterprise,Federation\n\
               2,Regular,,Klingon\n\
               3,Regular,Bird of Prey,Klingon\n";
    let rows = decode(csv.as_bytes(), SourceKind::Csv).unwrap();
    let drafts: Vec<_> = rows
      .iter()
      .map(|row| normalize(row, SourceKind::Csv, &ImportContext::default()))
      .collect();

    assert_eq!(drafts.len(), 3);
    assert!(drafts[0].is_ok());
    assert_eq!(drafts[1], Err(Rejection::MissingField("shipName")));
    assert_eq!(drafts[2].as_ref().unwrap().issue, "3");
  }
}
