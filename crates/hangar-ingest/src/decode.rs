//! CSV and JSON decoding into [`RawRow`]s.

use serde_json::Value;

use crate::{Error, RawRow, Result};

/// Column titles used by spreadsheet exports, mapped to row keys.
const HEADER_ALIASES: &[(&str, &str)] = &[
  ("Issue", "issue"),
  ("Edition", "edition"),
  ("Ship Name", "shipName"),
  ("Race/Faction", "faction"),
  ("Release Date", "releaseDate"),
  ("Image", "imageUrl"),
];

fn canonical_header(raw: &str) -> String {
  let trimmed = raw.trim();
  HEADER_ALIASES
    .iter()
    .find(|(alias, _)| *alias == trimmed)
    .map(|(_, key)| (*key).to_owned())
    .unwrap_or_else(|| trimmed.to_owned())
}

/// Decode a CSV document with a header row. Every cell becomes a JSON string;
/// rows whose cells are all blank are skipped.
pub fn decode_csv(input: &str) -> Result<Vec<RawRow>> {
  let mut reader = csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .trim(csv::Trim::Headers)
    .from_reader(input.as_bytes());

  let headers: Vec<String> =
    reader.headers()?.iter().map(canonical_header).collect();

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record?;
    if record.iter().all(|cell| cell.trim().is_empty()) {
      continue;
    }

    let mut row = RawRow::new();
    for (header, cell) in headers.iter().zip(record.iter()) {
      if header.is_empty() {
        continue;
      }
      row.insert(header.clone(), Value::String(cell.to_owned()));
    }
    rows.push(row);
  }

  Ok(rows)
}

/// Decode a JSON document that must be an array of objects. Store-assigned
/// identity keys (`_id`, `id`) are dropped so they can never collide with
/// the target store's identifiers.
pub fn decode_json(input: &str) -> Result<Vec<RawRow>> {
  let Value::Array(items) = serde_json::from_str::<Value>(input)? else {
    return Err(Error::NotAnArray);
  };

  items
    .into_iter()
    .enumerate()
    .map(|(index, item)| match item {
      Value::Object(mut map) => {
        map.remove("_id");
        map.remove("id");
        Ok(map)
      }
      _ => Err(Error::NotAnObject(index)),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn csv_headers_are_trimmed_and_aliased() {
    let csv = " Issue ,Edition,Ship Name,Race/Faction,Release Date,notes\n\
               12,Regular,Defiant,Federation,15/03/2024,hi\n";
    let rows = decode_csv(csv).unwrap();
    assert_eq!(rows.len(), 1);

    let row = &rows[0];
    assert_eq!(row["issue"], "12");
    assert_eq!(row["edition"], "Regular");
    assert_eq!(row["shipName"], "Defiant");
    assert_eq!(row["faction"], "Federation");
    assert_eq!(row["releaseDate"], "15/03/2024");
    assert_eq!(row["notes"], "hi");
  }

  #[test]
  fn csv_blank_rows_are_skipped() {
    let csv = "issue,edition\n1,Regular\n,\n2,Regular\n";
    let rows = decode_csv(csv).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["issue"], "2");
  }

  #[test]
  fn csv_short_rows_only_carry_present_cells() {
    let csv = "issue,edition,shipName\n1,Regular\n";
    let rows = decode_csv(csv).unwrap();
    assert!(!rows[0].contains_key("shipName"));
  }

  #[test]
  fn json_strips_identity_keys() {
    let json = r#"[{"_id":"abc","id":"def","issue":"1","owned":true}]"#;
    let rows = decode_json(json).unwrap();
    assert!(!rows[0].contains_key("_id"));
    assert!(!rows[0].contains_key("id"));
    assert_eq!(rows[0]["owned"], true);
  }

  #[test]
  fn json_must_be_an_array_of_objects() {
    assert!(matches!(decode_json(r#"{"issue":"1"}"#), Err(Error::NotAnArray)));
    assert!(matches!(decode_json(r#"[{"issue":"1"}, 7]"#), Err(Error::NotAnObject(1))));
    assert!(matches!(decode_json("[{"), Err(Error::Json(_))));
  }
}
