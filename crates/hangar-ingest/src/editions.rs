//! Edition reference rows from CSV.

use hangar_core::reference::NewEdition;

use crate::{
  Result,
  coerce::{parse_float, parse_text},
  decode_csv,
};

/// Editions read from an edition CSV, plus the number of rows skipped for
/// lacking a name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditionRows {
  pub editions: Vec<NewEdition>,
  pub errors:   u64,
}

/// Read `name`, `description` and `retailPrice` columns. Every edition is
/// assigned to `franchise`; `retailPrice` is kept only when it is a
/// non-negative number.
pub fn decode_editions_csv(
  input: &str,
  franchise: &str,
  is_default: bool,
) -> Result<EditionRows> {
  let mut out = EditionRows::default();

  for row in decode_csv(input)? {
    let Some(name) = row.get("name").and_then(parse_text) else {
      out.errors += 1;
      continue;
    };

    out.editions.push(NewEdition {
      name,
      franchise: franchise.to_owned(),
      internal_name: None,
      description: row.get("description").and_then(parse_text),
      retail_price: row
        .get("retailPrice")
        .and_then(parse_float)
        .filter(|p| *p >= 0.0),
      collection_type: None,
      is_default,
    });
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rows_without_names_are_counted() {
    let csv = "name,description,retailPrice\n\
               Regular, The main line ,12.99\n\
               ,orphan row,5\n\
               Special,,-3\n\
               XL,,abc\n";
    let rows = decode_editions_csv(csv, "Star Trek", true).unwrap();

    assert_eq!(rows.errors, 1);
    assert_eq!(rows.editions.len(), 3);

    let regular = &rows.editions[0];
    assert_eq!(regular.name, "Regular");
    assert_eq!(regular.franchise, "Star Trek");
    assert_eq!(regular.description.as_deref(), Some("The main line"));
    assert_eq!(regular.retail_price, Some(12.99));
    assert!(regular.is_default);

    assert_eq!(rows.editions[1].retail_price, None);
    assert_eq!(rows.editions[1].description, None);
    assert_eq!(rows.editions[2].retail_price, None);
  }
}
