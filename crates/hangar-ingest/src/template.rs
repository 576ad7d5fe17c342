//! The downloadable CSV import template.

use crate::{Error, Result};

/// Column order of the import template. Every column is a key that
/// [`crate::normalize`] understands.
pub const TEMPLATE_COLUMNS: [&str; 10] = [
  "issue",
  "edition",
  "shipName",
  "faction",
  "releaseDate",
  "owned",
  "wishlist",
  "wishlistPriority",
  "retailPrice",
  "description",
];

const EXAMPLE_ROWS: u32 = 3;
const EXAMPLE_RELEASE_DATE: &str = "2024-03-15";

/// Render a template for one edition: a header row and three example rows
/// pre-filled with the edition's name and default retail price.
pub fn encode_template(
  edition_name: &str,
  retail_price: Option<f64>,
) -> Result<String> {
  let price = retail_price.unwrap_or(0.0).to_string();

  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(TEMPLATE_COLUMNS)?;

  for n in 1..=EXAMPLE_ROWS {
    let n = n.to_string();
    let ship_name = format!("Example Ship {n}");
    let description = format!("Example description for ship {n}");
    writer.write_record([
      n.as_str(),
      edition_name,
      ship_name.as_str(),
      "Example Faction",
      EXAMPLE_RELEASE_DATE,
      "false",
      "true",
      n.as_str(),
      price.as_str(),
      description.as_str(),
    ])?;
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| csv::Error::from(e.into_error()))?;
  String::from_utf8(bytes).map_err(|_| Error::NotUtf8)
}
