//! Orphan detection: reference entities no canonical starship refers to.

use std::collections::BTreeMap;

use hangar_core::{
  migration::StarshipCollection,
  reference::{ReferenceEntity, ReferenceKind},
  store::CollectionStore,
};
use serde::{Serialize, Serializer};
use strum::IntoEnumIterator;

/// One reference table split into used and orphaned entities.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOrphans {
  pub kind:    ReferenceKind,
  /// Entities in the table.
  pub total:   u64,
  /// Entities whose name no canonical starship uses.
  pub orphans: Vec<ReferenceEntity>,
}

impl TableOrphans {
  /// Share of the table that is orphaned, 0–100; 0 for an empty table.
  pub fn percentage(&self) -> f64 {
    if self.total == 0 {
      0.0
    } else {
      self.orphans.len() as f64 / self.total as f64 * 100.0
    }
  }

  pub fn names(&self) -> Vec<&str> {
    self.orphans.iter().map(|e| e.name.as_str()).collect()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrphanReport {
  pub starships: u64,
  /// One entry per reference kind, in declaration order.
  pub tables:    Vec<TableOrphans>,
}

impl OrphanReport {
  pub fn table(&self, kind: ReferenceKind) -> Option<&TableOrphans> {
    self.tables.iter().find(|t| t.kind == kind)
  }

  pub fn total_orphans(&self) -> u64 {
    self.tables.iter().map(|t| t.orphans.len() as u64).sum()
  }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportView<'a> {
  total_counts:         BTreeMap<&'static str, u64>,
  orphaned_counts:      BTreeMap<&'static str, u64>,
  orphaned_percentages: BTreeMap<&'static str, f64>,
  orphaned_records:     BTreeMap<&'static str, Vec<&'a str>>,
}

impl Serialize for OrphanReport {
  fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
    let mut view = ReportView {
      total_counts:         BTreeMap::from([("starships", self.starships)]),
      orphaned_counts:      BTreeMap::new(),
      orphaned_percentages: BTreeMap::new(),
      orphaned_records:     BTreeMap::new(),
    };
    for t in &self.tables {
      let key = t.kind.report_key();
      view.total_counts.insert(key, t.total);
      view.orphaned_counts.insert(key, t.orphans.len() as u64);
      view.orphaned_percentages.insert(key, t.percentage());
      view.orphaned_records.insert(key, t.names());
    }
    view.serialize(serializer)
  }
}

/// Partition one table against the labels canonical starships use.
pub async fn find_table_orphans<S: CollectionStore>(
  store: &S,
  kind: ReferenceKind,
) -> Result<TableOrphans, S::Error> {
  let used = store.distinct_labels(kind).await?;
  let entities = store.list_references(kind).await?;
  let total = entities.len() as u64;

  let orphans = entities
    .into_iter()
    .filter(|e| !used.contains(&e.name))
    .collect();

  Ok(TableOrphans { kind, total, orphans })
}

/// Report orphans across every reference table. Read-only.
pub async fn find_orphans<S: CollectionStore>(
  store: &S,
) -> Result<OrphanReport, S::Error> {
  let starships = store.count_starships(StarshipCollection::Canonical).await?;

  let mut tables = Vec::new();
  for kind in ReferenceKind::iter() {
    tables.push(find_table_orphans(store, kind).await?);
  }

  Ok(OrphanReport { starships, tables })
}

/// Delete the entities listed in `table`; returns rows removed. An entity
/// that a starship started using after the report was taken is kept.
pub async fn delete_orphans<S: CollectionStore>(
  store: &S,
  table: &TableOrphans,
) -> Result<u64, S::Error> {
  if table.orphans.is_empty() {
    return Ok(0);
  }
  let ids = table.orphans.iter().map(|e| e.id).collect();
  let removed = store.delete_unused_references(table.kind, ids).await?;
  tracing::info!(kind = %table.kind, removed, "deleted orphaned reference entities");
  Ok(removed)
}
