//! Natural-key upsert of a single draft into the canonical store.

use chrono::Utc;
use hangar_core::{starship::StarshipDraft, store::CollectionStore};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  Inserted(Uuid),
  Updated(Uuid),
}

impl UpsertOutcome {
  pub fn id(self) -> Uuid {
    match self {
      Self::Inserted(id) | Self::Updated(id) => id,
    }
  }
}

/// Merge `draft` into the record with the same (issue, edition), or insert a
/// new record with defaults for everything the draft omits.
pub async fn upsert<S: CollectionStore>(
  store: &S,
  draft: StarshipDraft,
) -> Result<UpsertOutcome, S::Error> {
  let now = Utc::now();

  match store.find_starship(draft.natural_key()).await? {
    Some(mut existing) => {
      draft.merge_into(&mut existing, now);
      let id = existing.id;
      store.update_starship(existing).await?;
      Ok(UpsertOutcome::Updated(id))
    }
    None => {
      let starship = draft.into_starship(Uuid::new_v4(), now);
      let id = starship.id;
      store.insert_starship(starship).await?;
      Ok(UpsertOutcome::Inserted(id))
    }
  }
}
