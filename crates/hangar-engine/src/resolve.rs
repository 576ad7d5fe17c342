//! Edition lookup for bulk-input drafts.

use hangar_core::{
  reference::Edition,
  starship::StarshipDraft,
  store::CollectionStore,
};

/// Enrich `draft` from the edition whose display name equals `draft.edition`.
///
/// When the draft names a franchise only that franchise's edition matches;
/// otherwise the oldest edition with the name does. A miss returns the draft
/// unchanged.
pub async fn resolve_edition<S: CollectionStore>(
  store: &S,
  draft: StarshipDraft,
) -> Result<StarshipDraft, S::Error> {
  let found = store
    .find_edition_by_name(draft.edition.clone(), draft.franchise.clone())
    .await?;
  let Some(edition) = found else {
    tracing::debug!(
      edition = %draft.edition,
      franchise = ?draft.franchise,
      "no matching edition"
    );
    return Ok(draft);
  };

  Ok(apply_edition(draft, &edition))
}

/// Copy an edition's defaults onto a draft. The internal name always comes
/// from the edition; franchise, collection type and retail price only fill
/// gaps.
pub fn apply_edition(mut draft: StarshipDraft, edition: &Edition) -> StarshipDraft {
  draft.edition_internal_name = Some(edition.internal_name.clone());
  if draft.franchise.is_none() {
    draft.franchise = Some(edition.franchise.clone());
  }
  if draft.collection_type.is_none() {
    draft.collection_type = edition.collection_type.clone();
  }
  if draft.retail_price.is_none() {
    draft.retail_price = edition.retail_price;
  }
  draft
}
