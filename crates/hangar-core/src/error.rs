//! Error types for `hangar-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{reference::ReferenceKind, starship::NaturalKey};

#[derive(Debug, Error)]
pub enum Error {
  #[error("a starship with natural key {0} already exists")]
  DuplicateNaturalKey(NaturalKey),

  #[error("an edition named {name:?} already exists for franchise {franchise:?}")]
  DuplicateEditionName { name: String, franchise: String },

  #[error("an edition with internal name {0:?} already exists")]
  DuplicateInternalName(String),

  #[error("{kind} {name:?} already exists")]
  DuplicateReference { kind: ReferenceKind, name: String },

  #[error("editions are created through create_edition, not add_reference")]
  EditionNeedsFranchise,

  #[error("edition not found: {0}")]
  EditionNotFound(Uuid),

  #[error("starship not found: {0}")]
  StarshipNotFound(Uuid),
}

impl Error {
  /// `true` for the uniqueness violations a caller can fix by changing input.
  pub fn is_conflict(&self) -> bool {
    matches!(
      self,
      Self::DuplicateNaturalKey(_)
        | Self::DuplicateEditionName { .. }
        | Self::DuplicateInternalName(_)
        | Self::DuplicateReference { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
