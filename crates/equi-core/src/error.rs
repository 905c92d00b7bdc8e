//! Error types for `equi-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::store::{StoreError, StoreErrorKind};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid hall layout: {0}")]
  InvalidHall(String),

  #[error("role {0:?} has zero capacity")]
  ZeroCapacity(String),

  #[error("role {role:?} has an invalid weight for skill {skill:?}")]
  InvalidWeight { role: String, skill: String },

  #[error("duplicate role name: {0:?}")]
  DuplicateRole(String),

  #[error("duplicate candidate id: {0:?}")]
  DuplicateCandidate(String),

  #[error("team size must be at least 1")]
  ZeroTeamSize,

  #[error("gender could not be determined; an explicit gender is required")]
  GenderUnresolved,

  #[error("embedding contains a value that is not a finite number")]
  InvalidEmbedding,

  #[error("invalid seat: {0}")]
  InvalidSeat(String),

  #[error("participant #{0} appears more than once in the edit")]
  DuplicateEdit(u32),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("store error: {source}")]
  Store {
    kind:   StoreErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  /// Wrap a backend error coming out of an [`crate::store::EventStore`].
  pub fn store<E: StoreError>(err: E) -> Self {
    Self::Store { kind: err.kind(), source: Box::new(err) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
