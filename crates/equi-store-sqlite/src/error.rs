//! Error type for `equi-store-sqlite`.

use equi_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] equi_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value the domain types do not accept.
  #[error("corrupt row: {0}")]
  Decode(String),

  #[error("event not found: {0}")]
  EventNotFound(uuid::Uuid),

  #[error("participant #{serial_no} not found in event {event_id}")]
  ParticipantNotFound { event_id: uuid::Uuid, serial_no: u32 },

  /// Another participant already holds this seat.
  #[error("seat {seat:?} is already taken in event {event_id}")]
  SeatTaken { event_id: uuid::Uuid, seat: String },
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    match self {
      Self::EventNotFound(_)
      | Self::ParticipantNotFound { .. }
      | Self::Core(equi_core::Error::EventNotFound(_)) => StoreErrorKind::NotFound,
      Self::SeatTaken { .. } => StoreErrorKind::Conflict,
      Self::Core(_) => StoreErrorKind::Invalid,
      _ => StoreErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
