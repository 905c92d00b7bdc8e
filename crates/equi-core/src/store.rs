//! The `EventStore` trait, the storage adapter as seen from the core.
//!
//! The engines never touch storage; they take roster snapshots as plain
//! slices. This trait is what the registration flow, the API and the CLI use
//! to fetch those snapshots and to append new records. Backends live in
//! their own crates (e.g. `equi-store-sqlite`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  event::{Event, HallLayout, NewEvent},
  participant::{NewParticipant, Participant, ParticipantEdit},
  team::{Role, TeamCandidate},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Broad classes of backend failure, so callers can report them without
/// knowing the backend's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
  /// The event or participant addressed does not exist.
  NotFound,
  /// The write clashes with existing data, e.g. a seat held by someone else.
  Conflict,
  /// The input was rejected before anything was written.
  Invalid,
  Other,
}

/// Implemented by every backend's error type.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn kind(&self) -> StoreErrorKind;
}

/// Abstraction over an event store backend.
///
/// Everything is scoped to one event: a participant, candidate or role
/// belongs to exactly one event and is removed with it.
///
/// The store does not serialise seat allocation. Callers that allow several
/// concurrent writers per event must wrap "read roster, allocate, append" in
/// their own critical section; backends reject a second participant with an
/// already-taken seat as a last line of defence.
pub trait EventStore: Send + Sync {
  type Error: StoreError;

  // ── Events ────────────────────────────────────────────────────────────

  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Returns `None` if the event does not exist.
  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// All events, oldest first.
  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Change the hall geometry. Existing seat labels are kept as they are;
  /// seats that fall outside the new grid simply stop counting as occupied.
  fn update_layout(
    &self,
    id: Uuid,
    layout: HallLayout,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Delete an event together with its roster, candidates and roles.
  /// Returns `false` if it did not exist.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Participants ──────────────────────────────────────────────────────

  /// Append a participant, assigning the next serial number and the
  /// registration timestamp.
  fn add_participant(
    &self,
    event_id: Uuid,
    input: NewParticipant,
  ) -> impl Future<Output = Result<Participant, Self::Error>> + Send + '_;

  /// The event's roster in registration order.
  fn list_participants(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Apply a bulk roster edit, all or nothing. Every edit must name an
  /// existing serial number, and no two participants may end up in the same
  /// seat. Returns the edited participants in the order given.
  fn edit_participants(
    &self,
    event_id: Uuid,
    edits: Vec<ParticipantEdit>,
  ) -> impl Future<Output = Result<Vec<Participant>, Self::Error>> + Send + '_;

  /// Admin removal of a single participant. Returns `false` if not found.
  fn remove_participant(
    &self,
    event_id: Uuid,
    serial_no: u32,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Remove the whole roster. Serial numbers keep counting from where they
  /// were.
  fn clear_participants(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Teams ─────────────────────────────────────────────────────────────

  /// Replace the event's candidate pool.
  fn replace_candidates(
    &self,
    event_id: Uuid,
    candidates: Vec<TeamCandidate>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_candidates(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TeamCandidate>, Self::Error>> + Send + '_;

  /// Replace the event's roles; order is preserved.
  fn replace_roles(
    &self,
    event_id: Uuid,
    roles: Vec<Role>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_roles(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + '_;
}
