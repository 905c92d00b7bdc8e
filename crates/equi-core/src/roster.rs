//! Roster maintenance outside of registration: resizing the hall and bulk
//! edits of participant rows.
//!
//! Neither operation re-seats anyone. Seat allocation always rebuilds
//! occupancy from the roster it is handed, so later registrations see the
//! edited roster and the new grid without further bookkeeping.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
  Error, Result,
  event::{Event, HallLayout},
  participant::{Participant, ParticipantEdit},
  seating,
  store::EventStore,
};

/// Change an event's rows, columns and cluster size.
pub async fn resize<S: EventStore>(
  store: &S,
  event_id: Uuid,
  layout: HallLayout,
) -> Result<Event> {
  let event = store.update_layout(event_id, layout).await.map_err(Error::store)?;
  let roster = store.list_participants(event_id).await.map_err(Error::store)?;
  let outside = roster
    .iter()
    .filter_map(|p| p.seat.as_deref())
    .filter(|label| seating::locate_seat(&layout, label).is_none())
    .count();

  tracing::info!(
    %event_id,
    rows = layout.rows(),
    cols = layout.cols(),
    cluster_size = layout.cluster_size(),
    outside,
    "hall layout changed"
  );
  Ok(event)
}

/// Check a bulk edit against `event` and normalise it.
///
/// Seat labels must name a seat inside the grid and are rewritten in their
/// canonical form. Each serial number may appear once. Personal fields are
/// dropped under privacy mode.
pub fn prepare_edits(event: &Event, edits: Vec<ParticipantEdit>) -> Result<Vec<ParticipantEdit>> {
  let mut serials = HashSet::new();
  edits
    .into_iter()
    .map(|mut edit| {
      if !serials.insert(edit.serial_no) {
        return Err(Error::DuplicateEdit(edit.serial_no));
      }
      if let Some(label) = edit.seat.take() {
        let index = seating::locate_seat(&event.layout, &label).ok_or_else(|| {
          Error::InvalidSeat(format!("{label:?} is not a seat of this hall"))
        })?;
        edit.seat = Some(seating::seat_label(&event.layout, index));
      }
      if event.privacy_mode {
        edit.anonymize();
      }
      Ok(edit)
    })
    .collect()
}

/// Apply a bulk edit to an event's roster. Nothing is written unless every
/// row is accepted.
pub async fn edit<S: EventStore>(
  store: &S,
  event_id: Uuid,
  edits: Vec<ParticipantEdit>,
) -> Result<Vec<Participant>> {
  let event = store
    .get_event(event_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::EventNotFound(event_id))?;
  let edits = prepare_edits(&event, edits)?;
  let edited = store
    .edit_participants(event_id, edits)
    .await
    .map_err(Error::store)?;

  tracing::info!(%event_id, edited = edited.len(), "roster edited");
  Ok(edited)
}
