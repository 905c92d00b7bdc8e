//! Gender-clustered seat allocation.
//!
//! Seats are numbered in row-major order. Consecutive runs of
//! `cluster_size` seats share a slot type, starting with a female run and
//! alternating from there:
//!
//! ```text
//! cluster_size = 2, 2 x 4 hall
//!   Row A:  F F M M
//!   Row B:  F F M M
//! ```
//!
//! Allocation is stateless. Occupancy is rebuilt from the roster passed in on
//! every call and never cached between calls, because imports and edits can
//! change the roster behind the allocator's back.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
  event::HallLayout,
  participant::{Gender, Participant},
};

/// The sentinel rendered for an exhausted hall.
pub const FULL: &str = "FULL";

// ─── Slot types ──────────────────────────────────────────────────────────────

/// The gender a seat is designated to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotType {
  Female,
  Male,
}

/// Slot type of the seat at linear index `index`.
pub fn slot_type(index: usize, cluster_size: u32) -> SlotType {
  let group = index / cluster_size.max(1) as usize;
  if group % 2 == 0 { SlotType::Female } else { SlotType::Male }
}

// ─── Labels ──────────────────────────────────────────────────────────────────

fn row_letter(row: usize) -> char { (b'A' + row as u8) as char }

/// Render the label of the seat at linear index `index`, e.g.
/// `"Row B, Seat 3"`.
pub fn seat_label(layout: &HallLayout, index: usize) -> String {
  let cols = layout.cols() as usize;
  let (row, col) = (index / cols, index % cols);
  format!("Row {}, Seat {}", row_letter(row), col + 1)
}

/// Parse a seat label back into a 0-based `(row, col)` pair.
///
/// Returns `None` for anything that is not a well-formed label. Bounds are
/// not checked against any layout.
pub fn parse_seat_label(label: &str) -> Option<(usize, usize)> {
  let (row_part, seat_part) = label.split_once(',')?;
  let letter = row_part.trim().strip_prefix("Row ")?.trim();
  let mut chars = letter.chars();
  let row = match (chars.next(), chars.next()) {
    (Some(c @ 'A'..='Z'), None) => (c as u8 - b'A') as usize,
    _ => return None,
  };
  let seat: usize = seat_part.trim().strip_prefix("Seat ")?.trim().parse().ok()?;
  Some((row, seat.checked_sub(1)?))
}

/// Linear index of `label` within `layout`, or `None` if the label does not
/// parse or lies outside the grid.
pub fn locate_seat(layout: &HallLayout, label: &str) -> Option<usize> {
  let (row, col) = parse_seat_label(label)?;
  let cols = layout.cols() as usize;
  (row < layout.rows() as usize && col < cols).then_some(row * cols + col)
}

// ─── Allocation ──────────────────────────────────────────────────────────────

/// The outcome of a seat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "seat", rename_all = "snake_case")]
pub enum SeatAssignment {
  Seat(String),
  /// No free seat of the requested slot type is left. Not an error: the
  /// caller decides whether to block registration or record the participant
  /// without a seat.
  Full,
}

impl SeatAssignment {
  pub fn seat(&self) -> Option<&str> {
    match self {
      Self::Seat(label) => Some(label),
      Self::Full => None,
    }
  }

  pub fn into_seat(self) -> Option<String> {
    match self {
      Self::Seat(label) => Some(label),
      Self::Full => None,
    }
  }

  pub fn is_full(&self) -> bool { matches!(self, Self::Full) }
}

impl fmt::Display for SeatAssignment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Seat(label) => f.write_str(label),
      Self::Full => f.write_str(FULL),
    }
  }
}

/// Find the first free seat, in linear order, whose slot type matches
/// `gender` (see [`Gender::slot_type`]).
///
/// `seated` is the authoritative roster snapshot; a seat is occupied when
/// its label appears as any participant's `seat`. Calling this twice with
/// the same inputs returns the same seat.
pub fn allocate_seat(
  layout: &HallLayout,
  seated: &[Participant],
  gender: Gender,
) -> SeatAssignment {
  let slot = gender.slot_type();
  let occupied: HashSet<&str> =
    seated.iter().filter_map(|p| p.seat.as_deref()).collect();

  let assignment = (0..layout.capacity())
    .filter(|&i| slot_type(i, layout.cluster_size()) == slot)
    .map(|i| seat_label(layout, i))
    .find(|label| !occupied.contains(label.as_str()))
    .map_or(SeatAssignment::Full, SeatAssignment::Seat);

  tracing::debug!(
    %gender,
    occupied = occupied.len(),
    %assignment,
    "seat allocation"
  );
  assignment
}

// ─── Seat map ────────────────────────────────────────────────────────────────

/// One cell of a [`SeatMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatCell {
  pub label:    String,
  pub slot:     SlotType,
  /// Serial number of the occupant, if any.
  pub occupant: Option<u32>,
}

/// A row-major snapshot of the hall: every seat with its slot type and
/// occupant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatMap {
  pub rows:     Vec<Vec<SeatCell>>,
  /// Participants registered without a seat.
  pub unseated: Vec<u32>,
}

impl SeatMap {
  /// Lay `participants` out on the grid. Participants whose label does not
  /// parse or falls outside the grid are ignored.
  pub fn build(layout: &HallLayout, participants: &[Participant]) -> Self {
    let cols = layout.cols() as usize;
    let mut rows: Vec<Vec<SeatCell>> = (0..layout.rows() as usize)
      .map(|r| {
        (0..cols)
          .map(|c| {
            let index = r * cols + c;
            SeatCell {
              label:    seat_label(layout, index),
              slot:     slot_type(index, layout.cluster_size()),
              occupant: None,
            }
          })
          .collect()
      })
      .collect();

    let mut unseated = Vec::new();
    for p in participants {
      let Some(label) = p.seat.as_deref() else {
        unseated.push(p.serial_no);
        continue;
      };
      if let Some((r, c)) = parse_seat_label(label)
        && let Some(cell) = rows.get_mut(r).and_then(|row| row.get_mut(c))
      {
        cell.occupant = Some(p.serial_no);
      }
    }

    Self { rows, unseated }
  }

  pub fn occupied(&self) -> usize {
    self
      .rows
      .iter()
      .flatten()
      .filter(|c| c.occupant.is_some())
      .count()
  }
}
