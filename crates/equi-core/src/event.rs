//! Events: named sessions that own a hall layout and a roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Row labels are single letters, so a hall has at most 26 rows.
pub const MAX_ROWS: u32 = 26;

// ─── Hall layout ─────────────────────────────────────────────────────────────

/// Grid bounds and the gender cluster width of a hall.
///
/// Always valid once constructed: every dimension is at least 1 and the row
/// count fits the A–Z label range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHallLayout")]
pub struct HallLayout {
  rows:         u32,
  cols:         u32,
  cluster_size: u32,
}

#[derive(Deserialize)]
struct RawHallLayout {
  rows:         u32,
  cols:         u32,
  cluster_size: u32,
}

impl TryFrom<RawHallLayout> for HallLayout {
  type Error = Error;

  fn try_from(raw: RawHallLayout) -> Result<Self> {
    Self::new(raw.rows, raw.cols, raw.cluster_size)
  }
}

impl HallLayout {
  pub fn new(rows: u32, cols: u32, cluster_size: u32) -> Result<Self> {
    if rows == 0 || cols == 0 {
      return Err(Error::InvalidHall(format!(
        "hall must have at least one row and one column (got {rows}x{cols})"
      )));
    }
    if rows > MAX_ROWS {
      return Err(Error::InvalidHall(format!(
        "at most {MAX_ROWS} rows are supported (got {rows})"
      )));
    }
    if cluster_size == 0 {
      return Err(Error::InvalidHall("cluster size must be at least 1".into()));
    }
    Ok(Self { rows, cols, cluster_size })
  }

  pub fn rows(&self) -> u32 { self.rows }

  pub fn cols(&self) -> u32 { self.cols }

  pub fn cluster_size(&self) -> u32 { self.cluster_size }

  /// Total number of seats in the hall.
  pub fn capacity(&self) -> usize { self.rows as usize * self.cols as usize }
}

// ─── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:     Uuid,
  pub name:         String,
  pub layout:       HallLayout,
  /// When set, personal fields are never stored for this event's roster.
  pub privacy_mode: bool,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::EventStore::create_event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
  pub name:         String,
  pub layout:       HallLayout,
  #[serde(default)]
  pub privacy_mode: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_degenerate_dimensions() {
    assert!(matches!(HallLayout::new(0, 4, 1), Err(Error::InvalidHall(_))));
    assert!(matches!(HallLayout::new(2, 0, 1), Err(Error::InvalidHall(_))));
    assert!(matches!(HallLayout::new(2, 4, 0), Err(Error::InvalidHall(_))));
    assert!(matches!(HallLayout::new(27, 4, 1), Err(Error::InvalidHall(_))));
  }

  #[test]
  fn capacity_is_rows_times_cols() {
    let layout = HallLayout::new(26, 50, 3).unwrap();
    assert_eq!(layout.capacity(), 1300);
  }

  #[test]
  fn deserialising_validates() {
    let ok: HallLayout =
      serde_json::from_str(r#"{"rows":2,"cols":4,"cluster_size":2}"#).unwrap();
    assert_eq!(ok.cluster_size(), 2);

    let bad = serde_json::from_str::<HallLayout>(r#"{"rows":2,"cols":4,"cluster_size":0}"#);
    assert!(bad.is_err());
  }
}
