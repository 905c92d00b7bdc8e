//! Participants: the people registered into an event, usually seated.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seating::SlotType;

// ─── Gender ──────────────────────────────────────────────────────────────────

/// The gender recorded for a participant or team candidate.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Gender {
  Male,
  Female,
  #[serde(rename = "Non-Binary")]
  NonBinary,
}

impl Gender {
  /// The seat slot type this gender may occupy.
  ///
  /// Non-binary participants share the male slots.
  pub fn slot_type(self) -> SlotType {
    match self {
      Self::Female => SlotType::Female,
      Self::Male | Self::NonBinary => SlotType::Male,
    }
  }

  /// The opposite binary gender; `None` for [`Gender::NonBinary`].
  pub fn opposite(self) -> Option<Self> {
    match self {
      Self::Male => Some(Self::Female),
      Self::Female => Some(Self::Male),
      Self::NonBinary => None,
    }
  }

  /// Pick the gender to record for a registrant.
  ///
  /// An explicit operator choice always wins; otherwise the detector's label
  /// is used when it is a binary one. `Unknown` without an override yields
  /// `None` and the caller has to ask.
  pub fn resolve(
    detected: Option<DetectedGender>,
    explicit: Option<Gender>,
  ) -> Option<Gender> {
    if explicit.is_some() {
      return explicit;
    }
    match detected? {
      DetectedGender::Male => Some(Gender::Male),
      DetectedGender::Female => Some(Gender::Female),
      DetectedGender::Unknown => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Male => "Male",
      Self::Female => "Female",
      Self::NonBinary => "Non-Binary",
    }
  }
}

impl fmt::Display for Gender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.as_str())
  }
}

/// Returned when a gender string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseGenderError(pub String);

impl fmt::Display for ParseGenderError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown gender: {:?}", self.0)
  }
}

impl std::error::Error for ParseGenderError {}

impl FromStr for Gender {
  type Err = ParseGenderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "male" | "m" | "man" => Ok(Self::Male),
      "female" | "f" | "woman" => Ok(Self::Female),
      "non-binary" | "nonbinary" | "non_binary" | "nb" => Ok(Self::NonBinary),
      _ => Err(ParseGenderError(s.to_owned())),
    }
  }
}

/// The gender label produced by the face detection provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectedGender {
  Male,
  Female,
  Unknown,
}

// ─── Participant ─────────────────────────────────────────────────────────────

/// A registered attendee of one event.
///
/// Owned by its event; created once at registration and otherwise only
/// touched by bulk edit, bulk import or explicit admin removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
  pub event_id:      Uuid,
  /// 1-based, assigned by the store, monotonic per event and never reused.
  pub serial_no:     u32,
  pub gender:        Gender,
  /// Seat label such as `"Row A, Seat 3"`; `None` when the hall was full.
  pub seat:          Option<String>,
  pub name:          Option<String>,
  pub external_id:   Option<String>,
  pub branch:        Option<String>,
  pub age:           Option<u32>,
  /// Face descriptor; empty when no face was captured.
  #[serde(default)]
  pub embedding:     Vec<f32>,
  pub registered_at: DateTime<Utc>,
}

impl Participant {
  /// Human-readable label used in duplicate reports and team listings.
  pub fn display_label(&self) -> String {
    match self.name.as_deref().map(str::trim) {
      Some(name) if !name.is_empty() => name.to_owned(),
      _ => format!("#{}", self.serial_no),
    }
  }
}

/// Input to [`crate::store::EventStore::add_participant`].
/// `serial_no` and `registered_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParticipant {
  pub gender:      Gender,
  pub seat:        Option<String>,
  pub name:        Option<String>,
  pub external_id: Option<String>,
  pub branch:      Option<String>,
  pub age:         Option<u32>,
  #[serde(default)]
  pub embedding:   Vec<f32>,
}

impl NewParticipant {
  /// A seatless, anonymous participant of the given gender.
  pub fn new(gender: Gender) -> Self {
    Self {
      gender,
      seat: None,
      name: None,
      external_id: None,
      branch: None,
      age: None,
      embedding: Vec::new(),
    }
  }

  /// Drop every personal field, keeping only what seating needs.
  pub fn anonymize(&mut self) {
    self.name = None;
    self.external_id = None;
    self.branch = None;
  }
}

/// One row of a bulk roster edit: the new values of every editable field.
///
/// The serial number picks the participant; the embedding and registration
/// time are never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantEdit {
  pub serial_no:   u32,
  pub gender:      Gender,
  #[serde(default)]
  pub seat:        Option<String>,
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default)]
  pub external_id: Option<String>,
  #[serde(default)]
  pub branch:      Option<String>,
  #[serde(default)]
  pub age:         Option<u32>,
}

impl ParticipantEdit {
  /// An edit that leaves `p` as it is.
  pub fn from_participant(p: &Participant) -> Self {
    Self {
      serial_no:   p.serial_no,
      gender:      p.gender,
      seat:        p.seat.clone(),
      name:        p.name.clone(),
      external_id: p.external_id.clone(),
      branch:      p.branch.clone(),
      age:         p.age,
    }
  }

  pub fn anonymize(&mut self) {
    self.name = None;
    self.external_id = None;
    self.branch = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn non_binary_serialises_with_hyphen() {
    let json = serde_json::to_string(&Gender::NonBinary).unwrap();
    assert_eq!(json, "\"Non-Binary\"");
    let back: Gender = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Gender::NonBinary);
  }

  #[test]
  fn parse_accepts_common_spellings() {
    assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
    assert_eq!(" F ".parse::<Gender>().unwrap(), Gender::Female);
    assert_eq!("Non-Binary".parse::<Gender>().unwrap(), Gender::NonBinary);
    assert!("robot".parse::<Gender>().is_err());
  }

  #[test]
  fn explicit_gender_overrides_detector() {
    let g = Gender::resolve(Some(DetectedGender::Male), Some(Gender::NonBinary));
    assert_eq!(g, Some(Gender::NonBinary));
  }

  #[test]
  fn explicit_gender_without_detection() {
    assert_eq!(Gender::resolve(None, Some(Gender::Male)), Some(Gender::Male));
  }

  #[test]
  fn unknown_detection_without_override_is_unresolved() {
    assert_eq!(Gender::resolve(Some(DetectedGender::Unknown), None), None);
    assert_eq!(Gender::resolve(None, None), None);
    assert_eq!(
      Gender::resolve(Some(DetectedGender::Female), None),
      Some(Gender::Female)
    );
  }

  #[test]
  fn non_binary_shares_male_slots() {
    assert_eq!(Gender::NonBinary.slot_type(), SlotType::Male);
    assert_eq!(Gender::Female.slot_type(), SlotType::Female);
  }
}
