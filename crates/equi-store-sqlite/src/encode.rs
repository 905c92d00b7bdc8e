//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings.
//! Embeddings, skills and role requirements are compact JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use equi_core::{
  event::{Event, HallLayout},
  matcher,
  participant::{Gender, Participant},
  team::{Role, SkillSet, TeamCandidate},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: Gender) -> &'static str { g.as_str() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse().map_err(|e| Error::Decode(format!("{e}")))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

/// JSON has no encoding for NaN or infinities, so those are refused here
/// rather than written as `null` and left unreadable.
pub fn encode_embedding(e: &[f32]) -> Result<String> {
  if !matcher::is_finite_embedding(e) {
    return Err(equi_core::Error::InvalidEmbedding.into());
  }
  Ok(serde_json::to_string(e)?)
}

pub fn decode_embedding(s: &str) -> Result<Vec<f32>> { Ok(serde_json::from_str(s)?) }

pub fn encode_skills(s: &SkillSet) -> Result<String> { Ok(serde_json::to_string(s)?) }

pub fn decode_skills(s: &str) -> Result<SkillSet> { Ok(serde_json::from_str(s)?) }

pub fn encode_requirements(r: &BTreeMap<String, f64>) -> Result<String> {
  Ok(serde_json::to_string(r)?)
}

pub fn decode_requirements(s: &str) -> Result<BTreeMap<String, f64>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:     String,
  pub name:         String,
  pub hall_rows:    u32,
  pub hall_cols:    u32,
  pub cluster_size: u32,
  pub privacy_mode: bool,
  pub created_at:   String,
}

impl RawEvent {
  pub const COLUMNS: &'static str =
    "event_id, name, hall_rows, hall_cols, cluster_size, privacy_mode, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:     row.get(0)?,
      name:         row.get(1)?,
      hall_rows:    row.get(2)?,
      hall_cols:    row.get(3)?,
      cluster_size: row.get(4)?,
      privacy_mode: row.get(5)?,
      created_at:   row.get(6)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:     decode_uuid(&self.event_id)?,
      name:         self.name,
      layout:       HallLayout::new(self.hall_rows, self.hall_cols, self.cluster_size)?,
      privacy_mode: self.privacy_mode,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `participants` row.
pub struct RawParticipant {
  pub event_id:      String,
  pub serial_no:     u32,
  pub gender:        String,
  pub seat:          Option<String>,
  pub name:          Option<String>,
  pub external_id:   Option<String>,
  pub branch:        Option<String>,
  pub age:           Option<u32>,
  pub embedding:     String,
  pub registered_at: String,
}

impl RawParticipant {
  pub const COLUMNS: &'static str = "event_id, serial_no, gender, seat, name, \
                                     external_id, branch, age, embedding, \
                                     registered_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:      row.get(0)?,
      serial_no:     row.get(1)?,
      gender:        row.get(2)?,
      seat:          row.get(3)?,
      name:          row.get(4)?,
      external_id:   row.get(5)?,
      branch:        row.get(6)?,
      age:           row.get(7)?,
      embedding:     row.get(8)?,
      registered_at: row.get(9)?,
    })
  }

  pub fn into_participant(self) -> Result<Participant> {
    Ok(Participant {
      event_id:      decode_uuid(&self.event_id)?,
      serial_no:     self.serial_no,
      gender:        decode_gender(&self.gender)?,
      seat:          self.seat,
      name:          self.name,
      external_id:   self.external_id,
      branch:        self.branch,
      age:           self.age,
      embedding:     decode_embedding(&self.embedding)?,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

/// Raw values read directly from a `candidates` row.
pub struct RawCandidate {
  pub candidate_id: String,
  pub name:         String,
  pub gender:       String,
  pub skills:       String,
}

impl RawCandidate {
  pub fn into_candidate(self) -> Result<TeamCandidate> {
    Ok(TeamCandidate {
      id:     self.candidate_id,
      name:   self.name,
      gender: decode_gender(&self.gender)?,
      skills: decode_skills(&self.skills)?,
    })
  }
}

/// Raw values read directly from a `roles` row.
pub struct RawRole {
  pub name:         String,
  pub capacity:     u32,
  pub requirements: String,
}

impl RawRole {
  pub fn into_role(self) -> Result<Role> {
    Ok(Role {
      name:         self.name,
      capacity:     self.capacity,
      requirements: decode_requirements(&self.requirements)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gender_column_values() {
    for g in [Gender::Male, Gender::Female, Gender::NonBinary] {
      assert_eq!(decode_gender(encode_gender(g)).unwrap(), g);
    }
    assert!(matches!(decode_gender("other"), Err(Error::Decode(_))));
  }

  #[test]
  fn non_finite_embedding_is_not_encoded() {
    assert_eq!(encode_embedding(&[0.5, -1.0]).unwrap(), "[0.5,-1.0]");
    for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
      let err = encode_embedding(&[0.5, bad]).unwrap_err();
      assert!(matches!(err, Error::Core(equi_core::Error::InvalidEmbedding)));
    }
  }

  #[test]
  fn bad_timestamp_is_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
