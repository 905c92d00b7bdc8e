//! The registration flow: duplicate check, then seating, then append.
//!
//! [`plan`] is the pure decision over a roster snapshot; [`register`] and
//! [`import`] run it against an [`EventStore`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  event::Event,
  face::DetectedFace,
  matcher::{self, MatchOutcome, SimilarityMetric},
  participant::{DetectedGender, Gender, NewParticipant, Participant},
  seating::{self, SeatAssignment},
  store::EventStore,
};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// What to do with a registrant when no seat of their slot type is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullHallPolicy {
  /// Refuse the registration.
  Block,
  /// Record the participant without a seat.
  #[default]
  RecordWithoutSeat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPolicy {
  #[serde(default)]
  pub metric:  SimilarityMetric,
  #[serde(default)]
  pub on_full: FullHallPolicy,
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Everything known about a registrant at the door.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRequest {
  /// Operator-chosen gender; overrides the detector.
  pub gender:          Option<Gender>,
  pub detected_gender: Option<DetectedGender>,
  pub name:            Option<String>,
  pub external_id:     Option<String>,
  pub branch:          Option<String>,
  pub age:             Option<u32>,
  #[serde(default)]
  pub embedding:       Vec<f32>,
}

impl RegistrationRequest {
  /// Start a request from a detected face: its embedding and gender label.
  pub fn from_face(face: &DetectedFace) -> Self {
    Self {
      detected_gender: Some(face.gender),
      embedding: face.embedding.clone(),
      ..Self::default()
    }
  }
}

// ─── Planning ────────────────────────────────────────────────────────────────

/// What should happen to a registration request.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationDecision {
  /// Append this participant (seat already allocated, or `None`).
  Register(NewParticipant),
  /// The face is already on this event's roster; nothing is stored.
  Duplicate(MatchOutcome),
  /// No seat left and the policy says block.
  HallFull,
}

/// Decide what to do with `request` given the event's current roster.
///
/// `roster` must be the full participant list of `event`; duplicate checks
/// never look beyond it.
pub fn plan(
  event: &Event,
  roster: &[Participant],
  request: RegistrationRequest,
  policy: &RegistrationPolicy,
) -> Result<RegistrationDecision> {
  plan_with(event, roster, request, policy, true)
}

fn plan_with(
  event: &Event,
  roster: &[Participant],
  request: RegistrationRequest,
  policy: &RegistrationPolicy,
  check_duplicates: bool,
) -> Result<RegistrationDecision> {
  let gender = Gender::resolve(request.detected_gender, request.gender)
    .ok_or(Error::GenderUnresolved)?;
  if !matcher::is_finite_embedding(&request.embedding) {
    return Err(Error::InvalidEmbedding);
  }

  if check_duplicates && !request.embedding.is_empty() {
    let outcome = matcher::check_roster(&request.embedding, roster, policy.metric);
    if outcome.is_duplicate {
      return Ok(RegistrationDecision::Duplicate(outcome));
    }
  }

  let seat = match seating::allocate_seat(&event.layout, roster, gender) {
    SeatAssignment::Seat(label) => Some(label),
    SeatAssignment::Full => match policy.on_full {
      FullHallPolicy::Block => return Ok(RegistrationDecision::HallFull),
      FullHallPolicy::RecordWithoutSeat => None,
    },
  };

  let mut participant = NewParticipant {
    gender,
    seat,
    name: request.name,
    external_id: request.external_id,
    branch: request.branch,
    age: request.age,
    embedding: request.embedding,
  };
  if event.privacy_mode {
    participant.anonymize();
  }
  Ok(RegistrationDecision::Register(participant))
}

// ─── Store-backed flow ───────────────────────────────────────────────────────

/// The result of [`register`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
  Registered { participant: Participant },
  Duplicate { matched: MatchOutcome },
  HallFull,
}

async fn load<S: EventStore>(
  store: &S,
  event_id: Uuid,
) -> Result<(Event, Vec<Participant>)> {
  let event = store
    .get_event(event_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::EventNotFound(event_id))?;
  let roster = store.list_participants(event_id).await.map_err(Error::store)?;
  Ok((event, roster))
}

/// Register one person: check for a duplicate face within the event,
/// allocate a seat, and append.
pub async fn register<S: EventStore>(
  store: &S,
  event_id: Uuid,
  request: RegistrationRequest,
  policy: &RegistrationPolicy,
) -> Result<RegistrationOutcome> {
  let (event, roster) = load(store, event_id).await?;

  match plan(&event, &roster, request, policy)? {
    RegistrationDecision::Register(input) => {
      let participant = store
        .add_participant(event_id, input)
        .await
        .map_err(Error::store)?;
      tracing::info!(
        %event_id,
        serial_no = participant.serial_no,
        seat = participant.seat.as_deref().unwrap_or(seating::FULL),
        "participant registered"
      );
      Ok(RegistrationOutcome::Registered { participant })
    }
    RegistrationDecision::Duplicate(matched) => {
      tracing::info!(
        %event_id,
        matched = matched.matched_label.as_deref().unwrap_or_default(),
        "duplicate face; registration skipped"
      );
      Ok(RegistrationOutcome::Duplicate { matched })
    }
    RegistrationDecision::HallFull => {
      tracing::info!(%event_id, "hall full; registration blocked");
      Ok(RegistrationOutcome::HallFull)
    }
  }
}

/// A record that [`import`] could not register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
  /// 0-based position in the imported list.
  pub index:  usize,
  pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
  pub registered: Vec<Participant>,
  pub skipped:    Vec<SkippedRecord>,
}

/// Bulk-register `records` in order, seating each against the growing
/// roster. Faces are not compared; imported rows are taken as distinct
/// people. Records without a usable gender or with a non-finite embedding,
/// and those that hit a full hall under [`FullHallPolicy::Block`], are
/// skipped and reported.
pub async fn import<S: EventStore>(
  store: &S,
  event_id: Uuid,
  records: Vec<RegistrationRequest>,
  policy: &RegistrationPolicy,
) -> Result<ImportReport> {
  let (event, mut roster) = load(store, event_id).await?;
  let mut report = ImportReport::default();

  for (index, record) in records.into_iter().enumerate() {
    let decision = match plan_with(&event, &roster, record, policy, false) {
      Ok(d) => d,
      Err(e @ (Error::GenderUnresolved | Error::InvalidEmbedding)) => {
        report.skipped.push(SkippedRecord { index, reason: e.to_string() });
        continue;
      }
      Err(e) => return Err(e),
    };
    match decision {
      RegistrationDecision::Register(input) => {
        let participant = store
          .add_participant(event_id, input)
          .await
          .map_err(Error::store)?;
        roster.push(participant.clone());
        report.registered.push(participant);
      }
      RegistrationDecision::HallFull => report.skipped.push(SkippedRecord {
        index,
        reason: "hall full".to_owned(),
      }),
      // not produced: faces are not compared on import
      RegistrationDecision::Duplicate(_) => report.skipped.push(SkippedRecord {
        index,
        reason: "duplicate".to_owned(),
      }),
    }
  }

  tracing::info!(
    %event_id,
    registered = report.registered.len(),
    skipped = report.skipped.len(),
    "import finished"
  );
  Ok(report)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::event::HallLayout;

  fn event(rows: u32, cols: u32, cluster: u32, privacy_mode: bool) -> Event {
    Event {
      event_id: Uuid::new_v4(),
      name: "Orientation".into(),
      layout: HallLayout::new(rows, cols, cluster).unwrap(),
      privacy_mode,
      created_at: Utc::now(),
    }
  }

  fn seated(event: &Event, serial_no: u32, new: NewParticipant) -> Participant {
    Participant {
      event_id: event.event_id,
      serial_no,
      gender: new.gender,
      seat: new.seat,
      name: new.name,
      external_id: new.external_id,
      branch: new.branch,
      age: new.age,
      embedding: new.embedding,
      registered_at: Utc::now(),
    }
  }

  fn request(gender: Gender, name: &str, embedding: Vec<f32>) -> RegistrationRequest {
    RegistrationRequest {
      gender: Some(gender),
      name: Some(name.into()),
      embedding,
      ..Default::default()
    }
  }

  fn registered(decision: RegistrationDecision) -> NewParticipant {
    match decision {
      RegistrationDecision::Register(p) => p,
      other => panic!("expected registration, got {other:?}"),
    }
  }

  #[test]
  fn same_face_is_flagged_with_label() {
    let evt = event(2, 4, 1, false);
    let policy = RegistrationPolicy::default();
    let first = registered(
      plan(&evt, &[], request(Gender::Female, "Ada", vec![1.0, 0.0, 0.2]), &policy)
        .unwrap(),
    );
    assert_eq!(first.seat.as_deref(), Some("Row A, Seat 1"));
    let roster = vec![seated(&evt, 1, first)];

    let again = plan(&evt, &roster, request(Gender::Female, "Ada?", vec![1.0, 0.0, 0.2]), &policy)
      .unwrap();
    match again {
      RegistrationDecision::Duplicate(m) => {
        assert!(m.is_duplicate);
        assert_eq!(m.matched_label.as_deref(), Some("Ada"));
      }
      other => panic!("expected duplicate, got {other:?}"),
    }
  }

  #[test]
  fn missing_embedding_skips_duplicate_check() {
    let evt = event(2, 4, 1, false);
    let policy = RegistrationPolicy::default();
    let roster = vec![seated(
      &evt,
      1,
      NewParticipant {
        seat: Some("Row A, Seat 1".into()),
        embedding: vec![1.0, 0.0],
        ..NewParticipant::new(Gender::Female)
      },
    )];
    let p = registered(plan(&evt, &roster, request(Gender::Female, "B", vec![]), &policy).unwrap());
    assert_eq!(p.seat.as_deref(), Some("Row A, Seat 3"));
  }

  #[test]
  fn unknown_gender_needs_an_override() {
    let evt = event(1, 2, 1, false);
    let req = RegistrationRequest {
      detected_gender: Some(DetectedGender::Unknown),
      ..Default::default()
    };
    let err = plan(&evt, &[], req.clone(), &RegistrationPolicy::default()).unwrap_err();
    assert!(matches!(err, Error::GenderUnresolved));

    let req = RegistrationRequest { gender: Some(Gender::NonBinary), ..req };
    let p = registered(plan(&evt, &[], req, &RegistrationPolicy::default()).unwrap());
    assert_eq!(p.seat.as_deref(), Some("Row A, Seat 2"));
  }

  #[test]
  fn non_finite_embedding_is_rejected() {
    let evt = event(1, 2, 1, false);
    let policy = RegistrationPolicy::default();
    for bad in [vec![f32::INFINITY, 0.5], vec![0.1, f32::NAN]] {
      let err = plan(&evt, &[], request(Gender::Female, "x", bad), &policy).unwrap_err();
      assert!(matches!(err, Error::InvalidEmbedding));
    }
  }

  #[test]
  fn full_hall_follows_policy() {
    let evt = event(1, 2, 1, false);
    let roster = vec![seated(
      &evt,
      1,
      NewParticipant { seat: Some("Row A, Seat 1".into()), ..NewParticipant::new(Gender::Female) },
    )];

    let block = RegistrationPolicy { on_full: FullHallPolicy::Block, ..Default::default() };
    let decision = plan(&evt, &roster, request(Gender::Female, "late", vec![]), &block).unwrap();
    assert_eq!(decision, RegistrationDecision::HallFull);

    let keep = RegistrationPolicy::default();
    let p = registered(plan(&evt, &roster, request(Gender::Female, "late", vec![]), &keep).unwrap());
    assert_eq!(p.seat, None);
    assert_eq!(p.name.as_deref(), Some("late"));
  }

  #[test]
  fn privacy_mode_drops_personal_fields() {
    let evt = event(1, 2, 1, true);
    let req = RegistrationRequest {
      gender: Some(Gender::Male),
      name: Some("Grace".into()),
      external_id: Some("S-17".into()),
      branch: Some("CSE".into()),
      age: Some(20),
      ..Default::default()
    };
    let p = registered(plan(&evt, &[], req, &RegistrationPolicy::default()).unwrap());
    assert_eq!(p.name, None);
    assert_eq!(p.external_id, None);
    assert_eq!(p.branch, None);
    assert_eq!(p.age, Some(20));
    assert_eq!(p.seat.as_deref(), Some("Row A, Seat 2"));
  }

  #[test]
  fn request_from_face_carries_detection() {
    let face = DetectedFace {
      bbox:       crate::face::BoundingBox { top: 0, right: 10, bottom: 10, left: 0 },
      embedding:  vec![0.5, 0.5],
      gender:     DetectedGender::Female,
      confidence: 0.93,
    };
    let req = RegistrationRequest::from_face(&face);
    assert_eq!(req.detected_gender, Some(DetectedGender::Female));
    assert_eq!(req.embedding, vec![0.5, 0.5]);
    assert_eq!(req.gender, None);
  }
}
