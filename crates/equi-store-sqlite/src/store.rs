//! [`SqliteStore`], the SQLite implementation of [`EventStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use equi_core::{
  event::{Event, HallLayout, NewEvent},
  participant::{NewParticipant, Participant, ParticipantEdit},
  store::EventStore,
  team::{self, Role, TeamCandidate},
};

use crate::{
  Error, Result,
  encode::{
    RawCandidate, RawEvent, RawParticipant, RawRole, encode_dt, encode_embedding,
    encode_gender, encode_requirements, encode_skills, encode_uuid,
  },
  schema::SCHEMA,
};

/// What happened inside the insert transaction of `add_participant`.
enum Insert {
  Done(u32),
  NoEvent,
  SeatTaken,
}

/// What happened inside the transaction of `edit_participants`.
enum Edit {
  Done,
  NoEvent,
  NoParticipant(u32),
  SeatTaken(String),
}

/// Column values of one edited row, in `UPDATE` parameter order after the
/// key.
type EditRow = (
  u32,
  String,
  Option<String>,
  Option<String>,
  Option<String>,
  Option<String>,
  Option<u32>,
);

fn event_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM events WHERE event_id = ?1",
        rusqlite::params![id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Equi event store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fail with [`Error::EventNotFound`] unless `id` exists.
  async fn require_event(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let exists = self.conn.call(move |conn| Ok(event_exists(conn, &id_str)?)).await?;
    if exists { Ok(()) } else { Err(Error::EventNotFound(id)) }
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for SqliteStore {
  type Error = Error;

  // ── Events ────────────────────────────────────────────────────────────────

  async fn create_event(&self, input: NewEvent) -> Result<Event> {
    let event = Event {
      event_id:     Uuid::new_v4(),
      name:         input.name,
      layout:       input.layout,
      privacy_mode: input.privacy_mode,
      created_at:   Utc::now(),
    };

    let id_str  = encode_uuid(event.event_id);
    let name    = event.name.clone();
    let rows    = event.layout.rows();
    let cols    = event.layout.cols();
    let cluster = event.layout.cluster_size();
    let privacy = event.privacy_mode;
    let at_str  = encode_dt(event.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (
             event_id, name, hall_rows, hall_cols, cluster_size,
             privacy_mode, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, rows, cols, cluster, privacy, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(event_id = %event.event_id, "event created");
    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM events WHERE event_id = ?1", RawEvent::COLUMNS),
              rusqlite::params![id_str],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM events ORDER BY created_at, rowid",
          RawEvent::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_layout(&self, id: Uuid, layout: HallLayout) -> Result<Event> {
    let id_str  = encode_uuid(id);
    let rows    = layout.rows();
    let cols    = layout.cols();
    let cluster = layout.cluster_size();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE events SET hall_rows = ?2, hall_cols = ?3, cluster_size = ?4
           WHERE event_id = ?1",
          rusqlite::params![id_str, rows, cols, cluster],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::EventNotFound(id));
    }
    tracing::debug!(event_id = %id, rows, cols, cluster, "hall layout updated");
    self.get_event(id).await?.ok_or(Error::EventNotFound(id))
  }

  async fn delete_event(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    // Child rows go with the event through ON DELETE CASCADE.
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM events WHERE event_id = ?1", rusqlite::params![
          id_str
        ])?)
      })
      .await?;

    if deleted > 0 {
      tracing::debug!(event_id = %id, "event deleted");
    }
    Ok(deleted > 0)
  }

  // ── Participants ──────────────────────────────────────────────────────────

  async fn add_participant(
    &self,
    event_id: Uuid,
    input: NewParticipant,
  ) -> Result<Participant> {
    let registered_at = Utc::now();

    let id_str        = encode_uuid(event_id);
    let gender_str    = encode_gender(input.gender).to_owned();
    let seat          = input.seat.clone();
    let name          = input.name.clone();
    let external_id   = input.external_id.clone();
    let branch        = input.branch.clone();
    let age           = input.age;
    let embedding_str = encode_embedding(&input.embedding)?;
    let at_str        = encode_dt(registered_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let serial: Option<u32> = tx
          .query_row(
            "SELECT next_serial FROM events WHERE event_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(serial) = serial else {
          return Ok(Insert::NoEvent);
        };

        if let Some(seat) = &seat {
          let taken = tx
            .query_row(
              "SELECT 1 FROM participants WHERE event_id = ?1 AND seat = ?2",
              rusqlite::params![id_str, seat],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if taken {
            return Ok(Insert::SeatTaken);
          }
        }

        tx.execute(
          "INSERT INTO participants (
             event_id, serial_no, gender, seat, name, external_id,
             branch, age, embedding, registered_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            serial,
            gender_str,
            seat,
            name,
            external_id,
            branch,
            age,
            embedding_str,
            at_str,
          ],
        )?;
        tx.execute(
          "UPDATE events SET next_serial = next_serial + 1 WHERE event_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(Insert::Done(serial))
      })
      .await?;

    let serial_no = match outcome {
      Insert::Done(serial) => serial,
      Insert::NoEvent => return Err(Error::EventNotFound(event_id)),
      Insert::SeatTaken => {
        return Err(Error::SeatTaken {
          event_id,
          seat: input.seat.unwrap_or_default(),
        });
      }
    };

    Ok(Participant {
      event_id,
      serial_no,
      gender: input.gender,
      seat: input.seat,
      name: input.name,
      external_id: input.external_id,
      branch: input.branch,
      age: input.age,
      embedding: input.embedding,
      registered_at,
    })
  }

  async fn list_participants(&self, event_id: Uuid) -> Result<Vec<Participant>> {
    let id_str = encode_uuid(event_id);

    let raws: Vec<RawParticipant> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM participants WHERE event_id = ?1 ORDER BY serial_no",
          RawParticipant::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawParticipant::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawParticipant::into_participant).collect()
  }

  async fn edit_participants(
    &self,
    event_id: Uuid,
    edits: Vec<ParticipantEdit>,
  ) -> Result<Vec<Participant>> {
    let id_str = encode_uuid(event_id);
    let serials: Vec<u32> = edits.iter().map(|e| e.serial_no).collect();
    let rows: Vec<EditRow> = edits
      .into_iter()
      .map(|e| {
        (
          e.serial_no,
          encode_gender(e.gender).to_owned(),
          e.seat,
          e.name,
          e.external_id,
          e.branch,
          e.age,
        )
      })
      .collect();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !event_exists(&tx, &id_str)? {
          return Ok(Edit::NoEvent);
        }

        // Free every edited seat first so an edit may swap seats.
        {
          let mut free = tx.prepare(
            "UPDATE participants SET seat = NULL WHERE event_id = ?1 AND serial_no = ?2",
          )?;
          for (serial, ..) in &rows {
            if free.execute(rusqlite::params![id_str, serial])? == 0 {
              return Ok(Edit::NoParticipant(*serial));
            }
          }
        }

        {
          let mut taken =
            tx.prepare("SELECT 1 FROM participants WHERE event_id = ?1 AND seat = ?2")?;
          let mut update = tx.prepare(
            "UPDATE participants
             SET gender = ?3, seat = ?4, name = ?5, external_id = ?6, branch = ?7, age = ?8
             WHERE event_id = ?1 AND serial_no = ?2",
          )?;
          for (serial, gender, seat, name, external_id, branch, age) in &rows {
            if let Some(seat) = seat
              && taken.exists(rusqlite::params![id_str, seat])?
            {
              return Ok(Edit::SeatTaken(seat.clone()));
            }
            update.execute(rusqlite::params![
              id_str,
              serial,
              gender,
              seat,
              name,
              external_id,
              branch,
              age
            ])?;
          }
        }

        tx.commit()?;
        Ok(Edit::Done)
      })
      .await?;

    match outcome {
      Edit::Done => {}
      Edit::NoEvent => return Err(Error::EventNotFound(event_id)),
      Edit::NoParticipant(serial_no) => {
        return Err(Error::ParticipantNotFound { event_id, serial_no });
      }
      Edit::SeatTaken(seat) => return Err(Error::SeatTaken { event_id, seat }),
    }

    let roster = self.list_participants(event_id).await?;
    serials
      .into_iter()
      .map(|serial_no| {
        roster
          .iter()
          .find(|p| p.serial_no == serial_no)
          .cloned()
          .ok_or(Error::ParticipantNotFound { event_id, serial_no })
      })
      .collect()
  }

  async fn remove_participant(&self, event_id: Uuid, serial_no: u32) -> Result<bool> {
    let id_str = encode_uuid(event_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM participants WHERE event_id = ?1 AND serial_no = ?2",
          rusqlite::params![id_str, serial_no],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn clear_participants(&self, event_id: Uuid) -> Result<()> {
    self.require_event(event_id).await?;
    let id_str = encode_uuid(event_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM participants WHERE event_id = ?1", rusqlite::params![
          id_str
        ])?)
      })
      .await?;

    tracing::debug!(%event_id, deleted, "roster cleared");
    Ok(())
  }

  // ── Teams ─────────────────────────────────────────────────────────────────

  async fn replace_candidates(
    &self,
    event_id: Uuid,
    candidates: Vec<TeamCandidate>,
  ) -> Result<()> {
    team::validate_candidates(&candidates)?;
    self.require_event(event_id).await?;

    let id_str = encode_uuid(event_id);
    let rows = candidates
      .into_iter()
      .map(|c| {
        Ok((
          c.id,
          c.name,
          encode_gender(c.gender).to_owned(),
          encode_skills(&c.skills)?,
        ))
      })
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM candidates WHERE event_id = ?1", rusqlite::params![
          id_str
        ])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO candidates (event_id, position, candidate_id, name, gender, skills)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (position, (cid, name, gender, skills)) in rows.iter().enumerate() {
            stmt.execute(rusqlite::params![
              id_str,
              position as i64,
              cid,
              name,
              gender,
              skills
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_candidates(&self, event_id: Uuid) -> Result<Vec<TeamCandidate>> {
    let id_str = encode_uuid(event_id);

    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT candidate_id, name, gender, skills FROM candidates
           WHERE event_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawCandidate {
              candidate_id: row.get(0)?,
              name:         row.get(1)?,
              gender:       row.get(2)?,
              skills:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn replace_roles(&self, event_id: Uuid, roles: Vec<Role>) -> Result<()> {
    team::validate_roles(&roles)?;
    self.require_event(event_id).await?;

    let id_str = encode_uuid(event_id);
    let rows = roles
      .into_iter()
      .map(|r| Ok((r.name, r.capacity, encode_requirements(&r.requirements)?)))
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM roles WHERE event_id = ?1", rusqlite::params![id_str])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO roles (event_id, position, name, capacity, requirements)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (position, (name, capacity, requirements)) in rows.iter().enumerate() {
            stmt.execute(rusqlite::params![
              id_str,
              position as i64,
              name,
              capacity,
              requirements
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_roles(&self, event_id: Uuid) -> Result<Vec<Role>> {
    let id_str = encode_uuid(event_id);

    let raws: Vec<RawRole> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT name, capacity, requirements FROM roles
           WHERE event_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawRole {
              name:         row.get(0)?,
              capacity:     row.get(1)?,
              requirements: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRole::into_role).collect()
  }
}
