//! Handlers for registration, the roster and the seat map.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events/{id}/participants` | Registration order |
//! | `POST`   | `/events/{id}/participants` | 201 registered, 409 duplicate or hall full |
//! | `DELETE` | `/events/{id}/participants` | Clears the roster |
//! | `PATCH`  | `/events/{id}/participants` | Bulk edit; 409 if a seat is taken |
//! | `POST`   | `/events/{id}/participants/import` | Bulk register, no duplicate checks |
//! | `DELETE` | `/events/{id}/participants/{serial}` | Admin removal |
//! | `POST`   | `/events/{id}/duplicates` | Matcher query only; nothing is stored |
//! | `GET`    | `/events/{id}/seats` | Seat map |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use equi_core::{
  matcher::{self, MatchOutcome, SimilarityMetric},
  participant::{Participant, ParticipantEdit},
  registration::{self, ImportReport, RegistrationOutcome, RegistrationRequest},
  roster,
  seating::SeatMap,
  store::EventStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError, events};

// ─── Roster ──────────────────────────────────────────────────────────────────

/// `GET /events/{id}/participants`
pub async fn list<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Participant>>, ApiError> {
  events::load(&*state.store, id).await?;
  let roster = state.store.list_participants(id).await.map_err(ApiError::store)?;
  Ok(Json(roster))
}

/// `DELETE /events/{id}/participants`
pub async fn clear<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  events::load(&*state.store, id).await?;
  let _guard = state.registration.lock().await;
  state.store.clear_participants(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /events/{id}/participants`: body is a list of row edits.
pub async fn edit<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Vec<ParticipantEdit>>,
) -> Result<Json<Vec<Participant>>, ApiError> {
  let _guard = state.registration.lock().await;
  Ok(Json(roster::edit(&*state.store, id, body).await?))
}

/// `DELETE /events/{id}/participants/{serial}`
pub async fn remove<S: EventStore>(
  State(state): State<AppState<S>>,
  Path((id, serial)): Path<(Uuid, u32)>,
) -> Result<StatusCode, ApiError> {
  let _guard = state.registration.lock().await;
  if state
    .store
    .remove_participant(id, serial)
    .await
    .map_err(ApiError::store)?
  {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("participant #{serial} not found in event {id}")))
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

/// `POST /events/{id}/participants`: body is a registration request.
pub async fn register<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RegistrationRequest>,
) -> Result<Response, ApiError> {
  let outcome = {
    let _guard = state.registration.lock().await;
    registration::register(&*state.store, id, body, &state.settings.registration).await?
  };
  let status = match outcome {
    RegistrationOutcome::Registered { .. } => StatusCode::CREATED,
    RegistrationOutcome::Duplicate { .. } | RegistrationOutcome::HallFull => {
      StatusCode::CONFLICT
    }
  };
  Ok((status, Json(outcome)).into_response())
}

/// `POST /events/{id}/participants/import`: body is a list of requests.
pub async fn import<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Vec<RegistrationRequest>>,
) -> Result<Json<ImportReport>, ApiError> {
  let _guard = state.registration.lock().await;
  let report =
    registration::import(&*state.store, id, body, &state.settings.registration).await?;
  Ok(Json(report))
}

// ─── Duplicate query ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DuplicateQuery {
  pub embedding: Vec<f32>,
  /// Overrides the server's configured metric and threshold.
  pub metric:    Option<SimilarityMetric>,
}

/// `POST /events/{id}/duplicates` with body `{"embedding":[..]}`
pub async fn duplicates<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<DuplicateQuery>,
) -> Result<Json<MatchOutcome>, ApiError> {
  events::load(&*state.store, id).await?;
  let roster = state.store.list_participants(id).await.map_err(ApiError::store)?;
  let metric = body.metric.unwrap_or(state.settings.registration.metric);
  Ok(Json(matcher::check_roster(&body.embedding, &roster, metric)))
}

// ─── Seat map ────────────────────────────────────────────────────────────────

/// `GET /events/{id}/seats`
pub async fn seats<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SeatMap>, ApiError> {
  let event = events::load(&*state.store, id).await?;
  let roster = state.store.list_participants(id).await.map_err(ApiError::store)?;
  Ok(Json(SeatMap::build(&event.layout, &roster)))
}
