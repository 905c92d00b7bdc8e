//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Oldest first |
//! | `POST`   | `/events` | Body: `{"name":..,"rows":..,"cols":..,"cluster_size":..}` |
//! | `GET`    | `/events/{id}` | 404 if not found |
//! | `DELETE` | `/events/{id}` | Removes roster, candidates and roles too |
//! | `PUT`    | `/events/{id}/layout` | Body: `{"rows":..,"cols":..,"cluster_size":..}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use equi_core::{
  event::{Event, HallLayout, NewEvent},
  roster,
  store::EventStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Fetch an event or fail with 404.
pub(crate) async fn load<S: EventStore>(store: &S, id: Uuid) -> Result<Event, ApiError> {
  store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /events`
pub async fn list<S: EventStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let events = state.store.list_events().await.map_err(ApiError::store)?;
  Ok(Json(events))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:         String,
  pub rows:         u32,
  pub cols:         u32,
  #[serde(default = "default_cluster")]
  pub cluster_size: u32,
  #[serde(default)]
  pub privacy_mode: bool,
}

fn default_cluster() -> u32 { 1 }

/// `POST /events`
pub async fn create<S: EventStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let layout = HallLayout::new(body.rows, body.cols, body.cluster_size)?;
  let event = state
    .store
    .create_event(NewEvent {
      name: body.name,
      layout,
      privacy_mode: body.privacy_mode,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Get / delete ────────────────────────────────────────────────────────────

/// `GET /events/{id}`
pub async fn get_one<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(load(&*state.store, id).await?))
}

/// `DELETE /events/{id}`
pub async fn delete_one<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if state.store.delete_event(id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("event {id} not found")))
  }
}

// ─── Layout ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LayoutBody {
  pub rows:         u32,
  pub cols:         u32,
  #[serde(default = "default_cluster")]
  pub cluster_size: u32,
}

/// `PUT /events/{id}/layout`
pub async fn put_layout<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LayoutBody>,
) -> Result<Json<Event>, ApiError> {
  let layout = HallLayout::new(body.rows, body.cols, body.cluster_size)?;
  let _guard = state.registration.lock().await;
  Ok(Json(roster::resize(&*state.store, id, layout).await?))
}
