//! Handlers for candidates, roles, role allocation and random teams.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` `PUT` | `/events/{id}/candidates` | PUT replaces the pool |
//! | `GET` `PUT` | `/events/{id}/roles` | PUT replaces the roles; order is kept |
//! | `POST` | `/events/{id}/allocation` | Body: `{"mode":"equality"}` or `{"threshold":0.25}` |
//! | `POST` | `/events/{id}/teams` | Body: `{"team_size":4,"seed":7}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use equi_core::{
  balancer::{self, BalanceMode, RoleAllocation},
  grouping,
  participant::Participant,
  store::EventStore,
  team::{self, Role, TeamCandidate},
};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, events};

// ─── Candidates ──────────────────────────────────────────────────────────────

/// `GET /events/{id}/candidates`
pub async fn list_candidates<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamCandidate>>, ApiError> {
  events::load(&*state.store, id).await?;
  let pool = state.store.list_candidates(id).await.map_err(ApiError::store)?;
  Ok(Json(pool))
}

/// `PUT /events/{id}/candidates`
pub async fn put_candidates<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Vec<TeamCandidate>>,
) -> Result<StatusCode, ApiError> {
  team::validate_candidates(&body)?;
  events::load(&*state.store, id).await?;
  state.store.replace_candidates(id, body).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// `GET /events/{id}/roles`
pub async fn list_roles<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Role>>, ApiError> {
  events::load(&*state.store, id).await?;
  let roles = state.store.list_roles(id).await.map_err(ApiError::store)?;
  Ok(Json(roles))
}

/// `PUT /events/{id}/roles`
pub async fn put_roles<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<Vec<Role>>,
) -> Result<StatusCode, ApiError> {
  team::validate_roles(&body)?;
  events::load(&*state.store, id).await?;
  state.store.replace_roles(id, body).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Allocation ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AllocationBody {
  pub mode:      Option<BalanceMode>,
  /// A raw threshold; wins over `mode` when both are given.
  pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
  pub threshold:  f64,
  #[serde(flatten)]
  pub allocation: RoleAllocation,
  /// The audit trail rendered for display.
  pub log:        Vec<String>,
}

/// `POST /events/{id}/allocation`
pub async fn allocate<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AllocationBody>,
) -> Result<Json<AllocationResponse>, ApiError> {
  let threshold = match (body.threshold, body.mode) {
    (Some(t), _) if !t.is_finite() || t < 0.0 => {
      return Err(ApiError::BadRequest(format!("invalid balance threshold: {t}")));
    }
    (Some(t), _) => t,
    (None, Some(mode)) => mode.threshold(),
    (None, None) => state.settings.balance.threshold(),
  };

  events::load(&*state.store, id).await?;
  let candidates = state.store.list_candidates(id).await.map_err(ApiError::store)?;
  let roles = state.store.list_roles(id).await.map_err(ApiError::store)?;

  let allocation = balancer::allocate_roles(&candidates, &roles, threshold)?;
  let log = allocation.audit_lines();
  Ok(Json(AllocationResponse { threshold, allocation, log }))
}

// ─── Random teams ────────────────────────────────────────────────────────────

/// Who gets dealt into teams.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamPool {
  #[default]
  Participants,
  Candidates,
}

#[derive(Debug, Deserialize)]
pub struct TeamsBody {
  pub team_size: usize,
  /// Fixes the shuffle; omitted means a fresh random draw.
  pub seed:      Option<u64>,
  #[serde(default)]
  pub pool:      TeamPool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Teams {
  Participants(Vec<Vec<Participant>>),
  Candidates(Vec<Vec<TeamCandidate>>),
}

/// `POST /events/{id}/teams`
pub async fn generate<S: EventStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TeamsBody>,
) -> Result<Json<Teams>, ApiError> {
  events::load(&*state.store, id).await?;
  let mut rng = match body.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };

  let teams = match body.pool {
    TeamPool::Participants => {
      let roster = state.store.list_participants(id).await.map_err(ApiError::store)?;
      Teams::Participants(grouping::generate_teams(&roster, body.team_size, &mut rng)?)
    }
    TeamPool::Candidates => {
      let pool = state.store.list_candidates(id).await.map_err(ApiError::store)?;
      Teams::Candidates(grouping::generate_teams(&pool, body.team_size, &mut rng)?)
    }
  };
  Ok(Json(teams))
}
