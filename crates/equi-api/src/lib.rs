//! JSON REST API for Equi.
//!
//! Exposes an axum [`Router`] backed by any [`equi_core::store::EventStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", equi_api::api_router(AppState::new(store, settings)))
//! ```

pub mod error;
pub mod events;
pub mod participants;
pub mod teams;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use equi_core::{balancer::BalanceMode, registration::RegistrationPolicy, store::EventStore};
use serde::Deserialize;
use tokio::sync::Mutex;

pub use error::ApiError;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Server-wide defaults applied when a request does not say otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ApiSettings {
  #[serde(default)]
  pub registration: RegistrationPolicy,
  #[serde(default)]
  pub balance:      BalanceMode,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: EventStore> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
  /// Held across "read roster, allocate seat, append" so two registrations
  /// never pick the same seat. Roster edits and hall resizes take it too.
  registration: Arc<Mutex<()>>,
}

impl<S: EventStore> AppState<S> {
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self {
      store,
      settings: Arc::new(settings),
      registration: Arc::new(Mutex::new(())),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: EventStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/{id}", get(events::get_one::<S>).delete(events::delete_one::<S>))
    .route("/events/{id}/layout", put(events::put_layout::<S>))
    // Registration and roster
    .route(
      "/events/{id}/participants",
      get(participants::list::<S>)
        .post(participants::register::<S>)
        .patch(participants::edit::<S>)
        .delete(participants::clear::<S>),
    )
    .route("/events/{id}/participants/import", post(participants::import::<S>))
    .route("/events/{id}/participants/{serial}", delete(participants::remove::<S>))
    .route("/events/{id}/duplicates", post(participants::duplicates::<S>))
    .route("/events/{id}/seats", get(participants::seats::<S>))
    // Teams
    .route(
      "/events/{id}/candidates",
      get(teams::list_candidates::<S>).put(teams::put_candidates::<S>),
    )
    .route("/events/{id}/roles", get(teams::list_roles::<S>).put(teams::put_roles::<S>))
    .route("/events/{id}/allocation", post(teams::allocate::<S>))
    .route("/events/{id}/teams", post(teams::generate::<S>))
    .with_state(state)
}
