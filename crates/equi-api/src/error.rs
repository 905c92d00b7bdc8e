//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use equi_core::store::{StoreError, StoreErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E: StoreError>(err: E) -> Self {
    let kind = err.kind();
    Self::from_store(kind, Box::new(err))
  }

  fn from_store(
    kind: StoreErrorKind,
    source: Box<dyn std::error::Error + Send + Sync>,
  ) -> Self {
    match kind {
      StoreErrorKind::NotFound => Self::NotFound(source.to_string()),
      StoreErrorKind::Conflict => Self::Conflict(source.to_string()),
      StoreErrorKind::Invalid => Self::BadRequest(source.to_string()),
      StoreErrorKind::Other => Self::Store(source),
    }
  }
}

impl From<equi_core::Error> for ApiError {
  fn from(err: equi_core::Error) -> Self {
    match err {
      equi_core::Error::EventNotFound(id) => Self::NotFound(format!("event {id} not found")),
      equi_core::Error::Store { kind, source } => Self::from_store(kind, source),
      other => Self::BadRequest(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
