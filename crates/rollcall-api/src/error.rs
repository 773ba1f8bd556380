//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rollcall_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Admission(#[from] CoreError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Admission(e) => match e {
        CoreError::CeremonyInvalid(_)
        | CoreError::LocationRequired
        | CoreError::InvalidDuration(_)
        | CoreError::InvalidCoordinates(_) => StatusCode::BAD_REQUEST,
        CoreError::ChallengeNotFound
        | CoreError::ChallengeExpired
        | CoreError::SignatureInvalid
        | CoreError::CredentialNotRegistered
        | CoreError::CredentialSubjectMismatch
        | CoreError::PossibleCloneDetected { .. } => StatusCode::UNAUTHORIZED,
        CoreError::OutsideGeofence { .. } | CoreError::GeofenceRequired => {
          StatusCode::FORBIDDEN
        }
        CoreError::SubjectNotFound(_) | CoreError::TokenNotFound => {
          StatusCode::NOT_FOUND
        }
        CoreError::AlreadyEnrolled => StatusCode::CONFLICT,
        CoreError::TokenExpired => StatusCode::GONE,
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      ApiError::NotFound(_) => "not_found",
      ApiError::BadRequest(_) => "bad_request",
      ApiError::Admission(e) => e.kind(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = json!({ "error": self.kind(), "message": self.to_string() });
    (status, Json(body)).into_response()
  }
}
