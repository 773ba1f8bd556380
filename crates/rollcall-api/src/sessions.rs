//! Handlers for `/sessions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions` | Body: `{"issuer_id":..,"topic_id":..,"duration_minutes":10}` |
//! | `GET`  | `/sessions?issuer_id=<id>` | Newest first, with attendance counts |
//! | `GET`  | `/sessions/{id}/attendance` | Oldest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use rollcall_admission::Admission;
use rollcall_core::{
  attendance::AttendanceFact, session::SessionSummary, store::RollcallStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub issuer_id:        Uuid,
  /// The class or topic the session is for.
  pub topic_id:         Uuid,
  pub duration_minutes: i64,
}

/// `POST /sessions`
pub async fn create<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let session = admission
    .create_session_token(body.issuer_id, body.topic_id, body.duration_minutes)
    .await?;
  Ok((StatusCode::CREATED, Json(session)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub issuer_id: Uuid,
}

/// `GET /sessions?issuer_id=<id>`
pub async fn list<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
  Ok(Json(admission.sessions_for_issuer(params.issuer_id).await?))
}

/// `GET /sessions/{id}/attendance`
pub async fn attendance<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceFact>>, ApiError> {
  Ok(Json(admission.attendance_for_session(id).await?))
}
