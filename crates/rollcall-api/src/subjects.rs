//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subjects` | Body: `{"display_name":"Asha","role":"student"}` |
//! | `GET`    | `/subjects/{id}` | 404 if not found |
//! | `GET`    | `/subjects/{id}/credential` | Enrollment status |
//! | `POST`   | `/subjects/{id}/credential` | Body: [`RegisterBody`]; completes registration |
//! | `DELETE` | `/subjects/{id}/credential` | Revokes so the subject can enroll again |
//! | `POST`   | `/subjects/{id}/challenge` | Starts a ceremony |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use rollcall_admission::{Admission, CredentialStatus, RegistrationPayload};
use rollcall_core::{
  store::RollcallStore,
  subject::{Role, Subject},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{encoding, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub display_name: String,
  pub role:         Role,
}

/// `POST /subjects`
pub async fn create<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  if body.display_name.trim().is_empty() {
    return Err(ApiError::BadRequest("display_name must not be empty".into()));
  }
  let subject = admission.add_subject(body.display_name, body.role).await?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /subjects/{id}`
pub async fn get_one<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Subject>, ApiError> {
  Ok(Json(admission.get_subject(id).await?))
}

// ─── Credential ───────────────────────────────────────────────────────────────

/// `GET /subjects/{id}/credential`
pub async fn credential_status<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CredentialStatus>, ApiError> {
  Ok(Json(admission.credential_status(id).await?))
}

/// Registration response as posted by the browser. Buffers are base64url.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub ceremony_id:        Uuid,
  #[serde(default, deserialize_with = "encoding::opt_bytes")]
  pub credential_id:      Option<Vec<u8>>,
  #[serde(deserialize_with = "encoding::bytes")]
  pub attestation_object: Vec<u8>,
  #[serde(deserialize_with = "encoding::bytes")]
  pub client_data_json:   Vec<u8>,
}

/// `POST /subjects/{id}/credential`
pub async fn register<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let credential = admission
    .register_credential(id, RegistrationPayload {
      ceremony_id:        body.ceremony_id,
      credential_id:      body.credential_id,
      attestation_object: body.attestation_object,
      client_data_json:   body.client_data_json,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(credential)))
}

/// `DELETE /subjects/{id}/credential`
pub async fn reset<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let removed = admission.reset_credential(id).await?;
  Ok(Json(json!({ "removed": removed })))
}

// ─── Challenge ────────────────────────────────────────────────────────────────

/// What the browser needs to call `navigator.credentials`.
#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
  pub ceremony_id:       Uuid,
  /// base64url nonce.
  pub challenge:         String,
  pub expires_at:        DateTime<Utc>,
  pub rp_id:             String,
  pub user_verification: &'static str,
}

/// `POST /subjects/{id}/challenge`
pub async fn challenge<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ChallengeResponse>, ApiError> {
  let issued = admission.issue_challenge(id).await?;
  let config = admission.config();
  Ok(Json(ChallengeResponse {
    ceremony_id:       issued.ceremony_id,
    challenge:         encoding::encode(&issued.challenge),
    expires_at:        issued.expires_at,
    rp_id:             config.relying_party.id.clone(),
    user_verification: if config.require_user_verification {
      "required"
    } else {
      "preferred"
    },
  }))
}
