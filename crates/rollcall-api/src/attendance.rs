//! `POST /attendance`: authenticate and admit in one request.
//!
//! Returns 201 when the attendance fact was created and 200 when the subject
//! was already present; both carry an [`rollcall_admission::AttendanceResult`].

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rollcall_admission::{
  Admission, AdmissionOutcome, AdmissionRequest, AssertionPayload,
};
use rollcall_core::{geofence::Coordinates, store::RollcallStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{encoding, error::ApiError};

/// Buffers are base64url. Coordinates are optional but must come in pairs.
#[derive(Debug, Deserialize)]
pub struct AdmitBody {
  pub subject_id:         Uuid,
  pub token:              String,
  pub latitude:           Option<f64>,
  pub longitude:          Option<f64>,
  pub ceremony_id:        Uuid,
  #[serde(deserialize_with = "encoding::bytes")]
  pub credential_id:      Vec<u8>,
  #[serde(deserialize_with = "encoding::bytes")]
  pub client_data_json:   Vec<u8>,
  #[serde(deserialize_with = "encoding::bytes")]
  pub authenticator_data: Vec<u8>,
  #[serde(deserialize_with = "encoding::bytes")]
  pub signature:          Vec<u8>,
}

impl AdmitBody {
  fn into_request(self) -> Result<AdmissionRequest, ApiError> {
    let location = match (self.latitude, self.longitude) {
      (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
      (None, None) => None,
      _ => {
        return Err(ApiError::BadRequest(
          "latitude and longitude must be given together".into(),
        ));
      }
    };
    Ok(AdmissionRequest {
      subject_id: self.subject_id,
      token: self.token,
      location,
      assertion: AssertionPayload {
        ceremony_id:        self.ceremony_id,
        credential_id:      self.credential_id,
        client_data_json:   self.client_data_json,
        authenticator_data: self.authenticator_data,
        signature:          self.signature,
      },
    })
  }
}

/// `POST /attendance`
pub async fn admit<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Json(body): Json<AdmitBody>,
) -> Result<impl IntoResponse, ApiError> {
  let result = admission.authenticate_and_admit(body.into_request()?).await?;
  let status = match result.outcome {
    AdmissionOutcome::Created => StatusCode::CREATED,
    AdmissionOutcome::AlreadyPresent => StatusCode::OK,
  };
  Ok((status, Json(result)))
}
