//! `GET` / `PUT /geofence`: the singleton campus geofence.

use std::sync::Arc;

use axum::{Json, extract::State};
use rollcall_admission::Admission;
use rollcall_core::{geofence::GeofenceConfig, store::RollcallStore};

use crate::error::ApiError;

/// `GET /geofence`, 404 until one has been saved.
pub async fn get_one<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
) -> Result<Json<GeofenceConfig>, ApiError> {
  admission
    .get_geofence()
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("no geofence configured".into()))
}

/// `PUT /geofence`. Body fields may be individually absent or null.
pub async fn replace<S: RollcallStore>(
  State(admission): State<Arc<Admission<S>>>,
  Json(body): Json<GeofenceConfig>,
) -> Result<Json<GeofenceConfig>, ApiError> {
  Ok(Json(admission.set_geofence(body).await?))
}
