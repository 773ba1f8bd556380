//! Inputs and outputs of the admission operations.
//!
//! Binary fields hold raw bytes; transport encodings are the caller's concern.

use rollcall_core::{attendance::AttendanceFact, geofence::Coordinates};
use serde::Serialize;
use uuid::Uuid;

/// A browser's answer to `navigator.credentials.create`.
#[derive(Debug, Clone)]
pub struct RegistrationPayload {
  pub ceremony_id:        Uuid,
  /// Optional echo of the new credential's id; checked against the
  /// attested credential data when present.
  pub credential_id:      Option<Vec<u8>>,
  pub attestation_object: Vec<u8>,
  pub client_data_json:   Vec<u8>,
}

/// A browser's answer to `navigator.credentials.get`.
#[derive(Debug, Clone)]
pub struct AssertionPayload {
  pub ceremony_id:        Uuid,
  pub credential_id:      Vec<u8>,
  pub client_data_json:   Vec<u8>,
  pub authenticator_data: Vec<u8>,
  pub signature:          Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AdmissionRequest {
  pub subject_id: Uuid,
  /// The opaque session token string the faculty member handed out.
  pub token:      String,
  pub location:   Option<Coordinates>,
  pub assertion:  AssertionPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionOutcome {
  Created,
  AlreadyPresent,
}

/// How the location check was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GeofenceCheck {
  Within { distance_m: f64 },
  /// No geofence record exists; admitted under the fail-open policy.
  NotConfigured,
  /// The record lacks a center or radius; admitted under the fail-open policy.
  Partial,
}

impl GeofenceCheck {
  pub fn was_bypassed(&self) -> bool { !matches!(self, Self::Within { .. }) }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceResult {
  pub outcome:  AdmissionOutcome,
  pub fact:     AttendanceFact,
  pub geofence: GeofenceCheck,
}
