//! Error types for `rollcall-core`.
//!
//! Every rejection the admission path can produce has its own variant so that
//! callers can render an accurate message and tests can assert on the exact
//! reason.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  // ── Protocol errors ─────────────────────────────────────────────────────
  #[error("no pending challenge for this ceremony")]
  ChallengeNotFound,

  #[error("challenge expired or not found")]
  ChallengeExpired,

  #[error("ceremony invalid: {0}")]
  CeremonyInvalid(String),

  #[error("signature verification failed")]
  SignatureInvalid,

  #[error("credential is not registered")]
  CredentialNotRegistered,

  #[error("credential does not belong to subject")]
  CredentialSubjectMismatch,

  #[error("subject already has an enrolled credential")]
  AlreadyEnrolled,

  #[error(
    "signature counter did not increase (stored {stored}, presented \
     {presented}); possible cloned authenticator"
  )]
  PossibleCloneDetected { stored: u32, presented: u32 },

  // ── Admission errors ────────────────────────────────────────────────────
  #[error("session token not found")]
  TokenNotFound,

  #[error("session token expired")]
  TokenExpired,

  #[error("location is required to mark attendance")]
  LocationRequired,

  #[error(
    "outside the allowed radius ({distance_m:.2}m from campus, limit \
     {radius_m:.2}m)"
  )]
  OutsideGeofence { distance_m: f64, radius_m: f64 },

  #[error("no complete geofence is configured")]
  GeofenceRequired,

  // ── Input errors ────────────────────────────────────────────────────────
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("invalid session duration: {0} minutes")]
  InvalidDuration(i64),

  #[error("invalid coordinates: {0}")]
  InvalidCoordinates(String),

  // ── Backend ─────────────────────────────────────────────────────────────
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// A stable snake_case tag for the error kind, suitable for wire formats.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::ChallengeNotFound => "challenge_not_found",
      Self::ChallengeExpired => "challenge_expired",
      Self::CeremonyInvalid(_) => "ceremony_invalid",
      Self::SignatureInvalid => "signature_invalid",
      Self::CredentialNotRegistered => "credential_not_registered",
      Self::CredentialSubjectMismatch => "credential_subject_mismatch",
      Self::AlreadyEnrolled => "already_enrolled",
      Self::PossibleCloneDetected { .. } => "possible_clone_detected",
      Self::TokenNotFound => "token_not_found",
      Self::TokenExpired => "token_expired",
      Self::LocationRequired => "location_required",
      Self::OutsideGeofence { .. } => "outside_geofence",
      Self::GeofenceRequired => "geofence_required",
      Self::SubjectNotFound(_) => "subject_not_found",
      Self::InvalidDuration(_) => "invalid_duration",
      Self::InvalidCoordinates(_) => "invalid_coordinates",
      Self::Store(_) => "store",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
