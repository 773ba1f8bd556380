//! [`Admission`]: the operations exposed to callers.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rollcall_core::{
  Error, Result,
  attendance::{AttendanceFact, Recorded},
  challenge::{ChallengeStore, IssuedChallenge},
  clock::{Clock, SystemClock},
  credential::Credential,
  geofence::{Coordinates, GeofenceConfig},
  session::{SessionSummary, SessionToken},
  store::RollcallStore,
  subject::{Role, Subject},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  config::{AdmissionConfig, MissingGeofencePolicy},
  payload::{
    AdmissionOutcome, AdmissionRequest, AttendanceResult, GeofenceCheck,
    RegistrationPayload,
  },
};

/// Whether a subject can authenticate yet, and with what.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
  pub subject_id: Uuid,
  pub enrolled:   bool,
  pub credential: Option<Credential>,
}

pub struct Admission<S> {
  pub(crate) store:      Arc<S>,
  pub(crate) challenges: ChallengeStore,
  pub(crate) clock:      Arc<dyn Clock>,
  pub(crate) config:     AdmissionConfig,
}

impl<S: RollcallStore> Admission<S> {
  pub fn new(store: Arc<S>, config: AdmissionConfig) -> Self {
    Self::with_clock(store, config, Arc::new(SystemClock))
  }

  pub fn with_clock(
    store: Arc<S>,
    config: AdmissionConfig,
    clock: Arc<dyn Clock>,
  ) -> Self {
    let challenges =
      ChallengeStore::new(config.challenge_validity(), config.challenge_capacity);
    Self { store, challenges, clock, config }
  }

  pub fn config(&self) -> &AdmissionConfig { &self.config }

  async fn require_subject(&self, subject_id: Uuid) -> Result<Subject> {
    self
      .store
      .get_subject(subject_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubjectNotFound(subject_id))
  }

  // ─── Identity ──────────────────────────────────────────────────────────────

  pub async fn add_subject(&self, display_name: String, role: Role) -> Result<Subject> {
    let subject = self
      .store
      .add_subject(display_name, role)
      .await
      .map_err(Error::store)?;
    tracing::info!(subject_id = %subject.subject_id, %role, "subject created");
    Ok(subject)
  }

  pub async fn get_subject(&self, subject_id: Uuid) -> Result<Subject> {
    self.require_subject(subject_id).await
  }

  // ─── Ceremonies ────────────────────────────────────────────────────────────

  /// Start a ceremony (registration or authentication) for `subject_id`.
  pub async fn issue_challenge(&self, subject_id: Uuid) -> Result<IssuedChallenge> {
    self.require_subject(subject_id).await?;
    let issued = self.challenges.issue(subject_id, self.clock.now());
    tracing::debug!(%subject_id, ceremony_id = %issued.ceremony_id, "challenge issued");
    Ok(issued)
  }

  /// Complete a registration ceremony and enroll the new credential.
  pub async fn register_credential(
    &self,
    subject_id: Uuid,
    payload: RegistrationPayload,
  ) -> Result<Credential> {
    let now = self.clock.now();
    let credential = self.registration_ceremony(subject_id, payload, now).await?;
    tracing::info!(
      %subject_id,
      credential_id = %credential.credential_id,
      aaguid = %credential.aaguid,
      format = %credential.attestation_format,
      "credential enrolled"
    );
    Ok(credential)
  }

  /// Token, ceremony, geofence, then the ledger. Nothing is recorded unless
  /// every earlier stage passes.
  pub async fn authenticate_and_admit(
    &self,
    request: AdmissionRequest,
  ) -> Result<AttendanceResult> {
    let now = self.clock.now();
    let subject_id = request.subject_id;

    let session = self
      .store
      .session_by_token(request.token)
      .await
      .map_err(Error::store)?
      .ok_or(Error::TokenNotFound)?;
    session.check_admissible(now)?;

    self
      .authentication_ceremony(subject_id, request.assertion, now)
      .await?;

    let geofence = self.check_geofence(subject_id, request.location).await?;

    let recorded = self
      .store
      .record_if_absent(subject_id, session.session_id, now)
      .await
      .map_err(Error::store)?;

    let (outcome, fact) = match recorded {
      Recorded::Created(fact) => (AdmissionOutcome::Created, fact),
      Recorded::AlreadyPresent(fact) => (AdmissionOutcome::AlreadyPresent, fact),
    };
    tracing::info!(
      %subject_id,
      session_id = %session.session_id,
      ?outcome,
      "admission granted"
    );
    Ok(AttendanceResult { outcome, fact, geofence })
  }

  async fn check_geofence(
    &self,
    subject_id: Uuid,
    location: Option<Coordinates>,
  ) -> Result<GeofenceCheck> {
    let policy = self.config.missing_geofence;
    let Some(config) = self.store.active_geofence().await.map_err(Error::store)? else {
      return match policy {
        MissingGeofencePolicy::Admit => {
          tracing::warn!(%subject_id, "no geofence configured; location check bypassed");
          Ok(GeofenceCheck::NotConfigured)
        }
        MissingGeofencePolicy::Reject => Err(Error::GeofenceRequired),
      };
    };

    let point = location.ok_or(Error::LocationRequired)?;
    point.validate()?;

    let Ok(fence) = config.complete() else {
      return match policy {
        MissingGeofencePolicy::Admit => {
          tracing::warn!(
            %subject_id,
            ?config,
            "geofence record is partial; location check bypassed"
          );
          Ok(GeofenceCheck::Partial)
        }
        MissingGeofencePolicy::Reject => Err(Error::GeofenceRequired),
      };
    };

    let distance_m = fence.distance_m(point);
    if distance_m <= fence.radius_m {
      Ok(GeofenceCheck::Within { distance_m })
    } else {
      tracing::info!(%subject_id, distance_m, radius_m = fence.radius_m, "outside geofence");
      Err(Error::OutsideGeofence { distance_m, radius_m: fence.radius_m })
    }
  }

  // ─── Credential registry ───────────────────────────────────────────────────

  /// Revoke every credential of `subject_id` so it can enroll again.
  pub async fn reset_credential(&self, subject_id: Uuid) -> Result<u64> {
    self.require_subject(subject_id).await?;
    let removed = self.store.revoke_all(subject_id).await.map_err(Error::store)?;
    tracing::info!(%subject_id, removed, "credential reset");
    Ok(removed)
  }

  pub async fn credential_status(&self, subject_id: Uuid) -> Result<CredentialStatus> {
    self.require_subject(subject_id).await?;
    let credential = self
      .store
      .credential_for_subject(subject_id)
      .await
      .map_err(Error::store)?;
    Ok(CredentialStatus {
      subject_id,
      enrolled: credential.is_some(),
      credential,
    })
  }

  // ─── Sessions ──────────────────────────────────────────────────────────────

  /// Open a session valid for `duration_minutes` from now.
  pub async fn create_session_token(
    &self,
    issuer_id: Uuid,
    topic_id: Uuid,
    duration_minutes: i64,
  ) -> Result<SessionToken> {
    if duration_minutes <= 0 || duration_minutes > self.config.max_session_minutes {
      return Err(Error::InvalidDuration(duration_minutes));
    }
    self.require_subject(issuer_id).await?;

    let now: DateTime<Utc> = self.clock.now();
    let validity = Duration::try_minutes(duration_minutes)
      .filter(|v| now.checked_add_signed(*v).is_some())
      .ok_or(Error::InvalidDuration(duration_minutes))?;
    let session = SessionToken::generate(issuer_id, topic_id, now, validity);
    self
      .store
      .insert_session(session.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(
      %issuer_id,
      %topic_id,
      session_id = %session.session_id,
      expires_at = %session.expires_at,
      "session opened"
    );
    Ok(session)
  }

  pub async fn sessions_for_issuer(&self, issuer_id: Uuid) -> Result<Vec<SessionSummary>> {
    self.require_subject(issuer_id).await?;
    self
      .store
      .sessions_by_issuer(issuer_id)
      .await
      .map_err(Error::store)
  }

  pub async fn attendance_for_session(
    &self,
    session_id: Uuid,
  ) -> Result<Vec<AttendanceFact>> {
    self
      .store
      .attendance_for_session(session_id)
      .await
      .map_err(Error::store)
  }

  // ─── Geofence administration ───────────────────────────────────────────────

  pub async fn get_geofence(&self) -> Result<Option<GeofenceConfig>> {
    self.store.active_geofence().await.map_err(Error::store)
  }

  pub async fn set_geofence(&self, config: GeofenceConfig) -> Result<GeofenceConfig> {
    config.validate()?;
    let stored = self.store.set_geofence(config).await.map_err(Error::store)?;
    if stored.complete().is_err() {
      tracing::warn!(?stored, "geofence saved without center or radius");
    } else {
      tracing::info!(?stored, "geofence updated");
    }
    Ok(stored)
  }
}
