//! The `RollcallStore` trait: persistence for every durable record the
//! admission core touches.
//!
//! The trait is implemented by storage backends (e.g. `rollcall-store-sqlite`).
//! Higher layers (`rollcall-admission`, `rollcall-api`) depend on this
//! abstraction, not on any concrete backend.
//!
//! Outcomes that are part of the protocol (already enrolled, counter did not
//! increase, already present) are returned as values. `Self::Error` is
//! reserved for backend failures.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  attendance::{AttendanceFact, Recorded},
  credential::{
    CounterPolicy, CounterUpdate, Credential, CredentialId, Enrollment,
    NewCredential,
  },
  geofence::GeofenceConfig,
  session::{SessionSummary, SessionToken},
  subject::{Role, Subject},
};

/// Abstraction over a Rollcall store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RollcallStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identity ──────────────────────────────────────────────────────────

  /// Create and persist a new subject.
  fn add_subject(
    &self,
    display_name: String,
    role: Role,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Retrieve a subject by UUID. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  // ── Credentials ───────────────────────────────────────────────────────

  /// Insert a credential unless the subject already owns one or the
  /// credential id is taken. The check and the insert are a single atomic
  /// step.
  fn enroll(
    &self,
    input: NewCredential,
  ) -> impl Future<Output = Result<Enrollment, Self::Error>> + Send + '_;

  fn credential_for_subject(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + '_;

  fn credential_by_id(
    &self,
    credential_id: CredentialId,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + '_;

  /// Replace the stored counter with `new_counter` if `policy` permits it,
  /// atomically with respect to other updates of the same credential.
  fn update_counter(
    &self,
    credential_id: CredentialId,
    new_counter: u32,
    policy: CounterPolicy,
    used_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<CounterUpdate, Self::Error>> + Send + '_;

  /// Delete every credential owned by `subject_id`; returns how many were
  /// removed.
  fn revoke_all(
    &self,
    subject_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Session tokens ────────────────────────────────────────────────────

  fn insert_session(
    &self,
    session: SessionToken,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn session_by_token(
    &self,
    token: String,
  ) -> impl Future<Output = Result<Option<SessionToken>, Self::Error>> + Send + '_;

  /// All sessions opened by `issuer_id`, newest first, with attendance counts.
  fn sessions_by_issuer(
    &self,
    issuer_id: Uuid,
  ) -> impl Future<Output = Result<Vec<SessionSummary>, Self::Error>> + Send + '_;

  // ── Geofence ──────────────────────────────────────────────────────────

  /// The singleton geofence record, if one has ever been written.
  fn active_geofence(
    &self,
  ) -> impl Future<Output = Result<Option<GeofenceConfig>, Self::Error>> + Send + '_;

  /// Create or replace the singleton geofence record.
  fn set_geofence(
    &self,
    config: GeofenceConfig,
  ) -> impl Future<Output = Result<GeofenceConfig, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  /// Record `subject_id` as present for `session_id` unless a fact for the
  /// pair already exists. Concurrent calls for one pair yield exactly one
  /// [`Recorded::Created`].
  fn record_if_absent(
    &self,
    subject_id: Uuid,
    session_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Recorded, Self::Error>> + Send + '_;

  /// Every fact recorded for `session_id`, oldest first.
  fn attendance_for_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AttendanceFact>, Self::Error>> + Send + '_;
}
