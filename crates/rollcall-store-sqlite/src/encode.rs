//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings in UTC. UUIDs are stored as
//! hyphenated lowercase strings, credential ids as unpadded base64url.

use chrono::{DateTime, SecondsFormat, Utc};
use rollcall_core::{
  attendance::{AttendanceFact, AttendanceStatus},
  credential::{Credential, CredentialId},
  geofence::GeofenceConfig,
  session::{SessionSummary, SessionToken},
  subject::{Role, Subject},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Fixed-width nanosecond precision keeps the text sortable and lossless.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown role: {s:?}")))
}

pub fn decode_status(s: &str) -> Result<AttendanceStatus> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown attendance status: {s:?}")))
}

pub fn encode_credential_id(id: &CredentialId) -> String { id.to_base64url() }

pub fn decode_credential_id(s: &str) -> Result<CredentialId> {
  CredentialId::from_base64url(s)
    .map_err(|e| Error::Decode(format!("credential id: {e}")))
}

pub fn decode_counter(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("sign count {n} out of range")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:   String,
  pub display_name: String,
  pub role:         String,
  pub created_at:   String,
}

impl RawSubject {
  pub const COLUMNS: &'static str = "subject_id, display_name, role, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:   row.get(0)?,
      display_name: row.get(1)?,
      role:         row.get(2)?,
      created_at:   row.get(3)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:   decode_uuid(&self.subject_id)?,
      display_name: self.display_name,
      role:         decode_role(&self.role)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `credentials` row.
pub struct RawCredential {
  pub credential_id:      String,
  pub subject_id:         String,
  pub public_key:         Vec<u8>,
  pub sign_count:         i64,
  pub aaguid:             String,
  pub attestation_format: String,
  pub created_at:         String,
  pub last_used_at:       Option<String>,
}

impl RawCredential {
  pub const COLUMNS: &'static str = "credential_id, subject_id, public_key, \
    sign_count, aaguid, attestation_format, created_at, last_used_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      credential_id:      row.get(0)?,
      subject_id:         row.get(1)?,
      public_key:         row.get(2)?,
      sign_count:         row.get(3)?,
      aaguid:             row.get(4)?,
      attestation_format: row.get(5)?,
      created_at:         row.get(6)?,
      last_used_at:       row.get(7)?,
    })
  }

  pub fn into_credential(self) -> Result<Credential> {
    Ok(Credential {
      credential_id:      decode_credential_id(&self.credential_id)?,
      subject_id:         decode_uuid(&self.subject_id)?,
      public_key:         self.public_key,
      sign_count:         decode_counter(self.sign_count)?,
      aaguid:             decode_uuid(&self.aaguid)?,
      attestation_format: self.attestation_format,
      created_at:         decode_dt(&self.created_at)?,
      last_used_at:       self.last_used_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub session_id: String,
  pub issuer_id:  String,
  pub topic_id:   String,
  pub token:      String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub const COLUMNS: &'static str =
    "session_id, issuer_id, topic_id, token, created_at, expires_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id: row.get(0)?,
      issuer_id:  row.get(1)?,
      topic_id:   row.get(2)?,
      token:      row.get(3)?,
      created_at: row.get(4)?,
      expires_at: row.get(5)?,
    })
  }

  pub fn into_session(self) -> Result<SessionToken> {
    Ok(SessionToken {
      session_id: decode_uuid(&self.session_id)?,
      issuer_id:  decode_uuid(&self.issuer_id)?,
      topic_id:   decode_uuid(&self.topic_id)?,
      token:      self.token,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

/// A `sessions` row joined with its attendance count.
pub struct RawSessionSummary {
  pub session:          RawSession,
  pub attendance_count: i64,
}

impl RawSessionSummary {
  pub fn into_summary(self) -> Result<SessionSummary> {
    Ok(SessionSummary {
      session:          self.session.into_session()?,
      attendance_count: u64::try_from(self.attendance_count).map_err(|_| {
        Error::Decode(format!("attendance count {}", self.attendance_count))
      })?,
    })
  }
}

/// Raw values read directly from an `attendance` row.
pub struct RawAttendance {
  pub attendance_id: String,
  pub subject_id:    String,
  pub session_id:    String,
  pub status:        String,
  pub recorded_at:   String,
}

impl RawAttendance {
  pub const COLUMNS: &'static str =
    "attendance_id, subject_id, session_id, status, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id: row.get(0)?,
      subject_id:    row.get(1)?,
      session_id:    row.get(2)?,
      status:        row.get(3)?,
      recorded_at:   row.get(4)?,
    })
  }

  pub fn into_fact(self) -> Result<AttendanceFact> {
    Ok(AttendanceFact {
      attendance_id: decode_uuid(&self.attendance_id)?,
      subject_id:    decode_uuid(&self.subject_id)?,
      session_id:    decode_uuid(&self.session_id)?,
      status:        decode_status(&self.status)?,
      recorded_at:   decode_dt(&self.recorded_at)?,
    })
  }
}

/// The geofence row needs no decoding beyond what rusqlite does.
pub fn geofence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<GeofenceConfig> {
  Ok(GeofenceConfig {
    latitude:  row.get(0)?,
    longitude: row.get(1)?,
    radius_m:  row.get(2)?,
  })
}
