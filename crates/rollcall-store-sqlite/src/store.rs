//! [`SqliteStore`]: the SQLite implementation of [`RollcallStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use rollcall_core::{
  attendance::{AttendanceFact, AttendanceStatus, Recorded},
  credential::{
    CounterPolicy, CounterUpdate, Credential, CredentialId, Enrollment,
    NewCredential,
  },
  geofence::GeofenceConfig,
  session::{SessionSummary, SessionToken},
  store::RollcallStore,
  subject::{Role, Subject},
};

use crate::{
  encode::{
    decode_counter, encode_credential_id, encode_dt, encode_uuid,
    geofence_from_row, RawAttendance, RawCredential, RawSession,
    RawSessionSummary, RawSubject,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rollcall store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn credential_where(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<Credential>> {
    let raw: Option<RawCredential> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM credentials WHERE {column} = ?1",
          RawCredential::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawCredential::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCredential::into_credential).transpose()
  }
}

// ─── RollcallStore impl ──────────────────────────────────────────────────────

impl RollcallStore for SqliteStore {
  type Error = Error;

  // ── Identity ──────────────────────────────────────────────────────────────

  async fn add_subject(&self, display_name: String, role: Role) -> Result<Subject> {
    let subject = Subject {
      subject_id: Uuid::new_v4(),
      display_name,
      role,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(subject.subject_id);
    let name     = subject.display_name.clone();
    let role_str = role.to_string();
    let at_str   = encode_dt(subject.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (subject_id, display_name, role, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, role_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(subject)
  }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM subjects WHERE subject_id = ?1",
          RawSubject::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawSubject::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  // ── Credentials ───────────────────────────────────────────────────────────

  async fn enroll(&self, input: NewCredential) -> Result<Enrollment> {
    let credential = Credential {
      credential_id:      input.credential_id,
      subject_id:         input.subject_id,
      public_key:         input.public_key,
      sign_count:         input.initial_counter,
      aaguid:             input.aaguid,
      attestation_format: input.attestation_format,
      created_at:         Utc::now(),
      last_used_at:       None,
    };

    let cred_id_str = encode_credential_id(&credential.credential_id);
    let subject_str = encode_uuid(credential.subject_id);
    let public_key  = credential.public_key.clone();
    let sign_count  = i64::from(credential.sign_count);
    let aaguid_str  = encode_uuid(credential.aaguid);
    let fmt         = credential.attestation_format.clone();
    let at_str      = encode_dt(credential.created_at);

    // `Some(true)`: subject already enrolled; `Some(false)`: id taken.
    let conflict: Option<bool> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
          "INSERT OR IGNORE INTO credentials (
             credential_id, subject_id, public_key, sign_count,
             aaguid, attestation_format, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            cred_id_str,
            subject_str,
            public_key,
            sign_count,
            aaguid_str,
            fmt,
            at_str,
          ],
        )?;

        let conflict = if inserted == 1 {
          None
        } else {
          let enrolled = tx
            .query_row(
              "SELECT 1 FROM credentials WHERE subject_id = ?1",
              rusqlite::params![subject_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          Some(enrolled)
        };
        tx.commit()?;
        Ok(conflict)
      })
      .await?;

    Ok(match conflict {
      None => Enrollment::Created(credential),
      Some(true) => Enrollment::SubjectAlreadyEnrolled,
      Some(false) => Enrollment::CredentialIdTaken,
    })
  }

  async fn credential_for_subject(&self, subject_id: Uuid) -> Result<Option<Credential>> {
    self.credential_where("subject_id", encode_uuid(subject_id)).await
  }

  async fn credential_by_id(
    &self,
    credential_id: CredentialId,
  ) -> Result<Option<Credential>> {
    self
      .credential_where("credential_id", encode_credential_id(&credential_id))
      .await
  }

  async fn update_counter(
    &self,
    credential_id: CredentialId,
    new_counter:   u32,
    policy:        CounterPolicy,
    used_at:       DateTime<Utc>,
  ) -> Result<CounterUpdate> {
    let id_str = encode_credential_id(&credential_id);
    let at_str = encode_dt(used_at);

    // `None`: no such credential; `Some((stored, written))`.
    let outcome: Option<(i64, bool)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored: Option<i64> = tx
          .query_row(
            "SELECT sign_count FROM credentials WHERE credential_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let Some(stored) = stored else {
          return Ok(None);
        };

        let permitted = u32::try_from(stored)
          .map(|s| policy.permits(s, new_counter))
          .unwrap_or(false);

        if permitted {
          tx.execute(
            "UPDATE credentials SET sign_count = ?2, last_used_at = ?3
             WHERE credential_id = ?1",
            rusqlite::params![id_str, i64::from(new_counter), at_str],
          )?;
        }
        tx.commit()?;
        Ok(Some((stored, permitted)))
      })
      .await?;

    Ok(match outcome {
      None => CounterUpdate::NotFound,
      Some((_, true)) => CounterUpdate::Updated,
      Some((stored, false)) => CounterUpdate::NotIncreasing {
        stored: decode_counter(stored)?,
      },
    })
  }

  async fn revoke_all(&self, subject_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(subject_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM credentials WHERE subject_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(removed as u64)
  }

  // ── Session tokens ────────────────────────────────────────────────────────

  async fn insert_session(&self, session: SessionToken) -> Result<()> {
    let session_id_str = encode_uuid(session.session_id);
    let issuer_id_str  = encode_uuid(session.issuer_id);
    let topic_id_str   = encode_uuid(session.topic_id);
    let token          = session.token;
    let created_at_str = encode_dt(session.created_at);
    let expires_at_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (
             session_id, issuer_id, topic_id, token, created_at, expires_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            session_id_str,
            issuer_id_str,
            topic_id_str,
            token,
            created_at_str,
            expires_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_by_token(&self, token: String) -> Result<Option<SessionToken>> {
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {} FROM sessions WHERE token = ?1", RawSession::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![token], RawSession::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn sessions_by_issuer(&self, issuer_id: Uuid) -> Result<Vec<SessionSummary>> {
    let id_str = encode_uuid(issuer_id);

    let raws: Vec<RawSessionSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             s.session_id, s.issuer_id, s.topic_id, s.token,
             s.created_at, s.expires_at,
             COUNT(a.attendance_id)
           FROM sessions s
           LEFT JOIN attendance a ON a.session_id = s.session_id
           WHERE s.issuer_id = ?1
           GROUP BY s.session_id
           ORDER BY s.created_at DESC, s.rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawSessionSummary {
              session:          RawSession::from_row(row)?,
              attendance_count: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSessionSummary::into_summary).collect()
  }

  // ── Geofence ──────────────────────────────────────────────────────────────

  async fn active_geofence(&self) -> Result<Option<GeofenceConfig>> {
    Ok(
      self
        .conn
        .call(|conn| {
          Ok(
            conn
              .query_row(
                "SELECT latitude, longitude, radius_m FROM geofence WHERE singleton = 1",
                [],
                geofence_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn set_geofence(&self, config: GeofenceConfig) -> Result<GeofenceConfig> {
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO geofence (singleton, latitude, longitude, radius_m, updated_at)
           VALUES (1, ?1, ?2, ?3, ?4)
           ON CONFLICT(singleton) DO UPDATE SET
             latitude   = excluded.latitude,
             longitude  = excluded.longitude,
             radius_m   = excluded.radius_m,
             updated_at = excluded.updated_at",
          rusqlite::params![config.latitude, config.longitude, config.radius_m, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(config)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn record_if_absent(
    &self,
    subject_id: Uuid,
    session_id: Uuid,
    at:         DateTime<Utc>,
  ) -> Result<Recorded> {
    let attendance_id_str = encode_uuid(Uuid::new_v4());
    let subject_id_str    = encode_uuid(subject_id);
    let session_id_str    = encode_uuid(session_id);
    let status_str        = AttendanceStatus::Present.to_string();
    let at_str            = encode_dt(at);

    let (created, raw): (bool, RawAttendance) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
          "INSERT INTO attendance (
             attendance_id, subject_id, session_id, status, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(subject_id, session_id) DO NOTHING",
          rusqlite::params![
            attendance_id_str,
            subject_id_str,
            session_id_str,
            status_str,
            at_str,
          ],
        )?;
        let sql = format!(
          "SELECT {} FROM attendance WHERE subject_id = ?1 AND session_id = ?2",
          RawAttendance::COLUMNS
        );
        let raw = tx.query_row(
          &sql,
          rusqlite::params![subject_id_str, session_id_str],
          RawAttendance::from_row,
        )?;
        tx.commit()?;
        Ok((inserted == 1, raw))
      })
      .await?;

    let fact = raw.into_fact()?;
    Ok(if created {
      Recorded::Created(fact)
    } else {
      Recorded::AlreadyPresent(fact)
    })
  }

  async fn attendance_for_session(&self, session_id: Uuid) -> Result<Vec<AttendanceFact>> {
    let id_str = encode_uuid(session_id);

    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM attendance WHERE session_id = ?1
           ORDER BY recorded_at ASC, rowid ASC",
          RawAttendance::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendance::into_fact).collect()
  }
}
