//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id   TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    role         TEXT NOT NULL,    -- 'student' | 'faculty' | 'admin'
    created_at   TEXT NOT NULL
);

-- At most one credential per subject; credential ids are globally unique.
CREATE TABLE IF NOT EXISTS credentials (
    credential_id      TEXT PRIMARY KEY,   -- base64url
    subject_id         TEXT NOT NULL UNIQUE
                         REFERENCES subjects(subject_id) ON DELETE CASCADE,
    public_key         BLOB NOT NULL,      -- COSE_Key bytes
    sign_count         INTEGER NOT NULL CHECK (sign_count >= 0),
    aaguid             TEXT NOT NULL,
    attestation_format TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    last_used_at       TEXT
);

-- Session tokens are immutable once written.
CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    issuer_id  TEXT NOT NULL REFERENCES subjects(subject_id),
    topic_id   TEXT NOT NULL,
    token      TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- Singleton: the CHECK pins the only possible key to 1.
CREATE TABLE IF NOT EXISTS geofence (
    singleton  INTEGER PRIMARY KEY CHECK (singleton = 1),
    latitude   REAL,
    longitude  REAL,
    radius_m   REAL,
    updated_at TEXT NOT NULL
);

-- Attendance facts are never updated.
CREATE TABLE IF NOT EXISTS attendance (
    attendance_id TEXT PRIMARY KEY,
    subject_id    TEXT NOT NULL REFERENCES subjects(subject_id),
    session_id    TEXT NOT NULL REFERENCES sessions(session_id),
    status        TEXT NOT NULL DEFAULT 'present',
    recorded_at   TEXT NOT NULL,
    UNIQUE (subject_id, session_id)
);

CREATE INDEX IF NOT EXISTS sessions_issuer_idx    ON sessions(issuer_id);
CREATE INDEX IF NOT EXISTS attendance_session_idx ON attendance(session_id);

PRAGMA user_version = 1;
";
