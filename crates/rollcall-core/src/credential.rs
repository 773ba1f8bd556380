//! Credential: the durable public-key record bound to one subject.
//!
//! A subject has zero or one credential. The record is written once by a
//! successful registration ceremony; afterwards only the signature counter
//! (and its last-used timestamp) ever changes.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

// ─── CredentialId ────────────────────────────────────────────────────────────

/// The opaque, globally unique identifier an authenticator assigns to a
/// credential. Serialised as unpadded base64url.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialId(Vec<u8>);

impl CredentialId {
  pub fn new(bytes: Vec<u8>) -> Self { Self(bytes) }

  pub fn as_bytes(&self) -> &[u8] { &self.0 }

  pub fn to_base64url(&self) -> String { URL_SAFE_NO_PAD.encode(&self.0) }

  pub fn from_base64url(s: &str) -> Result<Self, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(s).map(Self)
  }
}

impl fmt::Debug for CredentialId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "CredentialId({})", self.to_base64url())
  }
}

impl fmt::Display for CredentialId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_base64url())
  }
}

impl From<Vec<u8>> for CredentialId {
  fn from(bytes: Vec<u8>) -> Self { Self(bytes) }
}

impl Serialize for CredentialId {
  fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&self.to_base64url())
  }
}

impl<'de> Deserialize<'de> for CredentialId {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let s = String::deserialize(d)?;
    Self::from_base64url(&s).map_err(serde::de::Error::custom)
  }
}

// ─── Credential ──────────────────────────────────────────────────────────────

/// A stored credential. The public key is never serialised outward.
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
  pub credential_id:      CredentialId,
  pub subject_id:         Uuid,
  /// COSE_Key bytes exactly as the authenticator produced them.
  #[serde(skip_serializing)]
  pub public_key:         Vec<u8>,
  pub sign_count:         u32,
  /// Authenticator model identifier (the "authenticator instance tag").
  pub aaguid:             Uuid,
  /// Attestation statement format reported at registration, e.g. `"none"`.
  pub attestation_format: String,
  pub created_at:         DateTime<Utc>,
  pub last_used_at:       Option<DateTime<Utc>>,
}

/// Input to [`crate::store::RollcallStore::enroll`].
#[derive(Debug, Clone)]
pub struct NewCredential {
  pub credential_id:      CredentialId,
  pub subject_id:         Uuid,
  pub public_key:         Vec<u8>,
  pub initial_counter:    u32,
  pub aaguid:             Uuid,
  pub attestation_format: String,
}

/// Result of an enrollment attempt. Only `Created` writes anything.
#[derive(Debug, Clone)]
pub enum Enrollment {
  Created(Credential),
  /// The subject already owns a credential; enrollment is write-once.
  SubjectAlreadyEnrolled,
  /// Another subject already registered this credential identifier.
  CredentialIdTaken,
}

// ─── Signature counter ───────────────────────────────────────────────────────

/// How a newly presented signature counter is judged against the stored one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CounterPolicy {
  /// Reject counters that do not increase. An authenticator that reports
  /// zero on every use does not implement a counter and is accepted.
  #[default]
  Strict,
  /// Accept any counter value and store it.
  Relaxed,
}

impl CounterPolicy {
  pub fn permits(self, stored: u32, presented: u32) -> bool {
    match self {
      Self::Strict => presented > stored || (stored == 0 && presented == 0),
      Self::Relaxed => true,
    }
  }
}

/// Result of [`crate::store::RollcallStore::update_counter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
  Updated,
  /// The policy refused the new value; nothing was written.
  NotIncreasing { stored: u32 },
  NotFound,
}
