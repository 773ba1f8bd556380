//! Session tokens: the faculty-issued, time-boxed gate on admission.
//!
//! Expiry is absolute and fixed at creation. A token is admissible strictly
//! before `expires_at` and permanently inert from that instant on.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Random bytes behind every token string.
const TOKEN_BYTES: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
  pub session_id: Uuid,
  /// The faculty subject that opened the session.
  pub issuer_id:  Uuid,
  /// The class or topic attendance is being taken for.
  pub topic_id:   Uuid,
  /// Opaque, globally unique string handed to students (e.g. as a QR code).
  pub token:      String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl SessionToken {
  /// Mint a fresh token valid for `validity` from `now`.
  pub fn generate(
    issuer_id: Uuid,
    topic_id: Uuid,
    now: DateTime<Utc>,
    validity: Duration,
  ) -> Self {
    let mut raw = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut raw);
    Self {
      session_id: Uuid::new_v4(),
      issuer_id,
      topic_id,
      token: URL_SAFE_NO_PAD.encode(raw),
      created_at: now,
      expires_at: now + validity,
    }
  }

  pub fn is_admissible(&self, now: DateTime<Utc>) -> bool {
    now < self.expires_at
  }

  /// [`Self::is_admissible`] as a `Result`.
  pub fn check_admissible(&self, now: DateTime<Utc>) -> Result<()> {
    if self.is_admissible(now) {
      Ok(())
    } else {
      Err(Error::TokenExpired)
    }
  }
}

/// A session together with how many attendance facts it has collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
  pub session:          SessionToken,
  pub attendance_count: u64,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, min, 0).unwrap()
  }

  #[test]
  fn admissible_strictly_before_expiry() {
    let t = SessionToken::generate(
      Uuid::new_v4(),
      Uuid::new_v4(),
      at(0),
      Duration::minutes(10),
    );
    assert!(t.is_admissible(at(0)));
    assert!(t.is_admissible(at(9)));
    assert!(!t.is_admissible(at(10)));
    assert!(matches!(t.check_admissible(at(11)), Err(Error::TokenExpired)));
  }

  #[test]
  fn tokens_are_unique() {
    let a = SessionToken::generate(
      Uuid::nil(),
      Uuid::nil(),
      at(0),
      Duration::minutes(1),
    );
    let b = SessionToken::generate(
      Uuid::nil(),
      Uuid::nil(),
      at(0),
      Duration::minutes(1),
    );
    assert_ne!(a.token, b.token);
    assert_ne!(a.session_id, b.session_id);
    assert_eq!(a.token.len(), 32);
  }
}
