//! The challenge store: single-use, per-ceremony random nonces.
//!
//! Challenges are keyed by a random ceremony id rather than by subject, so two
//! ceremonies started concurrently by the same subject do not invalidate each
//! other. Each entry carries an explicit expiry checked at consumption; the
//! underlying cache additionally evicts by capacity and age so abandoned
//! ceremonies cannot accumulate.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use moka::{policy::EvictionPolicy, sync::Cache};
use rand_core::{OsRng, RngCore as _};
use uuid::Uuid;

use crate::{Error, Result};

/// Length of every nonce, in bytes.
pub const CHALLENGE_LEN: usize = 32;

/// A pending challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
  pub ceremony_id: Uuid,
  pub subject_id:  Uuid,
  pub nonce:       [u8; CHALLENGE_LEN],
  pub issued_at:   DateTime<Utc>,
  pub expires_at:  DateTime<Utc>,
}

/// What the caller receives from [`ChallengeStore::issue`].
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
  pub ceremony_id: Uuid,
  pub challenge:   Vec<u8>,
  pub expires_at:  DateTime<Utc>,
}

/// Longest validity a store will honour.
pub fn max_validity() -> Duration { Duration::days(1) }

pub struct ChallengeStore {
  pending:  Cache<Uuid, Challenge>,
  validity: Duration,
}

impl ChallengeStore {
  /// `validity` bounds how long a challenge may be presented, clamped to
  /// [`max_validity`]. At most `capacity` challenges are outstanding at once;
  /// past that the least recently issued ones are evicted.
  pub fn new(validity: Duration, capacity: u64) -> Self {
    let validity = validity.clamp(Duration::zero(), max_validity());
    // Eviction is a backstop for abandoned ceremonies; the authoritative
    // expiry check happens in `consume` against the caller's clock.
    let ttl = validity
      .to_std()
      .unwrap_or(StdDuration::ZERO)
      .saturating_add(StdDuration::from_secs(60));
    Self {
      pending: Cache::builder()
        .max_capacity(capacity)
        .eviction_policy(EvictionPolicy::lru())
        .time_to_live(ttl)
        .build(),
      validity,
    }
  }

  /// Generate and remember a fresh nonce for `subject_id`.
  pub fn issue(&self, subject_id: Uuid, now: DateTime<Utc>) -> IssuedChallenge {
    let mut nonce = [0u8; CHALLENGE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let challenge = Challenge {
      ceremony_id: Uuid::new_v4(),
      subject_id,
      nonce,
      issued_at: now,
      expires_at: now + self.validity,
    };
    let issued = IssuedChallenge {
      ceremony_id: challenge.ceremony_id,
      challenge:   nonce.to_vec(),
      expires_at:  challenge.expires_at,
    };
    self.pending.insert(challenge.ceremony_id, challenge);
    issued
  }

  /// Atomically remove and return the challenge for `ceremony_id`.
  ///
  /// The entry is destroyed on every attempt, including ones that fail
  /// because the challenge belongs to another subject or has expired.
  pub fn consume(
    &self,
    ceremony_id: Uuid,
    subject_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Challenge> {
    let challenge =
      self.pending.remove(&ceremony_id).ok_or(Error::ChallengeNotFound)?;
    if challenge.subject_id != subject_id {
      return Err(Error::ChallengeNotFound);
    }
    if now >= challenge.expires_at {
      return Err(Error::ChallengeExpired);
    }
    Ok(challenge)
  }
}
