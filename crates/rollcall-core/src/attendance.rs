//! Attendance facts: the at-most-once record that a subject was present.
//!
//! A fact is never mutated after creation. Uniqueness per
//! `(subject_id, session_id)` is enforced by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
  #[default]
  Present,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceFact {
  pub attendance_id: Uuid,
  pub subject_id:    Uuid,
  pub session_id:    Uuid,
  pub status:        AttendanceStatus,
  pub recorded_at:   DateTime<Utc>,
}

/// Result of [`crate::store::RollcallStore::record_if_absent`]. Both arms
/// carry the single fact that exists for the pair after the call.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
  Created(AttendanceFact),
  AlreadyPresent(AttendanceFact),
}

impl Recorded {
  pub fn fact(&self) -> &AttendanceFact {
    match self {
      Self::Created(f) | Self::AlreadyPresent(f) => f,
    }
  }

  pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }
}
