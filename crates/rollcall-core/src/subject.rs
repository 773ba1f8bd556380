//! Subject: a user of the system, as seen by the admission core.
//!
//! Subjects are owned by the identity collaborator. The core only reads them
//! to confirm that an identifier refers to someone real.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The role a subject plays. Role checks are the caller's concern; the core
/// carries the value for display and audit only.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Student,
  Faculty,
  Admin,
}

/// A user. The identifier is immutable and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:   Uuid,
  pub display_name: String,
  pub role:         Role,
  pub created_at:   DateTime<Utc>,
}
