//! Admission policy, deserialised from the server configuration.

use chrono::Duration;
use rollcall_core::credential::CounterPolicy;
use serde::{Deserialize, Serialize};

/// Upper bound on `challenge_ttl_secs`.
pub const MAX_CHALLENGE_TTL_SECS: u64 = 86_400;

/// Upper bound on `max_session_minutes`.
pub const MAX_SESSION_MINUTES: i64 = 24 * 60;

/// Who the relying party is, as far as ceremonies are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParty {
  /// Effective domain the authenticator scopes credentials to.
  #[serde(default = "default_rp_id")]
  pub id:      String,
  /// Exact origins client data may report, e.g. `https://attendance.example.edu`.
  #[serde(default = "default_origins")]
  pub origins: Vec<String>,
}

impl Default for RelyingParty {
  fn default() -> Self {
    Self {
      id:      default_rp_id(),
      origins: default_origins(),
    }
  }
}

/// What to do when the geofence record is missing or partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingGeofencePolicy {
  /// Skip the distance check and log the bypass.
  #[default]
  Admit,
  /// Refuse admission until a complete geofence is configured.
  Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
  #[serde(default)]
  pub relying_party:             RelyingParty,
  #[serde(default = "default_challenge_ttl_secs")]
  pub challenge_ttl_secs:        u64,
  #[serde(default = "default_challenge_capacity")]
  pub challenge_capacity:        u64,
  #[serde(default = "default_true")]
  pub require_user_verification: bool,
  #[serde(default)]
  pub counter_policy:            CounterPolicy,
  #[serde(default)]
  pub missing_geofence:          MissingGeofencePolicy,
  #[serde(default = "default_max_session_minutes")]
  pub max_session_minutes:       i64,
}

impl AdmissionConfig {
  pub fn challenge_validity(&self) -> Duration {
    let secs = i64::try_from(self.challenge_ttl_secs).unwrap_or(i64::MAX);
    Duration::try_seconds(secs).unwrap_or(Duration::MAX)
  }
}

impl Default for AdmissionConfig {
  fn default() -> Self {
    Self {
      relying_party:             RelyingParty::default(),
      challenge_ttl_secs:        default_challenge_ttl_secs(),
      challenge_capacity:        default_challenge_capacity(),
      require_user_verification: true,
      counter_policy:            CounterPolicy::default(),
      missing_geofence:          MissingGeofencePolicy::default(),
      max_session_minutes:       default_max_session_minutes(),
    }
  }
}

fn default_rp_id() -> String { "localhost".to_owned() }

fn default_origins() -> Vec<String> { vec!["http://localhost:5173".to_owned()] }

fn default_challenge_ttl_secs() -> u64 { 120 }

fn default_challenge_capacity() -> u64 { 10_000 }

fn default_true() -> bool { true }

fn default_max_session_minutes() -> i64 { 240 }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_yields_defaults() {
    let cfg: AdmissionConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, AdmissionConfig::default());
    assert_eq!(cfg.relying_party.id, "localhost");
    assert_eq!(cfg.challenge_validity(), Duration::minutes(2));
    assert_eq!(cfg.counter_policy, CounterPolicy::Strict);
  }

  #[test]
  fn policies_parse_lowercase() {
    let cfg: AdmissionConfig = serde_json::from_str(
      r#"{
        "relying_party": { "id": "attendance.example.edu" },
        "counter_policy": "relaxed",
        "missing_geofence": "reject"
      }"#,
    )
    .unwrap();
    assert_eq!(cfg.relying_party.id, "attendance.example.edu");
    assert_eq!(cfg.relying_party.origins, vec!["http://localhost:5173"]);
    assert_eq!(cfg.counter_policy, CounterPolicy::Relaxed);
    assert_eq!(cfg.missing_geofence, MissingGeofencePolicy::Reject);
  }
}
