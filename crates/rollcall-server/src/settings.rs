//! Server configuration: an optional TOML file under `ROLLCALL_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rollcall_admission::{
  AdmissionConfig,
  config::{MAX_CHALLENGE_TTL_SECS, MAX_SESSION_MINUTES},
};
use serde::Deserialize;

/// Runtime server configuration, deserialised from `rollcall.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub admission:  AdmissionConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("rollcall.db") }

/// Read `path` (if it exists) and overlay the environment.
///
/// Nested keys use a double underscore, e.g.
/// `ROLLCALL_ADMISSION__COUNTER_POLICY=relaxed`. Origins may be given as a
/// comma-separated list.
pub fn load(path: &Path) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("ROLLCALL")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("admission.relying_party.origins")
        .try_parsing(true),
    )
    .build()
    .context("failed to read configuration")?;

  let cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  check_bounds(&cfg.admission)?;
  Ok(cfg)
}

fn check_bounds(admission: &AdmissionConfig) -> anyhow::Result<()> {
  anyhow::ensure!(
    (1..=MAX_CHALLENGE_TTL_SECS).contains(&admission.challenge_ttl_secs),
    "admission.challenge_ttl_secs must be between 1 and {MAX_CHALLENGE_TTL_SECS}, got {}",
    admission.challenge_ttl_secs
  );
  anyhow::ensure!(
    admission.challenge_capacity > 0,
    "admission.challenge_capacity must be positive"
  );
  anyhow::ensure!(
    (1..=MAX_SESSION_MINUTES).contains(&admission.max_session_minutes),
    "admission.max_session_minutes must be between 1 and {MAX_SESSION_MINUTES}, got {}",
    admission.max_session_minutes
  );
  anyhow::ensure!(
    !admission.relying_party.origins.is_empty(),
    "admission.relying_party.origins must list at least one origin"
  );
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
