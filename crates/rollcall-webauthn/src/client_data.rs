//! `CollectedClientData`: the JSON the browser signs over.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyType {
  Create,
  Get,
}

impl CeremonyType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Create => "webauthn.create",
      Self::Get => "webauthn.get",
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
  #[serde(rename = "type")]
  pub ceremony_type: String,
  /// Base64url-encoded challenge, as echoed by the browser.
  pub challenge:     String,
  pub origin:        String,
  #[serde(default)]
  pub cross_origin:  bool,
}

impl ClientData {
  pub fn parse(json: &[u8]) -> Result<Self> {
    serde_json::from_slice(json)
      .map_err(|e| Error::MalformedClientData(e.to_string()))
  }

  /// Decoded challenge bytes. Trailing padding is tolerated.
  pub fn challenge_bytes(&self) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
      .decode(self.challenge.trim_end_matches('='))
      .map_err(|e| Error::MalformedClientData(format!("challenge: {e}")))
  }

  pub fn check_type(&self, expected: CeremonyType) -> Result<()> {
    if self.ceremony_type == expected.as_str() {
      Ok(())
    } else {
      Err(Error::CeremonyTypeMismatch {
        expected: expected.as_str(),
        found:    self.ceremony_type.clone(),
      })
    }
  }

  pub fn check_challenge(&self, expected: &[u8]) -> Result<()> {
    if self.challenge_bytes()? == expected {
      Ok(())
    } else {
      Err(Error::ChallengeMismatch)
    }
  }

  pub fn check_same_origin(&self) -> Result<()> {
    if self.cross_origin { Err(Error::CrossOrigin) } else { Ok(()) }
  }

  pub fn check_origin(&self, allowed: &[String]) -> Result<()> {
    if allowed.iter().any(|o| o == &self.origin) {
      Ok(())
    } else {
      Err(Error::OriginMismatch(self.origin.clone()))
    }
  }
}
