//! Serde adapters for binary fields, carried as unpadded base64url strings
//! (the encoding browsers use for WebAuthn buffers).

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, de::Error as _};

pub fn encode(bytes: &[u8]) -> String { URL_SAFE_NO_PAD.encode(bytes) }

pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
  // Some clients pad; accept both.
  URL_SAFE_NO_PAD.decode(s.trim_end_matches('='))
}

/// `#[serde(deserialize_with = "encoding::bytes")]`
pub fn bytes<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
  let s = String::deserialize(d)?;
  decode(&s).map_err(|e| D::Error::custom(format!("invalid base64url: {e}")))
}

/// `#[serde(default, deserialize_with = "encoding::opt_bytes")]`
pub fn opt_bytes<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
  Option::<String>::deserialize(d)?
    .map(|s| decode(&s).map_err(|e| D::Error::custom(format!("invalid base64url: {e}"))))
    .transpose()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_padded_and_unpadded() {
    assert_eq!(encode(&[1, 2]), "AQI");
    assert_eq!(decode("AQI").unwrap(), vec![1, 2]);
    assert_eq!(decode("AQI=").unwrap(), vec![1, 2]);
    assert!(decode("not base64!").is_err());
  }
}
