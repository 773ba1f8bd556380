//! The CBOR attestation object returned by `navigator.credentials.create`.

use ciborium::Value;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct AttestationObject {
  /// Attestation statement format, e.g. `"none"` or `"packed"`.
  pub fmt:       String,
  pub auth_data: Vec<u8>,
}

fn malformed(msg: impl Into<String>) -> Error {
  Error::MalformedAttestation(msg.into())
}

impl AttestationObject {
  pub fn parse(bytes: &[u8]) -> Result<Self> {
    let value: Value = ciborium::de::from_reader(bytes)
      .map_err(|e| malformed(format!("cbor: {e}")))?;
    let Value::Map(entries) = value else {
      return Err(malformed("top level is not a map"));
    };

    let mut fmt = None;
    let mut auth_data = None;
    let mut has_stmt = false;
    for (k, v) in entries {
      match (k.as_text(), v) {
        (Some("fmt"), Value::Text(t)) => fmt = Some(t),
        (Some("authData"), Value::Bytes(b)) => auth_data = Some(b),
        (Some("attStmt"), Value::Map(_)) => has_stmt = true,
        (Some(other @ ("fmt" | "authData" | "attStmt")), _) => {
          return Err(malformed(format!("{other} has the wrong type")));
        }
        _ => {}
      }
    }

    if !has_stmt {
      return Err(malformed("attStmt missing"));
    }
    Ok(Self {
      fmt:       fmt.ok_or_else(|| malformed("fmt missing"))?,
      auth_data: auth_data.ok_or_else(|| malformed("authData missing"))?,
    })
  }
}
