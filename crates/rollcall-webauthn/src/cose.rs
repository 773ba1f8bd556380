//! COSE_Key decoding (RFC 9053) and signature verification.

use ciborium::Value;
use ed25519_dalek::Verifier as _;
use p256::ecdsa::signature::Verifier as _;

use crate::{Error, Result};

// COSE map labels and values.
const LABEL_KTY: i128 = 1;
const LABEL_ALG: i128 = 3;
const LABEL_CRV: i128 = -1;
const LABEL_X: i128 = -2;
const LABEL_Y: i128 = -3;

const KTY_OKP: i128 = 1;
const KTY_EC2: i128 = 2;
const CRV_P256: i128 = 1;
const CRV_ED25519: i128 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlgorithm {
  Es256,
  EdDsa,
}

impl CoseAlgorithm {
  pub fn id(self) -> i64 {
    match self {
      Self::Es256 => -7,
      Self::EdDsa => -8,
    }
  }

  fn from_id(id: i128) -> Result<Self> {
    match id {
      -7 => Ok(Self::Es256),
      -8 => Ok(Self::EdDsa),
      other => Err(Error::UnsupportedAlgorithm(other)),
    }
  }
}

/// A decoded credential public key.
#[derive(Debug, Clone)]
pub enum CoseKey {
  Es256(p256::ecdsa::VerifyingKey),
  EdDsa(ed25519_dalek::VerifyingKey),
}

fn malformed(msg: impl Into<String>) -> Error {
  Error::MalformedKey(msg.into())
}

fn int(v: &Value) -> Option<i128> { v.as_integer().map(i128::from) }

fn lookup(entries: &[(Value, Value)], label: i128) -> Option<&Value> {
  entries
    .iter()
    .find(|(k, _)| int(k) == Some(label))
    .map(|(_, v)| v)
}

fn required_int(entries: &[(Value, Value)], label: i128) -> Result<i128> {
  lookup(entries, label)
    .and_then(int)
    .ok_or_else(|| malformed(format!("label {label} missing or not an integer")))
}

fn required_bytes(entries: &[(Value, Value)], label: i128) -> Result<&[u8]> {
  lookup(entries, label)
    .and_then(Value::as_bytes)
    .map(Vec::as_slice)
    .ok_or_else(|| malformed(format!("label {label} missing or not bytes")))
}

impl CoseKey {
  pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
    let value: Value = ciborium::de::from_reader(bytes)
      .map_err(|e| malformed(format!("cbor: {e}")))?;
    let Value::Map(entries) = value else {
      return Err(malformed("COSE key is not a map"));
    };

    let alg = CoseAlgorithm::from_id(required_int(&entries, LABEL_ALG)?)?;
    let kty = required_int(&entries, LABEL_KTY)?;
    let crv = required_int(&entries, LABEL_CRV)?;

    match (alg, kty, crv) {
      (CoseAlgorithm::Es256, KTY_EC2, CRV_P256) => {
        let x = required_bytes(&entries, LABEL_X)?;
        let y = required_bytes(&entries, LABEL_Y)?;
        if x.len() != 32 || y.len() != 32 {
          return Err(malformed("P-256 coordinates must be 32 bytes"));
        }
        let mut sec1 = Vec::with_capacity(65);
        sec1.push(0x04);
        sec1.extend_from_slice(x);
        sec1.extend_from_slice(y);
        let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
          .map_err(|_| malformed("point is not on the P-256 curve"))?;
        Ok(Self::Es256(key))
      }
      (CoseAlgorithm::EdDsa, KTY_OKP, CRV_ED25519) => {
        let x: [u8; 32] = required_bytes(&entries, LABEL_X)?
          .try_into()
          .map_err(|_| malformed("Ed25519 key must be 32 bytes"))?;
        let key = ed25519_dalek::VerifyingKey::from_bytes(&x)
          .map_err(|_| malformed("invalid Ed25519 point"))?;
        Ok(Self::EdDsa(key))
      }
      _ => Err(malformed(format!(
        "key type {kty} / curve {crv} does not fit algorithm {}",
        alg.id()
      ))),
    }
  }

  pub fn algorithm(&self) -> CoseAlgorithm {
    match self {
      Self::Es256(_) => CoseAlgorithm::Es256,
      Self::EdDsa(_) => CoseAlgorithm::EdDsa,
    }
  }

  /// Verify `signature` over `message`. ES256 signatures are ASN.1 DER, as
  /// WebAuthn authenticators emit them; EdDSA signatures are the raw 64
  /// bytes.
  pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
    match self {
      Self::Es256(key) => {
        let sig = p256::ecdsa::Signature::from_der(signature)
          .map_err(|_| Error::SignatureInvalid)?;
        key.verify(message, &sig).map_err(|_| Error::SignatureInvalid)
      }
      Self::EdDsa(key) => {
        let sig = ed25519_dalek::Signature::from_slice(signature)
          .map_err(|_| Error::SignatureInvalid)?;
        key.verify(message, &sig).map_err(|_| Error::SignatureInvalid)
      }
    }
  }
}
