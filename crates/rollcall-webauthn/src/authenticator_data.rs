//! Authenticator data: the binary structure the authenticator signs.
//!
//! Layout: `rpIdHash (32) | flags (1) | signCount (4, BE)` followed, when the
//! AT flag is set, by `aaguid (16) | credIdLen (2, BE) | credId | COSE_Key`,
//! and, when the ED flag is set, by a CBOR extensions map.

use ciborium::Value;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

const HEADER_LEN: usize = 32 + 1 + 4;

/// The flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags(pub u8);

impl Flags {
  pub const USER_PRESENT: u8 = 0x01;
  pub const USER_VERIFIED: u8 = 0x04;
  pub const ATTESTED_DATA: u8 = 0x40;
  pub const EXTENSIONS: u8 = 0x80;

  fn has(self, bit: u8) -> bool { self.0 & bit != 0 }

  pub fn user_present(self) -> bool { self.has(Self::USER_PRESENT) }

  pub fn user_verified(self) -> bool { self.has(Self::USER_VERIFIED) }

  pub fn attested_data(self) -> bool { self.has(Self::ATTESTED_DATA) }

  pub fn extensions(self) -> bool { self.has(Self::EXTENSIONS) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
  pub aaguid:        [u8; 16],
  pub credential_id: Vec<u8>,
  /// The COSE_Key exactly as encoded by the authenticator.
  pub public_key:    Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
  pub rp_id_hash: [u8; 32],
  pub flags:      Flags,
  pub sign_count: u32,
  pub attested:   Option<AttestedCredentialData>,
}

fn malformed(msg: impl Into<String>) -> Error {
  Error::MalformedAuthenticatorData(msg.into())
}

/// Decode one CBOR item from the front of `bytes`, returning how many bytes it
/// occupied.
fn cbor_item_len(bytes: &[u8]) -> Result<usize> {
  let mut rest = bytes;
  ciborium::de::from_reader::<Value, _>(&mut rest)
    .map_err(|e| malformed(format!("cbor: {e}")))?;
  Ok(bytes.len() - rest.len())
}

impl AuthenticatorData {
  pub fn parse(bytes: &[u8]) -> Result<Self> {
    if bytes.len() < HEADER_LEN {
      return Err(malformed(format!("{} bytes is too short", bytes.len())));
    }

    let mut rp_id_hash = [0u8; 32];
    rp_id_hash.copy_from_slice(&bytes[..32]);
    let flags = Flags(bytes[32]);
    let sign_count =
      u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

    let mut rest = &bytes[HEADER_LEN..];

    let attested = if flags.attested_data() {
      if rest.len() < 18 {
        return Err(malformed("attested credential data truncated"));
      }
      let mut aaguid = [0u8; 16];
      aaguid.copy_from_slice(&rest[..16]);
      let id_len = u16::from_be_bytes([rest[16], rest[17]]) as usize;
      rest = &rest[18..];
      if rest.len() < id_len {
        return Err(malformed("credential id truncated"));
      }
      let credential_id = rest[..id_len].to_vec();
      rest = &rest[id_len..];

      let key_len = cbor_item_len(rest)?;
      let public_key = rest[..key_len].to_vec();
      rest = &rest[key_len..];

      Some(AttestedCredentialData { aaguid, credential_id, public_key })
    } else {
      None
    };

    if flags.extensions() {
      let ext_len = cbor_item_len(rest)?;
      rest = &rest[ext_len..];
    }

    if !rest.is_empty() {
      return Err(malformed(format!("{} trailing bytes", rest.len())));
    }

    Ok(Self { rp_id_hash, flags, sign_count, attested })
  }

  pub fn check_rp_id(&self, rp_id: &str) -> Result<()> {
    let expected = Sha256::digest(rp_id.as_bytes());
    if expected.as_slice() == self.rp_id_hash.as_slice() {
      Ok(())
    } else {
      Err(Error::RpIdMismatch)
    }
  }

  /// User presence is always required; user verification only when asked.
  pub fn check_user(&self, require_verification: bool) -> Result<()> {
    if !self.flags.user_present() {
      return Err(Error::UserNotPresent);
    }
    if require_verification && !self.flags.user_verified() {
      return Err(Error::UserNotVerified);
    }
    Ok(())
  }
}
