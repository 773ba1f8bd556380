//! Error type for `rollcall-webauthn`. One variant per verification step.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed client data: {0}")]
  MalformedClientData(String),

  #[error("malformed authenticator data: {0}")]
  MalformedAuthenticatorData(String),

  #[error("malformed attestation object: {0}")]
  MalformedAttestation(String),

  #[error("malformed public key: {0}")]
  MalformedKey(String),

  #[error("unsupported COSE algorithm {0}")]
  UnsupportedAlgorithm(i128),

  #[error("client data type {found:?}, expected {expected:?}")]
  CeremonyTypeMismatch {
    expected: &'static str,
    found:    String,
  },

  #[error("challenge does not match")]
  ChallengeMismatch,

  #[error("origin {0:?} is not allowed")]
  OriginMismatch(String),

  #[error("ceremony ran in a cross-origin frame")]
  CrossOrigin,

  #[error("relying party id hash does not match")]
  RpIdMismatch,

  #[error("user presence flag not set")]
  UserNotPresent,

  #[error("user verification flag not set")]
  UserNotVerified,

  #[error("attested credential data missing")]
  MissingCredentialData,

  #[error("credential id does not match attested credential data")]
  CredentialIdMismatch,

  #[error("signature verification failed")]
  SignatureInvalid,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
