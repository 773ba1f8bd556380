//! The two ceremony checks.

use sha2::{Digest, Sha256};

use crate::{
  AttestationObject, AuthenticatorData, CeremonyType, ClientData, CoseKey,
  Error, Result,
};

/// What the relying party expects of a ceremony.
#[derive(Debug, Clone, Copy)]
pub struct Expectation<'a> {
  /// The nonce that was issued for this ceremony.
  pub challenge:                 &'a [u8],
  /// Origins the client data may report.
  pub origins:                   &'a [String],
  pub rp_id:                     &'a str,
  pub require_user_verification: bool,
}

#[derive(Debug, Clone)]
pub struct VerifiedRegistration {
  pub credential_id:      Vec<u8>,
  /// COSE_Key bytes, to be stored verbatim.
  pub public_key:         Vec<u8>,
  pub sign_count:         u32,
  pub aaguid:             [u8; 16],
  pub attestation_format: String,
  pub user_verified:      bool,
}

#[derive(Debug, Clone, Copy)]
pub struct VerifiedAssertion {
  pub sign_count:    u32,
  pub user_verified: bool,
}

/// Check a registration response and extract the new credential.
///
/// `claimed_credential_id`, when given, must equal the id inside the attested
/// credential data.
pub fn verify_registration(
  attestation_object: &[u8],
  client_data_json: &[u8],
  claimed_credential_id: Option<&[u8]>,
  expect: &Expectation<'_>,
) -> Result<VerifiedRegistration> {
  let client = ClientData::parse(client_data_json)?;
  client.check_type(CeremonyType::Create)?;
  client.check_challenge(expect.challenge)?;
  client.check_origin(expect.origins)?;
  client.check_same_origin()?;

  let attestation = AttestationObject::parse(attestation_object)?;
  let auth = AuthenticatorData::parse(&attestation.auth_data)?;
  auth.check_rp_id(expect.rp_id)?;
  auth.check_user(expect.require_user_verification)?;

  let attested = auth.attested.ok_or(Error::MissingCredentialData)?;
  if let Some(claimed) = claimed_credential_id
    && claimed != attested.credential_id.as_slice()
  {
    return Err(Error::CredentialIdMismatch);
  }

  // Reject keys we could never verify an assertion with.
  CoseKey::from_cbor(&attested.public_key)?;

  Ok(VerifiedRegistration {
    credential_id:      attested.credential_id,
    public_key:         attested.public_key,
    sign_count:         auth.sign_count,
    aaguid:             attested.aaguid,
    attestation_format: attestation.fmt,
    user_verified:      auth.flags.user_verified(),
  })
}

/// Check an authentication response against a stored COSE public key.
///
/// The signature is checked first, over `authenticatorData ||
/// SHA-256(clientDataJSON)`; the client data, relying party and user
/// flags are checked afterwards.
pub fn verify_assertion(
  public_key: &[u8],
  authenticator_data: &[u8],
  client_data_json: &[u8],
  signature: &[u8],
  expect: &Expectation<'_>,
) -> Result<VerifiedAssertion> {
  let key = CoseKey::from_cbor(public_key)?;
  let auth = AuthenticatorData::parse(authenticator_data)?;

  let mut signed = Vec::with_capacity(authenticator_data.len() + 32);
  signed.extend_from_slice(authenticator_data);
  signed.extend_from_slice(&Sha256::digest(client_data_json));
  key.verify(&signed, signature)?;

  let client = ClientData::parse(client_data_json)?;
  client.check_type(CeremonyType::Get)?;
  client.check_challenge(expect.challenge)?;
  client.check_origin(expect.origins)?;
  client.check_same_origin()?;

  auth.check_rp_id(expect.rp_id)?;
  auth.check_user(expect.require_user_verification)?;

  Ok(VerifiedAssertion {
    sign_count:    auth.sign_count,
    user_verified: auth.flags.user_verified(),
  })
}
