//! A software authenticator for tests.
//!
//! [`SoftAuthenticator`] holds a real P-256 or Ed25519 key and produces
//! byte-exact registration and assertion responses, so tests exercise the same
//! parsing and signature paths a browser would. Feature-gated behind
//! `testutil` to prevent leaking into production builds.
//!
//! ```toml
//! [dev-dependencies]
//! rollcall-webauthn = { path = "../rollcall-webauthn", features = ["testutil"] }
//! ```

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ciborium::Value;
use ed25519_dalek::Signer as _;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest, Sha256};

use crate::{CeremonyType, CoseAlgorithm, Flags};

pub const TEST_RP_ID: &str = "attendance.example.edu";
pub const TEST_ORIGIN: &str = "https://attendance.example.edu";
pub const TEST_AAGUID: [u8; 16] = *b"rollcall-softkey";

enum SoftKey {
  P256(p256::ecdsa::SigningKey),
  Ed25519(ed25519_dalek::SigningKey),
}

/// Browser output of `navigator.credentials.create`.
#[derive(Debug, Clone)]
pub struct RegistrationResponse {
  pub credential_id:      Vec<u8>,
  pub attestation_object: Vec<u8>,
  pub client_data_json:   Vec<u8>,
}

/// Browser output of `navigator.credentials.get`.
#[derive(Debug, Clone)]
pub struct AssertionResponse {
  pub credential_id:      Vec<u8>,
  pub authenticator_data: Vec<u8>,
  pub client_data_json:   Vec<u8>,
  pub signature:          Vec<u8>,
}

pub struct SoftAuthenticator {
  key:              SoftKey,
  credential_id:    Vec<u8>,
  counter:          u32,
  /// Amount the counter moves on every assertion. Zero simulates an
  /// authenticator without a counter.
  pub counter_step: u32,
  /// Flags byte reported on every response (AT is added for registration).
  pub flags:        u8,
}

fn random_credential_id() -> Vec<u8> {
  let mut id = vec![0u8; 32];
  OsRng.fill_bytes(&mut id);
  id
}

impl SoftAuthenticator {
  fn with_key(key: SoftKey) -> Self {
    Self {
      key,
      credential_id: random_credential_id(),
      counter: 0,
      counter_step: 1,
      flags: Flags::USER_PRESENT | Flags::USER_VERIFIED,
    }
  }

  pub fn p256() -> Self {
    Self::with_key(SoftKey::P256(p256::ecdsa::SigningKey::random(&mut OsRng)))
  }

  pub fn ed25519() -> Self {
    Self::with_key(SoftKey::Ed25519(ed25519_dalek::SigningKey::generate(
      &mut OsRng,
    )))
  }

  pub fn credential_id(&self) -> &[u8] { &self.credential_id }

  pub fn counter(&self) -> u32 { self.counter }

  pub fn set_counter(&mut self, counter: u32) { self.counter = counter; }

  pub fn algorithm(&self) -> CoseAlgorithm {
    match self.key {
      SoftKey::P256(_) => CoseAlgorithm::Es256,
      SoftKey::Ed25519(_) => CoseAlgorithm::EdDsa,
    }
  }

  /// The credential public key as a CBOR COSE_Key.
  pub fn cose_public_key(&self) -> Vec<u8> {
    let int = |i: i64| Value::Integer(i.into());
    let entries = match &self.key {
      SoftKey::P256(sk) => {
        let point = sk.verifying_key().to_encoded_point(false);
        let raw = point.as_bytes();
        vec![
          (int(1), int(2)),
          (int(3), int(CoseAlgorithm::Es256.id())),
          (int(-1), int(1)),
          (int(-2), Value::Bytes(raw[1..33].to_vec())),
          (int(-3), Value::Bytes(raw[33..65].to_vec())),
        ]
      }
      SoftKey::Ed25519(sk) => vec![
        (int(1), int(1)),
        (int(3), int(CoseAlgorithm::EdDsa.id())),
        (int(-1), int(6)),
        (int(-2), Value::Bytes(sk.verifying_key().to_bytes().to_vec())),
      ],
    };
    cbor(&Value::Map(entries))
  }

  /// Answer a registration challenge with a `none` attestation.
  pub fn register(
    &self,
    challenge: &[u8],
    origin: &str,
    rp_id: &str,
  ) -> RegistrationResponse {
    let mut attested = Vec::new();
    attested.extend_from_slice(&TEST_AAGUID);
    attested.extend_from_slice(&(self.credential_id.len() as u16).to_be_bytes());
    attested.extend_from_slice(&self.credential_id);
    attested.extend_from_slice(&self.cose_public_key());

    let auth_data = authenticator_data(
      rp_id,
      self.flags | Flags::ATTESTED_DATA,
      self.counter,
      &attested,
    );
    let attestation_object = cbor(&Value::Map(vec![
      (Value::Text("fmt".into()), Value::Text("none".into())),
      (Value::Text("attStmt".into()), Value::Map(vec![])),
      (Value::Text("authData".into()), Value::Bytes(auth_data)),
    ]));

    RegistrationResponse {
      credential_id: self.credential_id.clone(),
      attestation_object,
      client_data_json: client_data(CeremonyType::Create, challenge, origin),
    }
  }

  /// Answer an authentication challenge, advancing the counter first.
  pub fn assert(
    &mut self,
    challenge: &[u8],
    origin: &str,
    rp_id: &str,
  ) -> AssertionResponse {
    self.counter = self.counter.wrapping_add(self.counter_step);
    let authenticator_data =
      authenticator_data(rp_id, self.flags, self.counter, &[]);
    let client_data_json = client_data(CeremonyType::Get, challenge, origin);
    let signature = self.sign(&authenticator_data, &client_data_json);
    AssertionResponse {
      credential_id: self.credential_id.clone(),
      authenticator_data,
      client_data_json,
      signature,
    }
  }

  /// Sign `authenticator_data || SHA-256(client_data_json)`.
  pub fn sign(&self, authenticator_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let mut msg = authenticator_data.to_vec();
    msg.extend_from_slice(&Sha256::digest(client_data_json));
    match &self.key {
      SoftKey::P256(sk) => {
        use p256::ecdsa::signature::Signer as _;
        let sig: p256::ecdsa::Signature = sk.sign(&msg);
        sig.to_der().as_bytes().to_vec()
      }
      SoftKey::Ed25519(sk) => sk.sign(&msg).to_bytes().to_vec(),
    }
  }
}

/// Serialise a CBOR value.
pub fn cbor(value: &Value) -> Vec<u8> {
  let mut out = Vec::new();
  ciborium::ser::into_writer(value, &mut out).expect("cbor encode");
  out
}

/// Build client-data JSON the way a browser does.
pub fn client_data(kind: CeremonyType, challenge: &[u8], origin: &str) -> Vec<u8> {
  serde_json::json!({
    "type": kind.as_str(),
    "challenge": URL_SAFE_NO_PAD.encode(challenge),
    "origin": origin,
    "crossOrigin": false,
  })
  .to_string()
  .into_bytes()
}

/// Build authenticator data: header followed by `trailer`.
pub fn authenticator_data(
  rp_id: &str,
  flags: u8,
  counter: u32,
  trailer: &[u8],
) -> Vec<u8> {
  let mut out = Sha256::digest(rp_id.as_bytes()).to_vec();
  out.push(flags);
  out.extend_from_slice(&counter.to_be_bytes());
  out.extend_from_slice(trailer);
  out
}
