//! WebAuthn ceremony verification for Rollcall.
//!
//! Parses the byte payloads a browser produces during `navigator.credentials`
//! calls and checks them against what the relying party expects:
//!
//! - registration: client-data JSON + CBOR attestation object, yielding the
//!   new credential's id, COSE public key, AAGUID and initial counter;
//! - authentication: client-data JSON + authenticator data + signature,
//!   verified against a stored COSE public key, yielding the new counter.
//!
//! Only the `none`-style trust model is implemented: attestation statements
//! are recorded by format but not chained to a vendor root. Supported key
//! algorithms are ES256 (P-256) and EdDSA (Ed25519).
//!
//! This crate knows nothing about subjects, storage, or challenges' lifetime;
//! callers supply the expected challenge bytes.

mod attestation;
mod authenticator_data;
mod client_data;
mod cose;
mod verify;

pub mod error;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use attestation::AttestationObject;
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, Flags};
pub use client_data::{CeremonyType, ClientData};
pub use cose::{CoseAlgorithm, CoseKey};
pub use error::{Error, Result};
pub use verify::{
  Expectation, VerifiedAssertion, VerifiedRegistration, verify_assertion,
  verify_registration,
};
