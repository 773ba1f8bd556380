//! Registration and authentication ceremonies.
//!
//! Both start by consuming the challenge, so a failed ceremony can never be
//! replayed with the same nonce. Every later step is fail-fast and nothing is
//! written until the last one.

use chrono::{DateTime, Utc};
use rollcall_core::{
  Error, Result,
  challenge::Challenge,
  credential::{
    CounterUpdate, Credential, CredentialId, Enrollment, NewCredential,
  },
  store::RollcallStore,
};
use rollcall_webauthn::{Expectation, verify_assertion, verify_registration};
use uuid::Uuid;

use crate::{
  Admission,
  payload::{AssertionPayload, RegistrationPayload},
};

/// Collapse verifier errors onto the admission taxonomy.
fn ceremony_error(err: rollcall_webauthn::Error) -> Error {
  match err {
    rollcall_webauthn::Error::SignatureInvalid => Error::SignatureInvalid,
    other => Error::CeremonyInvalid(other.to_string()),
  }
}

impl<S: RollcallStore> Admission<S> {
  fn expectation<'a>(&'a self, challenge: &'a Challenge) -> Expectation<'a> {
    Expectation {
      challenge:                 &challenge.nonce,
      origins:                   &self.config.relying_party.origins,
      rp_id:                     &self.config.relying_party.id,
      require_user_verification: self.config.require_user_verification,
    }
  }

  /// Any consumption failure ends the ceremony as `ChallengeExpired`.
  fn take_challenge(
    &self,
    ceremony_id: Uuid,
    subject_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Challenge> {
    self
      .challenges
      .consume(ceremony_id, subject_id, now)
      .map_err(|e| {
        tracing::warn!(%subject_id, %ceremony_id, reason = %e, "challenge rejected");
        Error::ChallengeExpired
      })
  }

  pub(crate) async fn registration_ceremony(
    &self,
    subject_id: Uuid,
    payload: RegistrationPayload,
    now: DateTime<Utc>,
  ) -> Result<Credential> {
    let challenge = self.take_challenge(payload.ceremony_id, subject_id, now)?;

    if self
      .store
      .credential_for_subject(subject_id)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::AlreadyEnrolled);
    }

    let verified = verify_registration(
      &payload.attestation_object,
      &payload.client_data_json,
      payload.credential_id.as_deref(),
      &self.expectation(&challenge),
    )
    .map_err(|e| {
      tracing::warn!(%subject_id, reason = %e, "registration ceremony rejected");
      ceremony_error(e)
    })?;

    let enrollment = self
      .store
      .enroll(NewCredential {
        credential_id:      CredentialId::new(verified.credential_id),
        subject_id,
        public_key:         verified.public_key,
        initial_counter:    verified.sign_count,
        aaguid:             Uuid::from_bytes(verified.aaguid),
        attestation_format: verified.attestation_format,
      })
      .await
      .map_err(Error::store)?;

    match enrollment {
      Enrollment::Created(credential) => Ok(credential),
      Enrollment::SubjectAlreadyEnrolled => Err(Error::AlreadyEnrolled),
      Enrollment::CredentialIdTaken => Err(Error::CeremonyInvalid(
        "credential id is registered to another subject".to_owned(),
      )),
    }
  }

  pub(crate) async fn authentication_ceremony(
    &self,
    subject_id: Uuid,
    payload: AssertionPayload,
    now: DateTime<Utc>,
  ) -> Result<Credential> {
    let challenge = self.take_challenge(payload.ceremony_id, subject_id, now)?;

    let credential_id = CredentialId::new(payload.credential_id);
    let mut credential = self
      .store
      .credential_by_id(credential_id.clone())
      .await
      .map_err(Error::store)?
      .ok_or(Error::CredentialNotRegistered)?;
    if credential.subject_id != subject_id {
      return Err(Error::CredentialSubjectMismatch);
    }

    let verified = verify_assertion(
      &credential.public_key,
      &payload.authenticator_data,
      &payload.client_data_json,
      &payload.signature,
      &self.expectation(&challenge),
    )
    .map_err(|e| {
      tracing::warn!(%subject_id, %credential_id, reason = %e, "assertion rejected");
      ceremony_error(e)
    })?;

    let update = self
      .store
      .update_counter(
        credential_id.clone(),
        verified.sign_count,
        self.config.counter_policy,
        now,
      )
      .await
      .map_err(Error::store)?;

    match update {
      CounterUpdate::Updated => {
        credential.sign_count = verified.sign_count;
        credential.last_used_at = Some(now);
        Ok(credential)
      }
      CounterUpdate::NotIncreasing { stored } => {
        tracing::warn!(
          %subject_id,
          %credential_id,
          stored,
          presented = verified.sign_count,
          "signature counter did not increase; possible cloned authenticator"
        );
        Err(Error::PossibleCloneDetected {
          stored,
          presented: verified.sign_count,
        })
      }
      // Revoked between lookup and update.
      CounterUpdate::NotFound => Err(Error::CredentialNotRegistered),
    }
  }
}
