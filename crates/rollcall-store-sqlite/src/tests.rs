//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use rollcall_core::{
  credential::{CounterPolicy, CounterUpdate, CredentialId, Enrollment, NewCredential},
  geofence::GeofenceConfig,
  session::SessionToken,
  store::RollcallStore,
  subject::Role,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_credential(subject_id: Uuid, id: &[u8], counter: u32) -> NewCredential {
  NewCredential {
    credential_id:      CredentialId::new(id.to_vec()),
    subject_id,
    public_key:         vec![0xa5, 0x01, 0x02],
    initial_counter:    counter,
    aaguid:             Uuid::nil(),
    attestation_format: "none".to_owned(),
  }
}

async fn session(s: &SqliteStore, issuer: Uuid, at_hour: u32) -> SessionToken {
  let now = Utc.with_ymd_and_hms(2026, 3, 2, at_hour, 0, 0).unwrap();
  let token = SessionToken::generate(issuer, Uuid::new_v4(), now, Duration::minutes(60));
  s.insert_session(token.clone()).await.unwrap();
  token
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;

  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  let fetched = s.get_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.subject_id, subject.subject_id);
  assert_eq!(fetched.display_name, "Asha");
  assert_eq!(fetched.role, Role::Student);
  assert_eq!(fetched.created_at, subject.created_at);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn enroll_then_lookup_both_ways() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();

  let outcome = s.enroll(new_credential(subject.subject_id, b"cred-1", 0)).await.unwrap();
  let Enrollment::Created(cred) = outcome else {
    panic!("expected Created");
  };
  assert_eq!(cred.sign_count, 0);
  assert!(cred.last_used_at.is_none());

  let by_subject = s.credential_for_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(by_subject.credential_id, cred.credential_id);
  assert_eq!(by_subject.public_key, vec![0xa5, 0x01, 0x02]);
  assert_eq!(by_subject.attestation_format, "none");

  let by_id = s
    .credential_by_id(CredentialId::new(b"cred-1".to_vec()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_id.subject_id, subject.subject_id);
}

#[tokio::test]
async fn second_enrollment_for_subject_is_refused() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();

  s.enroll(new_credential(subject.subject_id, b"cred-1", 0)).await.unwrap();
  let again = s.enroll(new_credential(subject.subject_id, b"cred-2", 0)).await.unwrap();
  assert!(matches!(again, Enrollment::SubjectAlreadyEnrolled));

  let kept = s.credential_for_subject(subject.subject_id).await.unwrap().unwrap();
  assert_eq!(kept.credential_id.as_bytes(), b"cred-1");
  assert!(
    s.credential_by_id(CredentialId::new(b"cred-2".to_vec()))
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn credential_id_taken_by_another_subject_is_refused() {
  let s = store().await;
  let a = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  let b = s.add_subject("Ravi".to_owned(), Role::Student).await.unwrap();

  s.enroll(new_credential(a.subject_id, b"shared", 0)).await.unwrap();
  let outcome = s.enroll(new_credential(b.subject_id, b"shared", 0)).await.unwrap();
  assert!(matches!(outcome, Enrollment::CredentialIdTaken));
  assert!(s.credential_for_subject(b.subject_id).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_enrollment_has_one_winner() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();

  let mut handles = Vec::new();
  for i in 0..16u8 {
    let s = s.clone();
    let id = subject.subject_id;
    handles.push(tokio::spawn(async move {
      s.enroll(new_credential(id, &[b'c', i], 0)).await.unwrap()
    }));
  }

  let mut created = 0;
  for h in handles {
    match h.await.unwrap() {
      Enrollment::Created(_) => created += 1,
      Enrollment::SubjectAlreadyEnrolled => {}
      other => panic!("unexpected outcome {other:?}"),
    }
  }
  assert_eq!(created, 1);
}

#[tokio::test]
async fn strict_counter_must_increase() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  s.enroll(new_credential(subject.subject_id, b"cred", 5)).await.unwrap();
  let id = CredentialId::new(b"cred".to_vec());
  let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

  let stale = s.update_counter(id.clone(), 5, CounterPolicy::Strict, at).await.unwrap();
  assert_eq!(stale, CounterUpdate::NotIncreasing { stored: 5 });

  let lower = s.update_counter(id.clone(), 3, CounterPolicy::Strict, at).await.unwrap();
  assert_eq!(lower, CounterUpdate::NotIncreasing { stored: 5 });

  let ok = s.update_counter(id.clone(), 6, CounterPolicy::Strict, at).await.unwrap();
  assert_eq!(ok, CounterUpdate::Updated);

  let cred = s.credential_by_id(id).await.unwrap().unwrap();
  assert_eq!(cred.sign_count, 6);
  assert_eq!(cred.last_used_at, Some(at));
}

#[tokio::test]
async fn strict_counter_accepts_authenticators_without_counter() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  s.enroll(new_credential(subject.subject_id, b"cred", 0)).await.unwrap();
  let id = CredentialId::new(b"cred".to_vec());

  let outcome = s
    .update_counter(id, 0, CounterPolicy::Strict, Utc::now())
    .await
    .unwrap();
  assert_eq!(outcome, CounterUpdate::Updated);
}

#[tokio::test]
async fn relaxed_counter_stores_any_value() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  s.enroll(new_credential(subject.subject_id, b"cred", 9)).await.unwrap();
  let id = CredentialId::new(b"cred".to_vec());

  let outcome = s
    .update_counter(id.clone(), 2, CounterPolicy::Relaxed, Utc::now())
    .await
    .unwrap();
  assert_eq!(outcome, CounterUpdate::Updated);
  assert_eq!(s.credential_by_id(id).await.unwrap().unwrap().sign_count, 2);
}

#[tokio::test]
async fn counter_update_for_unknown_credential() {
  let s = store().await;
  let outcome = s
    .update_counter(
      CredentialId::new(b"ghost".to_vec()),
      1,
      CounterPolicy::Strict,
      Utc::now(),
    )
    .await
    .unwrap();
  assert_eq!(outcome, CounterUpdate::NotFound);
}

#[tokio::test]
async fn concurrent_counter_updates_with_same_value_have_one_winner() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  s.enroll(new_credential(subject.subject_id, b"cred", 1)).await.unwrap();

  let mut handles = Vec::new();
  for _ in 0..8 {
    let s = s.clone();
    handles.push(tokio::spawn(async move {
      s.update_counter(
        CredentialId::new(b"cred".to_vec()),
        2,
        CounterPolicy::Strict,
        Utc::now(),
      )
      .await
      .unwrap()
    }));
  }

  let mut updated = 0;
  for h in handles {
    if h.await.unwrap() == CounterUpdate::Updated {
      updated += 1;
    }
  }
  assert_eq!(updated, 1);
}

#[tokio::test]
async fn revoke_all_removes_credential_and_allows_reenrollment() {
  let s = store().await;
  let subject = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  s.enroll(new_credential(subject.subject_id, b"old", 0)).await.unwrap();

  assert_eq!(s.revoke_all(subject.subject_id).await.unwrap(), 1);
  assert!(s.credential_for_subject(subject.subject_id).await.unwrap().is_none());
  assert_eq!(s.revoke_all(subject.subject_id).await.unwrap(), 0);

  let outcome = s.enroll(new_credential(subject.subject_id, b"new", 0)).await.unwrap();
  assert!(matches!(outcome, Enrollment::Created(_)));
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_round_trips_by_token() {
  let s = store().await;
  let issuer = s.add_subject("Dr. Rao".to_owned(), Role::Faculty).await.unwrap();
  let token = session(&s, issuer.subject_id, 9).await;

  let fetched = s.session_by_token(token.token.clone()).await.unwrap().unwrap();
  assert_eq!(fetched, token);
  assert!(s.session_by_token("nope".to_owned()).await.unwrap().is_none());
}

#[tokio::test]
async fn sessions_by_issuer_newest_first_with_counts() {
  let s = store().await;
  let issuer = s.add_subject("Dr. Rao".to_owned(), Role::Faculty).await.unwrap();
  let other = s.add_subject("Dr. Iyer".to_owned(), Role::Faculty).await.unwrap();
  let student = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();

  let early = session(&s, issuer.subject_id, 8).await;
  let late = session(&s, issuer.subject_id, 11).await;
  session(&s, other.subject_id, 10).await;

  s.record_if_absent(student.subject_id, early.session_id, early.created_at)
    .await
    .unwrap();

  let list = s.sessions_by_issuer(issuer.subject_id).await.unwrap();
  assert_eq!(list.len(), 2);
  assert_eq!(list[0].session.session_id, late.session_id);
  assert_eq!(list[0].attendance_count, 0);
  assert_eq!(list[1].session.session_id, early.session_id);
  assert_eq!(list[1].attendance_count, 1);
}

// ─── Geofence ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn geofence_absent_until_set() {
  let s = store().await;
  assert!(s.active_geofence().await.unwrap().is_none());
}

#[tokio::test]
async fn set_geofence_replaces_singleton() {
  let s = store().await;
  let first = GeofenceConfig {
    latitude:  Some(18.5204),
    longitude: Some(73.8567),
    radius_m:  Some(150.0),
  };
  s.set_geofence(first).await.unwrap();
  assert_eq!(s.active_geofence().await.unwrap(), Some(first));

  let partial = GeofenceConfig {
    latitude:  Some(19.0760),
    longitude: None,
    radius_m:  None,
  };
  s.set_geofence(partial).await.unwrap();
  assert_eq!(s.active_geofence().await.unwrap(), Some(partial));
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_if_absent_is_idempotent() {
  let s = store().await;
  let issuer = s.add_subject("Dr. Rao".to_owned(), Role::Faculty).await.unwrap();
  let student = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  let token = session(&s, issuer.subject_id, 9).await;
  let first_at = token.created_at + Duration::minutes(5);

  let first = s
    .record_if_absent(student.subject_id, token.session_id, first_at)
    .await
    .unwrap();
  assert!(first.is_created());

  let second = s
    .record_if_absent(
      student.subject_id,
      token.session_id,
      first_at + Duration::minutes(1),
    )
    .await
    .unwrap();
  assert!(!second.is_created());
  assert_eq!(second.fact(), first.fact());
  assert_eq!(second.fact().recorded_at, first_at);

  let all = s.attendance_for_session(token.session_id).await.unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn concurrent_record_if_absent_creates_once() {
  let s = store().await;
  let issuer = s.add_subject("Dr. Rao".to_owned(), Role::Faculty).await.unwrap();
  let student = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  let token = session(&s, issuer.subject_id, 9).await;

  let mut handles = Vec::new();
  for _ in 0..16 {
    let s = s.clone();
    let (subject_id, session_id, at) = (student.subject_id, token.session_id, token.created_at);
    handles.push(tokio::spawn(async move {
      s.record_if_absent(subject_id, session_id, at).await.unwrap()
    }));
  }

  let mut created = 0;
  for h in handles {
    if h.await.unwrap().is_created() {
      created += 1;
    }
  }
  assert_eq!(created, 1);
  assert_eq!(s.attendance_for_session(token.session_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn attendance_for_session_oldest_first() {
  let s = store().await;
  let issuer = s.add_subject("Dr. Rao".to_owned(), Role::Faculty).await.unwrap();
  let a = s.add_subject("Asha".to_owned(), Role::Student).await.unwrap();
  let b = s.add_subject("Ravi".to_owned(), Role::Student).await.unwrap();
  let token = session(&s, issuer.subject_id, 9).await;

  s.record_if_absent(b.subject_id, token.session_id, token.created_at + Duration::minutes(7))
    .await
    .unwrap();
  s.record_if_absent(a.subject_id, token.session_id, token.created_at + Duration::minutes(2))
    .await
    .unwrap();

  let facts = s.attendance_for_session(token.session_id).await.unwrap();
  let order: Vec<_> = facts.iter().map(|f| f.subject_id).collect();
  assert_eq!(order, vec![a.subject_id, b.subject_id]);
}
