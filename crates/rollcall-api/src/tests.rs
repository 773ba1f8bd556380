//! Router tests: requests go through the full axum stack via `oneshot`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use rollcall_admission::{Admission, AdmissionConfig, RelyingParty};
use rollcall_core::Error as CoreError;
use rollcall_store_sqlite::SqliteStore;
use rollcall_webauthn::testutil::{SoftAuthenticator, TEST_ORIGIN, TEST_RP_ID};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiError, api_router, encoding};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let config = AdmissionConfig {
    relying_party: RelyingParty {
      id:      TEST_RP_ID.to_string(),
      origins: vec![TEST_ORIGIN.to_string()],
    },
    ..AdmissionConfig::default()
  };
  api_router(Arc::new(Admission::new(Arc::new(store), config)))
}

async fn send(
  app:    &Router,
  method: &str,
  uri:    &str,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

async fn create_subject(app: &Router, name: &str, role: &str) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/subjects",
    Some(json!({ "display_name": name, "role": role })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["subject_id"].as_str().unwrap().to_owned()
}

/// Returns `(ceremony_id, challenge bytes)`.
async fn challenge(app: &Router, subject_id: &str) -> (String, Vec<u8>) {
  let (status, body) =
    send(app, "POST", &format!("/subjects/{subject_id}/challenge"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["rp_id"], TEST_RP_ID);
  assert_eq!(body["user_verification"], "required");
  (
    body["ceremony_id"].as_str().unwrap().to_owned(),
    encoding::decode(body["challenge"].as_str().unwrap()).unwrap(),
  )
}

async fn register(
  app: &Router,
  subject_id: &str,
  auth: &SoftAuthenticator,
) -> (StatusCode, Value) {
  let (ceremony_id, nonce) = challenge(app, subject_id).await;
  let resp = auth.register(&nonce, TEST_ORIGIN, TEST_RP_ID);
  send(
    app,
    "POST",
    &format!("/subjects/{subject_id}/credential"),
    Some(json!({
      "ceremony_id": ceremony_id,
      "credential_id": encoding::encode(&resp.credential_id),
      "attestation_object": encoding::encode(&resp.attestation_object),
      "client_data_json": encoding::encode(&resp.client_data_json),
    })),
  )
  .await
}

async fn admit(
  app: &Router,
  subject_id: &str,
  token: &str,
  auth: &mut SoftAuthenticator,
  location: Option<(f64, f64)>,
) -> (StatusCode, Value) {
  let (ceremony_id, nonce) = challenge(app, subject_id).await;
  let resp = auth.assert(&nonce, TEST_ORIGIN, TEST_RP_ID);
  let mut body = json!({
    "subject_id": subject_id,
    "token": token,
    "ceremony_id": ceremony_id,
    "credential_id": encoding::encode(&resp.credential_id),
    "client_data_json": encoding::encode(&resp.client_data_json),
    "authenticator_data": encoding::encode(&resp.authenticator_data),
    "signature": encoding::encode(&resp.signature),
  });
  if let Some((lat, lng)) = location {
    body["latitude"] = json!(lat);
    body["longitude"] = json!(lng);
  }
  send(app, "POST", "/attendance", Some(body)).await
}

async fn open_session(app: &Router, issuer_id: &str, minutes: i64) -> Value {
  let (status, body) = send(
    app,
    "POST",
    "/sessions",
    Some(json!({
      "issuer_id": issuer_id,
      "topic_id": uuid::Uuid::new_v4(),
      "duration_minutes": minutes,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_subject() {
  let app = app().await;
  let id = create_subject(&app, "Asha", "student").await;

  let (status, body) = send(&app, "GET", &format!("/subjects/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["display_name"], "Asha");
  assert_eq!(body["role"], "student");
}

#[tokio::test]
async fn unknown_subject_is_404_with_kind() {
  let app = app().await;
  let uri = format!("/subjects/{}", uuid::Uuid::new_v4());
  let (status, body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "subject_not_found");
  assert!(body["message"].as_str().unwrap().contains("subject not found"));
}

#[tokio::test]
async fn blank_display_name_is_rejected() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/subjects",
    Some(json!({ "display_name": "  ", "role": "student" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "bad_request");
}

// ─── Credential lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn register_status_reset() {
  let app = app().await;
  let id = create_subject(&app, "Asha", "student").await;
  let auth = SoftAuthenticator::p256();

  let uri = format!("/subjects/{id}/credential");
  let (_, status_body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status_body["enrolled"], false);

  let (status, body) = register(&app, &id, &auth).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["credential_id"], encoding::encode(auth.credential_id()));
  assert!(body.get("public_key").is_none());

  let (_, status_body) = send(&app, "GET", &uri, None).await;
  assert_eq!(status_body["enrolled"], true);

  let (status, body) = register(&app, &id, &SoftAuthenticator::p256()).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "already_enrolled");

  let (status, body) = send(&app, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["removed"], 1);

  let (status, _) = register(&app, &id, &SoftAuthenticator::ed25519()).await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_base64_is_unprocessable() {
  let app = app().await;
  let id = create_subject(&app, "Asha", "student").await;
  let (ceremony_id, _) = challenge(&app, &id).await;

  let (status, _) = send(
    &app,
    "POST",
    &format!("/subjects/{id}/credential"),
    Some(json!({
      "ceremony_id": ceremony_id,
      "attestation_object": "%%%",
      "client_data_json": "e30",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// ─── Admission ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_admission_flow() {
  let app = app().await;
  let faculty = create_subject(&app, "Dr. Rao", "faculty").await;
  let student = create_subject(&app, "Asha", "student").await;

  let (status, _) = send(&app, "GET", "/geofence", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, body) = send(
    &app,
    "PUT",
    "/geofence",
    Some(json!({ "latitude": 18.5204, "longitude": 73.8567, "radius_m": 200.0 })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["radius_m"], 200.0);

  let mut auth = SoftAuthenticator::p256();
  let (status, _) = register(&app, &student, &auth).await;
  assert_eq!(status, StatusCode::CREATED);

  let session = open_session(&app, &faculty, 10).await;
  let token = session["token"].as_str().unwrap();
  let session_id = session["session_id"].as_str().unwrap();

  let (status, body) =
    admit(&app, &student, token, &mut auth, Some((18.5210, 73.8570))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["outcome"], "created");
  assert_eq!(body["geofence"]["status"], "within");
  assert_eq!(body["fact"]["status"], "present");

  let (status, body) =
    admit(&app, &student, token, &mut auth, Some((18.5210, 73.8570))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "already_present");

  let (status, body) = admit(&app, &student, token, &mut auth, Some((19.0760, 72.8777))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "outside_geofence");

  let (status, body) = admit(&app, &student, token, &mut auth, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "location_required");

  let (_, facts) =
    send(&app, "GET", &format!("/sessions/{session_id}/attendance"), None).await;
  assert_eq!(facts.as_array().unwrap().len(), 1);

  let (_, sessions) = send(&app, "GET", &format!("/sessions?issuer_id={faculty}"), None).await;
  assert_eq!(sessions[0]["attendance_count"], 1);
}

#[tokio::test]
async fn unknown_token_is_404() {
  let app = app().await;
  let student = create_subject(&app, "Asha", "student").await;
  let mut auth = SoftAuthenticator::p256();
  register(&app, &student, &auth).await;

  let (status, body) = admit(&app, &student, "no-such-token", &mut auth, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "token_not_found");
}

#[tokio::test]
async fn half_a_location_is_rejected() {
  let app = app().await;
  let faculty = create_subject(&app, "Dr. Rao", "faculty").await;
  let student = create_subject(&app, "Asha", "student").await;
  let auth = SoftAuthenticator::p256();
  register(&app, &student, &auth).await;
  let session = open_session(&app, &faculty, 10).await;

  let (ceremony_id, nonce) = challenge(&app, &student).await;
  let mut auth = auth;
  let resp = auth.assert(&nonce, TEST_ORIGIN, TEST_RP_ID);
  let (status, body) = send(
    &app,
    "POST",
    "/attendance",
    Some(json!({
      "subject_id": student,
      "token": session["token"],
      "latitude": 18.5,
      "ceremony_id": ceremony_id,
      "credential_id": encoding::encode(&resp.credential_id),
      "client_data_json": encoding::encode(&resp.client_data_json),
      "authenticator_data": encoding::encode(&resp.authenticator_data),
      "signature": encoding::encode(&resp.signature),
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn session_duration_out_of_bounds() {
  let app = app().await;
  let faculty = create_subject(&app, "Dr. Rao", "faculty").await;
  let (status, body) = send(
    &app,
    "POST",
    "/sessions",
    Some(json!({
      "issuer_id": faculty,
      "topic_id": uuid::Uuid::new_v4(),
      "duration_minutes": 0,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid_duration");
}

// ─── Status mapping ──────────────────────────────────────────────────────────

#[test]
fn protocol_errors_map_to_distinct_statuses() {
  let cases = [
    (CoreError::ChallengeExpired, StatusCode::UNAUTHORIZED),
    (CoreError::SignatureInvalid, StatusCode::UNAUTHORIZED),
    (
      CoreError::PossibleCloneDetected { stored: 4, presented: 4 },
      StatusCode::UNAUTHORIZED,
    ),
    (CoreError::AlreadyEnrolled, StatusCode::CONFLICT),
    (CoreError::TokenExpired, StatusCode::GONE),
    (CoreError::GeofenceRequired, StatusCode::FORBIDDEN),
    (CoreError::CeremonyInvalid("x".into()), StatusCode::BAD_REQUEST),
  ];
  for (err, expected) in cases {
    let kind = err.kind();
    let api = ApiError::from(err);
    assert_eq!(api.status(), expected, "{kind}");
    assert_eq!(api.kind(), kind);
  }
}
