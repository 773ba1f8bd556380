//! JSON REST API for Rollcall.
//!
//! Exposes an axum [`Router`] over an [`Admission`] gate. Authentication of
//! the caller, role checks and TLS are the embedding server's concern; subject
//! ids travel explicitly in paths and bodies.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollcall_api::api_router(admission.clone()))
//! ```

pub mod attendance;
pub mod encoding;
pub mod error;
pub mod geofence;
pub mod sessions;
pub mod subjects;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use rollcall_admission::Admission;
use rollcall_core::store::RollcallStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `admission`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(admission: Arc<Admission<S>>) -> Router<()>
where
  S: RollcallStore + 'static,
{
  Router::new()
    // Subjects and their credential
    .route("/subjects", post(subjects::create::<S>))
    .route("/subjects/{id}", get(subjects::get_one::<S>))
    .route(
      "/subjects/{id}/credential",
      get(subjects::credential_status::<S>)
        .post(subjects::register::<S>)
        .delete(subjects::reset::<S>),
    )
    .route("/subjects/{id}/challenge", post(subjects::challenge::<S>))
    // Sessions
    .route("/sessions", get(sessions::list::<S>).post(sessions::create::<S>))
    .route("/sessions/{id}/attendance", get(sessions::attendance::<S>))
    // Admission
    .route("/attendance", post(attendance::admit::<S>))
    // Geofence
    .route("/geofence", get(geofence::get_one::<S>).put(geofence::replace::<S>))
    .with_state(admission)
}

#[cfg(test)]
mod tests;
