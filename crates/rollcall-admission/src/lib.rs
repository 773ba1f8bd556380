//! The admission gate: challenge-response ceremonies over a
//! [`rollcall_core::store::RollcallStore`], composed with the session token,
//! geofence and attendance checks.
//!
//! [`Admission`] is the single entry point. It owns the in-memory challenge
//! store and a [`rollcall_core::clock::Clock`]; everything durable goes
//! through the store.
//!
//! ```rust,ignore
//! let admission = Admission::new(Arc::new(store), AdmissionConfig::default());
//! let issued = admission.issue_challenge(subject_id).await?;
//! ```

mod admission;
mod ceremony;

pub mod config;
pub mod payload;

pub use admission::{Admission, CredentialStatus};
pub use config::{AdmissionConfig, MissingGeofencePolicy, RelyingParty};
pub use payload::{
  AdmissionOutcome, AdmissionRequest, AssertionPayload, AttendanceResult,
  GeofenceCheck, RegistrationPayload,
};
