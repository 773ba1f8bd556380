//! Core types and trait definitions for the Rollcall attendance gate.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the domain model, the error taxonomy, the persistence trait, and the
//! stateless parts of the admission path (challenge bookkeeping, token expiry,
//! geofence distance).

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod challenge;
pub mod clock;
pub mod credential;
pub mod error;
pub mod geofence;
pub mod session;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
