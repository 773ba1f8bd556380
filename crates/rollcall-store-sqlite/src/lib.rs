//! SQLite backend for the Rollcall store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write that must be atomic with
//! respect to a uniqueness invariant is a single statement or a single
//! immediate transaction inside one `call`.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
