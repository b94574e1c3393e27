//! SQLite backend for the grievance workflow.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write that changes a status runs
//! its checks, the update and the history insert inside a single transaction
//! on that thread, so it is atomic with respect to every other store call and
//! commits or rolls back as a whole even if the awaiting caller gives up.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
