//! Core types and trait definitions for the grievance workflow.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod actor;
pub mod assignment;
pub mod collab;
pub mod error;
pub mod grievance;
pub mod history;
pub mod policy;
pub mod store;

pub use error::{Error, Result};
