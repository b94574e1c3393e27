//! The grievance workflow engine.
//!
//! [`WorkflowEngine`] owns every transition of a grievance: it evaluates the
//! authorization table, applies the change and its history row through one
//! [`GrievanceStore`](grievance_core::store::GrievanceStore) write, and hands a
//! notification to the [`EventEmitter`]. [`AuditTrail`] reads the history
//! back. The
//! [`Sweeper`] drives SLA escalation on a timer through the same engine.

pub mod audit;
pub mod config;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod sweeper;
pub mod tracker;

pub use audit::AuditTrail;
pub use config::EngineConfig;
pub use emitter::EventEmitter;
pub use engine::WorkflowEngine;
pub use error::{Error, Result};
pub use sweeper::{SweepReport, Sweeper};
pub use tracker::AssignmentTracker;
