//! The audit trail.
//!
//! One [`GrievanceHistory`] row is appended for every accepted transition,
//! including creation, by the same store write that applies the transition.
//! Rows are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grievance::{Grievance, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceHistory {
  pub history_id:   Uuid,
  pub grievance_id: Uuid,
  /// The status entered by this transition.
  pub status:       Status,
  /// Actor id, or [`crate::actor::SYSTEM_ACTOR`].
  pub updated_by:   String,
  pub remarks:      Option<String>,
  pub updated_at:   DateTime<Utc>,
}

/// A status change to apply through
/// [`crate::store::GrievanceStore::transition_status`].
///
/// The store writes the new status and the matching history row in one
/// transaction.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub grievance_id: Uuid,
  pub status:       Status,
  /// Statuses the grievance must currently be in. Empty accepts any.
  pub from:         Vec<Status>,
  pub updated_by:   String,
  pub remarks:      Option<String>,
  pub updated_at:   DateTime<Utc>,
}

/// Result of [`crate::store::GrievanceStore::transition_status`]. Only
/// `Updated` means anything was written.
#[derive(Debug, Clone)]
pub enum StatusOutcome {
  Updated(Grievance),
  /// Moving into an active status was refused because the assigned worker
  /// already holds another active case.
  WorkerBusy(String),
  /// The current status was not one of [`StatusChange::from`].
  WrongStatus(Status),
  GrievanceNotFound,
}
