//! Assignment records.
//!
//! Each assignment act appends one row; rows are never updated. They exist so
//! the engine can answer which case workers an officer has handed work to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grievance::Grievance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub grievance_id:  Uuid,
  /// The officer who made the assignment.
  pub assigned_by:   String,
  /// The case worker receiving the grievance.
  pub assigned_to:   String,
  pub assigned_at:   DateTime<Utc>,
}

/// Input to [`crate::store::GrievanceStore::commit_assignment`].
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub grievance_id: Uuid,
  pub assigned_by:  String,
  pub assigned_to:  String,
  pub assigned_at:  DateTime<Utc>,
  /// Remarks for the `ASSIGNED` history row written with the assignment.
  pub remarks:      Option<String>,
}

/// Result of the store's conditional assignment write.
///
/// The store re-checks worker load and the target's current assignment inside
/// the same transaction as the write, so only `Assigned` means anything was
/// persisted (the assignment row, the status change and its history row).
#[derive(Debug, Clone)]
pub enum AssignOutcome {
  Assigned {
    grievance:  Grievance,
    assignment: Assignment,
  },
  /// The worker already holds an `ASSIGNED` or `IN_PROGRESS` case.
  WorkerBusy,
  /// The grievance already has an active assignment.
  AlreadyAssigned,
  GrievanceNotFound,
}
