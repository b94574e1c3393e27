//! The `GrievanceStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `grievance-store-sqlite`). The workflow engine depends on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  assignment::{AssignOutcome, Assignment, NewAssignment},
  grievance::{Grievance, GrievanceFilter},
  history::{GrievanceHistory, StatusChange, StatusOutcome},
};

/// Abstraction over the three grievance collections.
///
/// `grievances` is mutable; `assignments` and `grievance_history` are
/// append-only and expose no update or delete. Every write that changes a
/// grievance's status appends its history row in the same transaction, so
/// the two are never observed apart.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait GrievanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Grievances ────────────────────────────────────────────────────────

  /// Persist a new grievance and its `SUBMITTED` history row, attributed to
  /// the citizen at `created_at`. The id is chosen by the caller.
  fn insert_grievance<'a>(
    &'a self,
    grievance: &'a Grievance,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve a grievance by id. Returns `None` if not found.
  fn get_grievance(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Grievance>, Self::Error>> + Send + '_;

  /// Conditionally move a grievance to `change.status`.
  ///
  /// Inside one transaction: check `change.from`, and when the grievance
  /// enters an active status from an inactive one, check that its assigned
  /// worker holds no other active case. Only `status` and `updated_at` are
  /// written, together with the history row.
  fn transition_status(
    &self,
    change: StatusChange,
  ) -> impl Future<Output = Result<StatusOutcome, Self::Error>> + Send + '_;

  /// List grievances matching `filter`, oldest first.
  fn list_grievances<'a>(
    &'a self,
    filter: &'a GrievanceFilter,
  ) -> impl Future<Output = Result<Vec<Grievance>, Self::Error>> + Send + 'a;

  /// Grievances in an active status, assigned before `cutoff`, and not yet
  /// escalated.
  fn find_sla_breaches(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Grievance>, Self::Error>> + Send + '_;

  /// Conditionally mark a grievance escalated.
  ///
  /// Sets `escalated`, `status = ESCALATED` and `updated_at`, and appends the
  /// `ESCALATED` history row attributed to `updated_by`, only if the row is
  /// not already escalated. Returns the updated record, or `None` if the row
  /// was missing or already escalated.
  fn mark_escalated<'a>(
    &'a self,
    id: Uuid,
    updated_by: &'a str,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Grievance>, Self::Error>> + Send + 'a;

  // ── Assignments ───────────────────────────────────────────────────────

  /// `true` if `worker` holds any grievance in an active status.
  fn worker_has_active_case<'a>(
    &'a self,
    worker: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Atomically re-check worker load and the grievance's current assignment,
  /// then append the assignment row, move the grievance to `ASSIGNED` and
  /// append the history row.
  fn commit_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<AssignOutcome, Self::Error>> + Send + '_;

  /// All assignments made by `officer`, in insertion order. With
  /// `department`, only assignments of grievances routed there.
  fn assignments_by_officer<'a>(
    &'a self,
    officer: &'a str,
    department: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + 'a;

  // ── History ───────────────────────────────────────────────────────────

  /// The full audit trail for a grievance, oldest first.
  fn list_history(
    &self,
    grievance_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GrievanceHistory>, Self::Error>> + Send + '_;
}
