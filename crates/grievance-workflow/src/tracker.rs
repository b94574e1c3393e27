//! Assignment tracker: case-worker load and assignment records.

use std::{collections::HashSet, sync::Arc, time::Duration};

use grievance_core::{
  assignment::{AssignOutcome, NewAssignment},
  store::GrievanceStore,
};

use crate::{Result, error::bounded};

pub struct AssignmentTracker<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S: GrievanceStore> AssignmentTracker<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// `true` if `worker` currently holds an `ASSIGNED` or `IN_PROGRESS` case.
  pub async fn is_loaded(&self, worker: &str) -> Result<bool> {
    bounded(self.timeout, "worker load", self.store.worker_has_active_case(worker))
      .await
  }

  /// Record the assignment, its status change and its history row through the
  /// store's conditional write. The store repeats the load check inside its
  /// transaction, so a concurrent assignment that slipped past
  /// [`Self::is_loaded`] still comes back as `WorkerBusy`.
  pub async fn assign(&self, input: NewAssignment) -> Result<AssignOutcome> {
    bounded(self.timeout, "commit assignment", self.store.commit_assignment(input))
      .await
  }

  /// Distinct case workers `officer` has assigned to, in first-seen order,
  /// optionally only for grievances routed to `department`.
  pub async fn case_workers_for(
    &self,
    officer: &str,
    department: Option<&str>,
  ) -> Result<Vec<String>> {
    let rows = bounded(
      self.timeout,
      "list assignments",
      self.store.assignments_by_officer(officer, department),
    )
    .await?;

    let mut seen = HashSet::new();
    Ok(
      rows
        .into_iter()
        .map(|a| a.assigned_to)
        .filter(|w| !w.trim().is_empty())
        .filter(|w| seen.insert(w.clone()))
        .collect(),
    )
  }
}
