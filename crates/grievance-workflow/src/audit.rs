//! Audit trail reader.
//!
//! Rows are written by the store in the same transaction as the transition
//! they describe; this side only reads them back.

use std::{sync::Arc, time::Duration};

use grievance_core::{history::GrievanceHistory, store::GrievanceStore};
use tracing::debug;
use uuid::Uuid;

use crate::{Result, error::bounded};

pub struct AuditTrail<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S: GrievanceStore> AuditTrail<S> {
  pub fn new(store: Arc<S>, timeout: Duration) -> Self { Self { store, timeout } }

  /// The full trail, oldest first. May be empty.
  pub async fn trail(&self, grievance_id: Uuid) -> Result<Vec<GrievanceHistory>> {
    let rows =
      bounded(self.timeout, "list history", self.store.list_history(grievance_id))
        .await?;
    debug!(%grievance_id, rows = rows.len(), "history read");
    Ok(rows)
  }
}
