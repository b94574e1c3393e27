//! External collaborators the workflow consumes but does not own.
//!
//! - [`DepartmentValidator`]: reference-data lookup for routing triples.
//! - [`EventSink`]: downstream notification delivery.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::grievance::Grievance;

// ─── Department validation ───────────────────────────────────────────────────

/// Confirms that a `(department, category, sub-category)` triple exists.
///
/// An `Err` means the validator could not be reached; the engine reports that
/// as service-unavailable, distinct from `Ok(false)`.
pub trait DepartmentValidator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn is_valid<'a>(
    &'a self,
    department_id: &'a str,
    category_code: &'a str,
    sub_category_code: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
  GrievanceCreated,
  GrievanceAssigned,
  StatusUpdated,
  GrievanceEscalated,
  GrievanceReopened,
}

/// A status-change notification handed to the [`EventSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrievanceEvent {
  pub grievance_id: Uuid,
  /// The user the notification concerns: the citizen, or the case worker for
  /// assignments.
  pub user_id:      String,
  pub event_type:   EventType,
  pub message:      String,
}

impl GrievanceEvent {
  pub fn created(g: &Grievance) -> Self {
    Self {
      grievance_id: g.grievance_id,
      user_id:      g.citizen_id.clone(),
      event_type:   EventType::GrievanceCreated,
      message:      format!("Grievance {} submitted", g.grievance_id),
    }
  }

  pub fn assigned(g: &Grievance, worker: &str) -> Self {
    Self {
      grievance_id: g.grievance_id,
      user_id:      worker.to_owned(),
      event_type:   EventType::GrievanceAssigned,
      message:      format!("Grievance {} assigned to {worker}", g.grievance_id),
    }
  }

  pub fn status_updated(g: &Grievance) -> Self {
    Self {
      grievance_id: g.grievance_id,
      user_id:      g.citizen_id.clone(),
      event_type:   EventType::StatusUpdated,
      message:      format!("Grievance {} is now {}", g.grievance_id, g.status),
    }
  }

  pub fn escalated(g: &Grievance) -> Self {
    Self {
      grievance_id: g.grievance_id,
      user_id:      g.citizen_id.clone(),
      event_type:   EventType::GrievanceEscalated,
      message:      format!("Grievance {} escalated", g.grievance_id),
    }
  }

  pub fn reopened(g: &Grievance) -> Self {
    Self {
      grievance_id: g.grievance_id,
      user_id:      g.citizen_id.clone(),
      event_type:   EventType::GrievanceReopened,
      message:      format!("Grievance {} reopened", g.grievance_id),
    }
  }
}

/// Downstream consumer of [`GrievanceEvent`]s.
///
/// Delivery is best-effort: failures are logged by the emitter and never reach
/// the caller of the operation that produced the event.
pub trait EventSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn deliver(
    &self,
    event: GrievanceEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
