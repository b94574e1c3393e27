//! The grievance record and its status lifecycle.
//!
//! A grievance is created once by a citizen and then mutated in place by the
//! workflow engine. It is never deleted; every change it goes through is also
//! recorded in the append-only history (see [`crate::history`]).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a grievance currently sits in its lifecycle.
///
/// No transition table is enforced: `update_status` accepts any target, and
/// callers are responsible for requesting sane transitions.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
  Submitted,
  DeptReview,
  Assigned,
  InProgress,
  WorkDone,
  Resolved,
  Reopened,
  Escalated,
  Closed,
}

impl Status {
  /// Statuses that count against a case worker's load and that the SLA
  /// sweeper watches.
  pub const ACTIVE: [Status; 2] = [Status::Assigned, Status::InProgress];

  /// `true` for `ASSIGNED` and `IN_PROGRESS`.
  pub fn is_active(self) -> bool { Self::ACTIVE.contains(&self) }

  /// Statuses a citizen may reopen from.
  pub const REOPENABLE: [Status; 3] =
    [Status::WorkDone, Status::Resolved, Status::Closed];

  /// `true` for `WORK_DONE`, `RESOLVED` and `CLOSED`.
  pub fn is_reopenable(self) -> bool { Self::REOPENABLE.contains(&self) }

  /// Parse the SCREAMING_SNAKE_CASE wire form.
  pub fn parse(s: &str) -> Result<Self> {
    Status::from_str(s).map_err(|_| Error::UnknownStatus(s.to_owned()))
  }
}

// ─── Grievance ───────────────────────────────────────────────────────────────

/// Minimum description length, in characters.
pub const DESCRIPTION_MIN: usize = 10;
/// Maximum description length, in characters.
pub const DESCRIPTION_MAX: usize = 2000;

/// A citizen-filed complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grievance {
  pub grievance_id:       Uuid,
  /// Owner; never changes after creation.
  pub citizen_id:         String,
  pub department_id:      String,
  pub category_code:      String,
  pub sub_category_code:  String,
  pub assigned_worker_id: Option<String>,
  pub description:        String,
  pub status:             Status,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
  /// Time of the most recent assignment; the SLA clock starts here.
  pub assigned_at:        Option<DateTime<Utc>>,
  /// Once set, never cleared.
  pub escalated:          bool,
}

impl Grievance {
  /// Build a freshly submitted grievance from a validated request.
  pub fn submit(
    request: NewGrievance,
    citizen_id: impl Into<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      grievance_id:       Uuid::new_v4(),
      citizen_id:         citizen_id.into(),
      department_id:      request.department_id,
      category_code:      request.category_code,
      sub_category_code:  request.sub_category_code,
      assigned_worker_id: None,
      description:        request.description.trim().to_owned(),
      status:             Status::Submitted,
      created_at:         now,
      updated_at:         now,
      assigned_at:        None,
      escalated:          false,
    }
  }

  /// `true` if a worker is attached and the case still counts as active.
  pub fn has_active_assignment(&self) -> bool {
    self.assigned_worker_id.is_some() && self.status.is_active()
  }
}

// ─── NewGrievance ────────────────────────────────────────────────────────────

/// Input to [`crate::store::GrievanceStore::insert_grievance`] via the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrievance {
  pub department_id:     String,
  pub category_code:     String,
  pub sub_category_code: String,
  pub description:       String,
}

impl NewGrievance {
  /// Check the description length bounds.
  pub fn validate(&self) -> Result<()> {
    let len = self.description.trim().chars().count();
    if len < DESCRIPTION_MIN {
      return Err(Error::InvalidDescription(format!(
        "must be at least {DESCRIPTION_MIN} characters, got {len}"
      )));
    }
    if len > DESCRIPTION_MAX {
      return Err(Error::InvalidDescription(format!(
        "must be at most {DESCRIPTION_MAX} characters, got {len}"
      )));
    }
    Ok(())
  }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::GrievanceStore::list_grievances`]. Every
/// populated field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct GrievanceFilter {
  pub department_id:      Option<String>,
  pub assigned_worker_id: Option<String>,
  pub citizen_id:         Option<String>,
  /// Empty means any status.
  pub statuses:           Vec<Status>,
}
