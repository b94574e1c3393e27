//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that SQL string comparison orders them chronologically. UUIDs
//! are stored as hyphenated lowercase strings; statuses as their
//! SCREAMING_SNAKE_CASE names.

use chrono::{DateTime, SecondsFormat, Utc};
use grievance_core::{
  assignment::Assignment,
  grievance::{Grievance, Status},
  history::GrievanceHistory,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> &'static str {
  match s {
    Status::Submitted => "SUBMITTED",
    Status::DeptReview => "DEPT_REVIEW",
    Status::Assigned => "ASSIGNED",
    Status::InProgress => "IN_PROGRESS",
    Status::WorkDone => "WORK_DONE",
    Status::Resolved => "RESOLVED",
    Status::Reopened => "REOPENED",
    Status::Escalated => "ESCALATED",
    Status::Closed => "CLOSED",
  }
}

pub fn decode_status(s: &str) -> Result<Status> { Ok(Status::parse(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `grievances` SELECT; order matches
/// [`RawGrievance::from_row`].
pub const GRIEVANCE_COLUMNS: &str = "grievance_id, citizen_id, department_id, \
   category_code, sub_category_code, assigned_worker_id, description, status, \
   created_at, updated_at, assigned_at, escalated";

/// Raw values read directly from a `grievances` row.
pub struct RawGrievance {
  pub grievance_id:       String,
  pub citizen_id:         String,
  pub department_id:      String,
  pub category_code:      String,
  pub sub_category_code:  String,
  pub assigned_worker_id: Option<String>,
  pub description:        String,
  pub status:             String,
  pub created_at:         String,
  pub updated_at:         String,
  pub assigned_at:        Option<String>,
  pub escalated:          bool,
}

impl RawGrievance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      grievance_id:       row.get(0)?,
      citizen_id:         row.get(1)?,
      department_id:      row.get(2)?,
      category_code:      row.get(3)?,
      sub_category_code:  row.get(4)?,
      assigned_worker_id: row.get(5)?,
      description:        row.get(6)?,
      status:             row.get(7)?,
      created_at:         row.get(8)?,
      updated_at:         row.get(9)?,
      assigned_at:        row.get(10)?,
      escalated:          row.get(11)?,
    })
  }

  /// `true` if the row is `ASSIGNED` or `IN_PROGRESS`.
  pub fn is_active(&self) -> bool {
    Status::ACTIVE.iter().any(|s| encode_status(*s) == self.status)
  }

  /// `true` if this row already holds a worker in an active status.
  pub fn has_active_assignment(&self) -> bool {
    self.assigned_worker_id.is_some() && self.is_active()
  }

  pub fn into_grievance(self) -> Result<Grievance> {
    Ok(Grievance {
      grievance_id:       decode_uuid(&self.grievance_id)?,
      citizen_id:         self.citizen_id,
      department_id:      self.department_id,
      category_code:      self.category_code,
      sub_category_code:  self.sub_category_code,
      assigned_worker_id: self.assigned_worker_id,
      description:        self.description,
      status:             decode_status(&self.status)?,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
      assigned_at:        self.assigned_at.as_deref().map(decode_dt).transpose()?,
      escalated:          self.escalated,
    })
  }
}

/// Raw strings read directly from an `assignments` row.
pub struct RawAssignment {
  pub assignment_id: String,
  pub grievance_id:  String,
  pub assigned_by:   String,
  pub assigned_to:   String,
  pub assigned_at:   String,
}

impl RawAssignment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      assignment_id: row.get(0)?,
      grievance_id:  row.get(1)?,
      assigned_by:   row.get(2)?,
      assigned_to:   row.get(3)?,
      assigned_at:   row.get(4)?,
    })
  }

  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      grievance_id:  decode_uuid(&self.grievance_id)?,
      assigned_by:   self.assigned_by,
      assigned_to:   self.assigned_to,
      assigned_at:   decode_dt(&self.assigned_at)?,
    })
  }
}

/// Raw strings read directly from a `grievance_history` row.
pub struct RawHistory {
  pub history_id:   String,
  pub grievance_id: String,
  pub status:       String,
  pub updated_by:   String,
  pub remarks:      Option<String>,
  pub updated_at:   String,
}

impl RawHistory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      history_id:   row.get(0)?,
      grievance_id: row.get(1)?,
      status:       row.get(2)?,
      updated_by:   row.get(3)?,
      remarks:      row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_history(self) -> Result<GrievanceHistory> {
    Ok(GrievanceHistory {
      history_id:   decode_uuid(&self.history_id)?,
      grievance_id: decode_uuid(&self.grievance_id)?,
      status:       decode_status(&self.status)?,
      updated_by:   self.updated_by,
      remarks:      self.remarks,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  const ALL: [Status; 9] = [
    Status::Submitted,
    Status::DeptReview,
    Status::Assigned,
    Status::InProgress,
    Status::WorkDone,
    Status::Resolved,
    Status::Reopened,
    Status::Escalated,
    Status::Closed,
  ];

  #[test]
  fn status_column_matches_wire_form() {
    for s in ALL {
      assert_eq!(encode_status(s), s.to_string());
      assert_eq!(decode_status(encode_status(s)).unwrap(), s);
    }
  }

  #[test]
  fn timestamps_sort_lexicographically() {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let later = base + Duration::microseconds(1500);
    let a = encode_dt(base);
    let b = encode_dt(later);
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }
}
