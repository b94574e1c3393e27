//! [`SqliteStore`]: the SQLite implementation of [`GrievanceStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use grievance_core::{
  assignment::{AssignOutcome, Assignment, NewAssignment},
  grievance::{Grievance, GrievanceFilter, Status},
  history::{GrievanceHistory, StatusChange, StatusOutcome},
  store::GrievanceStore,
};

use crate::{
  encode::{
    decode_status, encode_dt, encode_status, encode_uuid, RawAssignment,
    RawGrievance, RawHistory, GRIEVANCE_COLUMNS,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A grievance store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What the assignment transaction observed, before decoding.
enum RawAssignOutcome {
  Assigned(RawGrievance),
  WorkerBusy,
  AlreadyAssigned,
  GrievanceNotFound,
}

/// What the status transaction observed, before decoding.
enum RawStatusOutcome {
  Updated(RawGrievance),
  WorkerBusy(String),
  WrongStatus(String),
  GrievanceNotFound,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `grievances` SELECT with the given tail (`WHERE ...`) and params.
  async fn select_grievances(
    &self,
    tail: String,
    params: Vec<String>,
  ) -> Result<Vec<Grievance>> {
    let raws: Vec<RawGrievance> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances {tail}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawGrievance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGrievance::into_grievance).collect()
  }
}

fn active_params() -> [&'static str; 2] {
  [encode_status(Status::ACTIVE[0]), encode_status(Status::ACTIVE[1])]
}

// ─── GrievanceStore impl ─────────────────────────────────────────────────────

impl GrievanceStore for SqliteStore {
  type Error = crate::Error;

  // ── Grievances ────────────────────────────────────────────────────────────

  async fn insert_grievance(&self, g: &Grievance) -> Result<()> {
    let id_str          = encode_uuid(g.grievance_id);
    let citizen_id      = g.citizen_id.clone();
    let department_id   = g.department_id.clone();
    let category_code   = g.category_code.clone();
    let sub_category    = g.sub_category_code.clone();
    let worker          = g.assigned_worker_id.clone();
    let description     = g.description.clone();
    let status_str      = encode_status(g.status);
    let created_at_str  = encode_dt(g.created_at);
    let updated_at_str  = encode_dt(g.updated_at);
    let assigned_at_str = g.assigned_at.map(encode_dt);
    let escalated       = g.escalated;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO grievances (
             grievance_id, citizen_id, department_id, category_code,
             sub_category_code, assigned_worker_id, description, status,
             created_at, updated_at, assigned_at, escalated
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            citizen_id,
            department_id,
            category_code,
            sub_category,
            worker,
            description,
            status_str,
            created_at_str,
            updated_at_str,
            assigned_at_str,
            escalated,
          ],
        )?;
        insert_history(&tx, &id_str, status_str, &citizen_id, None, &created_at_str)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_grievance(&self, id: Uuid) -> Result<Option<Grievance>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawGrievance> = self
      .conn
      .call(move |conn| Ok(select_one(conn, &id_str)?))
      .await?;

    raw.map(RawGrievance::into_grievance).transpose()
  }

  async fn transition_status(&self, change: StatusChange) -> Result<StatusOutcome> {
    let grievance_id = change.grievance_id;
    let id_str       = encode_uuid(change.grievance_id);
    let status_str   = encode_status(change.status);
    let entering     = change.status.is_active();
    let from: Vec<&'static str> = change.from.iter().map(|s| encode_status(*s)).collect();
    let updated_by   = change.updated_by;
    let remarks      = change.remarks;
    let at_str       = encode_dt(change.updated_at);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(current) = select_one(&tx, &id_str)? else {
          return Ok(RawStatusOutcome::GrievanceNotFound);
        };
        if !from.is_empty() && !from.iter().any(|s| *s == current.status) {
          return Ok(RawStatusOutcome::WrongStatus(current.status));
        }
        if entering
          && !current.is_active()
          && let Some(worker) = current.assigned_worker_id.as_deref()
          && worker_busy(&tx, worker, Some(id_str.as_str()))?
        {
          return Ok(RawStatusOutcome::WorkerBusy(worker.to_owned()));
        }

        tx.execute(
          "UPDATE grievances SET status = ?2, updated_at = ?3 WHERE grievance_id = ?1",
          rusqlite::params![id_str, status_str, at_str],
        )?;
        insert_history(&tx, &id_str, status_str, &updated_by, remarks.as_deref(), &at_str)?;
        tx.commit()?;

        Ok(RawStatusOutcome::Updated(RawGrievance {
          status:     status_str.to_owned(),
          updated_at: at_str,
          ..current
        }))
      })
      .await?;

    let outcome = match raw {
      RawStatusOutcome::Updated(g) => StatusOutcome::Updated(g.into_grievance()?),
      RawStatusOutcome::WorkerBusy(w) => StatusOutcome::WorkerBusy(w),
      RawStatusOutcome::WrongStatus(s) => StatusOutcome::WrongStatus(decode_status(&s)?),
      RawStatusOutcome::GrievanceNotFound => StatusOutcome::GrievanceNotFound,
    };
    debug!(
      %grievance_id,
      outcome = status_outcome_name(&outcome),
      "status transaction finished"
    );
    Ok(outcome)
  }

  async fn list_grievances(&self, filter: &GrievanceFilter) -> Result<Vec<Grievance>> {
    let mut conds: Vec<String> = vec![];
    let mut params: Vec<String> = vec![];

    let mut eq = |column: &str, value: &Option<String>| {
      if let Some(v) = value {
        params.push(v.clone());
        conds.push(format!("{column} = ?{}", params.len()));
      }
    };
    eq("department_id", &filter.department_id);
    eq("assigned_worker_id", &filter.assigned_worker_id);
    eq("citizen_id", &filter.citizen_id);

    if !filter.statuses.is_empty() {
      let mut slots = Vec::with_capacity(filter.statuses.len());
      for s in &filter.statuses {
        params.push(encode_status(*s).to_owned());
        slots.push(format!("?{}", params.len()));
      }
      conds.push(format!("status IN ({})", slots.join(", ")));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };

    self
      .select_grievances(format!("{where_clause} ORDER BY created_at, rowid"), params)
      .await
  }

  async fn find_sla_breaches(&self, cutoff: DateTime<Utc>) -> Result<Vec<Grievance>> {
    let [a, b] = active_params();
    self
      .select_grievances(
        "WHERE status IN (?1, ?2)
           AND escalated = 0
           AND assigned_at IS NOT NULL
           AND assigned_at < ?3
         ORDER BY assigned_at, rowid"
          .to_owned(),
        vec![a.to_owned(), b.to_owned(), encode_dt(cutoff)],
      )
      .await
  }

  async fn mark_escalated(
    &self,
    id: Uuid,
    updated_by: &str,
    at: DateTime<Utc>,
  ) -> Result<Option<Grievance>> {
    let id_str     = encode_uuid(id);
    let updated_by = updated_by.to_owned();
    let at_str     = encode_dt(at);
    let status_str = encode_status(Status::Escalated);

    let raw: Option<RawGrievance> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE grievances
              SET escalated = 1, status = ?2, updated_at = ?3
            WHERE grievance_id = ?1 AND escalated = 0",
          rusqlite::params![id_str, status_str, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        insert_history(&tx, &id_str, status_str, &updated_by, None, &at_str)?;
        let row = select_one(&tx, &id_str)?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    raw.map(RawGrievance::into_grievance).transpose()
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn worker_has_active_case(&self, worker: &str) -> Result<bool> {
    let worker = worker.to_owned();
    let busy = self
      .conn
      .call(move |conn| Ok(worker_busy(conn, &worker, None)?))
      .await?;
    Ok(busy)
  }

  async fn commit_assignment(&self, input: NewAssignment) -> Result<AssignOutcome> {
    let grievance_id = input.grievance_id;
    let remarks      = input.remarks;
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      grievance_id:  input.grievance_id,
      assigned_by:   input.assigned_by,
      assigned_to:   input.assigned_to,
      assigned_at:   input.assigned_at,
    };

    let asg_id_str   = encode_uuid(assignment.assignment_id);
    let g_id_str     = encode_uuid(assignment.grievance_id);
    let assigned_by  = assignment.assigned_by.clone();
    let assigned_to  = assignment.assigned_to.clone();
    let at_str       = encode_dt(assignment.assigned_at);
    let assigned_str = encode_status(Status::Assigned);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(current) = select_one(&tx, &g_id_str)? else {
          return Ok(RawAssignOutcome::GrievanceNotFound);
        };
        if worker_busy(&tx, &assigned_to, None)? {
          return Ok(RawAssignOutcome::WorkerBusy);
        }
        if current.has_active_assignment() {
          return Ok(RawAssignOutcome::AlreadyAssigned);
        }

        tx.execute(
          "INSERT INTO assignments
             (assignment_id, grievance_id, assigned_by, assigned_to, assigned_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![asg_id_str, g_id_str, assigned_by, assigned_to, at_str],
        )?;
        tx.execute(
          "UPDATE grievances
              SET assigned_worker_id = ?2, status = ?3,
                  assigned_at = ?4, updated_at = ?4
            WHERE grievance_id = ?1",
          rusqlite::params![g_id_str, assigned_to, assigned_str, at_str],
        )?;
        insert_history(
          &tx,
          &g_id_str,
          assigned_str,
          &assigned_by,
          remarks.as_deref(),
          &at_str,
        )?;
        tx.commit()?;

        Ok(RawAssignOutcome::Assigned(RawGrievance {
          assigned_worker_id: Some(assigned_to),
          status:             assigned_str.to_owned(),
          assigned_at:        Some(at_str.clone()),
          updated_at:         at_str,
          ..current
        }))
      })
      .await?;

    let outcome = match raw {
      RawAssignOutcome::Assigned(g) => AssignOutcome::Assigned {
        grievance: g.into_grievance()?,
        assignment,
      },
      RawAssignOutcome::WorkerBusy => AssignOutcome::WorkerBusy,
      RawAssignOutcome::AlreadyAssigned => AssignOutcome::AlreadyAssigned,
      RawAssignOutcome::GrievanceNotFound => AssignOutcome::GrievanceNotFound,
    };
    debug!(
      %grievance_id,
      outcome = outcome_name(&outcome),
      "assignment transaction finished"
    );
    Ok(outcome)
  }

  async fn assignments_by_officer(
    &self,
    officer: &str,
    department: Option<&str>,
  ) -> Result<Vec<Assignment>> {
    let officer    = officer.to_owned();
    let department = department.map(str::to_owned);

    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.assignment_id, a.grievance_id, a.assigned_by, a.assigned_to,
                  a.assigned_at
             FROM assignments a
             JOIN grievances g ON g.grievance_id = a.grievance_id
            WHERE a.assigned_by = ?1
              AND (?2 IS NULL OR g.department_id = ?2)
            ORDER BY a.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![officer, department], RawAssignment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn list_history(&self, grievance_id: Uuid) -> Result<Vec<GrievanceHistory>> {
    let g_id_str = encode_uuid(grievance_id);

    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT history_id, grievance_id, status, updated_by, remarks, updated_at
             FROM grievance_history
            WHERE grievance_id = ?1
            ORDER BY updated_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![g_id_str], RawHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistory::into_history).collect()
  }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────

fn select_one(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawGrievance>> {
  conn
    .query_row(
      &format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances WHERE grievance_id = ?1"),
      rusqlite::params![id_str],
      RawGrievance::from_row,
    )
    .optional()
}

/// `true` if `worker` holds an active grievance other than `except`.
fn worker_busy(
  conn: &rusqlite::Connection,
  worker: &str,
  except: Option<&str>,
) -> rusqlite::Result<bool> {
  let [a, b] = active_params();
  conn.query_row(
    "SELECT EXISTS (
       SELECT 1 FROM grievances
        WHERE assigned_worker_id = ?1
          AND status IN (?2, ?3)
          AND grievance_id IS NOT ?4
     )",
    rusqlite::params![worker, a, b, except],
    |r| r.get(0),
  )
}

fn insert_history(
  conn: &rusqlite::Connection,
  grievance_id: &str,
  status: &str,
  updated_by: &str,
  remarks: Option<&str>,
  at: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO grievance_history
       (history_id, grievance_id, status, updated_by, remarks, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      grievance_id,
      status,
      updated_by,
      remarks,
      at
    ],
  )?;
  Ok(())
}

fn status_outcome_name(o: &StatusOutcome) -> &'static str {
  match o {
    StatusOutcome::Updated(_) => "updated",
    StatusOutcome::WorkerBusy(_) => "worker_busy",
    StatusOutcome::WrongStatus(_) => "wrong_status",
    StatusOutcome::GrievanceNotFound => "not_found",
  }
}

fn outcome_name(o: &AssignOutcome) -> &'static str {
  match o {
    AssignOutcome::Assigned { .. } => "assigned",
    AssignOutcome::WorkerBusy => "worker_busy",
    AssignOutcome::AlreadyAssigned => "already_assigned",
    AssignOutcome::GrievanceNotFound => "not_found",
  }
}
