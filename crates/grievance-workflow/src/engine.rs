//! [`WorkflowEngine`]: the grievance state machine.
//!
//! Every operation follows the same shape: load the grievance, evaluate the
//! authorization table for the caller, apply the change through one
//! conditional store write (which also appends the history row), then queue
//! an event. Only the event step may fail silently.
//!
//! A store call that outlives the I/O timeout is reported as
//! `ServiceUnavailable`. The write may still commit afterwards; when it does,
//! state and history commit together and only the event is lost.
//!
//! Status changes through [`WorkflowEngine::update_status`] are permissive:
//! any target status is accepted regardless of the current one. The one
//! exception is re-activating a case whose worker has since taken another
//! active case, which would break load exclusivity.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use grievance_core::{
  actor::Actor,
  assignment::{AssignOutcome, NewAssignment},
  collab::{DepartmentValidator, GrievanceEvent},
  grievance::{Grievance, GrievanceFilter, NewGrievance, Status},
  history::{GrievanceHistory, StatusChange, StatusOutcome},
  policy::{self, Operation, Scope, Target},
  store::GrievanceStore,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  AssignmentTracker, AuditTrail, EngineConfig, Error, EventEmitter, Result,
  error::bounded,
};

/// Current time at the precision the store persists.
pub(crate) fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

fn target(g: &Grievance) -> Target<'_> {
  Target {
    department_id: Some(g.department_id.as_str()),
    owner_id:      Some(g.citizen_id.as_str()),
  }
}

pub struct WorkflowEngine<S, V> {
  store:     Arc<S>,
  validator: V,
  audit:     AuditTrail<S>,
  tracker:   AssignmentTracker<S>,
  events:    EventEmitter,
  config:    EngineConfig,
}

impl<S, V> WorkflowEngine<S, V>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  pub fn new(
    store: Arc<S>,
    validator: V,
    events: EventEmitter,
    config: EngineConfig,
  ) -> Self {
    let timeout = config.io_timeout();
    Self {
      audit: AuditTrail::new(Arc::clone(&store), timeout),
      tracker: AssignmentTracker::new(Arc::clone(&store), timeout),
      store,
      validator,
      events,
      config,
    }
  }

  pub fn config(&self) -> &EngineConfig { &self.config }

  async fn load(&self, id: Uuid) -> Result<Grievance> {
    bounded(self.config.io_timeout(), "get grievance", self.store.get_grievance(id))
      .await?
      .ok_or_else(|| Error::NotFound(format!("grievance {id} not found")))
  }

  async fn transition(&self, change: StatusChange) -> Result<Grievance> {
    let grievance_id = change.grievance_id;
    let outcome = bounded(
      self.config.io_timeout(),
      "transition status",
      self.store.transition_status(change),
    )
    .await?;
    match outcome {
      StatusOutcome::Updated(g) => Ok(g),
      StatusOutcome::WorkerBusy(worker) => Err(worker_busy(&worker)),
      StatusOutcome::WrongStatus(current) => Err(not_reopenable(grievance_id, current)),
      StatusOutcome::GrievanceNotFound => {
        Err(Error::NotFound(format!("grievance {grievance_id} not found")))
      }
    }
  }

  async fn list(&self, filter: GrievanceFilter) -> Result<Vec<Grievance>> {
    bounded(
      self.config.io_timeout(),
      "list grievances",
      self.store.list_grievances(&filter),
    )
    .await
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  /// File a new grievance on behalf of `actor`, who becomes its owner.
  pub async fn create_grievance(
    &self,
    request: NewGrievance,
    actor: &Actor,
  ) -> Result<Grievance> {
    if actor.id.trim().is_empty() {
      return Err(Error::BadRequest("citizen id is required".into()));
    }
    policy::authorize(
      actor,
      Operation::Create,
      Target {
        department_id: Some(request.department_id.as_str()),
        owner_id:      Some(actor.id.as_str()),
      },
    )?;
    request.validate()?;

    let valid = match tokio::time::timeout(
      self.config.io_timeout(),
      self.validator.is_valid(
        &request.department_id,
        &request.category_code,
        &request.sub_category_code,
      ),
    )
    .await
    {
      Ok(Ok(valid)) => valid,
      Ok(Err(e)) => {
        warn!(error = %e, "department validator failed");
        return Err(Error::ServiceUnavailable(format!(
          "department validator: {e}"
        )));
      }
      Err(_) => {
        return Err(Error::ServiceUnavailable(
          "department validator timed out".into(),
        ));
      }
    };
    if !valid {
      return Err(Error::NotFound(format!(
        "department {}/{}/{} not found",
        request.department_id, request.category_code, request.sub_category_code
      )));
    }

    let grievance = Grievance::submit(request, actor.id.as_str(), now());
    bounded(
      self.config.io_timeout(),
      "insert grievance",
      self.store.insert_grievance(&grievance),
    )
    .await?;
    self.events.emit(GrievanceEvent::created(&grievance));

    info!(
      grievance_id = %grievance.grievance_id,
      citizen_id = %grievance.citizen_id,
      department_id = %grievance.department_id,
      "grievance submitted"
    );
    Ok(grievance)
  }

  /// Hand a grievance to a case worker.
  ///
  /// Fails `Conflict` if the worker already holds an active case, or if the
  /// grievance itself is already actively assigned, checked in that order.
  pub async fn assign_grievance(
    &self,
    grievance_id: Uuid,
    assigned_to: &str,
    actor: &Actor,
  ) -> Result<Grievance> {
    let current = self.load(grievance_id).await?;
    policy::authorize(actor, Operation::Assign, target(&current))?;
    if assigned_to.trim().is_empty() {
      return Err(Error::BadRequest("assigned_to is required".into()));
    }

    if self.tracker.is_loaded(assigned_to).await? {
      return Err(worker_busy(assigned_to));
    }
    if current.has_active_assignment() {
      return Err(already_assigned(grievance_id));
    }

    let outcome = self
      .tracker
      .assign(NewAssignment {
        grievance_id,
        assigned_by: actor.id.clone(),
        assigned_to: assigned_to.to_owned(),
        assigned_at: now(),
        remarks: Some(format!("Assigned to {assigned_to}")),
      })
      .await?;
    let grievance = match outcome {
      AssignOutcome::Assigned { grievance, .. } => grievance,
      AssignOutcome::WorkerBusy => return Err(worker_busy(assigned_to)),
      AssignOutcome::AlreadyAssigned => return Err(already_assigned(grievance_id)),
      AssignOutcome::GrievanceNotFound => {
        return Err(Error::NotFound(format!("grievance {grievance_id} not found")));
      }
    };

    self.events.emit(GrievanceEvent::assigned(&grievance, assigned_to));

    info!(%grievance_id, assigned_to, assigned_by = %actor.id, "grievance assigned");
    Ok(grievance)
  }

  /// Move a grievance to `new_status`. Any target status is accepted, except
  /// re-activating a case whose worker is busy elsewhere (`Conflict`).
  pub async fn update_status(
    &self,
    grievance_id: Uuid,
    new_status: Status,
    remarks: Option<String>,
    actor: &Actor,
  ) -> Result<Grievance> {
    let current = self.load(grievance_id).await?;
    policy::authorize(actor, Operation::UpdateStatus, target(&current))?;

    let grievance = self
      .transition(StatusChange {
        grievance_id,
        status: new_status,
        from: vec![],
        updated_by: actor.id.clone(),
        remarks,
        updated_at: now(),
      })
      .await?;
    self.events.emit(GrievanceEvent::status_updated(&grievance));

    info!(
      %grievance_id,
      from = %current.status,
      to = %new_status,
      updated_by = %actor.id,
      "grievance status updated"
    );
    Ok(grievance)
  }

  /// Escalate a grievance. A grievance that is already escalated is returned
  /// unchanged, with no history row and no event.
  pub async fn escalate_grievance(
    &self,
    grievance_id: Uuid,
    actor: &Actor,
  ) -> Result<Grievance> {
    self.escalate(grievance_id, actor).await.map(|(g, _)| g)
  }

  /// As [`Self::escalate_grievance`], also reporting whether this call made
  /// the transition.
  pub(crate) async fn escalate(
    &self,
    grievance_id: Uuid,
    actor: &Actor,
  ) -> Result<(Grievance, bool)> {
    let current = self.load(grievance_id).await?;
    policy::authorize(actor, Operation::Escalate, target(&current))?;
    if current.escalated {
      return Ok((current, false));
    }

    let marked = bounded(
      self.config.io_timeout(),
      "mark escalated",
      self.store.mark_escalated(grievance_id, &actor.id, now()),
    )
    .await?;
    let Some(grievance) = marked else {
      // Another caller escalated it between our read and write.
      return Ok((self.load(grievance_id).await?, false));
    };
    self.events.emit(GrievanceEvent::escalated(&grievance));

    warn!(%grievance_id, escalated_by = %actor.id, "grievance escalated");
    Ok((grievance, true))
  }

  /// Reopen a grievance the citizen is not satisfied with. Only `WORK_DONE`,
  /// `RESOLVED` and `CLOSED` grievances can be reopened.
  pub async fn reopen_grievance(
    &self,
    grievance_id: Uuid,
    remarks: Option<String>,
    actor: &Actor,
  ) -> Result<Grievance> {
    let current = self.load(grievance_id).await?;
    policy::authorize(actor, Operation::Reopen, target(&current))?;
    if !current.status.is_reopenable() {
      return Err(not_reopenable(grievance_id, current.status));
    }

    let grievance = self
      .transition(StatusChange {
        grievance_id,
        status: Status::Reopened,
        from: Status::REOPENABLE.to_vec(),
        updated_by: actor.id.clone(),
        remarks,
        updated_at: now(),
      })
      .await?;
    self.events.emit(GrievanceEvent::reopened(&grievance));

    info!(%grievance_id, reopened_by = %actor.id, "grievance reopened");
    Ok(grievance)
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  pub async fn get_grievance(
    &self,
    grievance_id: Uuid,
    actor: &Actor,
  ) -> Result<Grievance> {
    let grievance = self.load(grievance_id).await?;
    policy::authorize(actor, Operation::Read, target(&grievance))?;
    Ok(grievance)
  }

  /// Everything the caller's role can see.
  pub async fn get_all_for_role(&self, actor: &Actor) -> Result<Vec<Grievance>> {
    let scope = policy::list_scope(actor, Operation::ListAll)?;
    self.list(scoped(scope, GrievanceFilter::default())).await
  }

  pub async fn get_by_department(
    &self,
    department_id: &str,
    actor: &Actor,
  ) -> Result<Vec<Grievance>> {
    let scope = policy::list_scope(actor, Operation::ByDepartment)?;
    if let Scope::Department(own) = &scope
      && own != department_id
    {
      return Err(Error::Unauthorized("department mismatch".into()));
    }
    self
      .list(scoped(scope, GrievanceFilter {
        department_id: Some(department_id.to_owned()),
        ..Default::default()
      }))
      .await
  }

  pub async fn get_by_case_worker(
    &self,
    worker_id: &str,
    actor: &Actor,
  ) -> Result<Vec<Grievance>> {
    let scope = policy::list_scope(actor, Operation::ByCaseWorker)?;
    self
      .list(scoped(scope, GrievanceFilter {
        assigned_worker_id: Some(worker_id.to_owned()),
        ..Default::default()
      }))
      .await
  }

  pub async fn get_by_citizen(
    &self,
    citizen_id: &str,
    actor: &Actor,
  ) -> Result<Vec<Grievance>> {
    if citizen_id.trim().is_empty() {
      return Err(Error::BadRequest("citizen id is required".into()));
    }
    let scope = policy::list_scope(actor, Operation::ByCitizen)?;
    if let Scope::Owner(own) = &scope
      && own != citizen_id
    {
      return Err(Error::Unauthorized(format!(
        "actor {own} may only list their own grievances"
      )));
    }
    self
      .list(scoped(scope, GrievanceFilter {
        citizen_id: Some(citizen_id.to_owned()),
        ..Default::default()
      }))
      .await
  }

  /// The audit trail, oldest first. An empty trail is reported as `NotFound`:
  /// every grievance gets a row at creation, so none means the data is
  /// inconsistent.
  pub async fn get_status_history(
    &self,
    grievance_id: Uuid,
    actor: &Actor,
  ) -> Result<Vec<GrievanceHistory>> {
    let grievance = self.load(grievance_id).await?;
    policy::authorize(actor, Operation::Read, target(&grievance))?;

    let trail = self.audit.trail(grievance_id).await?;
    if trail.is_empty() {
      warn!(%grievance_id, "grievance has no history rows");
      return Err(Error::NotFound(format!(
        "no history for grievance {grievance_id}"
      )));
    }
    Ok(trail)
  }

  /// Distinct case workers `officer_id` has assigned to, first-seen order.
  /// A department officer only sees assignments of their own department's
  /// grievances.
  pub async fn get_case_workers_for_officer(
    &self,
    officer_id: &str,
    actor: &Actor,
  ) -> Result<Vec<String>> {
    let department = match policy::list_scope(actor, Operation::CaseWorkersForOfficer)? {
      Scope::All => None,
      Scope::Department(d) => Some(d),
      Scope::Owner(own) => {
        return Err(Error::Unauthorized(format!("actor {own} has no assignments")));
      }
    };
    self.tracker.case_workers_for(officer_id, department.as_deref()).await
  }

  // ── SLA ───────────────────────────────────────────────────────────────────

  /// Active, unescalated grievances assigned more than the SLA threshold
  /// before `now`.
  pub async fn find_sla_breaches(&self, now: DateTime<Utc>) -> Result<Vec<Grievance>> {
    let cutoff = now - self.config.sla_threshold();
    bounded(
      self.config.io_timeout(),
      "find sla breaches",
      self.store.find_sla_breaches(cutoff),
    )
    .await
  }
}

/// Narrow `filter` to what `scope` allows.
fn scoped(scope: Scope, mut filter: GrievanceFilter) -> GrievanceFilter {
  match scope {
    Scope::All => {}
    Scope::Department(d) => filter.department_id = Some(d),
    Scope::Owner(c) => filter.citizen_id = Some(c),
  }
  filter
}

fn worker_busy(worker: &str) -> Error {
  Error::Conflict(format!("case worker {worker} is busy with an active grievance"))
}

fn not_reopenable(grievance_id: Uuid, current: Status) -> Error {
  Error::Conflict(format!(
    "grievance {grievance_id} is {current} and cannot be reopened"
  ))
}

fn already_assigned(grievance_id: Uuid) -> Error {
  Error::Conflict(format!("grievance {grievance_id} is already assigned"))
}
