//! Handlers for the per-party listing endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/departments/{id}/grievances` | Scoped roles may only name their own department |
//! | `GET` | `/case-workers/{id}/grievances` | Everything assigned to the worker |
//! | `GET` | `/citizens/{id}/grievances` | Citizens may only name themselves |
//! | `GET` | `/officers/{id}/case-workers` | Distinct workers, first-seen order |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use grievance_core::{
  collab::DepartmentValidator,
  grievance::Grievance,
  store::GrievanceStore,
};
use grievance_workflow::WorkflowEngine;

use crate::{actor::ActorContext, error::ApiError};

type Engine<S, V> = State<Arc<WorkflowEngine<S, V>>>;

/// `GET /departments/{id}/grievances`
pub async fn by_department<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(department_id): Path<String>,
) -> Result<Json<Vec<Grievance>>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_by_department(&department_id, &actor).await?))
}

/// `GET /case-workers/{id}/grievances`
pub async fn by_case_worker<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(worker_id): Path<String>,
) -> Result<Json<Vec<Grievance>>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_by_case_worker(&worker_id, &actor).await?))
}

/// `GET /citizens/{id}/grievances`
pub async fn by_citizen<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(citizen_id): Path<String>,
) -> Result<Json<Vec<Grievance>>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_by_citizen(&citizen_id, &actor).await?))
}

/// `GET /officers/{id}/case-workers`
pub async fn case_workers_for_officer<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(officer_id): Path<String>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_case_workers_for_officer(&officer_id, &actor).await?))
}
