//! Handlers for `/grievances` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/grievances` | Body: [`NewGrievance`]; returns 201 + the stored grievance |
//! | `GET`  | `/grievances` | Everything the caller's role can see |
//! | `GET`  | `/grievances/{id}` | Single grievance |
//! | `POST` | `/grievances/{id}/assign` | Body: [`AssignBody`] |
//! | `POST` | `/grievances/{id}/status` | Body: [`StatusBody`] |
//! | `POST` | `/grievances/{id}/escalate` | No body; idempotent |
//! | `POST` | `/grievances/{id}/reopen` | Body: [`ReopenBody`] |
//! | `GET`  | `/grievances/{id}/history` | Audit trail, oldest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use grievance_core::{
  collab::DepartmentValidator,
  grievance::{Grievance, NewGrievance, Status},
  history::GrievanceHistory,
  store::GrievanceStore,
};
use grievance_workflow::WorkflowEngine;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::ActorContext, error::ApiError};

type Engine<S, V> = State<Arc<WorkflowEngine<S, V>>>;

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /grievances`: the caller becomes the owning citizen.
pub async fn create<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Json(body): Json<NewGrievance>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  let grievance = engine.create_grievance(body, &actor).await?;
  Ok((StatusCode::CREATED, Json(grievance)))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /grievances`
pub async fn list<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
) -> Result<Json<Vec<Grievance>>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_all_for_role(&actor).await?))
}

/// `GET /grievances/{id}`
pub async fn get_one<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(id): Path<Uuid>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_grievance(id, &actor).await?))
}

/// `GET /grievances/{id}/history`
pub async fn history<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<GrievanceHistory>>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.get_status_history(id, &actor).await?))
}

// ─── Assign ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub assigned_to: String,
}

/// `POST /grievances/{id}/assign`, body: `{"assigned_to":"..."}`.
pub async fn assign<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(id): Path<Uuid>,
  Json(body): Json<AssignBody>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.assign_grievance(id, &body.assigned_to, &actor).await?))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// Body for `POST /grievances/{id}/status`. `status` is a wire name such as
/// `IN_PROGRESS`; unknown names are a 400.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:  String,
  pub remarks: Option<String>,
}

/// `POST /grievances/{id}/status`
pub async fn update_status<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  let status = Status::parse(&body.status)?;
  Ok(Json(engine.update_status(id, status, body.remarks, &actor).await?))
}

// ─── Escalate / reopen ────────────────────────────────────────────────────────

/// `POST /grievances/{id}/escalate`
pub async fn escalate<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(id): Path<Uuid>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.escalate_grievance(id, &actor).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReopenBody {
  #[serde(default)]
  pub remarks: Option<String>,
}

/// `POST /grievances/{id}/reopen`, body: `{"remarks":"..."}` (remarks optional).
pub async fn reopen<S, V>(
  State(engine): Engine<S, V>,
  ActorContext(actor): ActorContext,
  Path(id): Path<Uuid>,
  Json(body): Json<ReopenBody>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  V: DepartmentValidator,
{
  Ok(Json(engine.reopen_grievance(id, body.remarks, &actor).await?))
}
