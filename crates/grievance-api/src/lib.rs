//! JSON REST API for the grievance workflow.
//!
//! Exposes an axum [`Router`] backed by a [`WorkflowEngine`]. Caller identity
//! arrives as headers (see [`actor`]); TLS and authentication are the
//! gateway's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", grievance_api::api_router(engine.clone()))
//! ```

pub mod actor;
pub mod error;
pub mod grievances;
pub mod queries;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use grievance_core::{collab::DepartmentValidator, store::GrievanceStore};
use grievance_workflow::WorkflowEngine;

pub use actor::ActorContext;
pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, V>(engine: Arc<WorkflowEngine<S, V>>) -> Router<()>
where
  S: GrievanceStore + 'static,
  V: DepartmentValidator + 'static,
{
  Router::new()
    // Grievances
    .route(
      "/grievances",
      get(grievances::list::<S, V>).post(grievances::create::<S, V>),
    )
    .route("/grievances/{id}", get(grievances::get_one::<S, V>))
    .route("/grievances/{id}/assign", post(grievances::assign::<S, V>))
    .route("/grievances/{id}/status", post(grievances::update_status::<S, V>))
    .route("/grievances/{id}/escalate", post(grievances::escalate::<S, V>))
    .route("/grievances/{id}/reopen", post(grievances::reopen::<S, V>))
    .route("/grievances/{id}/history", get(grievances::history::<S, V>))
    // Listings
    .route(
      "/departments/{id}/grievances",
      get(queries::by_department::<S, V>),
    )
    .route(
      "/case-workers/{id}/grievances",
      get(queries::by_case_worker::<S, V>),
    )
    .route("/citizens/{id}/grievances", get(queries::by_citizen::<S, V>))
    .route(
      "/officers/{id}/case-workers",
      get(queries::case_workers_for_officer::<S, V>),
    )
    .with_state(engine)
}
