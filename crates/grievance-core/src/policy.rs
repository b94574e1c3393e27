//! The authorization table.
//!
//! Every workflow operation looks up `(operation, role)` once in [`access`]
//! and then evaluates the resulting [`Access`] against either a concrete
//! record ([`authorize`]) or a list query ([`list_scope`]).
//!
//! The system actor (no role) is unrestricted for every operation.

use serde::Serialize;
use thiserror::Error;

use crate::actor::{Actor, Role};

/// The operations gated by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
  Create,
  Assign,
  UpdateStatus,
  Escalate,
  Reopen,
  /// Single-record read and status history.
  Read,
  ListAll,
  ByDepartment,
  ByCaseWorker,
  ByCitizen,
  CaseWorkersForOfficer,
}

/// What a role may do for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  Unrestricted,
  /// Only records whose department matches the actor's department claim.
  DepartmentScoped,
  /// Only records owned by the actor (citizen id equals actor id).
  OwnerScoped,
  Forbidden,
}

/// Look up the table.
pub fn access(op: Operation, role: Option<Role>) -> Access {
  use Access::*;
  use Operation::*;

  let Some(role) = role else {
    return Unrestricted;
  };

  match (op, role) {
    // Only citizens file grievances, whatever the staff role.
    (Create, Role::Citizen) => OwnerScoped,
    (Create, _) => Forbidden,

    (_, Role::Admin | Role::SupervisoryOfficer) => Unrestricted,

    (Reopen, Role::Citizen) => OwnerScoped,
    (Reopen, _) => Forbidden,

    (Assign | UpdateStatus, Role::Citizen) => Forbidden,
    (Assign | UpdateStatus, _) => DepartmentScoped,

    (Escalate, Role::DepartmentOfficer) => DepartmentScoped,
    (Escalate, _) => Forbidden,

    (Read | ListAll | ByCitizen, Role::Citizen) => OwnerScoped,
    (Read | ListAll | ByCitizen, _) => DepartmentScoped,

    (ByDepartment | ByCaseWorker, Role::Citizen) => Forbidden,
    (ByDepartment | ByCaseWorker, _) => DepartmentScoped,

    // Narrowed to assignments of grievances in the officer's department.
    (CaseWorkersForOfficer, Role::DepartmentOfficer) => DepartmentScoped,
    (CaseWorkersForOfficer, _) => Forbidden,
  }
}

/// Why an actor was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
  #[error("actor {actor} may not perform {op:?}")]
  Forbidden { actor: String, op: Operation },

  #[error("actor {0} has no department claim")]
  MissingDepartment(String),

  #[error("department mismatch")]
  WrongDepartment,

  #[error("actor {0} does not own this grievance")]
  NotOwner(String),
}

/// The facts about a record that the table is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
  pub department_id: Option<&'a str>,
  pub owner_id:      Option<&'a str>,
}

/// Evaluate the table for `actor` performing `op` on `target`.
pub fn authorize(
  actor: &Actor,
  op: Operation,
  target: Target<'_>,
) -> Result<(), Denial> {
  match access(op, actor.role) {
    Access::Unrestricted => Ok(()),
    Access::Forbidden => Err(forbidden(actor, op)),
    Access::DepartmentScoped => {
      let own = actor_department(actor)?;
      match target.department_id {
        Some(dept) if dept == own => Ok(()),
        _ => Err(Denial::WrongDepartment),
      }
    }
    Access::OwnerScoped => match target.owner_id {
      Some(owner) if owner == actor.id => Ok(()),
      _ => Err(Denial::NotOwner(actor.id.clone())),
    },
  }
}

/// How a list query must be narrowed for `actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
  All,
  Department(String),
  Owner(String),
}

/// Evaluate the table for a list query.
pub fn list_scope(actor: &Actor, op: Operation) -> Result<Scope, Denial> {
  match access(op, actor.role) {
    Access::Unrestricted => Ok(Scope::All),
    Access::Forbidden => Err(forbidden(actor, op)),
    Access::DepartmentScoped => {
      Ok(Scope::Department(actor_department(actor)?.to_owned()))
    }
    Access::OwnerScoped => Ok(Scope::Owner(actor.id.clone())),
  }
}

fn actor_department(actor: &Actor) -> Result<&str, Denial> {
  match actor.department_id.as_deref() {
    Some(d) if !d.trim().is_empty() => Ok(d),
    _ => Err(Denial::MissingDepartment(actor.id.clone())),
  }
}

fn forbidden(actor: &Actor, op: Operation) -> Denial {
  Denial::Forbidden { actor: actor.id.clone(), op }
}
