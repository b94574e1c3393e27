//! Who is calling: roles and the per-call actor context.
//!
//! Identity itself is established upstream; the engine only receives the
//! claims (id, role, department) and evaluates them against
//! [`crate::policy`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Actor id recorded for system-initiated transitions (e.g. SLA escalation).
pub const SYSTEM_ACTOR: &str = "SYSTEM";

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
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Citizen,
  CaseWorker,
  DepartmentOfficer,
  SupervisoryOfficer,
  Admin,
}

impl Role {
  pub fn parse(s: &str) -> Result<Self> {
    Role::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }

  /// `CASE_WORKER` and `DEPARTMENT_OFFICER` only see their own department.
  pub fn is_department_scoped(self) -> bool {
    matches!(self, Role::CaseWorker | Role::DepartmentOfficer)
  }
}

/// The caller of a workflow operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:            String,
  /// `None` marks the system actor, which is unrestricted.
  pub role:          Option<Role>,
  pub department_id: Option<String>,
}

impl Actor {
  pub fn new(
    id: impl Into<String>,
    role: Role,
    department_id: Option<String>,
  ) -> Self {
    Self { id: id.into(), role: Some(role), department_id }
  }

  pub fn citizen(id: impl Into<String>) -> Self {
    Self::new(id, Role::Citizen, None)
  }

  pub fn system() -> Self {
    Self { id: SYSTEM_ACTOR.to_owned(), role: None, department_id: None }
  }

  pub fn is_system(&self) -> bool { self.role.is_none() }
}
