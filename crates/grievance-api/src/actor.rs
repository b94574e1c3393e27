//! Caller identity extractor.
//!
//! Authentication happens upstream; the gateway forwards the verified claims
//! as headers:
//!
//! | Header | Required | Notes |
//! |--------|----------|-------|
//! | `x-actor-id` | yes | Caller id (citizen id, employee id) |
//! | `x-actor-role` | yes | One of the `Role` names, e.g. `CASE_WORKER` |
//! | `x-actor-department` | no | Department claim for scoped roles |

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use grievance_core::actor::{Actor, Role};

use crate::error::ApiError;

pub const ACTOR_ID: &str = "x-actor-id";
pub const ACTOR_ROLE: &str = "x-actor-role";
pub const ACTOR_DEPARTMENT: &str = "x-actor-department";

/// The verified caller of a request.
///
/// There is no header form of the system actor: every HTTP caller has a role.
#[derive(Debug, Clone)]
pub struct ActorContext(pub Actor);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
  match headers.get(name) {
    None => Ok(None),
    Some(v) => v
      .to_str()
      .map(|s| Some(s.trim()).filter(|s| !s.is_empty()))
      .map_err(|_| ApiError::BadRequest(format!("{name} is not valid UTF-8"))),
  }
}

/// Read the actor claims from `headers`.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
  let id = header(headers, ACTOR_ID)?
    .ok_or_else(|| ApiError::BadRequest(format!("{ACTOR_ID} header is required")))?;
  let role = header(headers, ACTOR_ROLE)?
    .ok_or_else(|| ApiError::BadRequest(format!("{ACTOR_ROLE} header is required")))?;
  let role = Role::parse(role)?;
  let department = header(headers, ACTOR_DEPARTMENT)?.map(str::to_owned);
  Ok(Actor::new(id, role, department))
}

impl<S> FromRequestParts<S> for ActorContext
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    actor_from_headers(&parts.headers).map(ActorContext)
  }
}
