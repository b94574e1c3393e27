//! Error type for `grievance-workflow`.

use std::{future::Future, time::Duration};

use grievance_core::policy::Denial;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("service unavailable: {0}")]
  ServiceUnavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<Denial> for Error {
  fn from(d: Denial) -> Self {
    match d {
      Denial::MissingDepartment(_) => Error::BadRequest(d.to_string()),
      _ => Error::Unauthorized(d.to_string()),
    }
  }
}

impl From<grievance_core::Error> for Error {
  fn from(e: grievance_core::Error) -> Self { Error::BadRequest(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Await a store call under `limit`; expiry becomes `ServiceUnavailable`.
pub(crate) async fn bounded<T, E, F>(
  limit: Duration,
  what: &'static str,
  fut: F,
) -> Result<T>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(Ok(v)) => Ok(v),
    Ok(Err(e)) => Err(Error::Store(Box::new(e))),
    Err(_) => {
      warn!(operation = what, ?limit, "store call timed out");
      Err(Error::ServiceUnavailable(format!("{what} timed out")))
    }
  }
}
