//! Error types for `grievance-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown grievance status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("invalid description: {0}")]
  InvalidDescription(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
