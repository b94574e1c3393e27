//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use grievance_workflow::Error as WorkflowError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request itself is malformed (headers, body fields).
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Workflow(#[from] WorkflowError),
}

impl From<grievance_core::Error> for ApiError {
  fn from(e: grievance_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Workflow(e) => match e {
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::Conflict(_) => StatusCode::CONFLICT,
        WorkflowError::Unauthorized(_) => StatusCode::FORBIDDEN,
        WorkflowError::BadRequest(_) => StatusCode::BAD_REQUEST,
        WorkflowError::ServiceUnavailable(_) | WorkflowError::Store(_) => {
          StatusCode::SERVICE_UNAVAILABLE
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if let ApiError::Workflow(WorkflowError::Store(e)) = &self {
      error!(error = %e, "store failure");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
