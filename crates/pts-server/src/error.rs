//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("forbidden")]
  Forbidden,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("configuration error: {0}")]
  Config(String),
  #[error("password hashing failed: {0}")]
  Hash(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<pts_core::Error> for Error {
  fn from(e: pts_core::Error) -> Self {
    use pts_core::Error as Core;
    match e {
      Core::AlreadyOpen { .. } | Core::AlreadyClosed(_) | Core::AlreadyDecided(_) => {
        Error::Conflict(e.to_string())
      }
      Core::EventNotFound(_) | Core::ApprovalNotFound(_) => Error::NotFound(e.to_string()),
      Core::InvalidSubject | Core::EmptyDetail(_) | Core::TooLong { .. } => {
        Error::BadRequest(e.to_string())
      }
      Core::PolicyMismatch => Error::Config(e.to_string()),
      Core::Persistence(inner) => Error::Store(inner),
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Config(_) | Error::Hash(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, Error::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"pts\""),
      );
    }
    res
  }
}
