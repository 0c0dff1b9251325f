//! API error type and [`axum::response::IntoResponse`] implementation.

use agon_core::{Classify, ErrorKind};
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map any classified error (core or backend) onto a response category.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.kind() {
      ErrorKind::Unauthorized => Self::Unauthorized,
      ErrorKind::NotFound => Self::NotFound(e.to_string()),
      ErrorKind::InvalidInput => Self::BadRequest(e.to_string()),
      ErrorKind::Forbidden => Self::Forbidden(e.to_string()),
      ErrorKind::Internal => {
        tracing::warn!(error = %e, "store operation failed");
        Self::Store(Box::new(e))
      }
    }
  }
}

impl From<agon_core::Error> for ApiError {
  fn from(e: agon_core::Error) -> Self { Self::from_store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"agon\""),
      );
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (agon_core::Error::DebateNotFound("x".into()), StatusCode::NOT_FOUND),
      (agon_core::Error::EmptyBody, StatusCode::BAD_REQUEST),
      (agon_core::Error::NoVoteProvided, StatusCode::BAD_REQUEST),
      (agon_core::Error::SelfVote(uuid::Uuid::nil()), StatusCode::FORBIDDEN),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[test]
  fn unauthorized_carries_a_basic_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let challenge = res.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));
  }
}
