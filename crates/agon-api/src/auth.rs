//! HTTP Basic-auth identity provider and the [`Authenticated`] extractor.

use agon_core::{store::DebateStore, user::Principal};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// One login accepted by this server instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
  pub email:         String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Credentials accepted as valid for this server instance.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
  pub accounts: Vec<Account>,
}

impl AuthConfig {
  pub fn new(accounts: Vec<Account>) -> Self { Self { accounts } }

  /// Verify `Authorization: Basic email:password` and return the email.
  pub fn verify(&self, headers: &HeaderMap) -> Result<String, ApiError> {
    let header_val = headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let encoded = header_val
      .strip_prefix("Basic ")
      .ok_or(ApiError::Unauthorized)?;

    let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
    let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

    let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

    let account = self
      .accounts
      .iter()
      .find(|a| a.email.eq_ignore_ascii_case(email))
      .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Argon2::default()
      .verify_password(password.as_bytes(), &parsed_hash)
      .map_err(|_| ApiError::Unauthorized)?;

    Ok(account.email.clone())
  }
}

/// The verified acting user. Present in a handler means the request was
/// authenticated and the user record exists.
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: DebateStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let email = state.auth.verify(&parts.headers)?;
    let user = state
      .store
      .get_user_by_email(&email)
      .await
      .map_err(ApiError::from_store)?
      .ok_or(agon_core::Error::UserNotFound(email))?;
    Ok(Authenticated(user.into()))
  }
}
