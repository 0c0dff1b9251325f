//! Handlers for `/debates` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/debates` | Auth. Body: `{"question":"...","summary":"..."}`; 201 + `{id, slug}` |
//! | `GET`  | `/debates/{slug}` | 404 if not found |

use agon_core::{
  debate::{Debate, NewDebate},
  store::DebateStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub question: String,
  pub summary:  Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub id:   Uuid,
  pub slug: String,
}

/// `POST /debates`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(principal): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let input = NewDebate::new(
    &body.question,
    body.summary.as_deref(),
    Some(principal.user_id),
  )?;
  let debate = state
    .store
    .create_debate(input)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(slug = %debate.slug, author = %principal.email, "debate created");
  Ok((
    StatusCode::CREATED,
    Json(Created {
      id:   debate.debate_id,
      slug: debate.slug,
    }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /debates/{slug}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
) -> Result<Json<Debate>, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let debate = state
    .store
    .get_debate(&slug)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(agon_core::Error::DebateNotFound(slug))?;
  Ok(Json(debate))
}
