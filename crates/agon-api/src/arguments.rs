//! Handlers for argument endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/debates/{slug}/arguments` | `?side=` required; optional `page` (1-based) |
//! | `POST` | `/debates/{slug}/arguments` | Auth. Body: [`CreateBody`]; 201 + `{id}` |
//! | `GET`  | `/arguments/{id}` | 404 if not found |
//! | `GET`  | `/arguments/{id}/thread` | Root plus replies in pre-order |

use agon_core::{
  argument::{Argument, ArgumentInput, NewArgument, Side},
  evidence::parse_payload,
  store::{DebateStore, Page},
  thread::ThreadView,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub side: String,
  pub page: Option<u32>,
}

/// `GET /debates/{slug}/arguments?side=<side>[&page=<n>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Argument>>, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let side: Side = params.side.parse()?;
  let page = Page::new(params.page.unwrap_or(1));
  let arguments = state
    .store
    .list_root_arguments(&slug, side, page)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(arguments))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /debates/{slug}/arguments`.
///
/// `evidence` may be an array or a string holding an array; anything else
/// is treated as no evidence.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  #[serde(default)]
  pub side:      String,
  pub title:     Option<String>,
  #[serde(default)]
  pub body:      String,
  pub parent_id: Option<Uuid>,
  pub evidence:  Option<serde_json::Value>,
}

impl From<CreateBody> for ArgumentInput {
  fn from(b: CreateBody) -> Self {
    ArgumentInput {
      evidence:  parse_payload(b.evidence.as_ref()),
      side:      b.side,
      title:     b.title,
      body:      b.body,
      parent_id: b.parent_id,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub id: Uuid,
}

/// `POST /debates/{slug}/arguments`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(slug): Path<String>,
  Authenticated(principal): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  // A missing debate outranks field validation.
  state
    .store
    .get_debate(&slug)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| agon_core::Error::DebateNotFound(slug.clone()))?;

  let input = NewArgument::validate(
    ArgumentInput::from(body),
    Some(principal.user_id),
    &state.policy,
  )?;
  let argument = state
    .store
    .create_argument(&slug, input)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(
    debate = %slug,
    argument_id = %argument.argument_id,
    side = %argument.side,
    depth = argument.depth,
    "argument created"
  );
  Ok((StatusCode::CREATED, Json(Created { id: argument.argument_id })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /arguments/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Argument>, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let argument = state
    .store
    .get_argument(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(agon_core::Error::ArgumentNotFound(id))?;
  Ok(Json(argument))
}

// ─── Thread ───────────────────────────────────────────────────────────────────

/// `GET /arguments/{id}/thread`
pub async fn thread<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ThreadView>, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let view = state
    .store
    .get_thread(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(agon_core::Error::ArgumentNotFound(id))?;
  Ok(Json(view))
}
