//! Handlers for `/arguments/{id}/vote`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/arguments/{id}/vote` | Auth. The caller's `{soundness, factuality}` |
//! | `POST` | `/arguments/{id}/vote` | Auth. Body: `{"soundness"?: 1\|-1\|null, "factuality"?: 1\|-1\|null}` |

use agon_core::{
  store::DebateStore,
  vote::{MyVote, VoteOutcome, VoteRequest},
};
use axum::{
  Json,
  extract::{Path, State},
};
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `GET /arguments/{id}/vote`
pub async fn get_mine<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Authenticated(principal): Authenticated,
) -> Result<Json<MyVote>, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let vote = state
    .store
    .get_vote(id, principal.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(vote))
}

/// `POST /arguments/{id}/vote`
///
/// Returns the caller's new values and the argument's post-update aggregate.
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Authenticated(principal): Authenticated,
  Json(body): Json<serde_json::Value>,
) -> Result<Json<VoteOutcome>, ApiError>
where
  S: DebateStore + Clone + 'static,
{
  let request = VoteRequest::from_json(&body)?;
  let outcome = state
    .store
    .submit_vote(id, principal.user_id, request, state.policy)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(
    argument_id = %id,
    voter = %principal.email,
    soundness = ?outcome.my_vote.soundness,
    factuality = ?outcome.my_vote.factuality,
    "vote recorded"
  );
  Ok(Json(outcome))
}
