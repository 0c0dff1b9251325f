//! JSON REST API for Agon.
//!
//! Exposes an axum [`Router`] backed by any [`agon_core::store::DebateStore`].
//! Mutating routes and the caller's own vote require HTTP Basic credentials
//! matching a configured [`auth::Account`]; TLS is the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", agon_api::router(state))
//! ```

pub mod arguments;
pub mod auth;
pub mod debates;
pub mod error;
pub mod votes;

use std::sync::Arc;

use agon_core::{policy::Policy, store::DebateStore};
use axum::{
  Router,
  routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use auth::AuthConfig;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: DebateStore> {
  pub store:  Arc<S>,
  pub auth:   Arc<AuthConfig>,
  pub policy: Policy,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: DebateStore + Clone + 'static,
{
  Router::new()
    // Debates
    .route("/debates", post(debates::create::<S>))
    .route("/debates/{slug}", get(debates::get_one::<S>))
    .route(
      "/debates/{slug}/arguments",
      get(arguments::list::<S>).post(arguments::create::<S>),
    )
    // Arguments
    .route("/arguments/{id}", get(arguments::get_one::<S>))
    .route("/arguments/{id}/thread", get(arguments::thread::<S>))
    // Votes
    .route(
      "/arguments/{id}/vote",
      get(votes::get_mine::<S>).post(votes::submit::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;

  use agon_store_sqlite::SqliteStore;
  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use crate::auth::Account;

  const ALICE: &str = "alice@example.org";
  const BOB: &str = "bob@example.org";
  const PASSWORD: &str = "secret";

  async fn make_state(policy: Policy) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(PASSWORD.as_bytes(), &salt)
      .unwrap()
      .to_string();

    let mut accounts = Vec::new();
    for email in [ALICE, BOB] {
      store.ensure_user(email).await.unwrap();
      accounts.push(Account {
        email:         email.to_string(),
        password_hash: hash.clone(),
      });
    }

    AppState {
      store: Arc::new(store),
      auth: Arc::new(AuthConfig::new(accounts)),
      policy,
    }
  }

  fn auth_header(user: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{PASSWORD}")))
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    user:   Option<&str>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
      builder = builder.header(header::AUTHORIZATION, auth_header(user));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn new_debate(state: &AppState<SqliteStore>, question: &str) -> String {
    let resp = send(state, "POST", "/debates", Some(ALICE), Some(json!({ "question": question }))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["slug"].as_str().unwrap().to_owned()
  }

  async fn new_argument(
    state: &AppState<SqliteStore>,
    slug:  &str,
    body:  Value,
  ) -> Response {
    send(state, "POST", &format!("/debates/{slug}/arguments"), Some(ALICE), Some(body)).await
  }

  fn sourced(side: &str) -> Value {
    json!({
      "side": side,
      "body": "Because of the study.",
      "evidence": [{ "url": "https://example.org/study", "evidenceType": "Study" }],
    })
  }

  async fn argument_id(resp: Response) -> String {
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["id"].as_str().unwrap().to_owned()
  }

  // ── Auth ─────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn creating_a_debate_requires_credentials() {
    let state = make_state(Policy::default()).await;
    let resp = send(&state, "POST", "/debates", None, Some(json!({ "question": "Q?" }))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_password_is_unauthorized() {
    let state = make_state(Policy::default()).await;
    let bad = format!("Basic {}", B64.encode(format!("{ALICE}:nope")));
    let req = Request::builder()
      .method("POST")
      .uri("/debates")
      .header(header::AUTHORIZATION, bad)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"question":"Q?"}"#))
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Debates ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn debate_round_trip_and_missing_slug() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Should we abolish homework?").await;
    assert_eq!(slug, "should-we-abolish-homework");

    let resp = send(&state, "GET", &format!("/debates/{slug}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let debate = json_body(resp).await;
    assert_eq!(debate["question"], "Should we abolish homework?");
    assert_eq!(debate["argsCountPro"], 0);

    let resp = send(&state, "GET", "/debates/nope", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn empty_question_is_rejected() {
    let state = make_state(Policy::default()).await;
    let resp = send(&state, "POST", "/debates", Some(ALICE), Some(json!({ "question": "  " }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "Question is needed");
  }

  // ── Arguments ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn argument_with_string_encoded_evidence() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Evidence").await;

    let raw = json!([{ "title": "  A paper ", "quote": "" }, { "locator": "p. 4" }]).to_string();
    let id = argument_id(
      new_argument(&state, &slug, json!({ "side": "opposing", "body": " x ", "evidence": raw })).await,
    )
    .await;

    let resp = send(&state, "GET", &format!("/arguments/{id}"), None, None).await;
    let arg = json_body(resp).await;
    assert_eq!(arg["body"], "x");
    let evidence = arg["evidence"].as_array().unwrap();
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0]["title"], "A paper");
    assert_eq!(evidence[0]["evidenceType"], "other");

    let resp = send(&state, "GET", &format!("/debates/{slug}"), None, None).await;
    assert_eq!(json_body(resp).await["argsCountCon"], 1);
  }

  #[tokio::test]
  async fn argument_validation_messages() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Validation").await;

    let resp = new_argument(&state, &slug, json!({ "side": "sideways", "body": "x" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = new_argument(&state, &slug, json!({ "side": "neutral", "body": "  " })).await;
    assert_eq!(json_body(resp).await["error"], "Body is required");

    let resp = new_argument(&state, &slug, json!({ "side": "neutral", "body": "x", "evidence": "{oops" })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "Evidence is required");

    let resp = new_argument(&state, "missing", sourced("neutral")).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn missing_debate_is_reported_before_invalid_fields() {
    let state = make_state(Policy::default()).await;
    let resp = new_argument(&state, "missing", json!({ "side": "neutral", "body": "x" })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = new_argument(&state, "missing", json!({ "side": "sideways", "body": "" })).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn listing_and_thread_views() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Threads").await;

    let root = argument_id(new_argument(&state, &slug, sourced("affirmative")).await).await;
    let mut reply = sourced("opposing");
    reply["parentId"] = json!(root);
    let child = argument_id(new_argument(&state, &slug, reply).await).await;

    let resp = send(&state, "GET", &format!("/debates/{slug}/arguments?side=affirmative"), None, None).await;
    let listed = json_body(resp).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["replyCount"], 1);

    let resp = send(&state, "GET", &format!("/debates/{slug}/arguments?side=opposing&page=1"), None, None).await;
    assert!(json_body(resp).await.as_array().unwrap().is_empty());

    let resp = send(&state, "GET", &format!("/arguments/{child}/thread"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await;
    assert_eq!(view["root"]["argumentId"], json!(root));
    assert_eq!(view["replies"][0]["argumentId"], json!(child));
    assert_eq!(view["replies"][0]["depth"], 1);
  }

  // ── Votes ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn vote_toggle_over_http() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Votes").await;
    let id = argument_id(new_argument(&state, &slug, sourced("neutral")).await).await;
    let uri = format!("/arguments/{id}/vote");

    let resp = send(&state, "POST", &uri, Some(BOB), Some(json!({ "soundness": 1, "factuality": -1 }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let out = json_body(resp).await;
    assert_eq!(out["myVote"], json!({ "soundness": 1, "factuality": -1 }));
    assert_eq!(out["voteAggregate"]["soundness"], json!({ "sum": 1, "count": 1 }));
    assert_eq!(out["voteAggregate"]["factuality"], json!({ "sum": -1, "count": 1 }));

    let resp = send(&state, "POST", &uri, Some(BOB), Some(json!({ "soundness": 1 }))).await;
    let out = json_body(resp).await;
    assert_eq!(out["myVote"], json!({ "soundness": null, "factuality": -1 }));
    assert_eq!(out["voteAggregate"]["soundness"], json!({ "sum": 0, "count": 0 }));

    let resp = send(&state, "GET", &uri, Some(BOB), None).await;
    assert_eq!(json_body(resp).await, json!({ "soundness": null, "factuality": -1 }));

    let resp = send(&state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn invalid_vote_bodies_are_rejected() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Bad votes").await;
    let id = argument_id(new_argument(&state, &slug, sourced("neutral")).await).await;
    let uri = format!("/arguments/{id}/vote");

    let resp = send(&state, "POST", &uri, Some(BOB), Some(json!({ "soundness": 2 }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&state, "POST", &uri, Some(BOB), Some(json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "No vote provided");
  }

  #[tokio::test]
  async fn authors_are_forbidden_from_voting_on_their_own_argument() {
    let state = make_state(Policy::default()).await;
    let slug = new_debate(&state, "Self").await;
    let id = argument_id(new_argument(&state, &slug, sourced("neutral")).await).await;

    let resp = send(&state, "POST", &format!("/arguments/{id}/vote"), Some(ALICE), Some(json!({ "soundness": 1 }))).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn factuality_gating_follows_policy() {
    let mut policy = Policy::permissive();
    policy.factuality_requires_evidence = true;
    let state = make_state(policy).await;
    let slug = new_debate(&state, "Gating").await;
    let id = argument_id(
      new_argument(&state, &slug, json!({ "side": "affirmative", "body": "Trust me." })).await,
    )
    .await;
    let uri = format!("/arguments/{id}/vote");

    let resp = send(&state, "POST", &uri, Some(BOB), Some(json!({ "factuality": 1 }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "Evidence is required to rate factuality");

    let resp = send(&state, "POST", &uri, Some(BOB), Some(json!({ "factuality": null, "soundness": -1 }))).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
