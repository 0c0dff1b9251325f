//! The `DebateStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `agon-store-sqlite`).
//! Higher layers (`agon-api`, `agon-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Classify,
  argument::{Argument, NewArgument, Side},
  debate::{Debate, NewDebate},
  policy::Policy,
  thread::ThreadView,
  user::User,
  vote::{MyVote, VoteOutcome, VoteRequest},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Arguments shown per page in a side listing.
pub const PAGE_SIZE: u32 = 10;

/// A 1-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub number: u32,
  pub size:   u32,
}

impl Page {
  /// Page `number` of [`PAGE_SIZE`]; numbers below 1 clamp to 1.
  pub fn new(number: u32) -> Self {
    Self {
      number: number.max(1),
      size:   PAGE_SIZE,
    }
  }

  pub fn offset(&self) -> u64 { u64::from(self.number - 1) * u64::from(self.size) }
}

impl Default for Page {
  fn default() -> Self { Self::new(1) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an Agon document store backend.
///
/// Every mutating method is one atomic transaction: either all of its
/// writes land or none do. Counters and aggregates are only ever changed by
/// relative increments so concurrent writers from different users commute.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DebateStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user record for `email`, creating it if needed.
  fn ensure_user<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Resolve an identity-provider email to the internal user record.
  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Debates ───────────────────────────────────────────────────────────

  /// Persist a debate under the first free slug derived from
  /// `input.base_slug`.
  fn create_debate(
    &self,
    input: NewDebate,
  ) -> impl Future<Output = Result<Debate, Self::Error>> + Send + '_;

  /// Retrieve a debate by slug. Returns `None` if not found.
  fn get_debate<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Debate>, Self::Error>> + Send + 'a;

  // ── Arguments ─────────────────────────────────────────────────────────

  /// Insert an argument into the debate named by `debate_slug`.
  ///
  /// Roots increment the debate's side counter. Replies derive their thread
  /// position from the parent, which must belong to the same debate, and
  /// increment `reply_count` on the parent and (if different) the root.
  /// Both bump the debate's `last_activity_at`.
  fn create_argument<'a>(
    &'a self,
    debate_slug: &'a str,
    input: NewArgument,
  ) -> impl Future<Output = Result<Argument, Self::Error>> + Send + 'a;

  /// Retrieve an argument by id. Returns `None` if not found.
  fn get_argument(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Argument>, Self::Error>> + Send + '_;

  /// Depth-0 arguments of one side, newest first.
  fn list_root_arguments<'a>(
    &'a self,
    debate_slug: &'a str,
    side: Side,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Argument>, Self::Error>> + Send + 'a;

  /// The whole thread containing `argument_id`, replies in pre-order.
  /// Returns `None` if the argument does not exist.
  fn get_thread(
    &self,
    argument_id: Uuid,
  ) -> impl Future<Output = Result<Option<ThreadView>, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Apply a toggle vote and return the caller's new values together with
  /// the argument's post-update aggregate.
  fn submit_vote(
    &self,
    argument_id: Uuid,
    user_id: Uuid,
    request: VoteRequest,
    policy: Policy,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  /// The caller's current values on an argument; both absent if they have
  /// not voted.
  fn get_vote(
    &self,
    argument_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<MyVote, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_clamps_and_offsets() {
    assert_eq!(Page::new(0), Page::new(1));
    assert_eq!(Page::new(1).offset(), 0);
    assert_eq!(Page::new(3).offset(), 20);
  }
}
