//! Debates, the questions that argument threads hang off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, argument::Side};

/// Slug used when a question contains no URL-safe characters at all.
pub const FALLBACK_SLUG: &str = "debate";

/// A debatable question together with its denormalised per-side counters.
///
/// The counters only ever count depth-0 arguments and are maintained by
/// atomic increments at argument-creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debate {
  pub debate_id:          Uuid,
  pub slug:               String,
  pub question:           String,
  pub summary:            Option<String>,
  /// Legacy debates may be un-attributed.
  pub author_id:          Option<Uuid>,
  pub args_count_pro:     u64,
  pub args_count_con:     u64,
  pub args_count_neutral: u64,
  pub last_activity_at:   DateTime<Utc>,
  pub created_at:         DateTime<Utc>,
}

impl Debate {
  /// The cached root-argument count for `side`.
  pub fn count_for(&self, side: Side) -> u64 {
    match side {
      Side::Affirmative => self.args_count_pro,
      Side::Opposing => self.args_count_con,
      Side::Neutral => self.args_count_neutral,
    }
  }
}

/// Input to [`crate::store::DebateStore::create_debate`], already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDebate {
  pub question:  String,
  pub summary:   Option<String>,
  pub author_id: Option<Uuid>,
  /// Base slug; the store appends `-2`, `-3`, … on collision.
  pub base_slug: String,
}

impl NewDebate {
  pub fn new(
    question: &str,
    summary: Option<&str>,
    author_id: Option<Uuid>,
  ) -> Result<Self> {
    let question = question.trim();
    if question.is_empty() {
      return Err(Error::EmptyQuestion);
    }
    let summary = summary
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned);

    Ok(Self {
      question: question.to_owned(),
      summary,
      author_id,
      base_slug: slugify(question),
    })
  }
}

/// Lowercase `input` and collapse every run of characters outside
/// `[a-z0-9]` into a single `-`, without leading or trailing dashes.
pub fn slugify(input: &str) -> String {
  let mut slug = String::with_capacity(input.len());
  let mut pending_dash = false;

  for c in input.trim().chars().flat_map(char::to_lowercase) {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c);
    } else {
      pending_dash = true;
    }
  }

  if slug.is_empty() {
    FALLBACK_SLUG.to_owned()
  } else {
    slug
  }
}

/// The `attempt`-th candidate for `base`: `base`, then `base-2`, `base-3`, …
pub fn slug_candidate(base: &str, attempt: u32) -> String {
  if attempt <= 1 {
    base.to_owned()
  } else {
    format!("{base}-{attempt}")
  }
}
