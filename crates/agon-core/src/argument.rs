//! Arguments: the posts that make up a debate's threads.
//!
//! Every argument carries a materialised path (`ancestors`) plus its
//! `parent_id`, `root_id` and `depth`. These fields are written once at
//! creation and never touched again; tree shape is rebuilt on read by
//! [`crate::thread::reconstruct`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  evidence::{Evidence, NewEvidence, sanitize_all},
  policy::Policy,
  vote::VoteAggregate,
};

// ─── Side ────────────────────────────────────────────────────────────────────

/// Which side of the question an argument takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
  Affirmative,
  Opposing,
  Neutral,
}

impl Side {
  pub const ALL: [Side; 3] = [Self::Affirmative, Self::Opposing, Self::Neutral];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Affirmative => "affirmative",
      Self::Opposing => "opposing",
      Self::Neutral => "neutral",
    }
  }
}

impl fmt::Display for Side {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Side {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim() {
      "affirmative" => Ok(Self::Affirmative),
      "opposing" => Ok(Self::Opposing),
      "neutral" => Ok(Self::Neutral),
      other => Err(Error::InvalidSide(other.to_owned())),
    }
  }
}

// ─── Argument ────────────────────────────────────────────────────────────────

/// A persisted argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
  pub argument_id:    Uuid,
  pub debate_id:      Uuid,
  pub side:           Side,
  pub title:          Option<String>,
  pub body:           String,
  pub evidence:       Vec<Evidence>,
  pub author_id:      Option<Uuid>,
  /// Equals `ancestors.len()`; 0 for roots.
  pub depth:          u32,
  pub parent_id:      Option<Uuid>,
  /// `None` for roots, else the id of the top ancestor.
  pub root_id:        Option<Uuid>,
  /// Ancestor ids from the root down to the immediate parent.
  pub ancestors:      Vec<Uuid>,
  pub reply_count:    u64,
  pub vote_aggregate: VoteAggregate,
  pub created_at:     DateTime<Utc>,
}

impl Argument {
  pub fn is_root(&self) -> bool { self.parent_id.is_none() }

  /// The id every member of this argument's thread shares as `root_id`.
  pub fn thread_root_id(&self) -> Uuid {
    self.root_id.unwrap_or(self.argument_id)
  }

  pub fn has_evidence(&self) -> bool { !self.evidence.is_empty() }
}

// ─── Thread position ─────────────────────────────────────────────────────────

/// The ancestry fields of a new argument, derived from its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadPosition {
  pub parent_id: Option<Uuid>,
  pub root_id:   Option<Uuid>,
  pub ancestors: Vec<Uuid>,
  pub depth:     u32,
}

impl ThreadPosition {
  pub fn root() -> Self {
    Self {
      parent_id: None,
      root_id:   None,
      ancestors: Vec::new(),
      depth:     0,
    }
  }

  /// Position of a direct reply to `parent`.
  pub fn reply_to(parent: &Argument) -> Self {
    let mut ancestors = parent.ancestors.clone();
    ancestors.push(parent.argument_id);
    Self {
      parent_id: Some(parent.argument_id),
      root_id:   Some(parent.thread_root_id()),
      depth:     ancestors.len() as u32,
      ancestors,
    }
  }
}

// ─── Creation input ──────────────────────────────────────────────────────────

/// Raw argument fields as submitted by a client.
#[derive(Debug, Clone, Default)]
pub struct ArgumentInput {
  pub side:      String,
  pub title:     Option<String>,
  pub body:      String,
  pub evidence:  Vec<NewEvidence>,
  pub parent_id: Option<Uuid>,
}

/// A validated argument ready for [`crate::store::DebateStore::create_argument`].
///
/// Holds everything that can be checked without touching the store. Debate
/// existence and the parent's debate are checked inside the creation
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArgument {
  pub side:      Side,
  pub title:     Option<String>,
  pub body:      String,
  pub evidence:  Vec<Evidence>,
  pub parent_id: Option<Uuid>,
  pub author_id: Option<Uuid>,
}

impl NewArgument {
  pub fn validate(
    input: ArgumentInput,
    author_id: Option<Uuid>,
    policy: &Policy,
  ) -> Result<Self> {
    let side: Side = input.side.parse()?;

    let body = input.body.trim();
    if body.is_empty() {
      return Err(Error::EmptyBody);
    }

    let evidence = sanitize_all(input.evidence);
    if policy.require_evidence && evidence.is_empty() {
      return Err(Error::EvidenceRequired);
    }

    let title = input
      .title
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty());

    Ok(Self {
      side,
      title,
      body: body.to_owned(),
      evidence,
      parent_id: input.parent_id,
      author_id,
    })
  }
}
