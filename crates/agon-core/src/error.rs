//! Error types for `agon-core`.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a failure, used by transport layers to pick a
/// response status without knowing the concrete backend error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Unauthorized,
  NotFound,
  InvalidInput,
  Forbidden,
  Internal,
}

/// Implemented by every store error type so callers can classify it.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("debate not found: {0}")]
  DebateNotFound(String),

  #[error("argument not found: {0}")]
  ArgumentNotFound(Uuid),

  #[error("parent argument not found: {0}")]
  ParentNotFound(Uuid),

  #[error("parent argument {parent} belongs to a different debate")]
  ParentInOtherDebate { parent: Uuid },

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("Question is needed")]
  EmptyQuestion,

  #[error("Body is required")]
  EmptyBody,

  #[error("Invalid side: {0:?}")]
  InvalidSide(String),

  #[error("Evidence is required")]
  EvidenceRequired,

  #[error("Invalid vote value: {0}")]
  InvalidVoteValue(String),

  #[error("No vote provided")]
  NoVoteProvided,

  #[error("Evidence is required to rate factuality")]
  FactualityRequiresEvidence,

  #[error("cannot vote on your own argument {0}")]
  SelfVote(Uuid),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::DebateNotFound(_)
      | Self::ArgumentNotFound(_)
      | Self::ParentNotFound(_)
      | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::ParentInOtherDebate { .. }
      | Self::EmptyQuestion
      | Self::EmptyBody
      | Self::InvalidSide(_)
      | Self::EvidenceRequired
      | Self::InvalidVoteValue(_)
      | Self::NoVoteProvided
      | Self::FactualityRequiresEvidence => ErrorKind::InvalidInput,
      Self::SelfVote(_) => ErrorKind::Forbidden,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
