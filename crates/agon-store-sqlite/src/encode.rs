//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order is chronological order. Evidence and ancestors are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use agon_core::{
  argument::{Argument, Side},
  debate::Debate,
  evidence::Evidence,
  user::User,
  vote::{DimensionAggregate, Vote, VoteAggregate, VoteValue},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Side ────────────────────────────────────────────────────────────────────

pub fn encode_side(side: Side) -> &'static str { side.as_str() }

pub fn decode_side(s: &str) -> Result<Side> {
  s.parse().map_err(|_| Error::Decode(format!("unknown side: {s:?}")))
}

/// Debate column holding the root-argument counter for `side`.
pub fn side_counter_column(side: Side) -> &'static str {
  match side {
    Side::Affirmative => "args_count_pro",
    Side::Opposing => "args_count_con",
    Side::Neutral => "args_count_neutral",
  }
}

// ─── Votes ──────────────────────────────────────────────────────────────────

pub fn encode_vote_value(v: Option<VoteValue>) -> Option<i64> {
  v.map(VoteValue::as_i64)
}

pub fn decode_vote_value(n: Option<i64>) -> Result<Option<VoteValue>> {
  n.map(|n| {
    VoteValue::from_i64(n).ok_or_else(|| Error::Decode(format!("vote value {n}")))
  })
  .transpose()
}

// ─── Counters ────────────────────────────────────────────────────────────────

fn decode_count(n: i64, column: &str) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative {column}: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub email:      String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      email:      row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const DEBATE_COLUMNS: &str = "debate_id, slug, question, summary, author_id,
  args_count_pro, args_count_con, args_count_neutral,
  last_activity_at, created_at";

/// Raw values read directly from a `debates` row.
pub struct RawDebate {
  pub debate_id:          String,
  pub slug:               String,
  pub question:           String,
  pub summary:            Option<String>,
  pub author_id:          Option<String>,
  pub args_count_pro:     i64,
  pub args_count_con:     i64,
  pub args_count_neutral: i64,
  pub last_activity_at:   String,
  pub created_at:         String,
}

impl RawDebate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      debate_id:          row.get(0)?,
      slug:               row.get(1)?,
      question:           row.get(2)?,
      summary:            row.get(3)?,
      author_id:          row.get(4)?,
      args_count_pro:     row.get(5)?,
      args_count_con:     row.get(6)?,
      args_count_neutral: row.get(7)?,
      last_activity_at:   row.get(8)?,
      created_at:         row.get(9)?,
    })
  }

  pub fn into_debate(self) -> Result<Debate> {
    Ok(Debate {
      debate_id:          decode_uuid(&self.debate_id)?,
      slug:               self.slug,
      question:           self.question,
      summary:            self.summary,
      author_id:          decode_opt_uuid(self.author_id)?,
      args_count_pro:     decode_count(self.args_count_pro, "args_count_pro")?,
      args_count_con:     decode_count(self.args_count_con, "args_count_con")?,
      args_count_neutral: decode_count(self.args_count_neutral, "args_count_neutral")?,
      last_activity_at:   decode_dt(&self.last_activity_at)?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

pub const ARGUMENT_COLUMNS: &str = "argument_id, debate_id, side, title, body,
  evidence, author_id, depth, parent_id, root_id, ancestors, reply_count,
  soundness_sum, soundness_count, factuality_sum, factuality_count, created_at";

/// Raw values read directly from an `arguments` row.
pub struct RawArgument {
  pub argument_id:      String,
  pub debate_id:        String,
  pub side:             String,
  pub title:            Option<String>,
  pub body:             String,
  pub evidence:         String,
  pub author_id:        Option<String>,
  pub depth:            i64,
  pub parent_id:        Option<String>,
  pub root_id:          Option<String>,
  pub ancestors:        String,
  pub reply_count:      i64,
  pub soundness_sum:    i64,
  pub soundness_count:  i64,
  pub factuality_sum:   i64,
  pub factuality_count: i64,
  pub created_at:       String,
}

impl RawArgument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      argument_id:      row.get(0)?,
      debate_id:        row.get(1)?,
      side:             row.get(2)?,
      title:            row.get(3)?,
      body:             row.get(4)?,
      evidence:         row.get(5)?,
      author_id:        row.get(6)?,
      depth:            row.get(7)?,
      parent_id:        row.get(8)?,
      root_id:          row.get(9)?,
      ancestors:        row.get(10)?,
      reply_count:      row.get(11)?,
      soundness_sum:    row.get(12)?,
      soundness_count:  row.get(13)?,
      factuality_sum:   row.get(14)?,
      factuality_count: row.get(15)?,
      created_at:       row.get(16)?,
    })
  }

  pub fn into_argument(self) -> Result<Argument> {
    let evidence: Vec<Evidence> = serde_json::from_str(&self.evidence)?;
    let ancestors: Vec<Uuid> = serde_json::from_str(&self.ancestors)?;
    let depth = u32::try_from(self.depth)
      .map_err(|_| Error::Decode(format!("depth {}", self.depth)))?;

    Ok(Argument {
      argument_id: decode_uuid(&self.argument_id)?,
      debate_id: decode_uuid(&self.debate_id)?,
      side: decode_side(&self.side)?,
      title: self.title,
      body: self.body,
      evidence,
      author_id: decode_opt_uuid(self.author_id)?,
      depth,
      parent_id: decode_opt_uuid(self.parent_id)?,
      root_id: decode_opt_uuid(self.root_id)?,
      ancestors,
      reply_count: decode_count(self.reply_count, "reply_count")?,
      vote_aggregate: VoteAggregate {
        soundness:  DimensionAggregate {
          sum:   self.soundness_sum,
          count: self.soundness_count,
        },
        factuality: DimensionAggregate {
          sum:   self.factuality_sum,
          count: self.factuality_count,
        },
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const VOTE_COLUMNS: &str = "vote_id, argument_id, debate_id, user_id,
  soundness, factuality, created_at, updated_at";

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:     String,
  pub argument_id: String,
  pub debate_id:   String,
  pub user_id:     String,
  pub soundness:   Option<i64>,
  pub factuality:  Option<i64>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:     row.get(0)?,
      argument_id: row.get(1)?,
      debate_id:   row.get(2)?,
      user_id:     row.get(3)?,
      soundness:   row.get(4)?,
      factuality:  row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:     decode_uuid(&self.vote_id)?,
      argument_id: decode_uuid(&self.argument_id)?,
      debate_id:   decode_uuid(&self.debate_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      soundness:   decode_vote_value(self.soundness)?,
      factuality:  decode_vote_value(self.factuality)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}
