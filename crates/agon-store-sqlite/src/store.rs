//! [`SqliteStore`], the SQLite implementation of [`DebateStore`].

use std::path::Path;

use agon_core::{
  argument::{Argument, NewArgument, Side, ThreadPosition},
  debate::{Debate, NewDebate, slug_candidate},
  policy::Policy,
  store::{DebateStore, Page},
  thread::{ThreadView, reconstruct},
  user::User,
  vote::{
    Dimension, DimensionAggregate, MyVote, RecordWrite, Vote, VoteAggregate, VoteDeltas,
    VoteOutcome, VoteRequest,
  },
};
use chrono::Utc;
use rusqlite::{
  Connection, OptionalExtension as _, Transaction, TransactionBehavior,
  types::Value,
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    ARGUMENT_COLUMNS, DEBATE_COLUMNS, RawArgument, RawDebate, RawUser, RawVote,
    USER_COLUMNS, VOTE_COLUMNS, encode_dt, encode_side, encode_uuid,
    encode_vote_value, side_counter_column,
  },
  schema::SCHEMA,
};

type CoreError = agon_core::Error;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agon debate store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements are executed on one background thread, and writes take the
/// database write lock up front (`BEGIN IMMEDIATE`), so a vote's read of the
/// previous value and its increments are never interleaved with another
/// writer.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside one immediate transaction. The transaction commits only
  /// if `f` returns `Ok`; any error rolls everything back.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(in_transaction(conn, f)))
      .await?
  }

  /// Number of stored vote records, for asserting record deletion.
  #[cfg(test)]
  pub(crate) async fn vote_record_count(&self) -> Result<i64> {
    self
      .read(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM votes", [], |r| r.get(0))?))
      .await
  }

  /// Run a point-in-time read outside any explicit transaction.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

fn in_transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
  F: FnOnce(&Transaction<'_>) -> Result<T>,
{
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  match f(&tx) {
    Ok(value) => {
      tx.commit()?;
      Ok(value)
    }
    Err(e) => {
      tracing::debug!(error = %e, "rolling back transaction");
      tx.rollback()?;
      Err(e)
    }
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn select_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
      rusqlite::params![email],
      RawUser::from_row,
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

fn select_debate_by_slug(conn: &Connection, slug: &str) -> Result<Option<Debate>> {
  conn
    .query_row(
      &format!("SELECT {DEBATE_COLUMNS} FROM debates WHERE slug = ?1"),
      rusqlite::params![slug],
      RawDebate::from_row,
    )
    .optional()?
    .map(RawDebate::into_debate)
    .transpose()
}

fn require_debate(conn: &Connection, slug: &str) -> Result<Debate> {
  select_debate_by_slug(conn, slug)?
    .ok_or_else(|| CoreError::DebateNotFound(slug.to_owned()).into())
}

fn slug_taken(conn: &Connection, slug: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM debates WHERE slug = ?1",
        rusqlite::params![slug],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn select_argument(conn: &Connection, id: Uuid) -> Result<Option<Argument>> {
  conn
    .query_row(
      &format!("SELECT {ARGUMENT_COLUMNS} FROM arguments WHERE argument_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawArgument::from_row,
    )
    .optional()?
    .map(RawArgument::into_argument)
    .transpose()
}

fn select_arguments(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> Result<Vec<Argument>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, RawArgument::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawArgument::into_argument).collect()
}

fn insert_argument(conn: &Connection, arg: &Argument) -> Result<()> {
  conn.execute(
    "INSERT INTO arguments (
       argument_id, debate_id, side, title, body, evidence, author_id,
       depth, parent_id, root_id, ancestors, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      encode_uuid(arg.argument_id),
      encode_uuid(arg.debate_id),
      encode_side(arg.side),
      arg.title,
      arg.body,
      serde_json::to_string(&arg.evidence)?,
      arg.author_id.map(encode_uuid),
      i64::from(arg.depth),
      arg.parent_id.map(encode_uuid),
      arg.root_id.map(encode_uuid),
      serde_json::to_string(&arg.ancestors)?,
      encode_dt(arg.created_at),
    ],
  )?;
  Ok(())
}

fn increment_reply_count(conn: &Connection, id: Uuid) -> Result<()> {
  conn.execute(
    "UPDATE arguments SET reply_count = reply_count + 1 WHERE argument_id = ?1",
    rusqlite::params![encode_uuid(id)],
  )?;
  Ok(())
}

fn select_vote(conn: &Connection, argument_id: Uuid, user_id: Uuid) -> Result<Option<Vote>> {
  conn
    .query_row(
      &format!(
        "SELECT {VOTE_COLUMNS} FROM votes WHERE argument_id = ?1 AND user_id = ?2"
      ),
      rusqlite::params![encode_uuid(argument_id), encode_uuid(user_id)],
      RawVote::from_row,
    )
    .optional()?
    .map(RawVote::into_vote)
    .transpose()
}

fn select_aggregate(conn: &Connection, argument_id: Uuid) -> Result<VoteAggregate> {
  let (ss, sc, fs, fc): (i64, i64, i64, i64) = conn.query_row(
    "SELECT soundness_sum, soundness_count, factuality_sum, factuality_count
     FROM arguments WHERE argument_id = ?1",
    rusqlite::params![encode_uuid(argument_id)],
    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
  )?;
  Ok(VoteAggregate {
    soundness:  DimensionAggregate { sum: ss, count: sc },
    factuality: DimensionAggregate { sum: fs, count: fc },
  })
}

/// Apply the non-zero components of `deltas` as relative increments in a
/// single UPDATE. Does nothing when every component is zero.
fn apply_deltas(conn: &Connection, argument_id: Uuid, deltas: VoteDeltas) -> Result<()> {
  let mut sets: Vec<String> = Vec::new();
  let mut values: Vec<Value> = Vec::new();

  for dim in Dimension::ALL {
    let delta = deltas.get(dim);
    for (suffix, amount) in [("sum", delta.sum), ("count", delta.count)] {
      if amount != 0 {
        let column = format!("{}_{suffix}", dim.as_str());
        values.push(Value::Integer(amount));
        sets.push(format!("{column} = {column} + ?{}", values.len()));
      }
    }
  }

  if sets.is_empty() {
    return Ok(());
  }

  values.push(Value::Text(encode_uuid(argument_id)));
  let sql = format!(
    "UPDATE arguments SET {} WHERE argument_id = ?{}",
    sets.join(", "),
    values.len()
  );
  conn.execute(&sql, rusqlite::params_from_iter(values))?;
  Ok(())
}

// ─── DebateStore impl ────────────────────────────────────────────────────────

impl DebateStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn ensure_user(&self, email: &str) -> Result<User> {
    let email = email.to_owned();
    self
      .transact(move |tx| {
        if let Some(user) = select_user_by_email(tx, &email)? {
          return Ok(user);
        }
        let user = User {
          user_id: Uuid::new_v4(),
          email,
          created_at: Utc::now(),
        };
        tx.execute(
          "INSERT INTO users (user_id, email, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![
            encode_uuid(user.user_id),
            user.email,
            encode_dt(user.created_at)
          ],
        )?;
        tracing::debug!(user_id = %user.user_id, "created user");
        Ok(user)
      })
      .await
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();
    self.read(move |conn| select_user_by_email(conn, &email)).await
  }

  // ── Debates ───────────────────────────────────────────────────────────────

  async fn create_debate(&self, input: NewDebate) -> Result<Debate> {
    self
      .transact(move |tx| {
        let mut attempt = 1;
        let slug = loop {
          let candidate = slug_candidate(&input.base_slug, attempt);
          if !slug_taken(tx, &candidate)? {
            break candidate;
          }
          attempt += 1;
        };

        let now = Utc::now();
        let debate = Debate {
          debate_id:          Uuid::new_v4(),
          slug,
          question:           input.question,
          summary:            input.summary,
          author_id:          input.author_id,
          args_count_pro:     0,
          args_count_con:     0,
          args_count_neutral: 0,
          last_activity_at:   now,
          created_at:         now,
        };

        tx.execute(
          "INSERT INTO debates (
             debate_id, slug, question, summary, author_id,
             last_activity_at, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(debate.debate_id),
            debate.slug,
            debate.question,
            debate.summary,
            debate.author_id.map(encode_uuid),
            encode_dt(debate.last_activity_at),
            encode_dt(debate.created_at),
          ],
        )?;
        tracing::debug!(slug = %debate.slug, "created debate");
        Ok(debate)
      })
      .await
  }

  async fn get_debate(&self, slug: &str) -> Result<Option<Debate>> {
    let slug = slug.to_owned();
    self.read(move |conn| select_debate_by_slug(conn, &slug)).await
  }

  // ── Arguments ─────────────────────────────────────────────────────────────

  async fn create_argument(&self, debate_slug: &str, input: NewArgument) -> Result<Argument> {
    let slug = debate_slug.to_owned();
    self
      .transact(move |tx| {
        let debate = require_debate(tx, &slug)?;

        let position = match input.parent_id {
          None => ThreadPosition::root(),
          Some(parent_id) => {
            let parent = select_argument(tx, parent_id)?
              .ok_or(CoreError::ParentNotFound(parent_id))?;
            if parent.debate_id != debate.debate_id {
              return Err(CoreError::ParentInOtherDebate { parent: parent_id }.into());
            }
            ThreadPosition::reply_to(&parent)
          }
        };

        let now = Utc::now();
        let argument = Argument {
          argument_id:    Uuid::new_v4(),
          debate_id:      debate.debate_id,
          side:           input.side,
          title:          input.title,
          body:           input.body,
          evidence:       input.evidence,
          author_id:      input.author_id,
          depth:          position.depth,
          parent_id:      position.parent_id,
          root_id:        position.root_id,
          ancestors:      position.ancestors,
          reply_count:    0,
          vote_aggregate: VoteAggregate::default(),
          created_at:     now,
        };
        insert_argument(tx, &argument)?;

        let debate_id = encode_uuid(debate.debate_id);
        let now_str = encode_dt(now);

        match (argument.parent_id, argument.root_id) {
          (Some(parent_id), Some(root_id)) => {
            increment_reply_count(tx, parent_id)?;
            if root_id != parent_id {
              increment_reply_count(tx, root_id)?;
            }
            tx.execute(
              "UPDATE debates SET last_activity_at = ?1 WHERE debate_id = ?2",
              rusqlite::params![now_str, debate_id],
            )?;
          }
          _ => {
            let column = side_counter_column(argument.side);
            tx.execute(
              &format!(
                "UPDATE debates SET {column} = {column} + 1, last_activity_at = ?1
                 WHERE debate_id = ?2"
              ),
              rusqlite::params![now_str, debate_id],
            )?;
          }
        }

        tracing::debug!(
          argument_id = %argument.argument_id,
          depth = argument.depth,
          "created argument"
        );
        Ok(argument)
      })
      .await
  }

  async fn get_argument(&self, id: Uuid) -> Result<Option<Argument>> {
    self.read(move |conn| select_argument(conn, id)).await
  }

  async fn list_root_arguments(
    &self,
    debate_slug: &str,
    side: Side,
    page: Page,
  ) -> Result<Vec<Argument>> {
    let slug = debate_slug.to_owned();
    self
      .read(move |conn| {
        let debate = require_debate(conn, &slug)?;
        select_arguments(
          conn,
          &format!(
            "SELECT {ARGUMENT_COLUMNS} FROM arguments
             WHERE debate_id = ?1 AND side = ?2 AND depth = 0
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4"
          ),
          rusqlite::params![
            encode_uuid(debate.debate_id),
            encode_side(side),
            i64::from(page.size),
            page.offset() as i64,
          ],
        )
      })
      .await
  }

  async fn get_thread(&self, argument_id: Uuid) -> Result<Option<ThreadView>> {
    self
      .read(move |conn| {
        let Some(node) = select_argument(conn, argument_id)? else {
          return Ok(None);
        };
        let root = if node.is_root() {
          node
        } else {
          match select_argument(conn, node.thread_root_id())? {
            Some(root) => root,
            None => return Ok(None),
          }
        };

        let members = select_arguments(
          conn,
          &format!(
            "SELECT {ARGUMENT_COLUMNS} FROM arguments
             WHERE root_id = ?1
             ORDER BY created_at ASC, rowid ASC"
          ),
          rusqlite::params![encode_uuid(root.argument_id)],
        )?;

        let replies = reconstruct(root.argument_id, members);
        Ok(Some(ThreadView { root, replies }))
      })
      .await
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn submit_vote(
    &self,
    argument_id: Uuid,
    user_id: Uuid,
    request: VoteRequest,
    policy: Policy,
  ) -> Result<VoteOutcome> {
    self
      .transact(move |tx| {
        let argument = select_argument(tx, argument_id)?
          .ok_or(CoreError::ArgumentNotFound(argument_id))?;

        if argument.author_id == Some(user_id) {
          return Err(CoreError::SelfVote(argument_id).into());
        }

        let existing = select_vote(tx, argument_id, user_id)?;
        let prev = existing.as_ref().map(Vote::values).unwrap_or_default();
        let transition = request.resolve(prev);

        if policy.factuality_requires_evidence
          && !argument.has_evidence()
          && transition.sets(Dimension::Factuality)
        {
          return Err(CoreError::FactualityRequiresEvidence.into());
        }

        let now = encode_dt(Utc::now());
        let next = transition.next;

        match (transition.record_write(existing.is_some()), &existing) {
          (RecordWrite::Insert, _) => {
            tx.execute(
              "INSERT INTO votes (
                 vote_id, argument_id, debate_id, user_id,
                 soundness, factuality, created_at, updated_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
              rusqlite::params![
                encode_uuid(Uuid::new_v4()),
                encode_uuid(argument_id),
                encode_uuid(argument.debate_id),
                encode_uuid(user_id),
                encode_vote_value(next.soundness),
                encode_vote_value(next.factuality),
                now,
              ],
            )?;
          }
          (RecordWrite::Update, Some(vote)) => {
            tx.execute(
              "UPDATE votes SET soundness = ?1, factuality = ?2, updated_at = ?3
               WHERE vote_id = ?4",
              rusqlite::params![
                encode_vote_value(next.soundness),
                encode_vote_value(next.factuality),
                now,
                encode_uuid(vote.vote_id),
              ],
            )?;
          }
          (RecordWrite::Delete, Some(vote)) => {
            tx.execute(
              "DELETE FROM votes WHERE vote_id = ?1",
              rusqlite::params![encode_uuid(vote.vote_id)],
            )?;
          }
          _ => {}
        }

        apply_deltas(tx, argument_id, transition.deltas)?;
        let vote_aggregate = select_aggregate(tx, argument_id)?;

        tracing::debug!(
          %argument_id,
          %user_id,
          soundness = ?next.soundness,
          factuality = ?next.factuality,
          "recorded vote"
        );
        Ok(VoteOutcome { my_vote: next, vote_aggregate })
      })
      .await
  }

  async fn get_vote(&self, argument_id: Uuid, user_id: Uuid) -> Result<MyVote> {
    self
      .read(move |conn| {
        if select_argument(conn, argument_id)?.is_none() {
          return Err(CoreError::ArgumentNotFound(argument_id).into());
        }
        Ok(
          select_vote(conn, argument_id, user_id)?
            .map(|v| v.values())
            .unwrap_or_default(),
        )
      })
      .await
  }
}
