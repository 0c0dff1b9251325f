//! SQL schema for the Agon SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

-- Side counters count depth-0 arguments only and are changed exclusively
-- through `col = col + 1`.
CREATE TABLE IF NOT EXISTS debates (
    debate_id          TEXT PRIMARY KEY,
    slug               TEXT NOT NULL UNIQUE,
    question           TEXT NOT NULL,
    summary            TEXT,
    author_id          TEXT REFERENCES users(user_id),
    args_count_pro     INTEGER NOT NULL DEFAULT 0,
    args_count_con     INTEGER NOT NULL DEFAULT 0,
    args_count_neutral INTEGER NOT NULL DEFAULT 0,
    last_activity_at   TEXT NOT NULL,
    created_at         TEXT NOT NULL
);

-- Thread fields (parent_id, root_id, ancestors, depth) are written once.
CREATE TABLE IF NOT EXISTS arguments (
    argument_id       TEXT PRIMARY KEY,
    debate_id         TEXT NOT NULL REFERENCES debates(debate_id),
    side              TEXT NOT NULL
                      CHECK (side IN ('affirmative', 'opposing', 'neutral')),
    title             TEXT,
    body              TEXT NOT NULL,
    evidence          TEXT NOT NULL DEFAULT '[]',   -- JSON array of Evidence
    author_id         TEXT REFERENCES users(user_id),
    depth             INTEGER NOT NULL DEFAULT 0,
    parent_id         TEXT REFERENCES arguments(argument_id),
    root_id           TEXT REFERENCES arguments(argument_id),
    ancestors         TEXT NOT NULL DEFAULT '[]',   -- JSON array of UUIDs
    reply_count       INTEGER NOT NULL DEFAULT 0,
    soundness_sum     INTEGER NOT NULL DEFAULT 0,
    soundness_count   INTEGER NOT NULL DEFAULT 0,
    factuality_sum    INTEGER NOT NULL DEFAULT 0,
    factuality_count  INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,
    CHECK ((parent_id IS NULL) = (root_id IS NULL))
);

-- One record per (argument, user); a record with both dimensions NULL is
-- deleted instead of stored.
CREATE TABLE IF NOT EXISTS votes (
    vote_id      TEXT PRIMARY KEY,
    argument_id  TEXT NOT NULL REFERENCES arguments(argument_id),
    debate_id    TEXT NOT NULL REFERENCES debates(debate_id),
    user_id      TEXT NOT NULL REFERENCES users(user_id),
    soundness    INTEGER CHECK (soundness IN (-1, 1)),
    factuality   INTEGER CHECK (factuality IN (-1, 1)),
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (argument_id, user_id),
    CHECK  (soundness IS NOT NULL OR factuality IS NOT NULL)
);

CREATE INDEX IF NOT EXISTS arguments_listing_idx
    ON arguments(debate_id, side, depth, created_at);
CREATE INDEX IF NOT EXISTS arguments_root_idx   ON arguments(root_id, created_at);
CREATE INDEX IF NOT EXISTS arguments_parent_idx ON arguments(parent_id, created_at);
CREATE INDEX IF NOT EXISTS votes_user_idx       ON votes(user_id, created_at);

PRAGMA user_version = 1;
";
