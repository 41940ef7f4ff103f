//! SQL schema for the PTS SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    username      TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    full_name     TEXT,
    national_id   TEXT,            -- T.C. kimlik no
    email         TEXT,
    role          TEXT NOT NULL DEFAULT 'personnel',   -- 'personnel' | 'admin'
    created_at    TEXT NOT NULL
);

-- One row per presence interval. Rows are updated at most once, from
-- state 'open' to a closed state, and never deleted.
CREATE TABLE IF NOT EXISTS attendance_events (
    event_id     TEXT PRIMARY KEY,
    subject      TEXT NOT NULL,
    kind         TEXT NOT NULL,   -- 'terminal' or a free-form label
    note         TEXT NOT NULL DEFAULT '',
    state        TEXT NOT NULL,   -- 'open' | 'closed' | 'force_closed'
    admin_status TEXT,            -- set iff state = 'force_closed'
    opened_at    TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    closed_at    TEXT,
    needs_review INTEGER NOT NULL DEFAULT 0,
    CHECK (state IN ('open', 'closed', 'force_closed')),
    CHECK ((state = 'force_closed') = (admin_status IS NOT NULL)),
    CHECK (closed_at IS NULL OR closed_at >= opened_at)
);

-- Leave / advance requests and report submissions.
CREATE TABLE IF NOT EXISTS approval_items (
    item_id      TEXT PRIMARY KEY,
    subject      TEXT NOT NULL,
    kind         TEXT NOT NULL,
    detail       TEXT NOT NULL,
    state        TEXT NOT NULL DEFAULT 'pending',   -- 'pending' | 'approved' | 'rejected'
    submitted_at TEXT NOT NULL,
    decided_at   TEXT,
    decided_by   TEXT,
    CHECK (state IN ('pending', 'approved', 'rejected')),
    CHECK ((state = 'pending') = (decided_at IS NULL))
);

-- Internal message feed.
CREATE TABLE IF NOT EXISTS messages (
    message_id TEXT PRIMARY KEY,
    sender     TEXT NOT NULL,
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS events_subject_idx   ON attendance_events(subject, state);
CREATE INDEX IF NOT EXISTS events_opened_idx    ON attendance_events(opened_at);
CREATE INDEX IF NOT EXISTS approvals_subject_idx ON approval_items(subject);
CREATE INDEX IF NOT EXISTS messages_created_idx  ON messages(created_at);

PRAGMA user_version = 1;
";

/// Subjects with more than one open Terminal event; these block
/// [`SINGLE_OPEN_INDEX`].
pub const DUPLICATE_OPEN_SUBJECTS: &str = "
SELECT subject FROM attendance_events
 WHERE kind = 'terminal' AND state = 'open'
 GROUP BY subject
HAVING COUNT(*) > 1
 ORDER BY subject;
";

/// At most one open Terminal event per subject.
pub const SINGLE_OPEN_INDEX: &str = "
CREATE UNIQUE INDEX IF NOT EXISTS events_one_open_terminal
    ON attendance_events(subject)
    WHERE kind = 'terminal' AND state = 'open';
";

/// Removes [`SINGLE_OPEN_INDEX`] for stores that permit duplicate opens.
pub const DROP_SINGLE_OPEN_INDEX: &str =
  "DROP INDEX IF EXISTS events_one_open_terminal;";
