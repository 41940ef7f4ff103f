//! [`SqliteStore`]: the SQLite implementation of [`PtsStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Transaction, TransactionBehavior};
use uuid::Uuid;

use pts_core::{
  account::{Account, NewAccount},
  approval::{ApprovalItem, Verdict},
  event::AttendanceEvent,
  message::Message,
  store::{ApprovalQuery, CloseEvent, EventQuery, OpenOutcome, PtsStore},
  subject::Subject,
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, APPROVAL_COLUMNS, EVENT_COLUMNS, MESSAGE_COLUMNS, RawAccount, RawApproval,
    RawEvent, RawMessage, encode_approval_state, encode_dt, encode_event_state, encode_role,
    encode_state_filter, encode_uuid,
  },
  schema::{DROP_SINGLE_OPEN_INDEX, DUPLICATE_OPEN_SUBJECTS, SCHEMA, SINGLE_OPEN_INDEX},
};

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
  /// Enforce "one open Terminal event per subject" with a partial unique
  /// index. Disable only when duplicate opens are deliberately permitted.
  pub single_open_index: bool,
}

impl Default for StoreOptions {
  fn default() -> Self { Self { single_open_index: true } }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A PTS store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Every call
/// runs on the connection's own thread, one at a time, and each write is a
/// single transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn:              tokio_rusqlite::Connection,
  single_open_index: bool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with default options.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with(path, StoreOptions::default()).await
  }

  pub async fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, single_open_index: options.single_open_index };
    store.init_schema(options).await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with(StoreOptions::default()).await
  }

  pub async fn open_in_memory_with(options: StoreOptions) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, single_open_index: options.single_open_index };
    store.init_schema(options).await?;
    Ok(store)
  }

  /// Apply the schema and create or drop the single-open index.
  ///
  /// A database written with the index dropped may hold several open
  /// Terminal events per subject; the index is then refused with
  /// [`Error::DuplicateOpenEvents`] instead of a bare constraint failure.
  async fn init_schema(&self, options: StoreOptions) -> Result<()> {
    let duplicates: Vec<String> = self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        if !options.single_open_index {
          conn.execute_batch(DROP_SINGLE_OPEN_INDEX)?;
          return Ok(Vec::new());
        }

        let duplicates = {
          let mut stmt = conn.prepare(DUPLICATE_OPEN_SUBJECTS)?;
          stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        if duplicates.is_empty() {
          conn.execute_batch(SINGLE_OPEN_INDEX)?;
        }
        Ok(duplicates)
      })
      .await?;

    if !duplicates.is_empty() {
      return Err(Error::DuplicateOpenEvents(duplicates));
    }
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn select_open_terminal(tx: &Transaction<'_>, subject: &str) -> rusqlite::Result<Option<RawEvent>> {
  tx.query_row(
    &format!(
      "SELECT {EVENT_COLUMNS} FROM attendance_events
       WHERE subject = ?1 AND kind = 'terminal' AND state = 'open'
       ORDER BY opened_at, rowid
       LIMIT 1"
    ),
    rusqlite::params![subject],
    RawEvent::from_row,
  )
  .optional()
}

fn select_event(conn: &rusqlite::Connection, event_id: &str) -> rusqlite::Result<Option<RawEvent>> {
  conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM attendance_events WHERE event_id = ?1"),
      rusqlite::params![event_id],
      RawEvent::from_row,
    )
    .optional()
}

fn select_approval(conn: &rusqlite::Connection, item_id: &str) -> rusqlite::Result<Option<RawApproval>> {
  conn
    .query_row(
      &format!("SELECT {APPROVAL_COLUMNS} FROM approval_items WHERE item_id = ?1"),
      rusqlite::params![item_id],
      RawApproval::from_row,
    )
    .optional()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── PtsStore impl ───────────────────────────────────────────────────────────

impl PtsStore for SqliteStore {
  type Error = crate::Error;

  fn enforces_single_open(&self) -> bool { self.single_open_index }

  // ── Attendance events ─────────────────────────────────────────────────────

  async fn open_event(&self, event: AttendanceEvent, exclusive: bool) -> Result<OpenOutcome> {
    let raw = RawEvent::from_event(&event);
    let check = exclusive && event.kind.is_terminal();

    let conflict: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if check
          && let Some(existing) = select_open_terminal(&tx, &raw.subject)?
        {
          return Ok(Some(existing));
        }

        let inserted = tx.execute(
          &format!(
            "INSERT INTO attendance_events ({EVENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
          ),
          rusqlite::params![
            raw.event_id,
            raw.subject,
            raw.kind,
            raw.note,
            raw.state,
            raw.admin_status,
            raw.opened_at,
            raw.closed_at,
            raw.needs_review,
          ],
        );

        match inserted {
          Ok(_) => {
            tx.commit()?;
            Ok(None)
          }
          // The partial unique index caught a second open Terminal event.
          Err(e) if is_unique_violation(&e) => match select_open_terminal(&tx, &raw.subject)? {
            Some(existing) => Ok(Some(existing)),
            None => Err(e.into()),
          },
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    match conflict {
      Some(existing) => Ok(OpenOutcome::AlreadyOpen(existing.into_event()?)),
      None => Ok(OpenOutcome::Opened(event)),
    }
  }

  async fn close_event(&self, close: CloseEvent) -> Result<Option<AttendanceEvent>> {
    let id_str           = encode_uuid(close.event_id);
    let (state, status)  = encode_event_state(&close.state);
    let closed_at_str    = close.closed_at.map(encode_dt);
    let note             = close.note;
    let needs_review     = close.needs_review;

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE attendance_events
              SET state        = ?2,
                  admin_status = ?3,
                  closed_at    = COALESCE(?4, closed_at),
                  note         = COALESCE(?5, note),
                  needs_review = ?6
            WHERE event_id = ?1 AND state = 'open'",
          rusqlite::params![id_str, state, status, closed_at_str, note, needs_review],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let row = select_event(&tx, &id_str)?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn get_event(&self, event_id: Uuid) -> Result<Option<AttendanceEvent>> {
    let id_str = encode_uuid(event_id);
    let raw = self.conn.call(move |conn| Ok(select_event(conn, &id_str)?)).await?;
    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self, query: &EventQuery) -> Result<Vec<AttendanceEvent>> {
    // Build WHERE clause dynamically; every bound value is a string.
    let mut conds: Vec<String> = vec![];
    let mut values: Vec<String> = vec![];
    if let Some(subject) = &query.subject {
      values.push(subject.as_str().to_owned());
      conds.push(format!("subject = ?{}", values.len()));
    }
    if let Some(state) = query.state {
      values.push(encode_state_filter(state).to_owned());
      conds.push(format!("state = ?{}", values.len()));
    }
    if let Some(kind) = &query.kind {
      values.push(kind.as_str().to_owned());
      conds.push(format!("kind = ?{}", values.len()));
    }

    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let direction = if query.newest_first { "DESC" } else { "ASC" };
    let limit = query.limit.map_or(-1, |l| l as i64);

    let sql = format!(
      "SELECT {EVENT_COLUMNS} FROM attendance_events
       {where_clause}
       ORDER BY opened_at {direction}, rowid {direction}
       LIMIT {limit}"
    );

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values.iter()), RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Approval items ────────────────────────────────────────────────────────

  async fn insert_approval(&self, item: ApprovalItem) -> Result<ApprovalItem> {
    let id_str      = encode_uuid(item.item_id);
    let subject     = item.subject.as_str().to_owned();
    let kind        = item.kind.as_str().to_owned();
    let detail      = item.detail.clone();
    let state       = encode_approval_state(item.state);
    let submitted   = encode_dt(item.submitted_at);
    let decided_at  = item.decided_at.map(encode_dt);
    let decided_by  = item.decided_by.as_ref().map(|s| s.as_str().to_owned());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO approval_items ({APPROVAL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![id_str, subject, kind, detail, state, submitted, decided_at, decided_by],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn decide_approval(&self, verdict: Verdict) -> Result<Option<ApprovalItem>> {
    let id_str     = encode_uuid(verdict.item_id);
    let state      = encode_approval_state(verdict.state);
    let decided_at = encode_dt(verdict.decided_at);
    let decided_by = verdict.decided_by.as_str().to_owned();

    let raw: Option<RawApproval> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE approval_items
              SET state = ?2, decided_at = ?3, decided_by = ?4
            WHERE item_id = ?1 AND state = 'pending'",
          rusqlite::params![id_str, state, decided_at, decided_by],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let row = select_approval(&tx, &id_str)?;
        tx.commit()?;
        Ok(row)
      })
      .await?;

    raw.map(RawApproval::into_item).transpose()
  }

  async fn get_approval(&self, item_id: Uuid) -> Result<Option<ApprovalItem>> {
    let id_str = encode_uuid(item_id);
    let raw = self.conn.call(move |conn| Ok(select_approval(conn, &id_str)?)).await?;
    raw.map(RawApproval::into_item).transpose()
  }

  async fn list_approvals(&self, query: &ApprovalQuery) -> Result<Vec<ApprovalItem>> {
    let subject = query.subject.as_ref().map(|s| s.as_str().to_owned());
    let state   = query.state.map(encode_approval_state);

    let raws: Vec<RawApproval> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {APPROVAL_COLUMNS} FROM approval_items
           WHERE (?1 IS NULL OR subject = ?1)
             AND (?2 IS NULL OR state = ?2)
           ORDER BY submitted_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject, state], RawApproval::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawApproval::into_item).collect()
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Option<Account>> {
    let account = Account {
      username:    input.username,
      full_name:   input.full_name,
      national_id: input.national_id,
      email:       input.email,
      role:        input.role,
      created_at:  Utc::now(),
    };

    let username    = account.username.as_str().to_owned();
    let hash        = input.password_hash;
    let full_name   = account.full_name.clone();
    let national_id = account.national_id.clone();
    let email       = account.email.clone();
    let role        = encode_role(account.role);
    let at_str      = encode_dt(account.created_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO accounts
             (username, password_hash, full_name, national_id, email, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (username) DO NOTHING",
          rusqlite::params![username, hash, full_name, national_id, email, role, at_str],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(account))
  }

  async fn get_credentials(&self, username: &Subject) -> Result<Option<(Account, String)>> {
    let username = username.as_str().to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1"),
              rusqlite::params![username],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn list_accounts(&self) -> Result<Vec<Account>> {
    let raws: Vec<RawAccount> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY username"))?;
        let rows = stmt
          .query_map([], RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|raw| raw.into_account().map(|(account, _)| account))
      .collect()
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn post_message(&self, message: Message) -> Result<Message> {
    let id_str  = encode_uuid(message.message_id);
    let sender  = message.sender.as_str().to_owned();
    let content = message.content.clone();
    let at_str  = encode_dt(message.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4)"),
          rusqlite::params![id_str, sender, content, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(message)
  }

  async fn list_messages(&self, limit: usize) -> Result<Vec<Message>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }
}
