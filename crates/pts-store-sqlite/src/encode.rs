//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with a fixed microsecond width so
//! that lexical order matches chronological order. UUIDs are hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use pts_core::{
  account::{Account, Role},
  approval::{ApprovalItem, ApprovalKind, ApprovalState},
  event::{AttendanceEvent, EventKind, EventState, StateFilter},
  message::Message,
  subject::Subject,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Event state ──────────────────────────────────────────────────────────────

/// Split an [`EventState`] into its `(state, admin_status)` columns.
pub fn encode_event_state(state: &EventState) -> (&'static str, Option<String>) {
  match state {
    EventState::Open => ("open", None),
    EventState::Closed => ("closed", None),
    EventState::ForceClosed { status } => ("force_closed", Some(status.clone())),
  }
}

pub fn encode_state_filter(f: StateFilter) -> &'static str {
  match f {
    StateFilter::Open => "open",
    StateFilter::Closed => "closed",
    StateFilter::ForceClosed => "force_closed",
  }
}

pub fn decode_event_state(state: &str, admin_status: Option<String>) -> Result<EventState> {
  match (state, admin_status) {
    ("open", _) => Ok(EventState::Open),
    ("closed", _) => Ok(EventState::Closed),
    ("force_closed", Some(status)) => Ok(EventState::ForceClosed { status }),
    (other, _) => Err(Error::Decode { column: "state", value: other.to_owned() }),
  }
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Personnel => "personnel",
    Role::Admin => "admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "personnel" => Ok(Role::Personnel),
    "admin" => Ok(Role::Admin),
    other => Err(Error::Decode { column: "role", value: other.to_owned() }),
  }
}

// ─── Approval state ───────────────────────────────────────────────────────────

pub fn encode_approval_state(s: ApprovalState) -> &'static str {
  match s {
    ApprovalState::Pending => "pending",
    ApprovalState::Approved => "approved",
    ApprovalState::Rejected => "rejected",
  }
}

pub fn decode_approval_state(s: &str) -> Result<ApprovalState> {
  match s {
    "pending" => Ok(ApprovalState::Pending),
    "approved" => Ok(ApprovalState::Approved),
    "rejected" => Ok(ApprovalState::Rejected),
    other => Err(Error::Decode { column: "approval state", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEvent::from_row`].
pub const EVENT_COLUMNS: &str =
  "event_id, subject, kind, note, state, admin_status, opened_at, closed_at, needs_review";

/// Raw values read directly from an `attendance_events` row.
pub struct RawEvent {
  pub event_id:     String,
  pub subject:      String,
  pub kind:         String,
  pub note:         String,
  pub state:        String,
  pub admin_status: Option<String>,
  pub opened_at:    String,
  pub closed_at:    Option<String>,
  pub needs_review: bool,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:     row.get(0)?,
      subject:      row.get(1)?,
      kind:         row.get(2)?,
      note:         row.get(3)?,
      state:        row.get(4)?,
      admin_status: row.get(5)?,
      opened_at:    row.get(6)?,
      closed_at:    row.get(7)?,
      needs_review: row.get(8)?,
    })
  }

  pub fn from_event(e: &AttendanceEvent) -> Self {
    let (state, admin_status) = encode_event_state(&e.state);
    Self {
      event_id: encode_uuid(e.event_id),
      subject: e.subject.as_str().to_owned(),
      kind: e.kind.as_str().to_owned(),
      note: e.note.clone(),
      state: state.to_owned(),
      admin_status,
      opened_at: encode_dt(e.opened_at),
      closed_at: e.closed_at.map(encode_dt),
      needs_review: e.needs_review,
    }
  }

  pub fn into_event(self) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
      event_id:     decode_uuid(&self.event_id)?,
      subject:      Subject::new(&self.subject)?,
      kind:         EventKind::from(self.kind),
      opened_at:    decode_dt(&self.opened_at)?,
      closed_at:    self.closed_at.as_deref().map(decode_dt).transpose()?,
      state:        decode_event_state(&self.state, self.admin_status)?,
      note:         self.note,
      needs_review: self.needs_review,
    })
  }
}

/// Column list matching [`RawApproval::from_row`].
pub const APPROVAL_COLUMNS: &str =
  "item_id, subject, kind, detail, state, submitted_at, decided_at, decided_by";

pub struct RawApproval {
  pub item_id:      String,
  pub subject:      String,
  pub kind:         String,
  pub detail:       String,
  pub state:        String,
  pub submitted_at: String,
  pub decided_at:   Option<String>,
  pub decided_by:   Option<String>,
}

impl RawApproval {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:      row.get(0)?,
      subject:      row.get(1)?,
      kind:         row.get(2)?,
      detail:       row.get(3)?,
      state:        row.get(4)?,
      submitted_at: row.get(5)?,
      decided_at:   row.get(6)?,
      decided_by:   row.get(7)?,
    })
  }

  pub fn into_item(self) -> Result<ApprovalItem> {
    Ok(ApprovalItem {
      item_id:      decode_uuid(&self.item_id)?,
      subject:      Subject::new(&self.subject)?,
      kind:         ApprovalKind::parse(&self.kind),
      detail:       self.detail,
      state:        decode_approval_state(&self.state)?,
      submitted_at: decode_dt(&self.submitted_at)?,
      decided_at:   self.decided_at.as_deref().map(decode_dt).transpose()?,
      decided_by:   self.decided_by.as_deref().map(Subject::new).transpose()?,
    })
  }
}

/// Column list matching [`RawAccount::from_row`].
pub const ACCOUNT_COLUMNS: &str =
  "username, full_name, national_id, email, role, created_at, password_hash";

pub struct RawAccount {
  pub username:      String,
  pub full_name:     Option<String>,
  pub national_id:   Option<String>,
  pub email:         Option<String>,
  pub role:          String,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      username:      row.get(0)?,
      full_name:     row.get(1)?,
      national_id:   row.get(2)?,
      email:         row.get(3)?,
      role:          row.get(4)?,
      created_at:    row.get(5)?,
      password_hash: row.get(6)?,
    })
  }

  /// Decode into the public account and its password hash.
  pub fn into_account(self) -> Result<(Account, String)> {
    let account = Account {
      username:    Subject::new(&self.username)?,
      full_name:   self.full_name,
      national_id: self.national_id,
      email:       self.email,
      role:        decode_role(&self.role)?,
      created_at:  decode_dt(&self.created_at)?,
    };
    Ok((account, self.password_hash))
  }
}

/// Column list matching [`RawMessage::from_row`].
pub const MESSAGE_COLUMNS: &str = "message_id, sender, content, created_at";

pub struct RawMessage {
  pub message_id: String,
  pub sender:     String,
  pub content:    String,
  pub created_at: String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      sender:     row.get(1)?,
      content:    row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id: decode_uuid(&self.message_id)?,
      sender:     Subject::new(&self.sender)?,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
