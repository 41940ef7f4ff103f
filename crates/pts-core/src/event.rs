//! Attendance events: one record per presence interval.
//!
//! An event is created open, and is closed exactly once: either by the
//! subject returning (`clock_in`) or by an administrator forcing a status.
//! Once closed, no field changes again.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  duration::{self, DurationFormat},
  subject::Subject,
};

/// Note attached to a Terminal event while the subject is outside.
pub const OUTSIDE_NOTE: &str = "Dışarıda";

/// Note attached to a Terminal event when the subject returns.
pub fn returned_note(label: &str) -> String { format!("Geri Döndü ({label})") }

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Category of a presence interval. Only [`EventKind::Terminal`] events are
/// subject to the one-open-event-per-subject rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
  Terminal,
  Other(String),
}

impl EventKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Terminal => "terminal",
      Self::Other(label) => label,
    }
  }

  pub fn is_terminal(&self) -> bool { matches!(self, Self::Terminal) }
}

impl From<&str> for EventKind {
  fn from(s: &str) -> Self {
    let s = s.trim();
    if s.eq_ignore_ascii_case("terminal") {
      Self::Terminal
    } else {
      Self::Other(s.to_owned())
    }
  }
}

impl From<String> for EventKind {
  fn from(s: String) -> Self { Self::from(s.as_str()) }
}

impl From<EventKind> for String {
  fn from(k: EventKind) -> Self { k.as_str().to_owned() }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// The authoritative lifecycle state of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EventState {
  Open,
  Closed,
  /// Closed by an administrator with a free-form status label.
  ForceClosed { status: String },
}

impl EventState {
  pub fn is_open(&self) -> bool { matches!(self, Self::Open) }

  /// A short label for display and export.
  pub fn label(&self) -> &str {
    match self {
      Self::Open => "open",
      Self::Closed => "closed",
      Self::ForceClosed { status } => status,
    }
  }
}

/// State filter for event listings. `Closed` matches only events closed by
/// their subject; `ForceClosed` matches every admin-closed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateFilter {
  Open,
  Closed,
  ForceClosed,
}

impl StateFilter {
  pub fn matches(self, state: &EventState) -> bool {
    matches!(
      (self, state),
      (Self::Open, EventState::Open)
        | (Self::Closed, EventState::Closed)
        | (Self::ForceClosed, EventState::ForceClosed { .. })
    )
  }
}

// ─── Event ───────────────────────────────────────────────────────────────────

/// A single presence interval in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
  pub event_id:     Uuid,
  pub subject:      Subject,
  pub kind:         EventKind,
  /// Set at creation; never changes.
  pub opened_at:    DateTime<Utc>,
  /// Present once the subject returned. Never earlier than `opened_at`.
  pub closed_at:    Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub state:        EventState,
  pub note:         String,
  /// Set when the close time preceded `opened_at` and had to be clamped.
  pub needs_review: bool,
}

impl AttendanceEvent {
  /// A freshly opened event.
  pub fn open(subject: Subject, kind: EventKind, now: DateTime<Utc>) -> Self {
    let note = if kind.is_terminal() { OUTSIDE_NOTE.to_owned() } else { String::new() };
    Self {
      event_id: Uuid::new_v4(),
      subject,
      kind,
      opened_at: now,
      closed_at: None,
      state: EventState::Open,
      note,
      needs_review: false,
    }
  }

  pub fn is_open(&self) -> bool { self.state.is_open() }

  /// Elapsed time up to `closed_at`, or up to `now` while still open.
  pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
    duration::elapsed(self.opened_at, self.closed_at.unwrap_or(now))
  }

  /// [`duration::duration_label`] for this event, substituting `now` for a
  /// missing `closed_at`.
  pub fn duration_label(&self, now: DateTime<Utc>, format: DurationFormat) -> String {
    duration::duration_label(self.opened_at, self.closed_at.unwrap_or(now), format)
  }
}

/// One row of the "who is outside" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutsideEntry {
  pub event_id:  Uuid,
  pub subject:   Subject,
  pub opened_at: DateTime<Utc>,
}

impl From<&AttendanceEvent> for OutsideEntry {
  fn from(e: &AttendanceEvent) -> Self {
    Self {
      event_id:  e.event_id,
      subject:   e.subject.clone(),
      opened_at: e.opened_at,
    }
  }
}
