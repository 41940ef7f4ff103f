//! [`AttendanceLedger`]: the presence state machine and duration ledger.
//!
//! ```text
//! [no event] --clock_out--> Open --clock_in--> Closed
//!                           Open --force_close(status)--> ForceClosed
//! ```
//!
//! No transition leaves a closed event. The ledger never reads a wall clock:
//! every operation that needs "now" takes it from the caller.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  duration::{self, DurationFormat},
  event::{AttendanceEvent, EventKind, EventState, OutsideEntry, StateFilter, returned_note},
  store::{CloseEvent, EventQuery, OpenOutcome, PtsStore},
  subject::Subject,
};

// ─── Options ─────────────────────────────────────────────────────────────────

/// What `clock_out` does when the subject already has an open Terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenPolicy {
  /// Fail with [`Error::AlreadyOpen`].
  #[default]
  Reject,
  /// Record another open event. `clock_in` then closes the earliest one.
  AllowDuplicates,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerOptions {
  pub open_policy:     OpenPolicy,
  pub duration_format: DurationFormat,
}

// ─── Per-subject locks ───────────────────────────────────────────────────────

/// One async mutex per subject, created on demand. Entries nobody holds or
/// waits on are pruned on the next acquisition.
#[derive(Default)]
struct SubjectLocks {
  table: Mutex<HashMap<Subject, Arc<tokio::sync::Mutex<()>>>>,
}

impl SubjectLocks {
  async fn acquire(&self, subject: &Subject) -> OwnedMutexGuard<()> {
    let lock = {
      let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
      table.retain(|_, lock| Arc::strong_count(lock) > 1);
      table.entry(subject.clone()).or_default().clone()
    };
    lock.lock_owned().await
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// The authoritative owner of the attendance event log.
///
/// `clock_out`, `clock_in` and `force_close` run under a per-subject lock, so
/// the check-then-act sequence of one subject is never interleaved with
/// another transition of the same subject. Different subjects never contend.
pub struct AttendanceLedger<S> {
  store:   Arc<S>,
  options: LedgerOptions,
  locks:   SubjectLocks,
}

impl<S: PtsStore> AttendanceLedger<S> {
  /// Fails with [`Error::PolicyMismatch`] when `options` allow duplicate
  /// opens but the store rejects them on its own.
  pub fn new(store: Arc<S>, options: LedgerOptions) -> Result<Self> {
    if options.open_policy == OpenPolicy::AllowDuplicates && store.enforces_single_open() {
      return Err(Error::PolicyMismatch);
    }
    Ok(Self { store, options, locks: SubjectLocks::default() })
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn options(&self) -> LedgerOptions { self.options }

  // ── Transitions ───────────────────────────────────────────────────────

  /// The subject leaves: open a Terminal event at `now`.
  pub async fn clock_out(&self, subject: &Subject, now: DateTime<Utc>) -> Result<AttendanceEvent> {
    self.open_activity(subject, EventKind::Terminal, now).await
  }

  /// Open an event of any kind. The [`OpenPolicy`] applies to Terminal
  /// events only; other kinds may overlap freely.
  pub async fn open_activity(
    &self,
    subject: &Subject,
    kind: EventKind,
    now: DateTime<Utc>,
  ) -> Result<AttendanceEvent> {
    let _guard = self.locks.acquire(subject).await;

    let exclusive = kind.is_terminal() && self.options.open_policy == OpenPolicy::Reject;
    let event = AttendanceEvent::open(subject.clone(), kind, now);

    match self
      .store
      .open_event(event, exclusive)
      .await
      .map_err(Error::persistence)?
    {
      OpenOutcome::Opened(event) => {
        info!(%subject, event_id = %event.event_id, kind = %event.kind, "event opened");
        Ok(event)
      }
      OpenOutcome::AlreadyOpen(existing) => {
        debug!(%subject, event_id = %existing.event_id, "rejected duplicate open");
        Err(Error::AlreadyOpen {
          subject:  subject.clone(),
          event_id: existing.event_id,
        })
      }
    }
  }

  /// The subject returns: close their open Terminal event at `now`.
  ///
  /// Returns `None` when nothing is open; that is not an error. If `now`
  /// precedes the opening time, the close is clamped to zero elapsed time and
  /// the event is flagged for review.
  pub async fn clock_in(
    &self,
    subject: &Subject,
    now: DateTime<Utc>,
  ) -> Result<Option<AttendanceEvent>> {
    let _guard = self.locks.acquire(subject).await;

    let Some(open) = self.open_terminal_events(subject).await?.into_iter().next() else {
      debug!(%subject, "clock_in with no open event");
      return Ok(None);
    };

    let needs_review = now < open.opened_at;
    if needs_review {
      warn!(
        %subject,
        event_id = %open.event_id,
        opened_at = %open.opened_at,
        %now,
        "close time precedes open time; clamping and flagging for review"
      );
    }

    let closed_at = now.max(open.opened_at);
    let label = duration::duration_label(open.opened_at, closed_at, self.options.duration_format);

    let closed = self
      .store
      .close_event(CloseEvent {
        event_id: open.event_id,
        state: EventState::Closed,
        closed_at: Some(closed_at),
        note: Some(returned_note(&label)),
        needs_review,
      })
      .await
      .map_err(Error::persistence)?;

    if let Some(event) = &closed {
      info!(%subject, event_id = %event.event_id, elapsed = %label, "event closed");
    }
    Ok(closed)
  }

  /// Administrative close with an arbitrary status label. Timestamps are
  /// left as they are.
  pub async fn force_close(&self, event_id: Uuid, status: &str) -> Result<AttendanceEvent> {
    let status = status.trim();
    if status.is_empty() {
      return Err(Error::EmptyDetail("status"));
    }

    let event = self.get(event_id).await?.ok_or(Error::EventNotFound(event_id))?;
    let _guard = self.locks.acquire(&event.subject).await;

    let closed = self
      .store
      .close_event(CloseEvent {
        event_id,
        state: EventState::ForceClosed { status: status.to_owned() },
        closed_at: None,
        note: None,
        needs_review: event.needs_review,
      })
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::AlreadyClosed(event_id))?;

    info!(subject = %closed.subject, %event_id, %status, "event force-closed");
    Ok(closed)
  }

  // ── Queries ───────────────────────────────────────────────────────────

  /// Everyone currently outside, earliest departure first.
  pub async fn currently_out(&self) -> Result<Vec<OutsideEntry>> {
    let query = EventQuery {
      state: Some(StateFilter::Open),
      kind: Some(EventKind::Terminal),
      ..EventQuery::default()
    };
    let events = self.store.list_events(&query).await.map_err(Error::persistence)?;
    Ok(events.iter().map(OutsideEntry::from).collect())
  }

  /// The subject's open Terminal event, if any.
  pub async fn open_event_for(&self, subject: &Subject) -> Result<Option<AttendanceEvent>> {
    Ok(self.open_terminal_events(subject).await?.into_iter().next())
  }

  /// Time spent outside so far, or `None` if the subject is not outside.
  pub async fn elapsed_for(
    &self,
    subject: &Subject,
    now: DateTime<Utc>,
  ) -> Result<Option<TimeDelta>> {
    Ok(self.open_event_for(subject).await?.map(|e| e.elapsed(now)))
  }

  /// Every event, newest first, optionally filtered.
  pub async fn list_all(
    &self,
    state: Option<StateFilter>,
    kind: Option<EventKind>,
  ) -> Result<Vec<AttendanceEvent>> {
    let query = EventQuery { state, kind, newest_first: true, ..EventQuery::default() };
    self.store.list_events(&query).await.map_err(Error::persistence)
  }

  /// One subject's events, newest first.
  pub async fn history(&self, subject: &Subject) -> Result<Vec<AttendanceEvent>> {
    let query = EventQuery {
      subject: Some(subject.clone()),
      newest_first: true,
      ..EventQuery::default()
    };
    self.store.list_events(&query).await.map_err(Error::persistence)
  }

  pub async fn get(&self, event_id: Uuid) -> Result<Option<AttendanceEvent>> {
    self.store.get_event(event_id).await.map_err(Error::persistence)
  }

  /// Duration label for `event` in the configured format.
  pub fn duration_label(&self, event: &AttendanceEvent, now: DateTime<Utc>) -> String {
    event.duration_label(now, self.options.duration_format)
  }

  async fn open_terminal_events(&self, subject: &Subject) -> Result<Vec<AttendanceEvent>> {
    let query = EventQuery {
      subject: Some(subject.clone()),
      state: Some(StateFilter::Open),
      kind: Some(EventKind::Terminal),
      ..EventQuery::default()
    };
    self.store.list_events(&query).await.map_err(Error::persistence)
  }
}
