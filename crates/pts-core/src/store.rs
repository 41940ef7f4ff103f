//! The `PtsStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `pts-store-sqlite`).
//! The ledger and the HTTP layer depend on this abstraction, never on a
//! concrete backend. Each call is its own transaction scope; a read never
//! observes a write that has not committed.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount},
  approval::{ApprovalItem, ApprovalState, Verdict},
  event::{AttendanceEvent, EventKind, EventState, StateFilter},
  message::Message,
  subject::Subject,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`PtsStore::list_events`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub subject:      Option<Subject>,
  pub state:        Option<StateFilter>,
  pub kind:         Option<EventKind>,
  /// Order by `opened_at` descending instead of ascending.
  pub newest_first: bool,
  pub limit:        Option<usize>,
}

/// Parameters for [`PtsStore::list_approvals`]. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct ApprovalQuery {
  pub subject: Option<Subject>,
  pub state:   Option<ApprovalState>,
}

// ─── Write outcomes ──────────────────────────────────────────────────────────

/// Result of [`PtsStore::open_event`].
#[derive(Debug, Clone)]
pub enum OpenOutcome {
  Opened(AttendanceEvent),
  /// An open Terminal event already exists for the subject; nothing was
  /// written.
  AlreadyOpen(AttendanceEvent),
}

/// The closing write applied by [`PtsStore::close_event`].
#[derive(Debug, Clone)]
pub struct CloseEvent {
  pub event_id:     Uuid,
  pub state:        EventState,
  /// `None` leaves the column untouched (admin force-close).
  pub closed_at:    Option<chrono::DateTime<chrono::Utc>>,
  /// `None` leaves the note untouched.
  pub note:         Option<String>,
  pub needs_review: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a PTS storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PtsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether the backend rejects a second open Terminal event for a subject
  /// even when `open_event` is called with `exclusive == false`.
  fn enforces_single_open(&self) -> bool;

  // ── Attendance events ─────────────────────────────────────────────────

  /// Persist a newly opened event.
  ///
  /// When `exclusive` is set and the event is a Terminal event, the check for
  /// an existing open Terminal event of the same subject and the insert are
  /// one atomic step.
  fn open_event(
    &self,
    event: AttendanceEvent,
    exclusive: bool,
  ) -> impl Future<Output = Result<OpenOutcome, Self::Error>> + Send + '_;

  /// Apply a closing write, but only if the event is still open.
  ///
  /// Returns the updated event, or `None` if the event does not exist or is
  /// no longer open.
  fn close_event(
    &self,
    close: CloseEvent,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  fn list_events<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<AttendanceEvent>, Self::Error>> + Send + 'a;

  // ── Approval items ────────────────────────────────────────────────────

  fn insert_approval(
    &self,
    item: ApprovalItem,
  ) -> impl Future<Output = Result<ApprovalItem, Self::Error>> + Send + '_;

  /// Record a verdict if and only if the item is still pending.
  ///
  /// Returns the updated item, or `None` if it does not exist or was already
  /// decided.
  fn decide_approval(
    &self,
    verdict: Verdict,
  ) -> impl Future<Output = Result<Option<ApprovalItem>, Self::Error>> + Send + '_;

  fn get_approval(
    &self,
    item_id: Uuid,
  ) -> impl Future<Output = Result<Option<ApprovalItem>, Self::Error>> + Send + '_;

  fn list_approvals<'a>(
    &'a self,
    query: &'a ApprovalQuery,
  ) -> impl Future<Output = Result<Vec<ApprovalItem>, Self::Error>> + Send + 'a;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an account. Returns `None` if the username is taken.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look up an account together with its stored password hash.
  fn get_credentials<'a>(
    &'a self,
    username: &'a Subject,
  ) -> impl Future<Output = Result<Option<(Account, String)>, Self::Error>> + Send + 'a;

  fn list_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  fn post_message(
    &self,
    message: Message,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// The latest `limit` messages, newest first.
  fn list_messages(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;
}
