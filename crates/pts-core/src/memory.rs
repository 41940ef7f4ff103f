//! In-memory [`PtsStore`] used by the unit tests of this crate.
//!
//! `open_event` yields between its existence check and its insert so that
//! tests observe what happens when callers race on a store without
//! transactional check-then-insert.

use std::{
  collections::HashMap,
  convert::Infallible,
  sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount},
  approval::{ApprovalItem, Verdict},
  event::{AttendanceEvent, EventKind, EventState},
  message::Message,
  store::{ApprovalQuery, CloseEvent, EventQuery, OpenOutcome, PtsStore},
  subject::Subject,
};

#[derive(Default)]
struct Inner {
  events:    Vec<AttendanceEvent>,
  approvals: Vec<ApprovalItem>,
  accounts:  HashMap<Subject, (Account, String)>,
  messages:  Vec<Message>,
}

#[derive(Default)]
pub struct MemoryStore {
  inner:               Mutex<Inner>,
  enforce_single_open: bool,
}

impl MemoryStore {
  /// A store that reports itself as enforcing one open Terminal event per
  /// subject.
  pub fn enforcing() -> Self { Self { enforce_single_open: true, ..Self::default() } }

  fn lock(&self) -> MutexGuard<'_, Inner> { self.inner.lock().unwrap() }

  pub fn events(&self) -> Vec<AttendanceEvent> { self.lock().events.clone() }

  fn existing_open(&self, subject: &Subject) -> Option<AttendanceEvent> {
    self
      .lock()
      .events
      .iter()
      .find(|e| &e.subject == subject && e.kind.is_terminal() && e.is_open())
      .cloned()
  }
}

impl PtsStore for MemoryStore {
  type Error = Infallible;

  fn enforces_single_open(&self) -> bool { self.enforce_single_open }

  async fn open_event(
    &self,
    event: AttendanceEvent,
    exclusive: bool,
  ) -> Result<OpenOutcome, Infallible> {
    if (exclusive || self.enforce_single_open)
      && event.kind == EventKind::Terminal
      && let Some(existing) = self.existing_open(&event.subject)
    {
      return Ok(OpenOutcome::AlreadyOpen(existing));
    }
    tokio::task::yield_now().await;
    self.lock().events.push(event.clone());
    Ok(OpenOutcome::Opened(event))
  }

  async fn close_event(&self, close: CloseEvent) -> Result<Option<AttendanceEvent>, Infallible> {
    let mut inner = self.lock();
    let Some(event) = inner
      .events
      .iter_mut()
      .find(|e| e.event_id == close.event_id && e.state == EventState::Open)
    else {
      return Ok(None);
    };
    event.state = close.state;
    if let Some(at) = close.closed_at {
      event.closed_at = Some(at);
    }
    if let Some(note) = close.note {
      event.note = note;
    }
    event.needs_review = close.needs_review;
    Ok(Some(event.clone()))
  }

  async fn get_event(&self, event_id: Uuid) -> Result<Option<AttendanceEvent>, Infallible> {
    Ok(self.lock().events.iter().find(|e| e.event_id == event_id).cloned())
  }

  async fn list_events(&self, query: &EventQuery) -> Result<Vec<AttendanceEvent>, Infallible> {
    let mut events: Vec<_> = self
      .lock()
      .events
      .iter()
      .filter(|e| query.subject.as_ref().is_none_or(|s| &e.subject == s))
      .filter(|e| query.state.is_none_or(|f| f.matches(&e.state)))
      .filter(|e| query.kind.as_ref().is_none_or(|k| &e.kind == k))
      .cloned()
      .collect();
    events.sort_by_key(|e| e.opened_at);
    if query.newest_first {
      events.reverse();
    }
    if let Some(limit) = query.limit {
      events.truncate(limit);
    }
    Ok(events)
  }

  async fn insert_approval(&self, item: ApprovalItem) -> Result<ApprovalItem, Infallible> {
    self.lock().approvals.push(item.clone());
    Ok(item)
  }

  async fn decide_approval(&self, verdict: Verdict) -> Result<Option<ApprovalItem>, Infallible> {
    let mut inner = self.lock();
    let Some(item) = inner
      .approvals
      .iter_mut()
      .find(|i| i.item_id == verdict.item_id && i.state.is_pending())
    else {
      return Ok(None);
    };
    item.state = verdict.state;
    item.decided_at = Some(verdict.decided_at);
    item.decided_by = Some(verdict.decided_by);
    Ok(Some(item.clone()))
  }

  async fn get_approval(&self, item_id: Uuid) -> Result<Option<ApprovalItem>, Infallible> {
    Ok(self.lock().approvals.iter().find(|i| i.item_id == item_id).cloned())
  }

  async fn list_approvals(&self, query: &ApprovalQuery) -> Result<Vec<ApprovalItem>, Infallible> {
    let mut items: Vec<_> = self
      .lock()
      .approvals
      .iter()
      .filter(|i| query.subject.as_ref().is_none_or(|s| &i.subject == s))
      .filter(|i| query.state.is_none_or(|st| i.state == st))
      .cloned()
      .collect();
    items.sort_by_key(|i| std::cmp::Reverse(i.submitted_at));
    Ok(items)
  }

  async fn create_account(&self, input: NewAccount) -> Result<Option<Account>, Infallible> {
    let mut inner = self.lock();
    if inner.accounts.contains_key(&input.username) {
      return Ok(None);
    }
    let account = Account {
      username:    input.username.clone(),
      full_name:   input.full_name,
      national_id: input.national_id,
      email:       input.email,
      role:        input.role,
      created_at:  chrono::Utc::now(),
    };
    inner
      .accounts
      .insert(input.username, (account.clone(), input.password_hash));
    Ok(Some(account))
  }

  async fn get_credentials(
    &self,
    username: &Subject,
  ) -> Result<Option<(Account, String)>, Infallible> {
    Ok(self.lock().accounts.get(username).cloned())
  }

  async fn list_accounts(&self) -> Result<Vec<Account>, Infallible> {
    Ok(self.lock().accounts.values().map(|(a, _)| a.clone()).collect())
  }

  async fn post_message(&self, message: Message) -> Result<Message, Infallible> {
    self.lock().messages.push(message.clone());
    Ok(message)
  }

  async fn list_messages(&self, limit: usize) -> Result<Vec<Message>, Infallible> {
    let mut messages = self.lock().messages.clone();
    messages.sort_by_key(|m| std::cmp::Reverse(m.created_at));
    messages.truncate(limit);
    Ok(messages)
  }
}
