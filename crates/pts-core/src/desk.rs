//! [`ApprovalDesk`]: submission and review of approval items.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  approval::{ApprovalItem, ApprovalKind, ApprovalState, Decision, Verdict},
  store::{ApprovalQuery, PtsStore},
  subject::Subject,
};

pub struct ApprovalDesk<S> {
  store: Arc<S>,
}

impl<S: PtsStore> ApprovalDesk<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// File a new pending item on behalf of `subject`.
  pub async fn submit(
    &self,
    subject: &Subject,
    kind: ApprovalKind,
    detail: &str,
    now: DateTime<Utc>,
  ) -> Result<ApprovalItem> {
    let detail = detail.trim();
    if detail.is_empty() {
      return Err(Error::EmptyDetail("detail"));
    }
    let kind = kind.normalized();
    if kind.as_str().is_empty() {
      return Err(Error::EmptyDetail("kind"));
    }

    let item = ApprovalItem {
      item_id:      Uuid::new_v4(),
      subject:      subject.clone(),
      kind,
      detail:       detail.to_owned(),
      state:        ApprovalState::Pending,
      submitted_at: now,
      decided_at:   None,
      decided_by:   None,
    };

    let item = self.store.insert_approval(item).await.map_err(Error::persistence)?;
    info!(%subject, item_id = %item.item_id, kind = %item.kind, "approval item submitted");
    Ok(item)
  }

  /// Approve or reject a pending item.
  pub async fn decide(
    &self,
    item_id: Uuid,
    decision: Decision,
    decided_by: &Subject,
    now: DateTime<Utc>,
  ) -> Result<ApprovalItem> {
    let verdict = Verdict {
      item_id,
      state: decision.outcome(),
      decided_by: decided_by.clone(),
      decided_at: now,
    };

    if let Some(item) = self
      .store
      .decide_approval(verdict)
      .await
      .map_err(Error::persistence)?
    {
      info!(item_id = %item_id, state = ?item.state, by = %decided_by, "approval item decided");
      return Ok(item);
    }

    // Nothing was updated: tell "missing" apart from "already decided".
    match self.store.get_approval(item_id).await.map_err(Error::persistence)? {
      Some(_) => Err(Error::AlreadyDecided(item_id)),
      None => Err(Error::ApprovalNotFound(item_id)),
    }
  }

  pub async fn list(&self, query: &ApprovalQuery) -> Result<Vec<ApprovalItem>> {
    self.store.list_approvals(query).await.map_err(Error::persistence)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;
  use crate::memory::MemoryStore;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() }

  fn desk() -> ApprovalDesk<MemoryStore> { ApprovalDesk::new(Arc::new(MemoryStore::default())) }

  #[tokio::test]
  async fn submit_then_approve() {
    let d = desk();
    let alice = Subject::new("alice").unwrap();
    let admin = Subject::new("admin").unwrap();

    let item = d.submit(&alice, ApprovalKind::Leave, " 2 days ", now()).await.unwrap();
    assert_eq!(item.state, ApprovalState::Pending);
    assert_eq!(item.detail, "2 days");

    let decided = d.decide(item.item_id, Decision::Approve, &admin, now()).await.unwrap();
    assert_eq!(decided.state, ApprovalState::Approved);
    assert_eq!(decided.decided_by, Some(admin.clone()));
    assert_eq!(decided.decided_at, Some(now()));

    assert!(matches!(
      d.decide(item.item_id, Decision::Reject, &admin, now()).await,
      Err(Error::AlreadyDecided(_))
    ));
  }

  #[tokio::test]
  async fn decide_unknown_item() {
    let d = desk();
    let admin = Subject::new("admin").unwrap();
    assert!(matches!(
      d.decide(Uuid::new_v4(), Decision::Reject, &admin, now()).await,
      Err(Error::ApprovalNotFound(_))
    ));
  }

  #[tokio::test]
  async fn empty_detail_rejected() {
    let d = desk();
    let alice = Subject::new("alice").unwrap();
    assert!(matches!(
      d.submit(&alice, ApprovalKind::Advance, "  ", now()).await,
      Err(Error::EmptyDetail("detail"))
    ));
  }

  #[tokio::test]
  async fn list_filters_by_state_and_subject() {
    let d = desk();
    let alice = Subject::new("alice").unwrap();
    let bob = Subject::new("bob").unwrap();
    let admin = Subject::new("admin").unwrap();

    let a = d.submit(&alice, ApprovalKind::Leave, "leave", now()).await.unwrap();
    d.submit(&alice, ApprovalKind::Report, "march.pdf", now()).await.unwrap();
    d.submit(&bob, ApprovalKind::Advance, "500", now()).await.unwrap();
    d.decide(a.item_id, Decision::Reject, &admin, now()).await.unwrap();

    let pending = d
      .list(&ApprovalQuery { state: Some(ApprovalState::Pending), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(pending.len(), 2);

    let alices = d
      .list(&ApprovalQuery { subject: Some(alice), ..Default::default() })
      .await
      .unwrap();
    assert_eq!(alices.len(), 2);
  }

  #[tokio::test]
  async fn custom_kind_spelling_a_builtin_is_stored_as_builtin() {
    let d = desk();
    let alice = Subject::new("alice").unwrap();
    let item = d
      .submit(&alice, ApprovalKind::Other("Leave".into()), "1 day", now())
      .await
      .unwrap();
    assert_eq!(item.kind, ApprovalKind::Leave);

    assert!(matches!(
      d.submit(&alice, ApprovalKind::Other("  ".into()), "1 day", now()).await,
      Err(Error::EmptyDetail("kind"))
    ));
  }
}
