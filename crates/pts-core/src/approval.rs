//! Approval items: leave and advance requests, report submissions.
//!
//! These share only subject and timestamp metadata with presence events and
//! follow their own small state machine:
//!
//! ```text
//! Pending --approve--> Approved
//! Pending --reject---> Rejected
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::Subject;

/// What an approval item asks for.
///
/// Serialised as a bare label. Built-in labels always parse to their variant,
/// so `Other` never holds `leave`, `advance` or `report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApprovalKind {
  Leave,
  Advance,
  /// A submitted report; `detail` names the document.
  Report,
  Other(String),
}

impl ApprovalKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Leave => "leave",
      Self::Advance => "advance",
      Self::Report => "report",
      Self::Other(s) => s,
    }
  }

  /// Parse a label, matching built-in kinds case-insensitively.
  pub fn parse(s: &str) -> Self {
    let s = s.trim();
    if s.eq_ignore_ascii_case("leave") {
      Self::Leave
    } else if s.eq_ignore_ascii_case("advance") {
      Self::Advance
    } else if s.eq_ignore_ascii_case("report") {
      Self::Report
    } else {
      Self::Other(s.to_owned())
    }
  }

  /// The canonical form of this kind: an `Other` spelling a built-in label
  /// becomes that built-in.
  pub fn normalized(self) -> Self {
    match self {
      Self::Other(label) => Self::parse(&label),
      kind => kind,
    }
  }
}

impl From<String> for ApprovalKind {
  fn from(s: String) -> Self { Self::parse(&s) }
}

impl From<ApprovalKind> for String {
  fn from(k: ApprovalKind) -> Self { k.as_str().to_owned() }
}

impl fmt::Display for ApprovalKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
  Pending,
  Approved,
  Rejected,
}

impl ApprovalState {
  pub fn is_pending(self) -> bool { self == Self::Pending }
}

/// An administrator's verdict on a pending item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
  Approve,
  Reject,
}

impl Decision {
  pub fn outcome(self) -> ApprovalState {
    match self {
      Self::Approve => ApprovalState::Approved,
      Self::Reject => ApprovalState::Rejected,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalItem {
  pub item_id:      Uuid,
  pub subject:      Subject,
  pub kind:         ApprovalKind,
  pub detail:       String,
  pub state:        ApprovalState,
  pub submitted_at: DateTime<Utc>,
  pub decided_at:   Option<DateTime<Utc>>,
  pub decided_by:   Option<Subject>,
}

/// Recorded outcome of a decision, passed to
/// [`crate::store::PtsStore::decide_approval`].
#[derive(Debug, Clone)]
pub struct Verdict {
  pub item_id:    Uuid,
  pub state:      ApprovalState,
  pub decided_by: Subject,
  pub decided_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_serialises_as_bare_label() {
    assert_eq!(serde_json::to_value(ApprovalKind::Leave).unwrap(), "leave");
    assert_eq!(
      serde_json::to_value(ApprovalKind::Other("overtime".into())).unwrap(),
      "overtime"
    );
    let kind: ApprovalKind = serde_json::from_value("Advance".into()).unwrap();
    assert_eq!(kind, ApprovalKind::Advance);
  }

  #[test]
  fn builtin_labels_never_become_other() {
    let kind: ApprovalKind = serde_json::from_value(" LEAVE ".into()).unwrap();
    assert_eq!(kind, ApprovalKind::Leave);
    assert_eq!(ApprovalKind::Other("report".into()).normalized(), ApprovalKind::Report);
    assert_eq!(
      ApprovalKind::Other("overtime".into()).normalized(),
      ApprovalKind::Other("overtime".into())
    );
  }

  #[test]
  fn label_round_trips() {
    for kind in [
      ApprovalKind::Leave,
      ApprovalKind::Advance,
      ApprovalKind::Report,
      ApprovalKind::Other("overtime".into()),
    ] {
      assert_eq!(ApprovalKind::parse(kind.as_str()), kind);
    }
  }
}
