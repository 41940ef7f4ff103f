//! Error types for `pts-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::subject::Subject;

#[derive(Debug, Error)]
pub enum Error {
  /// Strict mode: the subject is already outside.
  #[error("{subject} already has an open terminal event ({event_id})")]
  AlreadyOpen { subject: Subject, event_id: Uuid },

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  /// No transition leaves a closed event.
  #[error("event {0} is already closed")]
  AlreadyClosed(Uuid),

  #[error("approval item not found: {0}")]
  ApprovalNotFound(Uuid),

  #[error("approval item {0} has already been decided")]
  AlreadyDecided(Uuid),

  #[error("subject identifier must not be empty")]
  InvalidSubject,

  #[error("{0} must not be empty")]
  EmptyDetail(&'static str),

  #[error("{field} must be at most {max} characters")]
  TooLong { field: &'static str, max: usize },

  /// The ledger was asked to allow duplicate opens over a store that
  /// rejects them.
  #[error("open policy allows duplicate open terminal events but the store enforces one per subject")]
  PolicyMismatch,

  /// Any failure reported by the storage backend.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
