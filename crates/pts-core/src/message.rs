//! The internal message feed: short notes every account can post and read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result, store::PtsStore, subject::Subject};

/// Messages returned by [`MessageBoard::recent`] when no limit is given.
pub const DEFAULT_FEED_LIMIT: usize = 15;

/// Longest accepted message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message_id: Uuid,
  pub sender:     Subject,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

pub struct MessageBoard<S> {
  store: Arc<S>,
}

impl<S: PtsStore> MessageBoard<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Post `content` as `sender`. Surrounding whitespace is dropped; nothing
  /// is stored for blank content.
  pub async fn post(&self, sender: &Subject, content: &str, now: DateTime<Utc>) -> Result<Message> {
    let content = content.trim();
    if content.is_empty() {
      return Err(Error::EmptyDetail("content"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
      return Err(Error::TooLong { field: "content", max: MAX_MESSAGE_CHARS });
    }

    let message = Message {
      message_id: Uuid::new_v4(),
      sender:     sender.clone(),
      content:    content.to_owned(),
      created_at: now,
    };
    let message = self.store.post_message(message).await.map_err(Error::persistence)?;
    info!(%sender, message_id = %message.message_id, "message posted");
    Ok(message)
  }

  /// The latest `limit` messages, newest first.
  pub async fn recent(&self, limit: usize) -> Result<Vec<Message>> {
    self.store.list_messages(limit).await.map_err(Error::persistence)
  }
}
