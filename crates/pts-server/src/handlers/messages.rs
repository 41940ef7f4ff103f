//! Handlers for the shared message feed.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/messages` | Body: `{"content":"…"}` |
//! | `GET`  | `/messages` | Newest first, optional `?limit=` (default 15) |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use pts_core::{
  message::{DEFAULT_FEED_LIMIT, Message},
  store::PtsStore,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::Error, now};

#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub content: String,
}

/// `POST /messages`
pub async fn post<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
  Json(body): Json<PostBody>,
) -> Result<impl IntoResponse, Error>
where
  S: PtsStore + Clone + 'static,
{
  let message = state
    .board
    .post(&account.username, &body.content, now())
    .await?;
  Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
  pub limit: Option<usize>,
}

/// `GET /messages[?limit=<n>]`
pub async fn recent<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
  Query(params): Query<FeedParams>,
) -> Result<Json<Vec<Message>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let limit = params.limit.unwrap_or(DEFAULT_FEED_LIMIT);
  Ok(Json(state.board.recent(limit).await?))
}
