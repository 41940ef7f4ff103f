//! Handlers for the caller's own presence.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Account plus the open Terminal event, if any |
//! | `POST` | `/terminal/out` | 201, or 409 if already outside |
//! | `POST` | `/terminal/in` | 200 with the closed event, 204 if nothing was open |
//! | `GET`  | `/terminal/outside` | Everyone currently outside |
//! | `GET`  | `/events/mine` | Newest first |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use pts_core::{
  account::Account,
  event::AttendanceEvent,
  store::PtsStore,
  subject::Subject,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, auth::Authenticated, error::Error, now};

// ─── Me ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MeView {
  pub account:     Account,
  pub open_event:  Option<AttendanceEvent>,
  /// Live duration label of `open_event`.
  pub outside_for: Option<String>,
}

/// `GET /me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
) -> Result<Json<MeView>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let open_event = state.ledger.open_event_for(&account.username).await?;
  let outside_for = open_event
    .as_ref()
    .map(|e| state.ledger.duration_label(e, now()));

  Ok(Json(MeView { account, open_event, outside_for }))
}

// ─── Clock out / in ───────────────────────────────────────────────────────────

/// `POST /terminal/out`
pub async fn clock_out<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
) -> Result<impl IntoResponse, Error>
where
  S: PtsStore + Clone + 'static,
{
  let event = state.ledger.clock_out(&account.username, now()).await?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `POST /terminal/in`
pub async fn clock_in<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
) -> Result<Response, Error>
where
  S: PtsStore + Clone + 'static,
{
  match state.ledger.clock_in(&account.username, now()).await? {
    Some(event) => Ok(Json(event).into_response()),
    None => Ok(StatusCode::NO_CONTENT.into_response()),
  }
}

// ─── Outside ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OutsideRow {
  pub event_id:  Uuid,
  pub subject:   Subject,
  pub opened_at: DateTime<Utc>,
  pub duration:  String,
}

/// `GET /terminal/outside`, oldest departure first.
pub async fn outside<S>(
  State(state): State<AppState<S>>,
  Authenticated(_): Authenticated,
) -> Result<Json<Vec<OutsideRow>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let at = now();
  let format = state.ledger.options().duration_format;
  let rows = state
    .ledger
    .currently_out()
    .await?
    .into_iter()
    .map(|entry| OutsideRow {
      duration:  pts_core::duration::duration_label(entry.opened_at, at, format),
      event_id:  entry.event_id,
      subject:   entry.subject,
      opened_at: entry.opened_at,
    })
    .collect();
  Ok(Json(rows))
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /events/mine`
pub async fn my_events<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
) -> Result<Json<Vec<AttendanceEvent>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  Ok(Json(state.ledger.history(&account.username).await?))
}
