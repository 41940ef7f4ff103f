//! Handlers for approval items (leave, advance and report requests).
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/requests` | Body: `{"kind":"leave","detail":"…"}` |
//! | `GET`  | `/requests/mine` | Caller's items, newest first |
//! | `GET`  | `/admin/requests` | Optional `?state=pending\|approved\|rejected` |
//! | `POST` | `/admin/requests/{id}/decision` | Body: `{"decision":"approve"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use pts_core::{
  approval::{ApprovalItem, ApprovalKind, ApprovalState, Decision},
  store::{ApprovalQuery, PtsStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::{AdminOnly, Authenticated},
  error::Error,
  now,
};

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub kind:   ApprovalKind,
  pub detail: String,
}

/// `POST /requests`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, Error>
where
  S: PtsStore + Clone + 'static,
{
  let item = state
    .desk
    .submit(&account.username, body.kind, &body.detail, now())
    .await?;
  Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /requests/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  Authenticated(account): Authenticated,
) -> Result<Json<Vec<ApprovalItem>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let query = ApprovalQuery { subject: Some(account.username), state: None };
  Ok(Json(state.desk.list(&query).await?))
}

// ─── Admin ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub state: Option<ApprovalState>,
}

/// `GET /admin/requests[?state=<state>]`
pub async fn list_all<S>(
  State(state): State<AppState<S>>,
  AdminOnly(_): AdminOnly,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ApprovalItem>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let query = ApprovalQuery { subject: None, state: params.state };
  Ok(Json(state.desk.list(&query).await?))
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
  pub decision: Decision,
}

/// `POST /admin/requests/{id}/decision`; 409 once decided.
pub async fn decide<S>(
  State(state): State<AppState<S>>,
  AdminOnly(admin): AdminOnly,
  Path(id): Path<Uuid>,
  Json(body): Json<DecisionBody>,
) -> Result<Json<ApprovalItem>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let item = state
    .desk
    .decide(id, body.decision, &admin.username, now())
    .await?;
  Ok(Json(item))
}
