//! Admin views over the event log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/events` | Optional `?state=open\|closed\|force_closed&kind=<kind>` |
//! | `POST` | `/admin/events/{id}/force-close` | Body: `{"status":"Onaylandı"}` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use pts_core::{
  event::{AttendanceEvent, EventKind, StateFilter},
  store::PtsStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::AdminOnly, error::Error};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub state: Option<StateFilter>,
  pub kind:  Option<String>,
}

/// `GET /admin/events[?state=<state>&kind=<kind>]`, newest first.
pub async fn list_events<S>(
  State(state): State<AppState<S>>,
  AdminOnly(_): AdminOnly,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AttendanceEvent>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let kind = params
    .kind
    .as_deref()
    .filter(|k| !k.trim().is_empty())
    .map(EventKind::from);
  Ok(Json(state.ledger.list_all(params.state, kind).await?))
}

// ─── Force close ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForceCloseBody {
  pub status: String,
}

/// `POST /admin/events/{id}/force-close`
pub async fn force_close<S>(
  State(state): State<AppState<S>>,
  AdminOnly(admin): AdminOnly,
  Path(id): Path<Uuid>,
  Json(body): Json<ForceCloseBody>,
) -> Result<Json<AttendanceEvent>, Error>
where
  S: PtsStore + Clone + 'static,
{
  let event = state.ledger.force_close(id, &body.status).await?;
  tracing::info!(event_id = %id, by = %admin.username, "event force-closed");
  Ok(Json(event))
}
