//! HTTP surface for the PTS attendance ledger.
//!
//! Exposes an axum [`Router`] backed by any [`PtsStore`]. Every route except
//! `/register` requires HTTP Basic credentials; `/admin/*` routes additionally
//! require the admin role.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use chrono::Utc;
use pts_core::{
  account::{NewAccount, Role},
  desk::ApprovalDesk,
  duration::DurationFormat,
  ledger::{AttendanceLedger, LedgerOptions, OpenPolicy},
  message::MessageBoard,
  store::PtsStore,
  subject::Subject,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{accounts, admin, export, messages, requests, terminal};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `PTS_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub admin_username:        String,
  pub admin_password_hash:   String,
  #[serde(default)]
  pub duration_format:       DurationFormat,
  /// Lift the one-open-Terminal-event rule. The store must have been opened
  /// without its single-open index.
  #[serde(default)]
  pub allow_duplicate_opens: bool,
}

impl ServerConfig {
  pub fn ledger_options(&self) -> LedgerOptions {
    LedgerOptions {
      open_policy:     if self.allow_duplicate_opens {
        OpenPolicy::AllowDuplicates
      } else {
        OpenPolicy::Reject
      },
      duration_format: self.duration_format,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: PtsStore> {
  pub ledger: Arc<AttendanceLedger<S>>,
  pub desk:   Arc<ApprovalDesk<S>>,
  pub board:  Arc<MessageBoard<S>>,
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S: PtsStore> AppState<S> {
  /// Fails when `config` asks for a duplicate-open policy that `store` cannot
  /// honour.
  pub fn new(store: Arc<S>, config: ServerConfig) -> Result<Self, Error> {
    let ledger = AttendanceLedger::new(store.clone(), config.ledger_options())?;
    Ok(Self {
      ledger: Arc::new(ledger),
      desk:   Arc::new(ApprovalDesk::new(store.clone())),
      board:  Arc::new(MessageBoard::new(store.clone())),
      store,
      config: Arc::new(config),
    })
  }
}

/// Create the configured admin account unless it already exists.
///
/// Returns `true` when an account was created.
pub async fn bootstrap_admin<S: PtsStore>(store: &S, config: &ServerConfig) -> Result<bool, Error> {
  let username = Subject::new(config.admin_username.as_str())
    .map_err(|_| Error::BadRequest("admin_username must not be blank".into()))?;

  let created = store
    .create_account(NewAccount {
      username:      username.clone(),
      password_hash: config.admin_password_hash.clone(),
      full_name:     None,
      national_id:   None,
      email:         None,
      role:          Role::Admin,
    })
    .await
    .map_err(Error::store)?;

  match created {
    Some(_) => {
      tracing::info!(%username, "created admin account");
      Ok(true)
    }
    None => {
      if let Some((account, _)) = store.get_credentials(&username).await.map_err(Error::store)?
        && !account.is_admin()
      {
        tracing::warn!(%username, "configured admin username belongs to a non-admin account");
      }
      Ok(false)
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the PTS server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PtsStore + Clone + 'static,
{
  Router::new()
    // Accounts
    .route("/register",                       post(accounts::register::<S>))
    .route("/me",                             get(terminal::me::<S>))
    // Terminal
    .route("/terminal/out",                   post(terminal::clock_out::<S>))
    .route("/terminal/in",                    post(terminal::clock_in::<S>))
    .route("/terminal/outside",               get(terminal::outside::<S>))
    .route("/events/mine",                    get(terminal::my_events::<S>))
    // Requests
    .route("/requests",                       post(requests::submit::<S>))
    .route("/requests/mine",                  get(requests::mine::<S>))
    // Messages
    .route("/messages",                       get(messages::recent::<S>).post(messages::post::<S>))
    // Admin
    .route("/admin/events",                   get(admin::list_events::<S>))
    .route("/admin/events/{id}/force-close",  post(admin::force_close::<S>))
    .route("/admin/requests",                 get(requests::list_all::<S>))
    .route("/admin/requests/{id}/decision",   post(requests::decide::<S>))
    .route("/admin/accounts",                 get(accounts::list::<S>))
    .route("/admin/export",                   get(export::json::<S>))
    .route("/admin/export.csv",               get(export::csv::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Current time for request handlers. The ledger itself never reads a clock.
pub(crate) fn now() -> chrono::DateTime<Utc> { Utc::now() }
