//! Handlers for account registration and listing.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use pts_core::{
  account::{Account, NewAccount, Role},
  store::PtsStore,
  subject::Subject,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{AdminOnly, hash_password},
  error::Error,
};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:    String,
  pub password:    String,
  pub full_name:   Option<String>,
  /// T.C. kimlik no, 11 digits.
  pub national_id: Option<String>,
  pub email:       Option<String>,
}

/// Trim an optional free-text field, dropping it when blank.
fn non_blank(field: Option<String>) -> Option<String> {
  field
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

fn national_id(field: Option<String>) -> Result<Option<String>, Error> {
  match non_blank(field) {
    Some(id) if id.len() != 11 || !id.bytes().all(|b| b.is_ascii_digit()) => {
      Err(Error::BadRequest("national_id must be 11 digits".into()))
    }
    id => Ok(id),
  }
}

/// `POST /register`. Always creates a personnel account.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, Error>
where
  S: PtsStore + Clone + 'static,
{
  let username = Subject::new(&body.username)
    .map_err(|_| Error::BadRequest("username must not be blank".into()))?;
  if body.password.is_empty() {
    return Err(Error::BadRequest("password must not be empty".into()));
  }

  let input = NewAccount {
    username:      username.clone(),
    password_hash: hash_password(&body.password)?,
    full_name:     non_blank(body.full_name),
    national_id:   national_id(body.national_id)?,
    email:         non_blank(body.email),
    role:          Role::Personnel,
  };

  let account = state
    .store
    .create_account(input)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Conflict(format!("username {username} is taken")))?;

  tracing::info!(%username, "account registered");
  Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /admin/accounts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  AdminOnly(_): AdminOnly,
) -> Result<Json<Vec<Account>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  Ok(Json(state.store.list_accounts().await.map_err(Error::store)?))
}
