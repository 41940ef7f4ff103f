//! HTTP Basic-auth extractors backed by the account table.
//!
//! Passwords are stored only as argon2 PHC strings.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;

use crate::{AppState, error::Error};
use pts_core::{account::Account, store::PtsStore, subject::Subject};

/// The authenticated caller.
pub struct Authenticated(pub Account);

/// An authenticated caller holding the admin role.
pub struct AdminOnly(pub Account);

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

fn verify_password(password: &str, phc: &str) -> Result<(), Error> {
  let parsed_hash = PasswordHash::new(phc).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)
}

/// Split an `Authorization: Basic …` header into username and password.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Resolve the request's credentials to an account.
pub async fn authenticate<S: PtsStore>(headers: &HeaderMap, store: &S) -> Result<Account, Error> {
  let (username, password) = basic_credentials(headers)?;
  let username = Subject::new(username).map_err(|_| Error::Unauthorized)?;

  let (account, phc) = store
    .get_credentials(&username)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  verify_password(&password, &phc)?;
  Ok(account)
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: PtsStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let account = authenticate(&parts.headers, state.store.as_ref()).await?;
    Ok(Authenticated(account))
  }
}

impl<S> FromRequestParts<AppState<S>> for AdminOnly
where
  S: PtsStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let account = authenticate(&parts.headers, state.store.as_ref()).await?;
    if !account.is_admin() {
      return Err(Error::Forbidden);
    }
    Ok(AdminOnly(account))
  }
}
