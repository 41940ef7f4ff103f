//! Accounts: the people allowed to use the system.
//!
//! Credentials are held by the store as an opaque password hash. Hashing and
//! verification belong to the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::subject::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Personnel,
  Admin,
}

/// Public account data. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub username:    Subject,
  pub full_name:   Option<String>,
  /// Turkish national identity number (T.C. kimlik no), 11 digits.
  pub national_id: Option<String>,
  pub email:       Option<String>,
  pub role:        Role,
  pub created_at:  DateTime<Utc>,
}

impl Account {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Input to [`crate::store::PtsStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub username:      Subject,
  /// PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub full_name:     Option<String>,
  pub national_id:   Option<String>,
  pub email:         Option<String>,
  pub role:          Role,
}
