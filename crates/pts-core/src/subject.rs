//! Subject: the person whose presence and requests are tracked.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A stable, non-empty identifier for a person (their username).
///
/// Surrounding whitespace is trimmed on construction, so `" alice "` and
/// `"alice"` name the same subject.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);

impl Subject {
  pub fn new(raw: impl AsRef<str>) -> Result<Self> {
    let trimmed = raw.as_ref().trim();
    if trimmed.is_empty() {
      return Err(Error::InvalidSubject);
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Subject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl TryFrom<String> for Subject {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<Subject> for String {
  fn from(value: Subject) -> Self { value.0 }
}
