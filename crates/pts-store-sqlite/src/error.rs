//! Error type for `pts-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pts_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Strict mode was requested over a database that already holds several
  /// open Terminal events for these subjects. Close or force-close the
  /// extras before restarting.
  #[error(
    "cannot enforce one open terminal event per subject; \
     subjects with several open events: {}",
    .0.join(", ")
  )]
  DuplicateOpenEvents(Vec<String>),

  /// A column held a value outside its known set.
  #[error("unrecognised {column} value: {value:?}")]
  Decode { column: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
