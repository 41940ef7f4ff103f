//! Tabular export of the event log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/export` | JSON rows |
//! | `GET`  | `/admin/export.csv` | `text/csv`, header row first |

use axum::{
  Json,
  extract::State,
  http::header,
  response::IntoResponse,
};
use chrono::{DateTime, SecondsFormat, Utc};
use pts_core::{
  duration::DurationFormat,
  event::AttendanceEvent,
  store::PtsStore,
};
use serde::Serialize;

use crate::{AppState, auth::AdminOnly, error::Error, now};

const CSV_HEADER: [&str; 7] =
  ["subject", "kind", "note", "state", "opened_at", "closed_at", "duration"];

/// One exported event. `duration` runs to `closed_at`, or to the export time
/// for events still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
  pub subject:   String,
  pub kind:      String,
  pub note:      String,
  pub state:     String,
  pub opened_at: DateTime<Utc>,
  pub closed_at: Option<DateTime<Utc>>,
  pub duration:  String,
}

impl ExportRow {
  pub fn from_event(event: &AttendanceEvent, at: DateTime<Utc>, format: DurationFormat) -> Self {
    Self {
      subject:   event.subject.to_string(),
      kind:      event.kind.to_string(),
      note:      event.note.clone(),
      state:     event.state.label().to_owned(),
      opened_at: event.opened_at,
      closed_at: event.closed_at,
      duration:  event.duration_label(at, format),
    }
  }

  fn csv_fields(&self) -> [String; 7] {
    let ts = |t: DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Secs, true);
    [
      self.subject.clone(),
      self.kind.clone(),
      self.note.clone(),
      self.state.clone(),
      ts(self.opened_at),
      self.closed_at.map(ts).unwrap_or_default(),
      self.duration.clone(),
    ]
  }
}

/// Quote a field when it contains a separator, quote or line break.
fn escape_csv(field: &str) -> String {
  if field.contains([',', '"', '\n', '\r']) {
    format!("\"{}\"", field.replace('"', "\"\""))
  } else {
    field.to_owned()
  }
}

fn push_record<I, T>(out: &mut String, fields: I)
where
  I: IntoIterator<Item = T>,
  T: AsRef<str>,
{
  let line = fields
    .into_iter()
    .map(|f| escape_csv(f.as_ref()))
    .collect::<Vec<_>>()
    .join(",");
  out.push_str(&line);
  out.push_str("\r\n");
}

/// Render rows as CSV with CRLF line endings.
pub fn to_csv(rows: &[ExportRow]) -> String {
  let mut out = String::new();
  push_record(&mut out, CSV_HEADER);
  for row in rows {
    push_record(&mut out, row.csv_fields());
  }
  out
}

async fn rows<S: PtsStore>(state: &AppState<S>) -> Result<Vec<ExportRow>, Error> {
  let at = now();
  let format = state.ledger.options().duration_format;
  let events = state.ledger.list_all(None, None).await?;
  Ok(events.iter().map(|e| ExportRow::from_event(e, at, format)).collect())
}

/// `GET /admin/export`
pub async fn json<S>(
  State(state): State<AppState<S>>,
  AdminOnly(_): AdminOnly,
) -> Result<Json<Vec<ExportRow>>, Error>
where
  S: PtsStore + Clone + 'static,
{
  Ok(Json(rows(&state).await?))
}

/// `GET /admin/export.csv`
pub async fn csv<S>(
  State(state): State<AppState<S>>,
  AdminOnly(_): AdminOnly,
) -> Result<impl IntoResponse, Error>
where
  S: PtsStore + Clone + 'static,
{
  let body = to_csv(&rows(&state).await?);
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (header::CONTENT_DISPOSITION, "attachment; filename=\"pts-export.csv\""),
    ],
    body,
  ))
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone as _};
  use pts_core::{
    event::{EventKind, EventState},
    subject::Subject,
  };

  use super::*;

  fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
  }

  #[test]
  fn escapes_only_when_needed() {
    assert_eq!(escape_csv("alice"), "alice");
    assert_eq!(escape_csv("a,b"), "\"a,b\"");
    assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
  }

  #[test]
  fn open_event_runs_to_export_time() {
    let e = AttendanceEvent::open(Subject::new("alice").unwrap(), EventKind::Terminal, at(9, 0));
    let row = ExportRow::from_event(&e, at(10, 30), DurationFormat::HoursMinutes);
    assert_eq!(row.state, "open");
    assert_eq!(row.closed_at, None);
    assert_eq!(row.duration, "1s 30dk");
  }

  #[test]
  fn closed_event_uses_closed_at() {
    let mut e =
      AttendanceEvent::open(Subject::new("bob").unwrap(), EventKind::Terminal, at(9, 0));
    e.closed_at = Some(at(9, 0) + TimeDelta::minutes(45));
    e.state = EventState::Closed;
    e.note = "Geri Döndü (0s 45dk)".into();

    let row = ExportRow::from_event(&e, at(18, 0), DurationFormat::Minutes);
    assert_eq!(row.duration, "45 dk");

    let csv = to_csv(&[row]);
    let mut lines = csv.split("\r\n");
    assert_eq!(
      lines.next(),
      Some("subject,kind,note,state,opened_at,closed_at,duration")
    );
    assert_eq!(
      lines.next(),
      Some("bob,terminal,Geri Döndü (0s 45dk),closed,2026-03-02T09:00:00Z,2026-03-02T09:45:00Z,45 dk")
    );
    assert_eq!(lines.next(), Some(""));
  }

  #[test]
  fn force_closed_status_is_exported() {
    let mut e =
      AttendanceEvent::open(Subject::new("carol").unwrap(), EventKind::Terminal, at(9, 0));
    e.state = EventState::ForceClosed { status: "İzinli, onaylı".into() };

    let csv = to_csv(&[ExportRow::from_event(&e, at(10, 0), DurationFormat::HoursMinutes)]);
    assert!(csv.contains(",\"İzinli, onaylı\","));
  }
}
