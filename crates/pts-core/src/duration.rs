//! Elapsed-time arithmetic and the human-readable duration label.
//!
//! Two display modes exist for the same computation: the compact
//! minutes-only form (`"47 dk"`) and the hours-and-minutes form
//! (`"2s 5dk"`). Both truncate to whole minutes.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How [`duration_label`] renders an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationFormat {
  /// `"<hours>s <minutes>dk"`, e.g. `"2s 5dk"` or `"0s 47dk"`.
  #[default]
  HoursMinutes,
  /// Legacy display: `"<minutes> dk"`, e.g. `"125 dk"`.
  Minutes,
}

/// Elapsed time between `start` and `end`, clamped to zero when the clock
/// went backwards.
pub fn elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeDelta {
  end.signed_duration_since(start).max(TimeDelta::zero())
}

/// Format the interval `start..end` in whole minutes.
pub fn duration_label(
  start: DateTime<Utc>,
  end: DateTime<Utc>,
  format: DurationFormat,
) -> String {
  format_elapsed(elapsed(start, end), format)
}

/// Format an already computed, non-negative duration.
pub fn format_elapsed(delta: TimeDelta, format: DurationFormat) -> String {
  let minutes = delta.num_minutes().max(0);
  match format {
    DurationFormat::HoursMinutes => {
      format!("{}s {}dk", minutes / 60, minutes % 60)
    }
    DurationFormat::Minutes => format!("{minutes} dk"),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
  }

  #[test]
  fn hours_and_minutes() {
    let end = t0() + TimeDelta::minutes(125);
    assert_eq!(duration_label(t0(), end, DurationFormat::HoursMinutes), "2s 5dk");
    assert_eq!(duration_label(t0(), end, DurationFormat::Minutes), "125 dk");
  }

  #[test]
  fn under_an_hour() {
    let end = t0() + TimeDelta::minutes(5);
    assert_eq!(duration_label(t0(), end, DurationFormat::HoursMinutes), "0s 5dk");
    assert_eq!(duration_label(t0(), end, DurationFormat::Minutes), "5 dk");
  }

  #[test]
  fn partial_minutes_truncate() {
    let end = t0() + TimeDelta::seconds(59 * 60 + 59);
    assert_eq!(duration_label(t0(), end, DurationFormat::Minutes), "59 dk");
  }

  #[test]
  fn backwards_clock_is_zero() {
    let end = t0() - TimeDelta::minutes(3);
    assert_eq!(elapsed(t0(), end), TimeDelta::zero());
    assert_eq!(duration_label(t0(), end, DurationFormat::HoursMinutes), "0s 0dk");
  }
}
