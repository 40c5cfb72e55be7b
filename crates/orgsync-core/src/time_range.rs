//! The inclusive window a sync run covers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
  start: DateTime<Utc>,
  end:   DateTime<Utc>,
}

impl TimeRange {
  pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
    if start > end {
      return Err(Error::InvalidTimeRange { start, end });
    }
    Ok(Self { start, end })
  }

  pub fn start(&self) -> DateTime<Utc> { self.start }

  pub fn end(&self) -> DateTime<Utc> { self.end }

  /// Closed-interval membership.
  pub fn contains(&self, instant: DateTime<Utc>) -> bool {
    self.start <= instant && instant <= self.end
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn bounds_are_inclusive() {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    let range = TimeRange::new(start, end).unwrap();
    assert!(range.contains(start));
    assert!(range.contains(end));
    assert!(!range.contains(end + chrono::TimeDelta::seconds(1)));
    assert!(!range.contains(start - chrono::TimeDelta::seconds(1)));
  }

  #[test]
  fn single_instant_range_is_valid() {
    let instant = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let range = TimeRange::new(instant, instant).unwrap();
    assert_eq!(range.start(), range.end());
    assert!(range.contains(instant));
  }

  #[test]
  fn reversed_range_is_rejected() {
    let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(matches!(
      TimeRange::new(start, end),
      Err(Error::InvalidTimeRange { .. })
    ));
  }
}
