//! Closed time window used for visibility and recurrence expansion.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{FamSyncError, FamSyncResult};
use crate::time::{self, Instant};

/// Number of days a listing covers when no end is given.
pub const DEFAULT_LISTING_DAYS: i64 = 7;

/// The `[start, end]` window, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Instant,
    pub end: Instant,
}

impl DateRange {
    pub fn new(start: Instant, end: Instant) -> Self {
        DateRange { start, end }
    }

    /// Parse optional ISO strings into a range.
    /// - `from`: defaults to the start of `now`'s day
    /// - `to`: defaults to `from` + DEFAULT_LISTING_DAYS
    pub fn from_args(from: Option<&str>, to: Option<&str>, now: Instant) -> FamSyncResult<Self> {
        let start = match from {
            Some(s) => time::parse_instant(s)?,
            None => time::start_of_day(now),
        };

        let end = match to {
            Some(s) => time::parse_instant(s)?,
            None => time::checked_shift(start, Duration::days(DEFAULT_LISTING_DAYS))?,
        };

        if end < start {
            return Err(FamSyncError::Validation(format!(
                "Range end {} is before its start {}",
                time::format_instant(end),
                time::format_instant(start)
            )));
        }

        Ok(DateRange { start, end })
    }

    pub fn contains(&self, t: Instant) -> bool {
        time::is_within_interval(t, self.start, self.end)
    }

    /// True if either endpoint of `[start, end]` falls inside the window.
    ///
    /// A span that starts before the window and ends after it does not count.
    pub fn touches(&self, start: Instant, end: Instant) -> bool {
        self.contains(start) || self.contains(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> Instant {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn from_args_defaults_to_a_week_from_today() {
        let now = day(10) + Duration::hours(14);
        let range = DateRange::from_args(None, None, now).unwrap();
        assert_eq!(range.start, day(10));
        assert_eq!(range.end, day(17));
    }

    #[test]
    fn from_args_parses_both_ends() {
        let range = DateRange::from_args(Some("2025-03-01"), Some("2025-03-05T12:00"), day(1)).unwrap();
        assert_eq!(range.start, day(1));
        assert_eq!(range.end, day(5) + Duration::hours(12));
    }

    #[test]
    fn from_args_rejects_inverted_range() {
        let err = DateRange::from_args(Some("2025-03-05"), Some("2025-03-01"), day(1));
        assert!(matches!(err, Err(FamSyncError::Validation(_))));
    }

    #[test]
    fn from_args_near_the_last_supported_year() {
        let err = DateRange::from_args(Some("9999-12-30"), None, day(1));
        assert!(matches!(err, Err(FamSyncError::InvalidDate(_))));
        let err = DateRange::from_args(Some("+262142-12-31T23:30"), None, day(1));
        assert!(matches!(err, Err(FamSyncError::InvalidDate(_))));
    }

    #[test]
    fn touches_requires_an_endpoint_inside() {
        let range = DateRange::new(day(10), day(12));
        assert!(range.touches(day(9), day(10)));
        assert!(range.touches(day(12), day(13)));
        assert!(!range.touches(day(9), day(13)));
        assert!(!range.touches(day(13), day(14)));
    }
}
