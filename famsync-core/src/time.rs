//! Calendar arithmetic on local wall-clock instants.
//!
//! Everything here works on date components rather than epoch offsets, so
//! stepping by days, weeks or months never drifts across DST changes.
//!
//! Month addition clamps to the length of the target month: Jan 31 plus one
//! month is Feb 28 (Feb 29 in a leap year). The clamped day is not remembered,
//! so stepping again from Feb 28 lands on Mar 28.

use chrono::{
    DateTime, Datelike, Days, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime,
    Weekday,
};
use serde::{Deserialize, Serialize};

use crate::error::{FamSyncError, FamSyncResult};

/// A local wall-clock instant.
pub type Instant = NaiveDateTime;

/// Earliest year accepted from callers.
pub const MIN_YEAR: i32 = 1;

/// Latest year accepted from callers. Stepping a few hundred periods past it
/// stays far inside what `NaiveDateTime` can represent.
pub const MAX_YEAR: i32 = 9999;

/// First day of the week for week-based views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
        }
    }
}

pub fn start_of_day(t: Instant) -> Instant {
    t.date().and_time(NaiveTime::MIN)
}

/// Last representable millisecond of the day.
pub fn end_of_day(t: Instant) -> Instant {
    start_of_day(t) + Duration::days(1) - Duration::milliseconds(1)
}

/// Midnight on the first day of the week containing `t`.
pub fn start_of_week(t: Instant, week_start: WeekStart) -> Instant {
    let offset = (7 + t.weekday().num_days_from_sunday()
        - week_start.weekday().num_days_from_sunday())
        % 7;
    start_of_day(t) - Duration::days(i64::from(offset))
}

pub fn end_of_week(t: Instant, week_start: WeekStart) -> Instant {
    end_of_day(start_of_week(t, week_start) + Duration::days(6))
}

pub fn start_of_month(t: Instant) -> Instant {
    let first = t.date() - Days::new(u64::from(t.day0()));
    first.and_time(NaiveTime::MIN)
}

pub fn end_of_month(t: Instant) -> Instant {
    add_months(start_of_month(t), 1) - Duration::milliseconds(1)
}

pub fn add_days(t: Instant, n: i64) -> Instant {
    t + Duration::days(n)
}

pub fn add_weeks(t: Instant, n: i64) -> Instant {
    t + Duration::weeks(n)
}

/// Calendar-aware month addition, clamping the day to the target month.
pub fn add_months(t: Instant, n: i32) -> Instant {
    let months = Months::new(n.unsigned_abs());
    let shifted = if n >= 0 {
        t.checked_add_months(months)
    } else {
        t.checked_sub_months(months)
    };
    shifted.unwrap_or(if n >= 0 {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    })
}

/// `t + d`, or an `InvalidDate` error when the result leaves the supported
/// years.
pub fn checked_shift(t: Instant, d: Duration) -> FamSyncResult<Instant> {
    t.checked_add_signed(d)
        .filter(|shifted| in_supported_years(*shifted))
        .ok_or_else(|| FamSyncError::InvalidDate(format!("{} shifted by {d}", format_instant(t))))
}

pub fn in_supported_years(t: Instant) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&t.year())
}

/// `start <= t <= end`. An inverted interval contains nothing.
pub fn is_within_interval(t: Instant, start: Instant, end: Instant) -> bool {
    start <= t && t <= end
}

pub fn is_same_day(a: Instant, b: Instant) -> bool {
    a.date() == b.date()
}

/// Parse an ISO-8601 string into a local instant.
///
/// Accepts RFC 3339 with an offset (converted to local time), a naive
/// date-time (`2025-03-20T15:00`, seconds optional) or a bare date
/// (midnight).
pub fn parse_instant(s: &str) -> FamSyncResult<Instant> {
    let s = s.trim();
    let parsed = parse_iso(s).ok_or_else(|| FamSyncError::InvalidDate(s.to_string()))?;

    if !in_supported_years(parsed) {
        return Err(FamSyncError::InvalidDate(format!(
            "{s} (years {MIN_YEAR} to {MAX_YEAR} only)"
        )));
    }
    Ok(parsed)
}

fn parse_iso(s: &str) -> Option<Instant> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Format an instant for the wire (`YYYY-MM-DDTHH:MM:SS`).
pub fn format_instant(t: Instant) -> String {
    t.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Instant {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn start_of_week_truncates_to_sunday_midnight() {
        // 2025-03-20 is a Thursday
        let t = at(2025, 3, 20, 15, 30);
        assert_eq!(start_of_week(t, WeekStart::Sunday), at(2025, 3, 16, 0, 0));
        assert_eq!(start_of_week(t, WeekStart::Monday), at(2025, 3, 17, 0, 0));
    }

    #[test]
    fn start_of_week_on_first_day_is_same_day() {
        let sunday = at(2025, 3, 16, 9, 0);
        assert_eq!(start_of_week(sunday, WeekStart::Sunday), at(2025, 3, 16, 0, 0));
        // Sunday belongs to the previous Monday-based week
        assert_eq!(start_of_week(sunday, WeekStart::Monday), at(2025, 3, 10, 0, 0));
    }

    #[test]
    fn end_of_week_is_last_millisecond_of_saturday() {
        let t = at(2025, 3, 20, 15, 30);
        let end = end_of_week(t, WeekStart::Sunday);
        assert_eq!(end.date(), NaiveDate::from_ymd_opt(2025, 3, 22).unwrap());
        assert_eq!(end + Duration::milliseconds(1), at(2025, 3, 23, 0, 0));
    }

    #[test]
    fn month_bounds() {
        let t = at(2024, 2, 14, 12, 0);
        assert_eq!(start_of_month(t), at(2024, 2, 1, 0, 0));
        assert_eq!(end_of_month(t) + Duration::milliseconds(1), at(2024, 3, 1, 0, 0));
    }

    #[test]
    fn add_months_clamps_to_month_length() {
        assert_eq!(add_months(at(2025, 1, 31, 8, 0), 1), at(2025, 2, 28, 8, 0));
        assert_eq!(add_months(at(2024, 1, 31, 8, 0), 1), at(2024, 2, 29, 8, 0));
        assert_eq!(add_months(at(2025, 3, 31, 8, 0), -1), at(2025, 2, 28, 8, 0));
        assert_eq!(add_months(at(2025, 12, 15, 8, 0), 1), at(2026, 1, 15, 8, 0));
    }

    #[test]
    fn add_days_and_weeks_keep_wall_clock_time() {
        assert_eq!(add_days(at(2025, 3, 29, 2, 30), 1), at(2025, 3, 30, 2, 30));
        assert_eq!(add_weeks(at(2025, 3, 20, 9, 0), 2), at(2025, 4, 3, 9, 0));
        assert_eq!(add_days(at(2025, 3, 1, 9, 0), -1), at(2025, 2, 28, 9, 0));
    }

    #[test]
    fn closed_interval_includes_both_ends() {
        let s = at(2025, 3, 1, 0, 0);
        let e = at(2025, 3, 2, 0, 0);
        assert!(is_within_interval(s, s, e));
        assert!(is_within_interval(e, s, e));
        assert!(!is_within_interval(e + Duration::seconds(1), s, e));
        assert!(!is_within_interval(s, e, s));
    }

    #[test]
    fn same_day_ignores_time() {
        assert!(is_same_day(at(2025, 3, 1, 0, 0), at(2025, 3, 1, 23, 59)));
        assert!(!is_same_day(at(2025, 3, 1, 23, 59), at(2025, 3, 2, 0, 0)));
    }

    #[test]
    fn parse_naive_forms() {
        assert_eq!(parse_instant("2025-03-20T15:00").unwrap(), at(2025, 3, 20, 15, 0));
        assert_eq!(parse_instant("2025-03-20T15:00:00").unwrap(), at(2025, 3, 20, 15, 0));
        assert_eq!(parse_instant("2025-03-20").unwrap(), at(2025, 3, 20, 0, 0));
        assert_eq!(parse_instant(" 2025-03-20 15:00 ").unwrap(), at(2025, 3, 20, 15, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_instant("next tuesday"),
            Err(FamSyncError::InvalidDate(_))
        ));
    }

    #[test]
    fn parse_rejects_years_out_of_range() {
        assert!(matches!(
            parse_instant("+262142-12-31T23:30"),
            Err(FamSyncError::InvalidDate(_))
        ));
        assert!(parse_instant("9999-12-31T23:30").is_ok());
        assert!(parse_instant("10000-01-01").is_err());
    }

    #[test]
    fn checked_shift_stays_in_supported_years() {
        let late = at(9999, 12, 31, 23, 30);
        assert!(matches!(
            checked_shift(late, Duration::hours(1)),
            Err(FamSyncError::InvalidDate(_))
        ));
        assert_eq!(
            checked_shift(at(2025, 3, 20, 9, 0), Duration::minutes(90)).unwrap(),
            at(2025, 3, 20, 10, 30)
        );
    }

    #[test]
    fn format_round_trips_through_parse() {
        let t = at(2025, 3, 20, 15, 0);
        assert_eq!(parse_instant(&format_instant(t)).unwrap(), t);
    }
}
