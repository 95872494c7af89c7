//! Calendar arithmetic on `NaiveDateTime`
//!
//! Field setters clamp the day of month the same way a date library with
//! in-place mutation does: moving Jan 31 to February yields Feb 28 (or 29),
//! never an overflow into March.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Comparison precision used by range checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Compare calendar days only
    #[default]
    Day,
    /// Compare down to the minute (seconds are ignored)
    Minute,
}

/// Whether `year` has a February 29th
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Number of days in `month` (1-12) of `year`. Returns 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and(NaiveDate::from_ymd_opt(next_year, next_month, 1))
        .and_then(|next| next.pred_opt())
        .map_or(0, |last| last.day())
}

/// Build a date-time from parts, clamping the day into the month.
fn rebuild(value: &NaiveDateTime, year: i32, month: u32, day: u32) -> NaiveDateTime {
    let last = days_in_month(year, month).max(1);
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
        .map(|date| date.and_time(value.time()))
        .unwrap_or(*value)
}

/// Replace the year, clamping Feb 29 to Feb 28 on non-leap years.
pub fn with_year(value: &NaiveDateTime, year: i32) -> NaiveDateTime {
    rebuild(value, year, value.month(), value.day())
}

/// Replace the month (1-12). Out-of-range months leave the value unchanged.
pub fn with_month(value: &NaiveDateTime, month: u32) -> NaiveDateTime {
    if !(1..=12).contains(&month) {
        return *value;
    }
    rebuild(value, value.year(), month, value.day())
}

/// Replace the day of month. Returns `None` when the month has no such day.
pub fn with_day(value: &NaiveDateTime, day: u32) -> Option<NaiveDateTime> {
    value.date().with_day(day).map(|date| date.and_time(value.time()))
}

/// Shift by whole months, clamping the day into the target month.
pub fn add_months(value: &NaiveDateTime, delta: i32) -> NaiveDateTime {
    let total = value.year() * 12 + value.month0() as i32 + delta;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    rebuild(value, year, month, value.day())
}

/// Shift by whole years (day clamped).
pub fn add_years(value: &NaiveDateTime, delta: i32) -> NaiveDateTime {
    with_year(value, value.year() + delta)
}

/// Replace the hour (0-23). Out-of-range hours leave the value unchanged.
pub fn with_hour(value: &NaiveDateTime, hour: u32) -> NaiveDateTime {
    value.with_hour(hour).unwrap_or(*value)
}

/// Replace the minute (0-59). Out-of-range minutes leave the value unchanged.
pub fn with_minute(value: &NaiveDateTime, minute: u32) -> NaiveDateTime {
    value.with_minute(minute).unwrap_or(*value)
}

/// First day of the month containing `value`.
pub fn first_of_month(value: &NaiveDateTime) -> NaiveDate {
    value.date().with_day(1).unwrap_or_else(|| value.date())
}

/// Weekday index with Sunday = 0.
pub fn weekday_from_sunday(date: &NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Drop everything below `granularity`.
pub fn truncate(value: &NaiveDateTime, granularity: Granularity) -> NaiveDateTime {
    match granularity {
        Granularity::Day => value.date().and_time(NaiveTime::MIN),
        Granularity::Minute => value
            .with_second(0)
            .and_then(|v| v.with_nanosecond(0))
            .unwrap_or(*value),
    }
}

/// `a < b` at the given granularity
pub fn is_before(a: &NaiveDateTime, b: &NaiveDateTime, granularity: Granularity) -> bool {
    truncate(a, granularity) < truncate(b, granularity)
}

/// `a > b` at the given granularity
pub fn is_after(a: &NaiveDateTime, b: &NaiveDateTime, granularity: Granularity) -> bool {
    truncate(a, granularity) > truncate(b, granularity)
}

/// `a == b` at the given granularity
pub fn is_same(a: &NaiveDateTime, b: &NaiveDateTime, granularity: Granularity) -> bool {
    truncate(a, granularity) == truncate(b, granularity)
}

/// Whether `value` lies in `[min, max]`, both ends inclusive.
pub fn in_range(
    value: &NaiveDateTime,
    min: &NaiveDateTime,
    max: &NaiveDateTime,
    granularity: Granularity,
) -> bool {
    !is_before(value, min, granularity) && !is_after(value, max, granularity)
}

/// Whether two values fall in the same month of the same year.
pub fn same_month(a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
