//! `xs:date`, `xs:time` and `xs:dateTime` values.
//!
//! Each value is a naive chrono value plus an optional fixed timezone offset.
//! Values without a timezone are only partially ordered against values with
//! one: when the two instants are within 14 hours of each other the order
//! depends on the unknown zone and the comparison is indeterminate.

mod lexical;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::errors::{indeterminate_comparison, invalid_lexical, EvalResult};

use super::duration::{DayTimeDuration, YearMonthDuration};

/// Reference date used to place an `xs:time` on the timeline.
const TIME_REFERENCE: Option<NaiveDate> = NaiveDate::from_ymd_opt(1972, 12, 31);

/// Convert a local value to UTC; `None` only at the edges of chrono's range.
fn to_utc(local: NaiveDateTime, tz: FixedOffset) -> Option<NaiveDateTime> {
    local.checked_sub_signed(TimeDelta::seconds(i64::from(tz.local_minus_utc())))
}

/// Compare two points, each optionally zoned.
///
/// Returns `None` when exactly one side is zoned and the difference is
/// within the ±14h window.
fn compare_points(
    left: NaiveDateTime,
    left_tz: Option<FixedOffset>,
    right: NaiveDateTime,
    right_tz: Option<FixedOffset>,
) -> Option<Ordering> {
    let window = TimeDelta::minutes(i64::from(lexical::MAX_TZ_MINUTES));
    match (left_tz, right_tz) {
        (None, None) => Some(left.cmp(&right)),
        (Some(l), Some(r)) => Some(to_utc(left, l)?.cmp(&to_utc(right, r)?)),
        (Some(l), None) => {
            let l = to_utc(left, l)?;
            // Unzoned value could be anywhere in [right - 14h, right + 14h].
            if l < right.checked_sub_signed(window)? {
                Some(Ordering::Less)
            } else if l > right.checked_add_signed(window)? {
                Some(Ordering::Greater)
            } else {
                None
            }
        }
        (None, Some(_)) => compare_points(right, right_tz, left, left_tz).map(Ordering::reverse),
    }
}

/// Identity used by `Eq`/`Hash`: zoned values by instant.
fn identity(local: NaiveDateTime, tz: Option<FixedOffset>) -> (bool, NaiveDateTime) {
    match tz {
        Some(offset) => (true, to_utc(local, offset).unwrap_or(local)),
        None => (false, local),
    }
}

// DateTime

/// An `xs:dateTime` value.
#[derive(Copy, Clone, Debug)]
pub struct DateTime {
    local: NaiveDateTime,
    tz: Option<FixedOffset>,
}

impl DateTime {
    /// Create a dateTime from a local value and optional offset.
    pub const fn new(local: NaiveDateTime, tz: Option<FixedOffset>) -> Self {
        DateTime { local, tz }
    }

    /// The local (wall clock) value.
    pub const fn local(&self) -> NaiveDateTime {
        self.local
    }

    /// The timezone offset, if the value carries one.
    pub const fn timezone(&self) -> Option<FixedOffset> {
        self.tz
    }

    /// Parse `YYYY-MM-DDThh:mm:ss(.s+)?(tz)?`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("dateTime", input, reason);
        let (body, tz) = lexical::split_timezone(input).map_err(fail)?;
        let (date, time) = body.split_once('T').ok_or_else(|| fail("missing 'T' separator"))?;
        let date = lexical::parse_date(date).map_err(fail)?;
        let (time, end_of_day) = lexical::parse_time(time).map_err(fail)?;
        let date = if end_of_day {
            date.succ_opt().ok_or_else(|| fail("date out of range"))?
        } else {
            date
        };
        Ok(DateTime::new(date.and_time(time), tz))
    }

    /// Three-way compare; indeterminate when the zones make the order unknown.
    pub fn compare(&self, other: &DateTime) -> EvalResult<Ordering> {
        compare_points(self.local, self.tz, other.local, other.tz)
            .ok_or_else(|| indeterminate_comparison(self, other))
    }

    /// Add a signed day-time duration.
    pub fn checked_add_day_time(&self, duration: &DayTimeDuration) -> Option<Self> {
        let delta = duration.to_time_delta()?;
        Some(DateTime::new(self.local.checked_add_signed(delta)?, self.tz))
    }

    /// Subtract a signed day-time duration.
    pub fn checked_sub_day_time(&self, duration: &DayTimeDuration) -> Option<Self> {
        self.checked_add_day_time(&duration.checked_neg()?)
    }

    /// Add a signed year-month duration, clamping the day to the month end.
    pub fn checked_add_year_month(&self, duration: &YearMonthDuration) -> Option<Self> {
        let local = add_months(self.local.date(), duration.months())?.and_time(self.local.time());
        Some(DateTime::new(local, self.tz))
    }

    /// Subtract a signed year-month duration.
    pub fn checked_sub_year_month(&self, duration: &YearMonthDuration) -> Option<Self> {
        self.checked_add_year_month(&duration.checked_neg()?)
    }
}

impl PartialEq for DateTime {
    fn eq(&self, other: &Self) -> bool {
        identity(self.local, self.tz) == identity(other.local, other.tz)
    }
}

impl Eq for DateTime {}

impl Hash for DateTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        identity(self.local, self.tz).hash(state);
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        lexical::write_date(f, self.local.date())?;
        f.write_str("T")?;
        lexical::write_time(f, self.local.time())?;
        lexical::write_timezone(f, self.tz)
    }
}

// Date

/// An `xs:date` value.
#[derive(Copy, Clone, Debug)]
pub struct Date {
    date: NaiveDate,
    tz: Option<FixedOffset>,
}

impl Date {
    /// Create a date from a calendar day and optional offset.
    pub const fn new(date: NaiveDate, tz: Option<FixedOffset>) -> Self {
        Date { date, tz }
    }

    /// The calendar day.
    pub const fn naive(&self) -> NaiveDate {
        self.date
    }

    /// The timezone offset, if the value carries one.
    pub const fn timezone(&self) -> Option<FixedOffset> {
        self.tz
    }

    /// Parse `-?YYYY-MM-DD(tz)?`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("date", input, reason);
        let (body, tz) = lexical::split_timezone(input).map_err(fail)?;
        let date = lexical::parse_date(body).map_err(fail)?;
        Ok(Date::new(date, tz))
    }

    fn start(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    /// Three-way compare of the starting instants.
    pub fn compare(&self, other: &Date) -> EvalResult<Ordering> {
        compare_points(self.start(), self.tz, other.start(), other.tz)
            .ok_or_else(|| indeterminate_comparison(self, other))
    }

    /// Add a signed year-month duration, clamping the day to the month end.
    pub fn checked_add_year_month(&self, duration: &YearMonthDuration) -> Option<Self> {
        Some(Date::new(add_months(self.date, duration.months())?, self.tz))
    }

    /// Subtract a signed year-month duration.
    pub fn checked_sub_year_month(&self, duration: &YearMonthDuration) -> Option<Self> {
        self.checked_add_year_month(&duration.checked_neg()?)
    }
}

impl PartialEq for Date {
    fn eq(&self, other: &Self) -> bool {
        identity(self.start(), self.tz) == identity(other.start(), other.tz)
    }
}

impl Eq for Date {}

impl Hash for Date {
    fn hash<H: Hasher>(&self, state: &mut H) {
        identity(self.start(), self.tz).hash(state);
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        lexical::write_date(f, self.date)?;
        lexical::write_timezone(f, self.tz)
    }
}

// Time

/// An `xs:time` value.
#[derive(Copy, Clone, Debug)]
pub struct Time {
    time: NaiveTime,
    tz: Option<FixedOffset>,
}

impl Time {
    /// Create a time from a wall-clock time and optional offset.
    pub const fn new(time: NaiveTime, tz: Option<FixedOffset>) -> Self {
        Time { time, tz }
    }

    /// The wall-clock time.
    pub const fn naive(&self) -> NaiveTime {
        self.time
    }

    /// The timezone offset, if the value carries one.
    pub const fn timezone(&self) -> Option<FixedOffset> {
        self.tz
    }

    /// Parse `hh:mm:ss(.s+)?(tz)?`; `24:00:00` reads as `00:00:00`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("time", input, reason);
        let (body, tz) = lexical::split_timezone(input).map_err(fail)?;
        let (time, _) = lexical::parse_time(body).map_err(fail)?;
        Ok(Time::new(time, tz))
    }

    /// The time placed on the reference date.
    pub(crate) fn on_reference_date(&self) -> NaiveDateTime {
        TIME_REFERENCE
            .unwrap_or(NaiveDate::MIN)
            .and_time(self.time)
    }

    /// Three-way compare on the reference date.
    pub fn compare(&self, other: &Time) -> EvalResult<Ordering> {
        compare_points(
            self.on_reference_date(),
            self.tz,
            other.on_reference_date(),
            other.tz,
        )
        .ok_or_else(|| indeterminate_comparison(self, other))
    }

    /// Normalize a zoned time to UTC wall-clock seconds since midnight,
    /// wrapping around the day. Unzoned times use `default_tz`.
    pub fn utc_seconds_of_day(&self, default_tz: FixedOffset) -> u32 {
        let offset = self.tz.unwrap_or(default_tz).local_minus_utc();
        let local = i64::from(chrono::Timelike::num_seconds_from_midnight(&self.time));
        let seconds = (local - i64::from(offset)).rem_euclid(86_400);
        u32::try_from(seconds).unwrap_or(0)
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        identity(self.on_reference_date(), self.tz)
            == identity(other.on_reference_date(), other.tz)
    }
}

impl Eq for Time {}

impl Hash for Time {
    fn hash<H: Hasher>(&self, state: &mut H) {
        identity(self.on_reference_date(), self.tz).hash(state);
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        lexical::write_time(f, self.time)?;
        lexical::write_timezone(f, self.tz)
    }
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}
