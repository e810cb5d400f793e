//! Lexical scanning and canonical formatting shared by the date/time types.
//!
//! Grammar (XML Schema 1.1 part 2, with year zero allowed):
//! - date: `-?YYYY+-MM-DD`
//! - time: `hh:mm:ss(.s+)?`, `24:00:00` allowed
//! - timezone: `Z` or `(+|-)hh:mm` with `|offset| <= 14:00`

use std::fmt::{self, Write as _};

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};

/// Maximum absolute timezone offset in minutes (14:00).
pub(super) const MAX_TZ_MINUTES: i32 = 14 * 60;

/// Split an optional trailing timezone off `input`.
pub(super) fn split_timezone(input: &str) -> Result<(&str, Option<FixedOffset>), &'static str> {
    if let Some(rest) = input.strip_suffix('Z') {
        return Ok((rest, FixedOffset::east_opt(0)));
    }
    let bytes = input.as_bytes();
    let len = bytes.len();
    if len >= 6 && matches!(bytes[len - 6], b'+' | b'-') && bytes[len - 3] == b':' {
        let (rest, tz) = input.split_at(len - 6);
        let sign = if tz.starts_with('-') { -1 } else { 1 };
        let hours = two_digits(&tz[1..3]).ok_or("malformed timezone hours")?;
        let minutes = two_digits(&tz[4..6]).ok_or("malformed timezone minutes")?;
        if minutes > 59 {
            return Err("timezone minutes out of range");
        }
        let total = i32::from(hours) * 60 + i32::from(minutes);
        if total > MAX_TZ_MINUTES {
            return Err("timezone offset beyond 14:00");
        }
        let offset = FixedOffset::east_opt(sign * total * 60).ok_or("invalid timezone")?;
        return Ok((rest, Some(offset)));
    }
    Ok((input, None))
}

/// Parse a date part `-?YYYY-MM-DD`.
pub(super) fn parse_date(input: &str) -> Result<NaiveDate, &'static str> {
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let mut parts = body.splitn(3, '-');
    let year_str = parts.next().ok_or("missing year")?;
    let month_str = parts.next().ok_or("missing month")?;
    let day_str = parts.next().ok_or("missing day")?;

    if year_str.len() < 4 || !year_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err("year must have at least four digits");
    }
    if year_str.len() > 4 && year_str.starts_with('0') {
        return Err("year with more than four digits must not start with 0");
    }
    let year: i32 = year_str.parse().map_err(|_| "year out of range")?;
    let year = if negative { -year } else { year };
    let month = two_digits(month_str).ok_or("month must have two digits")?;
    let day = two_digits(day_str).ok_or("day must have two digits")?;
    NaiveDate::from_ymd_opt(year, u32::from(month), u32::from(day)).ok_or("no such calendar date")
}

/// Parse a time part `hh:mm:ss(.s+)?`.
///
/// Returns the time and whether it was the end-of-day form `24:00:00`.
pub(super) fn parse_time(input: &str) -> Result<(NaiveTime, bool), &'static str> {
    let bytes = input.as_bytes();
    if bytes.len() < 8 || bytes[2] != b':' || bytes[5] != b':' {
        return Err("expected hh:mm:ss");
    }
    let field = |range: std::ops::Range<usize>| input.get(range).and_then(two_digits);
    let hour = field(0..2).ok_or("malformed hours")?;
    let minute = field(3..5).ok_or("malformed minutes")?;
    let second = field(6..8).ok_or("malformed seconds")?;
    let nanos = match input.get(8..).ok_or("malformed seconds")? {
        "" => 0,
        fraction => parse_fraction(fraction)?,
    };
    if hour == 24 {
        if minute != 0 || second != 0 || nanos != 0 {
            return Err("24 is only allowed as 24:00:00");
        }
        return Ok((NaiveTime::MIN, true));
    }
    if minute > 59 || second > 59 {
        return Err("minutes and seconds must be below 60");
    }
    NaiveTime::from_hms_nano_opt(u32::from(hour), u32::from(minute), u32::from(second), nanos)
        .map(|time| (time, false))
        .ok_or("hours out of range")
}

/// Parse `.ddd…` into nanoseconds; digits past the ninth are truncated.
fn parse_fraction(fraction: &str) -> Result<u32, &'static str> {
    let digits = fraction.strip_prefix('.').ok_or("unexpected characters after seconds")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err("malformed fractional seconds");
    }
    let mut nanos: u32 = 0;
    for (i, b) in digits.bytes().take(9).enumerate() {
        let digit = u32::from(b - b'0');
        nanos += digit * 10u32.pow(8 - u32::try_from(i).unwrap_or(8));
    }
    Ok(nanos)
}

fn two_digits(s: &str) -> Option<u8> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some((bytes[0] - b'0') * 10 + (bytes[1] - b'0'))
}

/// Write a date in canonical form.
pub(super) fn write_date(f: &mut fmt::Formatter<'_>, date: NaiveDate) -> fmt::Result {
    let year = date.year();
    if year < 0 {
        write!(f, "-{:04}", year.unsigned_abs())?;
    } else {
        write!(f, "{year:04}")?;
    }
    write!(f, "-{:02}-{:02}", date.month(), date.day())
}

/// Write a time in canonical form, fractional seconds without trailing zeros.
pub(super) fn write_time(f: &mut fmt::Formatter<'_>, time: NaiveTime) -> fmt::Result {
    write!(
        f,
        "{:02}:{:02}:{:02}",
        time.hour(),
        time.minute(),
        time.second()
    )?;
    let nanos = time.nanosecond();
    if nanos > 0 {
        let mut fraction = String::with_capacity(10);
        let _ = write!(fraction, "{nanos:09}");
        f.write_char('.')?;
        f.write_str(fraction.trim_end_matches('0'))?;
    }
    Ok(())
}

/// Write an optional timezone; UTC renders as `Z`.
pub(super) fn write_timezone(f: &mut fmt::Formatter<'_>, tz: Option<FixedOffset>) -> fmt::Result {
    let Some(tz) = tz else {
        return Ok(());
    };
    let seconds = tz.local_minus_utc();
    if seconds == 0 {
        return f.write_char('Z');
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    write!(f, "{sign}{:02}:{:02}", minutes / 60, minutes % 60)
}
