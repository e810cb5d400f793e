//! `xs:dayTimeDuration` and `xs:yearMonthDuration`.
//!
//! Both are stored as a single signed magnitude (nanoseconds, months), so
//! derived equality and ordering match value semantics: `PT24H == P1D`.

use std::fmt;

use chrono::TimeDelta;

use crate::errors::{invalid_lexical, EvalResult};

const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MINUTE: i128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i128 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i128 = 24 * NANOS_PER_HOUR;

/// Leading `-` and mandatory `P`.
fn split_sign<'a>(input: &'a str, datatype: &'static str) -> EvalResult<(bool, &'a str)> {
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let body = rest
        .strip_prefix('P')
        .ok_or_else(|| invalid_lexical(datatype, input, "must start with 'P'"))?;
    Ok((negative, body))
}

/// Scan `<digits><unit>` components in `units` order; returns `(unit, digits)`.
fn components<'a>(
    body: &'a str,
    units: &[char],
) -> Result<Vec<(char, &'a str)>, &'static str> {
    let mut out = Vec::new();
    let mut rest = body;
    let mut next_unit = 0;
    while !rest.is_empty() {
        let end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or("number without unit designator")?;
        let (number, tail) = rest.split_at(end);
        if number.is_empty() {
            return Err("unit designator without number");
        }
        let unit = tail.chars().next().ok_or("number without unit designator")?;
        let position = units[next_unit..]
            .iter()
            .position(|u| *u == unit)
            .ok_or("unexpected or out-of-order unit designator")?;
        next_unit += position + 1;
        out.push((unit, number));
        rest = &tail[unit.len_utf8()..];
    }
    Ok(out)
}

fn whole(number: &str) -> Result<i128, &'static str> {
    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err("fraction only allowed on seconds");
    }
    number.parse::<i128>().map_err(|_| "component too large")
}

/// Seconds with optional fraction, in nanoseconds.
fn seconds_nanos(number: &str) -> Result<i128, &'static str> {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() || (number.contains('.') && frac_part.is_empty()) {
        return Err("malformed seconds");
    }
    let seconds = whole(int_part)?;
    let mut nanos: i128 = 0;
    let mut scale = NANOS_PER_SECOND / 10;
    for b in frac_part.bytes() {
        if !b.is_ascii_digit() {
            return Err("malformed seconds");
        }
        nanos += i128::from(b - b'0') * scale;
        scale /= 10;
    }
    seconds
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|s| s.checked_add(nanos))
        .ok_or("component too large")
}

/// An `xs:dayTimeDuration` with nanosecond precision.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayTimeDuration {
    nanos: i128,
}

impl DayTimeDuration {
    /// The zero-length duration.
    pub const ZERO: Self = DayTimeDuration { nanos: 0 };

    /// Duration of the given signed number of nanoseconds.
    pub const fn from_nanos(nanos: i128) -> Self {
        DayTimeDuration { nanos }
    }

    /// Signed length in nanoseconds.
    pub const fn total_nanos(&self) -> i128 {
        self.nanos
    }

    /// Negated duration.
    pub fn checked_neg(&self) -> Option<Self> {
        self.nanos.checked_neg().map(Self::from_nanos)
    }

    /// Convert to a chrono delta; `None` beyond chrono's range.
    pub fn to_time_delta(&self) -> Option<TimeDelta> {
        let seconds = i64::try_from(self.nanos.div_euclid(NANOS_PER_SECOND)).ok()?;
        let nanos = u32::try_from(self.nanos.rem_euclid(NANOS_PER_SECOND)).ok()?;
        TimeDelta::new(seconds, nanos)
    }

    /// Parse `-?P(nD)?(T(nH)?(nM)?(n(.n)?S)?)?` with at least one component.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("dayTimeDuration", input, reason);
        let (negative, body) = split_sign(input, "dayTimeDuration")?;
        let (date_part, time_part) = match body.split_once('T') {
            Some((_, "")) => return Err(fail("'T' must be followed by a time component")),
            Some((d, t)) => (d, Some(t)),
            None => (body, None),
        };

        let mut nanos: i128 = 0;
        let mut seen = false;
        for (unit, number) in components(date_part, &['D']).map_err(fail)? {
            debug_assert_eq!(unit, 'D');
            nanos = whole(number)
                .map_err(fail)?
                .checked_mul(NANOS_PER_DAY)
                .ok_or_else(|| fail("component too large"))?;
            seen = true;
        }
        if let Some(time_part) = time_part {
            for (unit, number) in components(time_part, &['H', 'M', 'S']).map_err(fail)? {
                let part = match unit {
                    'H' => whole(number).map_err(fail)?.checked_mul(NANOS_PER_HOUR),
                    'M' => whole(number).map_err(fail)?.checked_mul(NANOS_PER_MINUTE),
                    _ => Some(seconds_nanos(number).map_err(fail)?),
                };
                nanos = part
                    .and_then(|p| nanos.checked_add(p))
                    .ok_or_else(|| fail("component too large"))?;
                seen = true;
            }
        }
        if !seen {
            return Err(fail("at least one component is required"));
        }
        Ok(DayTimeDuration::from_nanos(if negative { -nanos } else { nanos }))
    }
}

impl fmt::Display for DayTimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            return f.write_str("PT0S");
        }
        if self.nanos < 0 {
            f.write_str("-")?;
        }
        let abs = self.nanos.unsigned_abs();
        let days = abs / NANOS_PER_DAY.unsigned_abs();
        let rest = abs % NANOS_PER_DAY.unsigned_abs();
        let hours = rest / NANOS_PER_HOUR.unsigned_abs();
        let minutes = rest % NANOS_PER_HOUR.unsigned_abs() / NANOS_PER_MINUTE.unsigned_abs();
        let seconds = rest % NANOS_PER_MINUTE.unsigned_abs() / NANOS_PER_SECOND.unsigned_abs();
        let fraction = rest % NANOS_PER_SECOND.unsigned_abs();

        f.write_str("P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if rest > 0 {
            f.write_str("T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if seconds > 0 || fraction > 0 {
                write!(f, "{seconds}")?;
                if fraction > 0 {
                    let digits = format!("{fraction:09}");
                    write!(f, ".{}", digits.trim_end_matches('0'))?;
                }
                f.write_str("S")?;
            }
        }
        Ok(())
    }
}

/// An `xs:yearMonthDuration`, stored as signed total months.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonthDuration {
    months: i64,
}

impl YearMonthDuration {
    /// Duration of the given signed number of months.
    pub const fn from_months(months: i64) -> Self {
        YearMonthDuration { months }
    }

    /// Signed total months.
    pub const fn months(&self) -> i64 {
        self.months
    }

    /// Negated duration.
    pub fn checked_neg(&self) -> Option<Self> {
        self.months.checked_neg().map(Self::from_months)
    }

    /// Parse `-?P(nY)?(nM)?` with at least one component.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let fail = |reason: &str| invalid_lexical("yearMonthDuration", input, reason);
        let (negative, body) = split_sign(input, "yearMonthDuration")?;
        let parts = components(body, &['Y', 'M']).map_err(fail)?;
        if parts.is_empty() {
            return Err(fail("at least one component is required"));
        }
        let mut months: i128 = 0;
        for (unit, number) in parts {
            let n = whole(number).map_err(fail)?;
            let part = if unit == 'Y' { n.checked_mul(12) } else { Some(n) };
            months = part
                .and_then(|p| months.checked_add(p))
                .ok_or_else(|| fail("component too large"))?;
        }
        let months = i64::try_from(if negative { -months } else { months })
            .map_err(|_| fail("outside the supported range"))?;
        Ok(YearMonthDuration::from_months(months))
    }
}

impl fmt::Display for YearMonthDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 {
            return f.write_str("P0M");
        }
        if self.months < 0 {
            f.write_str("-")?;
        }
        let abs = self.months.unsigned_abs();
        let (years, months) = (abs / 12, abs % 12);
        f.write_str("P")?;
        if years > 0 {
            write!(f, "{years}Y")?;
        }
        if months > 0 {
            write!(f, "{months}M")?;
        }
        Ok(())
    }
}
