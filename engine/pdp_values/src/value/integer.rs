//! `xs:integer` values: a 64-bit newtype whose arithmetic is always checked.
//!
//! `Integer` wraps `i64` and intentionally does NOT implement `Add`, `Sub`,
//! `Mul`, `Div`, `Rem` or `Neg`. All arithmetic goes through checked methods
//! returning `Option<Integer>`, so overflow always surfaces as an
//! Indeterminate result instead of wrapping or panicking.

use std::fmt;

use crate::errors::{invalid_lexical, EvalResult};

/// An `xs:integer` value within the signed 64-bit range.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Integer(i64);

impl Integer {
    /// The zero value.
    pub const ZERO: Self = Self(0);

    /// Create a new `Integer` from a raw `i64`.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The underlying `i64`.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whether this is zero, the one divisor that always fails.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `integer-add` on two operands; `None` past the 64-bit range.
    #[inline]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// `integer-subtract`; `None` past the 64-bit range.
    #[inline]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// `integer-multiply`; `None` past the 64-bit range.
    #[inline]
    pub const fn checked_mul(self, rhs: Self) -> Option<Self> {
        match self.0.checked_mul(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked truncating division. Returns `None` on division by zero or
    /// overflow (`i64::MIN / -1`).
    #[inline]
    pub const fn checked_div(self, rhs: Self) -> Option<Self> {
        match self.0.checked_div(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked remainder, sign of the dividend. Returns `None` on division by
    /// zero or overflow.
    #[inline]
    pub const fn checked_rem(self, rhs: Self) -> Option<Self> {
        match self.0.checked_rem(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked absolute value. Returns `None` for `i64::MIN`.
    #[inline]
    pub const fn checked_abs(self) -> Option<Self> {
        match self.0.checked_abs() {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Convert to `f64`, exact for magnitudes up to 2^53.
    #[expect(
        clippy::cast_precision_loss,
        reason = "integer-to-double is defined as the nearest double"
    )]
    pub fn to_f64(self) -> f64 {
        self.0 as f64
    }

    /// Convert a finite double to an integer by truncation toward zero.
    ///
    /// Returns `None` for NaN, infinities and values outside the i64 range.
    pub fn from_f64_truncated(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let truncated = value.trunc();
        // 2^63 is exactly representable and equals i64::MAX + 1, so the valid
        // range is -2^63 <= truncated < 2^63.
        let two_pow_63 = 2.0_f64.powi(63);
        if truncated >= two_pow_63 || truncated < -two_pow_63 {
            return None;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "range checked against the exact i64 bounds above"
        )]
        let raw = truncated as i64;
        Some(Self(raw))
    }

    /// Parse the `xs:integer` lexical form `[+-]?[0-9]+`.
    pub fn parse(input: &str) -> EvalResult<Self> {
        let digits = input
            .strip_prefix('+')
            .or_else(|| input.strip_prefix('-'))
            .unwrap_or(input);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid_lexical("integer", input, "expected [+-]digits"));
        }
        // i64 parsing rejects a leading '+' on some inputs; normalise first.
        let normalized = input.strip_prefix('+').unwrap_or(input);
        normalized
            .parse::<i64>()
            .map(Self)
            .map_err(|_| invalid_lexical("integer", input, "outside the supported 64-bit range"))
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
