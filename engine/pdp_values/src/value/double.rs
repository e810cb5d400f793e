//! `xs:double` lexical handling and value identity.

use std::fmt;
use std::hash::Hasher;

use crate::errors::{invalid_lexical, EvalResult};

/// Parse the `xs:double` lexical space.
///
/// Accepts decimal and exponent forms plus `INF`, `+INF`, `-INF` and `NaN`.
/// Rust's own float grammar (`inf`, `infinity`, `nan`) is not accepted.
pub(super) fn parse(input: &str) -> EvalResult<f64> {
    match input {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    let fail = |reason: &str| invalid_lexical("double", input, reason);
    let unsigned = input
        .strip_prefix('+')
        .or_else(|| input.strip_prefix('-'))
        .unwrap_or(input);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !digits(int_part) || !digits(frac_part) {
        return Err(fail("malformed mantissa"));
    }
    if let Some(exponent) = exponent {
        let exp_digits = exponent
            .strip_prefix('+')
            .or_else(|| exponent.strip_prefix('-'))
            .unwrap_or(exponent);
        if exp_digits.is_empty() || !digits(exp_digits) {
            return Err(fail("malformed exponent"));
        }
    }
    input.parse::<f64>().map_err(|_| fail("not a number"))
}

/// Canonical lexical form; the shortest string that reads back exactly.
#[allow(clippy::float_cmp, reason = "exact comparison against infinities")]
pub(super) fn write(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value == f64::INFINITY {
        f.write_str("INF")
    } else if value == f64::NEG_INFINITY {
        f.write_str("-INF")
    } else {
        write!(f, "{value:?}")
    }
}

/// Value equality: IEEE equality, except every NaN equals every NaN.
#[allow(clippy::float_cmp, reason = "value identity is exact")]
pub(super) fn eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Hash consistent with [`eq`]: `-0.0` and `0.0` collide, all NaNs collide.
pub(super) fn hash<H: Hasher>(value: f64, state: &mut H) {
    let canonical = if value == 0.0 {
        0.0_f64
    } else if value.is_nan() {
        f64::NAN
    } else {
        value
    };
    state.write_u64(canonical.to_bits());
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::float_cmp,
    reason = "Tests use unwrap for brevity and compare exact results"
)]
mod tests {
    use super::*;

    struct Show(f64);

    impl fmt::Display for Show {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write(f, self.0)
        }
    }

    #[test]
    fn test_parse_lexical_space() {
        assert_eq!(parse("1.5").unwrap(), 1.5);
        assert_eq!(parse("-.5e2").unwrap(), -50.0);
        assert_eq!(parse("7.").unwrap(), 7.0);
        assert_eq!(parse("1E+3").unwrap(), 1000.0);
        assert_eq!(parse("+INF").unwrap(), f64::INFINITY);
        assert!(parse("NaN").unwrap().is_nan());
        for bad in ["", ".", "inf", "nan", "infinity", "1e", "1.2.3", "0x10", " 1"] {
            assert!(parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_canonical_form_reads_back() {
        for v in [0.1, -2.5, 1e20, 1e-7, 123_456.0] {
            let text = Show(v).to_string();
            assert_eq!(parse(&text).unwrap(), v, "{text}");
        }
        assert_eq!(Show(f64::NEG_INFINITY).to_string(), "-INF");
        assert_eq!(Show(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_identity() {
        assert!(eq(0.0, -0.0));
        assert!(eq(f64::NAN, f64::NAN));
        assert!(!eq(1.0, 1.000_000_1));
    }
}
