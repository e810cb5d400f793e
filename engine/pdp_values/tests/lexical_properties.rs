//! Property-based tests for the lexical forms of attribute values.
//!
//! For every generated value `v` of kind `k`:
//! 1. `parse(k, v.to_string()) == v`
//! 2. The canonical form is a fixed point: printing the re-parsed value
//!    yields the same text.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use pdp_values::{AttributeValue, PrimitiveKind};
use proptest::prelude::*;

fn assert_round_trip(value: &AttributeValue) {
    let text = value.to_string();
    let reparsed = AttributeValue::parse(value.kind(), &text).unwrap();
    assert_eq!(&reparsed, value, "{text}");
    assert_eq!(reparsed.to_string(), text);
}

// -- Strategies --

fn timezone_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("Z".to_string()),
        (-840i32..=840).prop_map(|minutes| {
            let sign = if minutes < 0 { '-' } else { '+' };
            let abs = minutes.unsigned_abs();
            format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
        }),
    ]
}

fn fraction_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        (0u32..1_000_000_000).prop_map(|n| format!(".{n:09}")),
    ]
}

fn date_strategy() -> impl Strategy<Value = String> {
    (1i32..=9999, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}"))
}

fn time_strategy() -> impl Strategy<Value = String> {
    (0u32..24, 0u32..60, 0u32..60, fraction_strategy())
        .prop_map(|(h, m, s, frac)| format!("{h:02}:{m:02}:{s:02}{frac}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn integer_round_trips(n in any::<i64>()) {
        assert_round_trip(&AttributeValue::integer(n));
    }

    #[test]
    fn double_round_trips(d in any::<f64>().prop_filter("NaN has no identity", |d| !d.is_nan())) {
        assert_round_trip(&AttributeValue::double(d));
    }

    #[test]
    fn string_round_trips(s in "\\PC*") {
        assert_round_trip(&AttributeValue::string(&s));
    }

    #[test]
    fn binary_round_trips(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        assert_round_trip(&AttributeValue::hex_binary(bytes.clone()));
        assert_round_trip(&AttributeValue::base64_binary(bytes));
    }

    #[test]
    fn date_time_round_trips(date in date_strategy(), time in time_strategy(), tz in timezone_strategy()) {
        let value = AttributeValue::parse(PrimitiveKind::DateTime, &format!("{date}T{time}{tz}")).unwrap();
        assert_round_trip(&value);
        let value = AttributeValue::parse(PrimitiveKind::Date, &format!("{date}{tz}")).unwrap();
        assert_round_trip(&value);
        let value = AttributeValue::parse(PrimitiveKind::Time, &format!("{time}{tz}")).unwrap();
        assert_round_trip(&value);
    }

    #[test]
    fn day_time_duration_round_trips(
        negative in any::<bool>(),
        days in 0u32..100_000,
        seconds in 0u32..200_000,
        frac in fraction_strategy(),
    ) {
        let sign = if negative { "-" } else { "" };
        let text = format!("{sign}P{days}DT{seconds}{frac}S");
        let value = AttributeValue::parse(PrimitiveKind::DayTimeDuration, &text).unwrap();
        assert_round_trip(&value);
    }

    #[test]
    fn year_month_duration_round_trips(negative in any::<bool>(), years in 0u32..10_000, months in 0u32..40) {
        let sign = if negative { "-" } else { "" };
        let text = format!("{sign}P{years}Y{months}M");
        let value = AttributeValue::parse(PrimitiveKind::YearMonthDuration, &text).unwrap();
        assert_round_trip(&value);
    }

    #[test]
    fn ip_address_round_trips(octets in any::<[u8; 4]>(), port in proptest::option::of(any::<u16>())) {
        let [a, b, c, d] = octets;
        let text = match port {
            Some(p) => format!("{a}.{b}.{c}.{d}:{p}"),
            None => format!("{a}.{b}.{c}.{d}"),
        };
        let value = AttributeValue::parse(PrimitiveKind::IpAddress, &text).unwrap();
        prop_assert_eq!(value.to_string(), text);
    }

    #[test]
    fn arbitrary_text_never_panics(kind_index in 0usize..16, text in "\\PC{0,24}") {
        let kind = PrimitiveKind::ALL[kind_index];
        if let Ok(value) = AttributeValue::parse(kind, &text) {
            prop_assert_eq!(value.kind(), kind);
        }
    }
}
