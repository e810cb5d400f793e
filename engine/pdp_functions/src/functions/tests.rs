use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pdp_values::{AttributeValue, Bag, EvalErrorKind, PrimitiveKind, Status, Value};
use pretty_assertions::assert_eq;

use super::{CompiledPattern, PatternCompiler, XsdPatternCompiler};
use crate::context::AttributeKey;
use crate::expr::{Argument, AttributeDesignator, Constant, Expression};
use crate::registry::FunctionRegistry;
use crate::test_helpers::{
    bag, boolean, count, dbl, eval, int, int_bag, parsed, standard_id, string_bag, text, Counting,
    MapContext,
};

fn truth(short_name: &str, args: Vec<Argument>) -> bool {
    eval(short_name, args).unwrap().as_bool().unwrap()
}

fn single(short_name: &str, args: Vec<Argument>) -> AttributeValue {
    eval(short_name, args).unwrap().into_single().unwrap()
}

fn err_kind(short_name: &str, args: Vec<Argument>) -> EvalErrorKind {
    eval(short_name, args).unwrap_err().kind
}

/// A boolean expression whose evaluation always fails with division by zero.
fn failing_boolean() -> Argument {
    let registry = FunctionRegistry::standard().unwrap();
    let divide = registry
        .bind_apply(&standard_id("integer-divide"), vec![int(1), int(0)])
        .unwrap();
    let equal = registry
        .bind_apply(&standard_id("integer-equal"), vec![Argument::from(divide), int(1)])
        .unwrap();
    Argument::from(equal)
}

fn subject(id: &str) -> AttributeKey {
    AttributeKey::new("subject", id)
}

/// `string-one-and-only` over the `subject#id` attribute.
fn one_string(id: &str) -> Argument {
    let registry = FunctionRegistry::standard().unwrap();
    let designator = AttributeDesignator::new(subject(id), PrimitiveKind::String);
    Argument::from(
        registry
            .bind_apply(&standard_id("string-one-and-only"), vec![Argument::expr(designator)])
            .unwrap(),
    )
}

// Equality

#[test]
fn test_equality() {
    assert!(truth("integer-equal", vec![int(3), int(3)]));
    assert!(!truth("string-equal", vec![text("a"), text("A")]));
    assert!(truth("string-equal-ignore-case", vec![text("ABC"), text("abc")]));
    assert!(truth("boolean-equal", vec![boolean(false), boolean(false)]));
}

#[test]
fn test_double_equal_follows_ieee() {
    assert!(!truth("double-equal", vec![dbl(f64::NAN), dbl(f64::NAN)]));
    assert!(truth("double-equal", vec![dbl(0.0), dbl(-0.0)]));
}

#[test]
fn test_temporal_equality_by_instant() {
    let dt = |s| parsed(PrimitiveKind::DateTime, s);
    assert!(truth("dateTime-equal", vec![dt("2002-05-30T09:00:00Z"), dt("2002-05-30T11:00:00+02:00")]));
    let kind = err_kind("dateTime-equal", vec![dt("2002-05-30T09:00:00Z"), dt("2002-05-30T10:00:00")]);
    assert!(matches!(kind, EvalErrorKind::IndeterminateComparison { .. }));
}

#[test]
fn test_equality_type_mismatch_is_syntax() {
    let err = eval("integer-equal", vec![int(1), text("1")]).unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
    assert!(matches!(err.kind, EvalErrorKind::ArgumentTypeMismatch { position: 2, .. }));
}

// Arithmetic

#[test]
fn test_integer_arithmetic() {
    assert_eq!(single("integer-add", vec![int(1), int(2), int(3)]), AttributeValue::integer(6));
    assert_eq!(single("integer-multiply", vec![int(2), int(3), int(4)]), AttributeValue::integer(24));
    assert_eq!(single("integer-subtract", vec![int(2), int(5)]), AttributeValue::integer(-3));
    assert_eq!(single("integer-divide", vec![int(-7), int(2)]), AttributeValue::integer(-3));
    assert_eq!(single("integer-mod", vec![int(7), int(3)]), AttributeValue::integer(1));
    assert_eq!(single("integer-abs", vec![int(-4)]), AttributeValue::integer(4));
}

#[test]
fn test_arithmetic_arity() {
    let err = eval("integer-add", vec![int(1)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArityMismatch { variadic: true, .. }));
    let err = eval("integer-subtract", vec![int(1), int(2), int(3)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArityMismatch { variadic: false, .. }));
}

#[test]
fn test_arithmetic_failures_are_indeterminate() {
    let cases = [
        ("integer-divide", vec![int(1), int(0)]),
        ("integer-mod", vec![int(1), int(0)]),
        ("integer-add", vec![int(i64::MAX), int(1)]),
        ("integer-abs", vec![int(i64::MIN)]),
        ("integer-divide", vec![int(i64::MIN), int(-1)]),
        ("double-divide", vec![dbl(1.0), dbl(0.0)]),
        ("double-multiply", vec![dbl(1e308), dbl(10.0)]),
    ];
    for (name, args) in cases {
        let err = eval(name, args).unwrap_err();
        assert_eq!(err.status(), Status::Indeterminate, "{name}");
    }
    assert_eq!(err_kind("integer-divide", vec![int(1), int(0)]), EvalErrorKind::DivisionByZero);
    assert_eq!(err_kind("integer-mod", vec![int(1), int(0)]), EvalErrorKind::ModuloByZero);
}

#[test]
fn test_rounding() {
    let cases = [
        ("round", 2.5, 3.0),
        ("round", -2.5, -2.0),
        ("round", 2.4, 2.0),
        ("floor", -1.5, -2.0),
        ("double-abs", -1.5, 1.5),
    ];
    for (name, input, expected) in cases {
        assert_eq!(single(name, vec![dbl(input)]), AttributeValue::double(expected), "{name}({input})");
    }
}

#[test]
fn test_numeric_conversion() {
    assert_eq!(single("double-to-integer", vec![dbl(2.9)]), AttributeValue::integer(2));
    assert_eq!(single("double-to-integer", vec![dbl(-2.9)]), AttributeValue::integer(-2));
    assert_eq!(single("integer-to-double", vec![int(3)]), AttributeValue::double(3.0));
    let kind = err_kind("double-to-integer", vec![dbl(1e300)]);
    assert!(matches!(kind, EvalErrorKind::InvalidConversion { .. }));
    let kind = err_kind("double-to-integer", vec![dbl(f64::NAN)]);
    assert!(matches!(kind, EvalErrorKind::InvalidConversion { .. }));
}

// Logical

#[test]
fn test_empty_connectives() {
    assert!(truth("and", vec![]));
    assert!(!truth("or", vec![]));
}

#[test]
fn test_connectives_short_circuit() {
    assert!(!truth("and", vec![boolean(false), failing_boolean()]));
    assert!(truth("or", vec![boolean(true), failing_boolean()]));

    let err = eval("and", vec![boolean(true), failing_boolean()]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArgumentIndeterminate { position: 2, .. }));
    assert_eq!(err.root_cause().kind, EvalErrorKind::DivisionByZero);
}

#[test]
fn test_skipped_arguments_are_not_evaluated() {
    let counting = Counting::new(Constant::new(AttributeValue::boolean(true)));
    let counter = counting.counter();
    assert!(!truth("and", vec![boolean(false), Argument::expr(counting)]));
    assert_eq!(count(&counter), 0);
}

#[test]
fn test_n_of() {
    assert!(truth("n-of", vec![int(0)]));
    assert!(truth("n-of", vec![int(1), boolean(true), failing_boolean()]));
    assert!(truth("n-of", vec![int(2), boolean(true), boolean(false), boolean(true)]));
    assert!(!truth("n-of", vec![int(2), boolean(false), boolean(false), boolean(true)]));

    let counting = Counting::new(Constant::new(AttributeValue::boolean(true)));
    let counter = counting.counter();
    assert!(!truth(
        "n-of",
        vec![int(2), boolean(false), boolean(false), Argument::expr(counting)]
    ));
    assert_eq!(count(&counter), 0);
}

#[test]
fn test_n_of_invalid_counts() {
    for required in [-1, 3] {
        let err = eval("n-of", vec![int(required), boolean(true), boolean(true)]).unwrap_err();
        assert_eq!(err.status(), Status::Indeterminate, "{required}");
        assert!(matches!(err.kind, EvalErrorKind::Processing { .. }));
    }
}

#[test]
fn test_not() {
    assert!(!truth("not", vec![boolean(true)]));
    assert!(truth("not", vec![boolean(false)]));
}

// Comparison

#[test]
fn test_ordering_predicates() {
    assert!(truth("integer-greater-than", vec![int(2), int(1)]));
    assert!(!truth("integer-greater-than", vec![int(1), int(1)]));
    assert!(truth("integer-greater-than-or-equal", vec![int(1), int(1)]));
    assert!(truth("double-less-than-or-equal", vec![dbl(1.0), dbl(1.0)]));
    assert!(truth("string-less-than", vec![text("abc"), text("abd")]));
    let date = |s| parsed(PrimitiveKind::Date, s);
    assert!(truth("date-less-than", vec![date("2002-05-30"), date("2002-06-01")]));
}

#[test]
fn test_mixed_zone_comparison_is_indeterminate() {
    let dt = |s| parsed(PrimitiveKind::DateTime, s);
    let err = eval(
        "dateTime-less-than",
        vec![dt("2002-05-30T09:00:00Z"), dt("2002-05-30T20:00:00")],
    )
    .unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
}

#[test]
fn test_time_in_range() {
    let t = |s| parsed(PrimitiveKind::Time, s);
    assert!(truth("time-in-range", vec![t("09:00:00Z"), t("08:00:00Z"), t("17:00:00Z")]));
    assert!(truth("time-in-range", vec![t("08:00:00Z"), t("08:00:00Z"), t("17:00:00Z")]));
    assert!(!truth("time-in-range", vec![t("18:00:00Z"), t("08:00:00Z"), t("17:00:00Z")]));
    // Wraps past midnight.
    assert!(truth("time-in-range", vec![t("23:30:00Z"), t("22:00:00Z"), t("02:00:00Z")]));
    assert!(truth("time-in-range", vec![t("01:00:00Z"), t("22:00:00Z"), t("02:00:00Z")]));
    assert!(!truth("time-in-range", vec![t("12:00:00Z"), t("22:00:00Z"), t("02:00:00Z")]));
    // Offsets normalize to UTC.
    assert!(truth("time-in-range", vec![t("10:00:00+02:00"), t("07:00:00Z"), t("09:00:00Z")]));
    // Unzoned bounds take the zone of the time.
    assert!(truth("time-in-range", vec![t("10:00:00+02:00"), t("09:00:00"), t("11:00:00")]));
}

// Date arithmetic

#[test]
fn test_date_arithmetic() {
    let dt = |s| parsed(PrimitiveKind::DateTime, s);
    let day_time = |s| parsed(PrimitiveKind::DayTimeDuration, s);
    let year_month = |s| parsed(PrimitiveKind::YearMonthDuration, s);

    let shifted = single("dateTime-add-dayTimeDuration", vec![dt("2002-05-30T23:30:00Z"), day_time("PT1H")]);
    assert_eq!(shifted.to_string(), "2002-05-31T00:30:00Z");
    let shifted = single("dateTime-subtract-dayTimeDuration", vec![dt("2002-05-30T23:30:00Z"), day_time("P1D")]);
    assert_eq!(shifted.to_string(), "2002-05-29T23:30:00Z");
    let shifted = single("dateTime-add-yearMonthDuration", vec![dt("2004-01-31T10:00:00"), year_month("P1M")]);
    assert_eq!(shifted.to_string(), "2004-02-29T10:00:00");
    let shifted = single(
        "date-subtract-yearMonthDuration",
        vec![parsed(PrimitiveKind::Date, "2004-03-31Z"), year_month("P1M")],
    );
    assert_eq!(shifted.to_string(), "2004-02-29Z");
}

#[test]
fn test_date_arithmetic_overflow_is_indeterminate() {
    let err = eval(
        "date-add-yearMonthDuration",
        vec![parsed(PrimitiveKind::Date, "2002-05-30"), parsed(PrimitiveKind::YearMonthDuration, "P999999999Y")],
    )
    .unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
}

// Bags

#[test]
fn test_one_and_only() {
    assert_eq!(single("integer-one-and-only", vec![bag(int_bag(&[5]))]), AttributeValue::integer(5));
    for values in [&[][..], &[1, 2][..]] {
        let kind = err_kind("integer-one-and-only", vec![bag(int_bag(values))]);
        assert_eq!(
            kind,
            EvalErrorKind::NotOneAndOnly {
                datatype: "integer".to_string(),
                size: values.len()
            }
        );
    }
}

#[test]
fn test_bag_size_and_membership() {
    assert_eq!(single("integer-bag-size", vec![bag(int_bag(&[1, 1, 2]))]), AttributeValue::integer(3));
    assert_eq!(single("string-bag-size", vec![bag(string_bag(&[]))]), AttributeValue::integer(0));
    assert!(truth("integer-is-in", vec![int(2), bag(int_bag(&[1, 2]))]));
    assert!(!truth("string-is-in", vec![text("c"), bag(string_bag(&["a", "b"]))]));
    // Membership agrees with double-equal, so NaN is never found.
    let nan_bag = Bag::singleton(AttributeValue::double(f64::NAN));
    assert!(!truth("double-equal", vec![dbl(f64::NAN), dbl(f64::NAN)]));
    assert!(!truth("double-is-in", vec![dbl(f64::NAN), bag(nan_bag)]));
}

fn date_time_bag(lexicals: &[&str]) -> Argument {
    let values = lexicals
        .iter()
        .map(|l| AttributeValue::parse(PrimitiveKind::DateTime, l).unwrap())
        .collect();
    bag(Bag::from_values(PrimitiveKind::DateTime, values).unwrap())
}

#[test]
fn test_is_in_agrees_with_equal_across_zones() {
    let local = || parsed(PrimitiveKind::DateTime, "2020-01-01T00:00:00");
    let utc = "2020-01-01T00:00:00Z";

    let equal = eval("dateTime-equal", vec![local(), parsed(PrimitiveKind::DateTime, utc)]).unwrap_err();
    assert!(matches!(equal.root_cause().kind, EvalErrorKind::IndeterminateComparison { .. }));

    let err = eval("dateTime-is-in", vec![local(), date_time_bag(&[utc])]).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.root_cause().kind, EvalErrorKind::IndeterminateComparison { .. }));

    // A definite match elsewhere in the bag decides the answer.
    assert!(truth(
        "dateTime-is-in",
        vec![local(), date_time_bag(&[utc, "2020-01-01T00:00:00"])]
    ));
}

#[test]
fn test_bag_constructor() {
    let value = eval("integer-bag", vec![int(1), int(2), int(2)]).unwrap();
    assert_eq!(value, Value::Bag(int_bag(&[2, 1, 2])));
    let empty = eval("string-bag", vec![]).unwrap();
    assert_eq!(empty, Value::Bag(Bag::empty(PrimitiveKind::String)));
}

#[test]
fn test_bag_kind_mismatch_is_syntax() {
    let err = eval("integer-bag-size", vec![bag(string_bag(&["a"]))]).unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
}

// Sets

#[test]
fn test_set_operations() {
    let result = eval("integer-intersection", vec![bag(int_bag(&[1, 2, 2, 3])), bag(int_bag(&[2, 3, 4]))]);
    assert_eq!(result.unwrap(), Value::Bag(int_bag(&[2, 3])));

    let result = eval(
        "integer-union",
        vec![bag(int_bag(&[1, 2])), bag(int_bag(&[2, 3])), bag(int_bag(&[3, 4]))],
    );
    assert_eq!(result.unwrap(), Value::Bag(int_bag(&[1, 2, 3, 4])));

    let union = eval("integer-union", vec![bag(int_bag(&[3, 1, 3])), bag(int_bag(&[]))])
        .unwrap()
        .into_bag()
        .unwrap();
    let order: Vec<_> = union.iter().cloned().collect();
    assert_eq!(order, vec![AttributeValue::integer(3), AttributeValue::integer(1)]);
}

#[test]
fn test_set_predicates() {
    assert!(truth("integer-subset", vec![bag(int_bag(&[1, 1])), bag(int_bag(&[1, 2]))]));
    assert!(truth("integer-subset", vec![bag(int_bag(&[])), bag(int_bag(&[]))]));
    assert!(!truth("integer-subset", vec![bag(int_bag(&[3])), bag(int_bag(&[1, 2]))]));
    assert!(truth("integer-set-equals", vec![bag(int_bag(&[1, 2, 2])), bag(int_bag(&[2, 1]))]));
    assert!(!truth("integer-set-equals", vec![bag(int_bag(&[1])), bag(int_bag(&[1, 2]))]));
    assert!(truth(
        "string-at-least-one-member-of",
        vec![bag(string_bag(&["x", "b"])), bag(string_bag(&["a", "b"]))]
    ));
    assert!(!truth(
        "integer-at-least-one-member-of",
        vec![bag(int_bag(&[])), bag(int_bag(&[1]))]
    ));
}

#[test]
fn test_sets_use_datatype_equality() {
    let nan = || Bag::singleton(AttributeValue::double(f64::NAN));
    assert!(!truth("double-subset", vec![bag(nan()), bag(nan())]));
    assert!(!truth("double-at-least-one-member-of", vec![bag(nan()), bag(nan())]));
    let meet = eval("double-intersection", vec![bag(nan()), bag(nan())]).unwrap();
    assert_eq!(meet, Value::Bag(Bag::empty(PrimitiveKind::Double)));

    // 0.0 and -0.0 are equal doubles, so the union keeps one of them.
    let zeros = Bag::from_values(
        PrimitiveKind::Double,
        vec![AttributeValue::double(0.0), AttributeValue::double(-0.0)],
    )
    .unwrap();
    let union = eval("double-union", vec![bag(zeros), bag(Bag::empty(PrimitiveKind::Double))])
        .unwrap()
        .into_bag()
        .unwrap();
    assert_eq!(union.len(), 1);
}

#[test]
fn test_set_predicates_across_zones() {
    let local = date_time_bag(&["2020-01-01T00:00:00"]);
    let zoned = date_time_bag(&["2020-01-01T00:00:00Z"]);

    let err = eval("dateTime-subset", vec![local.clone(), zoned.clone()]).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    let err = eval("dateTime-intersection", vec![local.clone(), zoned.clone()]).unwrap_err();
    assert!(matches!(err.root_cause().kind, EvalErrorKind::IndeterminateComparison { .. }));

    // A definite non-member decides subset without the indeterminate pair.
    let both = date_time_bag(&["2020-01-01T00:00:00", "2021-06-01T00:00:00Z"]);
    assert!(!truth("dateTime-subset", vec![both, zoned]));
}

#[test]
fn test_union_needs_two_bags() {
    let err = eval("integer-union", vec![bag(int_bag(&[1]))]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArityMismatch { .. }));
}

// Strings

#[test]
fn test_string_functions() {
    assert_eq!(
        single("string-concatenate", vec![text("a"), text("b"), text("c")]),
        AttributeValue::string("abc")
    );
    assert!(truth("string-starts-with", vec![text("ab"), text("abc")]));
    assert!(!truth("string-starts-with", vec![text("abc"), text("ab")]));
    assert!(truth("string-ends-with", vec![text("bc"), text("abc")]));
    assert!(truth("string-contains", vec![text(""), text("abc")]));
    let uri = parsed(PrimitiveKind::AnyUri, "http://example.com/a");
    assert!(truth("anyURI-contains", vec![text("example"), uri]));
    assert_eq!(
        single("string-normalize-space", vec![text("  a b \t")]),
        AttributeValue::string("a b")
    );
    assert_eq!(
        single("string-normalize-space", vec![text("\r\t\u{a0}a\u{3000} \n")]),
        AttributeValue::string("\u{a0}a\u{3000}")
    );
    assert_eq!(
        single("string-normalize-to-lower-case", vec![text("MiXeD")]),
        AttributeValue::string("mixed")
    );
}

#[test]
fn test_substring_counts_characters() {
    assert_eq!(single("string-substring", vec![text("hello"), int(1), int(3)]), AttributeValue::string("el"));
    assert_eq!(single("string-substring", vec![text("héllo"), int(1), int(-1)]), AttributeValue::string("éllo"));
    assert_eq!(single("string-substring", vec![text("abc"), int(3), int(3)]), AttributeValue::string(""));
    let uri = parsed(PrimitiveKind::AnyUri, "http://example.com");
    assert_eq!(single("anyURI-substring", vec![uri, int(0), int(4)]), AttributeValue::string("http"));
}

#[test]
fn test_substring_out_of_range() {
    for (begin, end) in [(3, 2), (0, 10), (-1, 2), (0, -2)] {
        let kind = err_kind("string-substring", vec![text("hello"), int(begin), int(end)]);
        assert!(matches!(kind, EvalErrorKind::SubstringOutOfRange { .. }), "{begin}..{end}");
    }
}

// Conversion

#[test]
fn test_conversions() {
    assert_eq!(single("integer-from-string", vec![text("42")]), AttributeValue::integer(42));
    assert_eq!(single("boolean-from-string", vec![text("true")]), AttributeValue::boolean(true));
    assert_eq!(single("string-from-double", vec![dbl(1.5)]), AttributeValue::string("1.5"));
    assert_eq!(single("string-from-boolean", vec![boolean(false)]), AttributeValue::string("false"));
    let dt = single("dateTime-from-string", vec![text("2002-05-30T09:30:10.500")]);
    assert_eq!(
        single("string-from-dateTime", vec![Argument::constant(dt)]),
        AttributeValue::string("2002-05-30T09:30:10.5")
    );
}

#[test]
fn test_unparsable_string_is_indeterminate() {
    let err = eval("integer-from-string", vec![text("forty-two")]).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.kind, EvalErrorKind::InvalidConversion { datatype: "integer", .. }));
}

// Names

#[test]
fn test_x500_name_match() {
    let name = |s| parsed(PrimitiveKind::X500Name, s);
    assert!(truth(
        "x500Name-match",
        vec![name("o=Medico Corp,c=US"), name("cn=John Smith, O=medico corp, c=US")]
    ));
    assert!(!truth(
        "x500Name-match",
        vec![name("o=Other,c=US"), name("cn=John Smith,o=Medico Corp,c=US")]
    ));
}

#[test]
fn test_rfc822_name_match() {
    let mailbox = |s| parsed(PrimitiveKind::Rfc822Name, s);
    assert!(truth("rfc822Name-match", vec![text("EXAMPLE.com"), mailbox("anne@example.com")]));
    assert!(truth("rfc822Name-match", vec![text(".example.com"), mailbox("anne@mail.example.com")]));
    assert!(!truth("rfc822Name-match", vec![text(".example.com"), mailbox("anne@example.com")]));
    assert!(truth("rfc822Name-match", vec![text("anne@EXAMPLE.com"), mailbox("anne@example.com")]));
    assert!(!truth("rfc822Name-match", vec![text("Anne@example.com"), mailbox("anne@example.com")]));
}

// Regular expressions

#[test]
fn test_regexp_match() {
    assert!(truth("string-regexp-match", vec![text("^a.c$"), text("abc")]));
    assert!(truth("string-regexp-match", vec![text("b"), text("abc")]));
    assert!(!truth("string-regexp-match", vec![text("^b"), text("abc")]));
    let ip = parsed(PrimitiveKind::IpAddress, "10.0.0.1");
    assert!(truth("ipAddress-regexp-match", vec![text(r"^10\."), ip]));
    let mailbox = parsed(PrimitiveKind::Rfc822Name, "anne@example.com");
    assert!(truth("rfc822Name-regexp-match", vec![text("@example"), mailbox]));
}

fn regexp_matches(pattern: &str, subject: &str) -> bool {
    truth("string-regexp-match", vec![text(pattern), text(subject)])
}

#[test]
fn test_schema_escapes_keep_schema_meaning() {
    // \w excludes punctuation such as `_` but includes symbols such as `+`.
    assert!(!regexp_matches(r"^\w+$", "a_b"));
    assert!(regexp_matches(r"^\w$", "+"));
    assert!(regexp_matches(r"^\w+$", "é9"));
    assert!(regexp_matches(r"^\W$", "_"));

    // \s is the four XML whitespace characters only.
    assert!(regexp_matches(r"^\s$", "\t"));
    assert!(!regexp_matches(r"^\s$", "\u{a0}"));
    assert!(regexp_matches(r"^\S$", "\u{a0}"));

    // `.` stops at both line endings.
    assert!(!regexp_matches("^a.b$", "a\rb"));
    assert!(!regexp_matches("^a.b$", "a\nb"));
    assert!(regexp_matches("^a.b$", "a\u{a0}b"));
}

#[test]
fn test_schema_escapes_inside_classes() {
    assert!(regexp_matches(r"^[\s_]+$", "_ \r_"));
    assert!(!regexp_matches(r"^[\s_]$", "\u{a0}"));
    assert!(!regexp_matches(r"^[^\w]$", "a"));
    assert!(regexp_matches(r"^[^\w]$", "_"));
    // Inside a class `.` is a literal dot.
    assert!(regexp_matches("^[.]$", "."));
    assert!(!regexp_matches("^[.]$", "x"));
}

#[test]
fn test_translation_of_schema_escapes() {
    let compiler = XsdPatternCompiler::new();
    assert_eq!(compiler.translate(r"a.\s").unwrap(), r"a[^\n\r][ \t\n\r]");
    assert_eq!(compiler.translate(r"[\w.]").unwrap(), r"[[^\p{P}\p{Z}\p{C}].]");
}

#[test]
fn test_literal_bad_pattern_fails_at_bind_time() {
    let err = eval("string-regexp-match", vec![text("a(b"), text("abc")]).unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
    assert!(matches!(err.kind, EvalErrorKind::InvalidPattern { .. }));
}

#[test]
fn test_runtime_bad_pattern_is_indeterminate() {
    let registry = FunctionRegistry::standard().unwrap();
    let apply = registry
        .bind_apply(&standard_id("string-regexp-match"), vec![one_string("pattern"), text("abc")])
        .unwrap();
    let mut ctx = MapContext::new().with(subject("pattern"), string_bag(&["a(b"]));
    let err = apply.evaluate(&mut ctx).unwrap_err();
    assert_eq!(err.status(), Status::Indeterminate);
    assert!(matches!(err.kind, EvalErrorKind::ArgumentIndeterminate { position: 1, .. }));
    assert!(matches!(err.root_cause().kind, EvalErrorKind::InvalidPattern { .. }));
}

#[derive(Debug, Default)]
struct CountingCompiler {
    inner: XsdPatternCompiler,
    compiled: AtomicUsize,
}

impl PatternCompiler for CountingCompiler {
    fn compile(&self, pattern: &str) -> pdp_values::EvalResult<Arc<dyn CompiledPattern>> {
        self.compiled.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(pattern)
    }
}

#[test]
fn test_literal_pattern_compiled_once() {
    let compiler = Arc::new(CountingCompiler::default());
    let registry = FunctionRegistry::standard_with(Arc::clone(&compiler) as Arc<dyn PatternCompiler>).unwrap();
    let id = standard_id("string-regexp-match");

    let literal = registry
        .bind_apply(&id, vec![text("^user-[0-9]+$"), one_string("name")])
        .unwrap();
    assert_eq!(compiler.compiled.load(Ordering::SeqCst), 1);
    for name in ["user-1", "user-22", "admin"] {
        let mut ctx = MapContext::new().with(subject("name"), string_bag(&[name]));
        let matched = literal.evaluate(&mut ctx).unwrap();
        assert_eq!(matched, Value::from(name != "admin"));
    }
    assert_eq!(compiler.compiled.load(Ordering::SeqCst), 1);

    let dynamic = registry
        .bind_apply(&id, vec![one_string("pattern"), text("abc")])
        .unwrap();
    for _ in 0..2 {
        let mut ctx = MapContext::new().with(subject("pattern"), string_bag(&["b"]));
        assert_eq!(dynamic.evaluate(&mut ctx).unwrap(), Value::from(true));
    }
    assert_eq!(compiler.compiled.load(Ordering::SeqCst), 3);
}

#[test]
fn test_strict_registry_rejects_untranslatable_literal() {
    let registry = FunctionRegistry::standard_with(Arc::new(XsdPatternCompiler::strict())).unwrap();
    let err = registry
        .bind_apply(&standard_id("string-regexp-match"), vec![text(r"\p{IsBasicLatin}+"), text("abc")])
        .unwrap_err();
    assert_eq!(err.status(), Status::Syntax);
}
