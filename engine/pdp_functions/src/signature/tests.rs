use super::*;

use pdp_values::{EvalErrorKind, PrimitiveKind, Status};
use pretty_assertions::assert_eq;

const INT: Datatype = PrimitiveKind::Integer.single();
const INT_BAG: Datatype = PrimitiveKind::Integer.bag();
const BOOL: Datatype = PrimitiveKind::Boolean.single();

#[test]
fn test_fixed_arity_requires_exact_count() {
    let sig = FunctionSignature::fixed("integer-equal", BOOL, &[INT, INT]);
    assert!(sig.validate(&[INT, INT]).is_ok());
    for count in [0, 1, 3] {
        let err = sig.validate(&vec![INT; count]).unwrap_err();
        assert_eq!(err.status(), Status::Syntax);
        assert!(matches!(err.kind, EvalErrorKind::ArityMismatch { expected: 2, variadic: false, .. }));
    }
}

#[test]
fn test_variadic_minimum_is_params_minus_one() {
    let sig = FunctionSignature::variadic("integer-add", INT, &[INT, INT], INT);
    assert_eq!(sig.min_arity(), 2);
    assert!(sig.validate(&[INT]).is_err());
    for count in 2..6 {
        assert!(sig.validate(&vec![INT; count]).is_ok(), "{count}");
    }
    let err = sig.validate(&[INT]).unwrap_err();
    assert_eq!(err.message, "integer-add expects at least 2 arguments, got 1");
}

#[test]
fn test_variadic_with_zero_minimum() {
    let sig = FunctionSignature::variadic("and", BOOL, &[], BOOL);
    assert!(sig.validate(&[]).is_ok());
    assert!(sig.validate(&[BOOL, BOOL, BOOL]).is_ok());
    let err = sig.validate(&[BOOL, INT]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArgumentTypeMismatch { position: 2, .. }));
}

#[test]
fn test_bag_and_single_are_never_interchangeable() {
    let single = FunctionSignature::fixed("integer-abs", INT, &[INT]);
    assert!(single.validate(&[INT_BAG]).is_err());
    let bag = FunctionSignature::fixed("integer-bag-size", INT, &[INT_BAG]);
    let err = bag.validate(&[INT]).unwrap_err();
    assert_eq!(err.message, "integer-bag-size: argument #1 must be bag<integer>, got integer");
}

#[test]
fn test_remaining_validated_against_tail() {
    let sig = FunctionSignature::fixed("integer-less-than", BOOL, &[INT, INT]);
    assert!(sig.validate_with_remaining(&[INT], &[INT]).is_ok());
    assert!(sig.validate_remaining(1, &[INT]).is_ok());
    let err = sig.validate_remaining(1, &[BOOL]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArgumentTypeMismatch { position: 2, .. }));
    assert!(sig.validate_remaining(1, &[INT, INT]).is_err());
}

#[test]
fn test_shape_classification() {
    assert_eq!(CallShape::classify(&[INT, INT]), Some(CallShape::AllPrimitive));
    assert_eq!(CallShape::classify(&[INT_BAG, INT_BAG]), Some(CallShape::AllBag));
    assert_eq!(
        CallShape::classify(&[INT, INT_BAG]),
        Some(CallShape::Mixed { primitive_count: 1 })
    );
    assert_eq!(CallShape::classify(&[INT_BAG, INT]), None);
    assert_eq!(CallShape::classify(&[]), Some(CallShape::AllPrimitive));
}

#[test]
fn test_display() {
    let sig = FunctionSignature::variadic("string-concatenate", PrimitiveKind::String.single(), &[PrimitiveKind::String.single(); 2], PrimitiveKind::String.single());
    assert_eq!(sig.to_string(), "string-concatenate(string, string, string...) -> string");
}

#[test]
fn test_shape_ignores_primitive_kinds() {
    let string = PrimitiveKind::String.single();
    let date_time = PrimitiveKind::DateTime.single();
    let duration = PrimitiveKind::DayTimeDuration.single();
    assert_eq!(CallShape::classify(&[string, INT, INT]), Some(CallShape::AllPrimitive));
    assert_eq!(CallShape::classify(&[date_time, duration]), Some(CallShape::AllPrimitive));
    assert_eq!(
        CallShape::classify(&[string, PrimitiveKind::Integer.bag()]),
        Some(CallShape::Mixed { primitive_count: 1 })
    );
    assert_eq!(
        CallShape::classify(&[PrimitiveKind::String.bag(), INT_BAG]),
        Some(CallShape::AllBag)
    );

    // Kinds are still enforced per parameter.
    let substring = FunctionSignature::fixed("substring", string, &[string, INT, INT]);
    let err = substring.validate(&[string, INT, string]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::ArgumentTypeMismatch { position: 3, .. }));
}
